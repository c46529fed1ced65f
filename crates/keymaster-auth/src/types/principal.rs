//! Authenticated principal type.

use serde::{Deserialize, Serialize};

/// An authenticated principal.
///
/// Supplied by the external identity collaborator at login and carried in
/// token claims afterwards. Immutable for the lifetime of a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Opaque subject identifier (user id).
    pub id: String,

    /// Granted scopes (space-separated).
    pub scope: String,
}

impl Principal {
    /// Creates a new principal.
    #[must_use]
    pub fn new(id: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            scope: scope.into(),
        }
    }

    /// Returns `true` if the principal was granted a specific scope.
    ///
    /// Performs exact matching on space-separated scopes.
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope.split_whitespace().any(|s| s == scope)
    }

    /// Iterates over the individual granted scopes.
    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.scope.split_whitespace()
    }
}
