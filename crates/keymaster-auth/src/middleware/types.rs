//! Authenticated request context types.

use std::sync::Arc;

use crate::token::jwt::TokenClaims;
use crate::types::Principal;

/// Authenticated request context.
///
/// Produced by [`crate::middleware::Authenticator::authenticate`] and by
/// the `BearerAuth` extractor. The claims are wrapped in `Arc` so the
/// context clones cheaply across async boundaries.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Validated access token claims.
    pub claims: Arc<TokenClaims>,

    /// The principal the token attests.
    pub principal: Principal,
}

impl AuthContext {
    /// Creates a context from validated claims.
    #[must_use]
    pub fn new(claims: TokenClaims) -> Self {
        let principal = claims.principal();
        Self {
            claims: Arc::new(claims),
            principal,
        }
    }

    /// Returns the authenticated subject id.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.principal.id
    }

    /// Returns the access token id.
    #[must_use]
    pub fn token_id(&self) -> &str {
        &self.claims.jti
    }

    /// Checks if the token carries a specific scope.
    ///
    /// Performs exact matching on space-separated scopes.
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.principal.has_scope(scope)
    }
}
