//! Identity collaborator trait.
//!
//! Credential verification is owned by the host application; the token
//! core only consumes its verdict. Password storage and hashing policy
//! live entirely behind this trait.

use async_trait::async_trait;

use crate::AuthResult;
use crate::types::Principal;

/// External identity collaborator consumed at login.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verifies a credential pair and resolves the principal.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` when the pair does not verify. The
    /// secret must never appear in errors or diagnostics.
    async fn verify_credentials(&self, identifier: &str, secret: &str) -> AuthResult<Principal>;
}
