//! Bearer token validation.
//!
//! This module provides the per-request validation contract the web layer
//! calls: a transport-agnostic [`Authenticator`] plus an Axum extractor
//! that feeds it from the `Authorization` header.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use keymaster_auth::middleware::{AuthState, BearerAuth};
//!
//! async fn protected_handler(BearerAuth(auth): BearerAuth) -> String {
//!     format!("Hello, {}!", auth.subject())
//! }
//!
//! let app = Router::new()
//!     .route("/protected", get(protected_handler))
//!     .with_state(auth_state);
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::storage::revoked_token::RevocationIndex;
use crate::token::jwt::{JwtCodec, TokenType};

use super::types::AuthContext;

// =============================================================================
// Authenticator
// =============================================================================

/// Per-request access-token validator.
///
/// Decodes the token through the codec (signature, issuer, expiry with
/// leeway), then consults the revocation index by the embedded token id
/// when access-token revocation is enabled. With revocation disabled the
/// hot path performs no store lookup at all.
pub struct Authenticator {
    codec: Arc<JwtCodec>,
    revocation_index: Arc<dyn RevocationIndex>,
    check_revocation: bool,
    store_timeout: Duration,
}

impl Authenticator {
    /// Creates a new authenticator.
    #[must_use]
    pub fn new(
        codec: Arc<JwtCodec>,
        revocation_index: Arc<dyn RevocationIndex>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            codec,
            revocation_index,
            check_revocation: config.access_token_revocation,
            store_timeout: config.store_timeout,
        }
    }

    /// Validates an access token string and yields the request context.
    ///
    /// # Errors
    ///
    /// - `MissingToken` - the token string is empty
    /// - `Malformed` | `InvalidSignature` | `Expired` - codec rejection
    /// - `Revoked` - the token id is in the revocation index
    /// - `TransientStoreFailure` - the index lookup timed out; retryable
    pub async fn authenticate(&self, token: &str) -> Result<AuthContext, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let claims = self.codec.decode(token, TokenType::Access).map_err(|e| {
            tracing::debug!(error = %e, "Access token rejected");
            e
        })?;

        if self.check_revocation {
            let revoked = tokio::time::timeout(
                self.store_timeout,
                self.revocation_index.is_revoked(&claims.jti),
            )
            .await
            .map_err(|_| AuthError::transient("revocation lookup timed out"))??;

            if revoked {
                tracing::debug!(jti = %claims.jti, "Access token revoked");
                return Err(AuthError::Revoked);
            }
        }

        Ok(AuthContext::new(claims))
    }
}

// =============================================================================
// Auth State
// =============================================================================

/// State required for bearer token extraction.
///
/// Include this in the application state and expose it to the extractor
/// via `FromRef`.
///
/// # Example
///
/// ```ignore
/// #[derive(Clone)]
/// struct AppState {
///     auth: AuthState,
///     // ... other state
/// }
///
/// impl FromRef<AppState> for AuthState {
///     fn from_ref(state: &AppState) -> Self {
///         state.auth.clone()
///     }
/// }
/// ```
#[derive(Clone)]
pub struct AuthState {
    /// Shared access-token validator.
    pub authenticator: Arc<Authenticator>,
}

impl AuthState {
    /// Creates a new auth state.
    #[must_use]
    pub fn new(authenticator: Arc<Authenticator>) -> Self {
        Self { authenticator }
    }
}

// =============================================================================
// Bearer Auth Extractor
// =============================================================================

/// Axum extractor that validates Bearer tokens.
///
/// This extractor:
/// 1. Extracts the `Authorization: Bearer <token>` header
/// 2. Decodes and validates the token
/// 3. Checks revocation (when enabled)
///
/// # Errors
///
/// Returns `AuthError` (which implements `IntoResponse`) if the header is
/// missing or malformed, or the token fails validation.
pub struct BearerAuth(pub AuthContext);

impl<S> FromRequestParts<S> for BearerAuth
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let context = auth_state.authenticator.authenticate(token).await?;
        Ok(BearerAuth(context))
    }
}
