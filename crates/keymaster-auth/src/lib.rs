//! # keymaster-auth
//!
//! Token-based authentication core for API clients.
//!
//! This crate provides:
//! - Signed access/refresh token minting and validation
//! - Versioned signing keys with rotation and grace periods
//! - Atomic refresh-token rotation with replay detection
//! - Revocation tracking for refresh chains and individual access tokens
//! - The per-request validation contract the web layer calls
//!
//! ## Overview
//!
//! Access tokens are short-lived and stateless: validity is determined by
//! signature, expiry, and an optional revocation check. Refresh tokens
//! are long-lived and persisted: each use consumes the token atomically
//! and issues a linked replacement, so reuse of a consumed token is
//! detected as theft and revokes the whole rotation chain.
//!
//! Credential verification and persistence are consumed through traits;
//! the host application supplies an [`storage::IdentityProvider`] and
//! storage backends (an in-memory backend ships in
//! `keymaster-auth-memory`).
//!
//! ## Modules
//!
//! - [`config`] - Token lifetimes, signing, and store behavior
//! - [`token`] - Codec, signing keys, and the issuance/refresh engine
//! - [`storage`] - Storage traits consumed by the core
//! - [`middleware`] - Per-request validation contract and HTTP boundary
//! - [`types`] - Principal and refresh-token domain types

pub mod config;
pub mod error;
pub mod middleware;
pub mod storage;
pub mod token;
pub mod types;

pub use config::{AuthConfig, SigningConfig, TokenLifetimes};
pub use error::{AuthError, ErrorCategory};
pub use middleware::{AuthContext, AuthState, Authenticator, BearerAuth};
pub use storage::{IdentityProvider, RefreshTokenStore, RevocationIndex};
pub use token::{
    Jwk, Jwks, JwtCodec, SigningAlgorithm, SigningKey, SigningKeyRing, TokenClaims,
    TokenClaimsBuilder, TokenPair, TokenService, TokenType,
};
pub use types::{Principal, RefreshTokenRecord, RefreshTokenStatus, RevocationReason};

/// Type alias for authentication results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use keymaster_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::config::{AuthConfig, SigningConfig, TokenLifetimes};
    pub use crate::error::{AuthError, ErrorCategory};
    pub use crate::middleware::{AuthContext, AuthState, Authenticator, BearerAuth};
    pub use crate::storage::{IdentityProvider, RefreshTokenStore, RevocationIndex};
    pub use crate::token::{
        JwtCodec, SigningAlgorithm, SigningKey, SigningKeyRing, TokenClaims, TokenPair,
        TokenService, TokenType,
    };
    pub use crate::types::{Principal, RefreshTokenRecord, RefreshTokenStatus, RevocationReason};
}
