//! Token issuance and refresh engine.
//!
//! This module orchestrates the credential flows:
//!
//! - Login: verify credentials with the identity collaborator, mint an
//!   access/refresh pair, record the refresh token
//! - Refresh: decode the presented refresh token, atomically rotate it,
//!   mint a fresh pair; reuse of a consumed token revokes its whole chain
//! - Logout: revoke the refresh token's chain
//! - Targeted access-token revocation (when enabled)
//!
//! Every store call runs under the configured bounded timeout; a timeout
//! surfaces as `TransientStoreFailure` and is never retried here.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::storage::identity::IdentityProvider;
use crate::storage::refresh_token::RefreshTokenStore;
use crate::storage::revoked_token::RevocationIndex;
use crate::token::jwt::{JwtCodec, TokenClaims, TokenType};
use crate::types::Principal;
use crate::types::refresh_token::{RefreshTokenRecord, RefreshTokenStatus, RevocationReason};

/// An issued access/refresh token pair.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    /// Signed access token.
    pub access_token: String,

    /// Signed refresh token.
    pub refresh_token: String,

    /// Token type for the Authorization header. Always "Bearer".
    pub token_type: String,

    /// Access token lifetime in seconds.
    pub expires_in: u64,

    /// Granted scopes (space-separated).
    pub scope: String,
}

impl TokenPair {
    /// Creates a new token pair response.
    #[must_use]
    pub fn new(
        access_token: String,
        refresh_token: String,
        expires_in: u64,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
            scope: scope.into(),
        }
    }
}

/// Token issuance and refresh engine.
pub struct TokenService {
    /// Codec for minting/decoding signed tokens.
    codec: Arc<JwtCodec>,

    /// External identity collaborator for credential checks.
    identity: Arc<dyn IdentityProvider>,

    /// Refresh-token state store.
    refresh_store: Arc<dyn RefreshTokenStore>,

    /// Revoked access-token index.
    revocation_index: Arc<dyn RevocationIndex>,

    /// Service configuration.
    config: AuthConfig,
}

impl TokenService {
    /// Creates a new token service.
    #[must_use]
    pub fn new(
        codec: Arc<JwtCodec>,
        identity: Arc<dyn IdentityProvider>,
        refresh_store: Arc<dyn RefreshTokenStore>,
        revocation_index: Arc<dyn RevocationIndex>,
        config: AuthConfig,
    ) -> Self {
        Self {
            codec,
            identity,
            refresh_store,
            revocation_index,
            config,
        }
    }

    /// Authenticates credentials and issues a fresh token pair.
    ///
    /// Credential verification is delegated to the identity collaborator;
    /// this service never sees password policy.
    ///
    /// # Errors
    ///
    /// - `InvalidCredentials` - the identity collaborator rejected the pair
    /// - `TransientStoreFailure` - the refresh token could not be recorded
    ///   in time
    pub async fn login(&self, identifier: &str, secret: &str) -> AuthResult<TokenPair> {
        let principal = self.identity.verify_credentials(identifier, secret).await?;

        let refresh_claims = self.refresh_claims(&principal);
        let record = RefreshTokenRecord::issued(
            refresh_claims.token_id()?,
            &principal.id,
            &principal.scope,
            OffsetDateTime::from_unix_timestamp(refresh_claims.iat)
                .map_err(|e| AuthError::internal(e.to_string()))?,
            OffsetDateTime::from_unix_timestamp(refresh_claims.exp)
                .map_err(|e| AuthError::internal(e.to_string()))?,
        );
        self.bounded(self.refresh_store.record(&record)).await?;

        let pair = self.mint_pair(&principal, &refresh_claims)?;
        tracing::debug!(
            subject = %principal.id,
            refresh_jti = %refresh_claims.jti,
            "Issued token pair at login"
        );
        Ok(pair)
    }

    /// Exchanges a refresh token for a new pair, rotating it.
    ///
    /// The store transition is atomic: of N concurrent calls presenting
    /// the same token, exactly one succeeds. Reuse of an already-consumed
    /// or revoked token is treated as a compromise signal - the entire
    /// rotation chain is revoked before the failure is surfaced.
    ///
    /// # Errors
    ///
    /// - `Malformed` | `InvalidSignature` | `Expired` - codec rejection
    /// - `AlreadyRotated` | `Revoked` - definitive rejection; the chain
    ///   has been revoked as a side effect
    /// - `NotFound` - the token id is unknown to the store
    /// - `TransientStoreFailure` - bounded store timeout; retryable
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        let claims = self.codec.decode(refresh_token, TokenType::Refresh)?;
        let old_id = claims.token_id()?;
        let principal = claims.principal();

        if !self.config.refresh_token_rotation {
            return self
                .refresh_without_rotation(refresh_token, &claims, &principal)
                .await;
        }

        let replacement_claims = self.refresh_claims(&principal);
        let replacement = RefreshTokenRecord {
            id: replacement_claims.token_id()?,
            subject: principal.id.clone(),
            scope: principal.scope.clone(),
            parent_id: Some(old_id),
            status: RefreshTokenStatus::Active,
            issued_at: OffsetDateTime::from_unix_timestamp(replacement_claims.iat)
                .map_err(|e| AuthError::internal(e.to_string()))?,
            expires_at: OffsetDateTime::from_unix_timestamp(replacement_claims.exp)
                .map_err(|e| AuthError::internal(e.to_string()))?,
            revoked_at: None,
            revocation_reason: None,
        };

        match self
            .bounded(self.refresh_store.rotate(old_id, &replacement))
            .await
        {
            Ok(()) => {
                let pair = self.mint_pair(&principal, &replacement_claims)?;
                tracing::debug!(
                    subject = %principal.id,
                    old_jti = %claims.jti,
                    new_jti = %replacement_claims.jti,
                    "Rotated refresh token"
                );
                Ok(pair)
            }
            Err(err) if err.is_reuse() => {
                self.handle_reuse(old_id, &claims).await;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Revokes a refresh token and its entire rotation chain.
    ///
    /// # Errors
    ///
    /// - `Malformed` | `InvalidSignature` | `Expired` - codec rejection
    /// - `NotFound` - the token id is unknown to the store
    /// - `TransientStoreFailure` - bounded store timeout; retryable
    pub async fn logout(&self, refresh_token: &str) -> AuthResult<()> {
        let claims = self.codec.decode(refresh_token, TokenType::Refresh)?;
        let id = claims.token_id()?;

        let revoked = self
            .bounded(
                self.refresh_store
                    .revoke_chain(id, RevocationReason::Logout),
            )
            .await?;
        tracing::debug!(jti = %claims.jti, revoked, "Revoked refresh chain at logout");
        Ok(())
    }

    /// Revokes a single access token by id, effective on the next
    /// validation.
    ///
    /// `expires_at` is the token's natural expiry and bounds how long the
    /// index entry is retained.
    ///
    /// # Errors
    ///
    /// - `Configuration` - access-token revocation is disabled
    /// - `TransientStoreFailure` - bounded store timeout; retryable
    pub async fn revoke_access_token(
        &self,
        jti: &str,
        expires_at: OffsetDateTime,
    ) -> AuthResult<()> {
        if !self.config.access_token_revocation {
            return Err(AuthError::configuration(
                "access-token revocation is disabled",
            ));
        }

        self.bounded(self.revocation_index.add(jti, expires_at))
            .await?;
        tracing::debug!(jti, "Revoked access token");
        Ok(())
    }

    /// Revokes every refresh token issued to a subject.
    ///
    /// # Errors
    ///
    /// Returns `TransientStoreFailure` on bounded store timeout.
    pub async fn revoke_subject(&self, subject: &str) -> AuthResult<u64> {
        let revoked = self
            .bounded(self.refresh_store.revoke_by_subject(subject))
            .await?;
        tracing::warn!(subject, revoked, "Revoked all refresh tokens for subject");
        Ok(revoked)
    }

    /// Gets the codec reference.
    #[must_use]
    pub fn codec(&self) -> &Arc<JwtCodec> {
        &self.codec
    }

    /// Gets the service configuration.
    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Refresh path with rotation disabled: the presented token stays
    /// active and only a new access token is minted.
    async fn refresh_without_rotation(
        &self,
        refresh_token: &str,
        claims: &TokenClaims,
        principal: &Principal,
    ) -> AuthResult<TokenPair> {
        let id = claims.token_id()?;
        match self.bounded(self.refresh_store.status(id)).await? {
            RefreshTokenStatus::Active => {}
            RefreshTokenStatus::Rotated => {
                self.handle_reuse(id, claims).await;
                return Err(AuthError::AlreadyRotated);
            }
            RefreshTokenStatus::Revoked => return Err(AuthError::Revoked),
        }

        let access_token = self.codec.mint(&self.access_claims(principal))?;
        Ok(TokenPair::new(
            access_token,
            refresh_token.to_string(),
            self.config.tokens.access_token_lifetime.as_secs(),
            principal.scope.clone(),
        ))
    }

    /// Revokes the chain after detected reuse. Best-effort: a store
    /// failure here must not mask the definitive rejection already owed
    /// to the caller.
    async fn handle_reuse(&self, id: uuid::Uuid, claims: &TokenClaims) {
        tracing::warn!(
            subject = %claims.sub,
            jti = %claims.jti,
            "Refresh token reuse detected; revoking rotation chain"
        );
        if let Err(err) = self
            .bounded(
                self.refresh_store
                    .revoke_chain(id, RevocationReason::ReuseDetected),
            )
            .await
        {
            tracing::warn!(jti = %claims.jti, error = %err, "Chain revocation failed");
        }
    }

    /// Mints the access token matching an already-minted refresh token.
    fn mint_pair(&self, principal: &Principal, refresh_claims: &TokenClaims) -> AuthResult<TokenPair> {
        let access_token = self.codec.mint(&self.access_claims(principal))?;
        let refresh_token = self.codec.mint(refresh_claims)?;
        Ok(TokenPair::new(
            access_token,
            refresh_token,
            self.config.tokens.access_token_lifetime.as_secs(),
            principal.scope.clone(),
        ))
    }

    fn access_claims(&self, principal: &Principal) -> TokenClaims {
        TokenClaims::builder(self.codec.issuer(), &principal.id, TokenType::Access)
            .scope(&principal.scope)
            .expires_in_seconds(self.config.tokens.access_token_lifetime.as_secs() as i64)
            .build()
    }

    fn refresh_claims(&self, principal: &Principal) -> TokenClaims {
        TokenClaims::builder(self.codec.issuer(), &principal.id, TokenType::Refresh)
            .scope(&principal.scope)
            .expires_in_seconds(self.config.tokens.refresh_token_lifetime.as_secs() as i64)
            .build()
    }

    /// Runs a store operation under the configured bounded timeout.
    async fn bounded<T, F>(&self, operation: F) -> AuthResult<T>
    where
        F: Future<Output = AuthResult<T>>,
    {
        tokio::time::timeout(self.config.store_timeout, operation)
            .await
            .map_err(|_| AuthError::transient("store operation timed out"))?
    }
}
