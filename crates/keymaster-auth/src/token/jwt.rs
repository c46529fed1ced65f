//! Signed token encoding and decoding.
//!
//! This module implements the token codec: minting compact signed token
//! strings (three dot-separated base64url segments) and decoding them
//! back into validated claims.
//!
//! Decoding verifies the signature before any claim is interpreted. The
//! `kid` header is read from the unverified header only to *select* a
//! verification key from the ring; no claim is trusted until the
//! signature checks out. Expiry is checked against the configured
//! clock-skew leeway.
//!
//! Token contents are never logged; diagnostics carry the `jti` only.

use std::sync::RwLock;
use std::time::Duration;

use jsonwebtoken::{Header, Validation, decode, decode_header, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::token::keys::{Jwks, SigningKey, SigningKeyRing};
use crate::types::Principal;

// ============================================================================
// Token Claims
// ============================================================================

/// Distinguishes the two credential kinds minted by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived, stateless request credential.
    Access,
    /// Long-lived, persisted rotation credential.
    Refresh,
}

impl TokenType {
    /// Returns the token type as carried in the `typ` claim.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Claims carried by every token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenClaims {
    /// Issuer (this server's URL).
    pub iss: String,

    /// Subject (principal id).
    pub sub: String,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Token id (unique, enables targeted revocation).
    pub jti: String,

    /// Space-separated scopes.
    pub scope: String,

    /// Token kind ("access" or "refresh").
    pub typ: TokenType,
}

impl TokenClaims {
    /// Creates a new builder for token claims.
    #[must_use]
    pub fn builder(
        issuer: impl Into<String>,
        subject: impl Into<String>,
        typ: TokenType,
    ) -> TokenClaimsBuilder {
        TokenClaimsBuilder::new(issuer, subject, typ)
    }

    /// Parses the token id claim.
    ///
    /// # Errors
    /// Fails with `Malformed` if the `jti` claim is not a UUID.
    pub fn token_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.jti).map_err(|_| AuthError::malformed("jti is not a valid token id"))
    }

    /// Returns the principal these claims attest.
    #[must_use]
    pub fn principal(&self) -> Principal {
        Principal::new(self.sub.clone(), self.scope.clone())
    }
}

/// Builder for `TokenClaims`.
pub struct TokenClaimsBuilder {
    iss: String,
    sub: String,
    exp: i64,
    iat: i64,
    jti: String,
    scope: String,
    typ: TokenType,
}

impl TokenClaimsBuilder {
    fn new(issuer: impl Into<String>, subject: impl Into<String>, typ: TokenType) -> Self {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        Self {
            iss: issuer.into(),
            sub: subject.into(),
            exp: now + 900, // Default 15 minutes
            iat: now,
            jti: Uuid::new_v4().to_string(),
            scope: String::new(),
            typ,
        }
    }

    /// Sets the expiration time in seconds from issuance.
    #[must_use]
    pub fn expires_in_seconds(mut self, seconds: i64) -> Self {
        self.exp = self.iat + seconds;
        self
    }

    /// Sets the scopes.
    #[must_use]
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Builds the token claims.
    #[must_use]
    pub fn build(self) -> TokenClaims {
        TokenClaims {
            iss: self.iss,
            sub: self.sub,
            exp: self.exp,
            iat: self.iat,
            jti: self.jti,
            scope: self.scope,
            typ: self.typ,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName => Self::InvalidSignature,
            _ => Self::malformed(err.to_string()),
        }
    }
}

// ============================================================================
// Codec
// ============================================================================

/// Codec for minting and decoding signed tokens.
///
/// Thread-safe (`Send + Sync`); intended to be shared behind an `Arc`.
pub struct JwtCodec {
    keys: RwLock<SigningKeyRing>,
    issuer: String,
    leeway: Duration,
}

impl JwtCodec {
    /// Creates a new codec.
    ///
    /// # Arguments
    /// * `keys` - The versioned key ring used for signing/verification
    /// * `issuer` - The issuer claim value (typically the server URL)
    /// * `leeway` - Clock-skew tolerance applied during validation
    #[must_use]
    pub fn new(keys: SigningKeyRing, issuer: impl Into<String>, leeway: Duration) -> Self {
        Self {
            keys: RwLock::new(keys),
            issuer: issuer.into(),
            leeway,
        }
    }

    /// Builds a codec with freshly generated keys from configuration.
    ///
    /// # Errors
    /// Returns an error if the signing configuration is invalid.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        let ring = SigningKeyRing::from_config(&config.signing)?;
        Ok(Self::new(
            ring,
            config.issuer.clone(),
            config.tokens.clock_skew_leeway,
        ))
    }

    /// Mints a signed token string from claims.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn mint(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        let keys = self.keys.read().expect("key ring lock poisoned");
        let key = keys.current();

        let mut header = Header::new(key.algorithm.to_jwt_algorithm());
        header.kid = Some(key.kid.clone());

        encode(&header, claims, key.encoding_key())
            .map_err(|e| AuthError::internal(format!("Failed to encode token: {e}")))
    }

    /// Decodes and validates a token string.
    ///
    /// Verifies the signature against the ring key named by the token's
    /// `kid` header, then validates issuer and expiry (with leeway), then
    /// checks the token kind.
    ///
    /// # Errors
    /// Fails with `Malformed`, `InvalidSignature`, or `Expired`.
    pub fn decode(&self, token: &str, expected: TokenType) -> Result<TokenClaims, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::malformed(e.to_string()))?;
        let kid = header
            .kid
            .ok_or_else(|| AuthError::malformed("missing kid header"))?;

        let keys = self.keys.read().expect("key ring lock poisoned");
        // A kid matching no held key is rejected outright; the header is
        // attacker-controlled and only ever used to select a key.
        let key = keys
            .verification_key(&kid)
            .ok_or(AuthError::InvalidSignature)?;

        if header.alg != key.algorithm.to_jwt_algorithm() {
            return Err(AuthError::InvalidSignature);
        }

        let mut validation = Validation::new(key.algorithm.to_jwt_algorithm());
        validation.set_issuer(&[&self.issuer]);
        validation.leeway = self.leeway.as_secs();
        validation.validate_exp = true;

        let claims = decode::<TokenClaims>(token, key.decoding_key(), &validation)
            .map_err(AuthError::from)?
            .claims;

        if claims.typ != expected {
            tracing::debug!(jti = %claims.jti, typ = %claims.typ, "Unexpected token type");
            return Err(AuthError::malformed(format!(
                "expected {expected} token, got {}",
                claims.typ
            )));
        }

        Ok(claims)
    }

    /// Installs a replacement signing key, retiring the current one into
    /// the verification grace set.
    pub fn rotate_key(&self, replacement: SigningKey) {
        let mut keys = self.keys.write().expect("key ring lock poisoned");
        keys.rotate(replacement);
    }

    /// Returns the current signing key id.
    #[must_use]
    pub fn current_kid(&self) -> String {
        self.keys
            .read()
            .expect("key ring lock poisoned")
            .current_kid()
            .to_string()
    }

    /// Returns the issuer URL.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Returns the JWKS for the ring's asymmetric verification keys.
    #[must_use]
    pub fn jwks(&self) -> Jwks {
        self.keys.read().expect("key ring lock poisoned").jwks()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::keys::SigningAlgorithm;

    const ISSUER: &str = "https://auth.example.com";

    fn hmac_codec() -> JwtCodec {
        let ring = SigningKeyRing::new(SigningKey::generate_hmac(), 2);
        JwtCodec::new(ring, ISSUER, Duration::from_secs(30))
    }

    fn access_claims() -> TokenClaims {
        TokenClaims::builder(ISSUER, "alice", TokenType::Access)
            .scope("read write")
            .expires_in_seconds(900)
            .build()
    }

    #[test]
    fn test_hs256_round_trip() {
        let codec = hmac_codec();
        let claims = access_claims();

        let token = codec.mint(&claims).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let decoded = codec.decode(&token, TokenType::Access).unwrap();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_rs256_round_trip() {
        let ring = SigningKeyRing::new(SigningKey::generate_rsa().unwrap(), 2);
        let codec = JwtCodec::new(ring, ISSUER, Duration::from_secs(30));
        let claims = access_claims();

        let token = codec.mint(&claims).unwrap();
        let decoded = codec.decode(&token, TokenType::Access).unwrap();
        assert_eq!(decoded.sub, "alice");
        assert_eq!(decoded.scope, "read write");
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = hmac_codec();
        // Expired well past the 30s leeway
        let claims = TokenClaims::builder(ISSUER, "alice", TokenType::Access)
            .expires_in_seconds(-120)
            .build();

        let token = codec.mint(&claims).unwrap();
        let result = codec.decode(&token, TokenType::Access);
        assert!(matches!(result, Err(AuthError::Expired)));
    }

    #[test]
    fn test_expiry_within_leeway_accepted() {
        let codec = hmac_codec();
        // Expired 10s ago, inside the 30s leeway
        let claims = TokenClaims::builder(ISSUER, "alice", TokenType::Access)
            .expires_in_seconds(-10)
            .build();

        let token = codec.mint(&claims).unwrap();
        assert!(codec.decode(&token, TokenType::Access).is_ok());
    }

    #[test]
    fn test_foreign_key_rejected() {
        let codec1 = hmac_codec();
        let codec2 = hmac_codec();

        let token = codec1.mint(&access_claims()).unwrap();
        // codec2 holds no key matching the token's kid
        let result = codec2.decode(&token, TokenType::Access);
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let codec = hmac_codec();
        let token = codec.mint(&access_claims()).unwrap();

        // Flip one byte of the signature segment
        let (head, signature) = token.rsplit_once('.').unwrap();
        let mut sig_bytes = signature.as_bytes().to_vec();
        sig_bytes[0] = if sig_bytes[0] == b'A' { b'B' } else { b'A' };
        let tampered = format!("{head}.{}", String::from_utf8(sig_bytes).unwrap());

        let result = codec.decode(&tampered, TokenType::Access);
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn test_tampered_claims_rejected() {
        let codec = hmac_codec();
        let token = codec.mint(&access_claims()).unwrap();

        // Replace the claims segment wholesale; the signature no longer covers it
        let parts: Vec<&str> = token.split('.').collect();
        let forged_claims = base64::Engine::encode(
            &base64::engine::general_purpose::URL_SAFE_NO_PAD,
            r#"{"sub":"mallory"}"#,
        );
        let forged = format!("{}.{}.{}", parts[0], forged_claims, parts[2]);

        assert!(codec.decode(&forged, TokenType::Access).is_err());
    }

    #[test]
    fn test_garbage_token_malformed() {
        let codec = hmac_codec();
        let result = codec.decode("not-a-token", TokenType::Access);
        assert!(matches!(result, Err(AuthError::Malformed { .. })));
    }

    #[test]
    fn test_wrong_token_type_rejected() {
        let codec = hmac_codec();
        let claims = TokenClaims::builder(ISSUER, "alice", TokenType::Refresh)
            .expires_in_seconds(3600)
            .build();
        let token = codec.mint(&claims).unwrap();

        // A refresh token presented where an access token is expected
        let result = codec.decode(&token, TokenType::Access);
        assert!(matches!(result, Err(AuthError::Malformed { .. })));
        // And decodes fine as what it is
        assert!(codec.decode(&token, TokenType::Refresh).is_ok());
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let codec = hmac_codec();
        // Validly signed by this codec, but claiming a different issuer
        let claims = TokenClaims::builder("https://other.example.com", "alice", TokenType::Access)
            .expires_in_seconds(900)
            .build();
        let token = codec.mint(&claims).unwrap();

        assert!(codec.decode(&token, TokenType::Access).is_err());
    }

    #[test]
    fn test_key_rotation_grace_period() {
        let codec = hmac_codec();
        let token = codec.mint(&access_claims()).unwrap();

        // After one rotation the retired key still verifies
        codec.rotate_key(SigningKey::generate_hmac());
        assert!(codec.decode(&token, TokenType::Access).is_ok());

        // Tokens mint under the new key
        let fresh = codec.mint(&access_claims()).unwrap();
        assert!(codec.decode(&fresh, TokenType::Access).is_ok());

        // Push the original key out of the grace set entirely
        codec.rotate_key(SigningKey::generate_hmac());
        codec.rotate_key(SigningKey::generate_hmac());
        let result = codec.decode(&token, TokenType::Access);
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn test_token_id_parsing() {
        let claims = access_claims();
        assert!(claims.token_id().is_ok());

        let mut bad = access_claims();
        bad.jti = "not-a-uuid".to_string();
        assert!(matches!(bad.token_id(), Err(AuthError::Malformed { .. })));
    }

    #[test]
    fn test_principal_from_claims() {
        let claims = access_claims();
        let principal = claims.principal();
        assert_eq!(principal.id, "alice");
        assert!(principal.has_scope("read"));
    }

    #[test]
    fn test_algorithm_confusion_rejected() {
        // A token whose header names an RS256 key's kid but claims HS256
        // must fail; the verification algorithm comes from the held key,
        // never from the attacker-controlled header.
        let rsa = SigningKey::generate_rsa().unwrap();
        assert_eq!(rsa.algorithm, SigningAlgorithm::RS256);
        let ring = SigningKeyRing::new(rsa, 2);
        let codec = JwtCodec::new(ring, ISSUER, Duration::from_secs(30));

        let mut forged_header = Header::new(jsonwebtoken::Algorithm::HS256);
        forged_header.kid = Some(codec.current_kid());
        let forged = encode(
            &forged_header,
            &access_claims(),
            &jsonwebtoken::EncodingKey::from_secret(b"guessed-secret"),
        )
        .unwrap();

        let result = codec.decode(&forged, TokenType::Access);
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }
}
