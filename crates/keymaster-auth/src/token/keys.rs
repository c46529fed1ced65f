//! Signing key material and rotation.
//!
//! This module provides the versioned key provider used by the token
//! codec. A [`SigningKeyRing`] holds the current signing key plus a
//! bounded list of retired keys that remain valid for verification, so
//! tokens signed before a rotation stay usable until they expire.
//!
//! ## Supported Algorithms
//!
//! - **HS256**: HMAC with SHA-256 (symmetric, shared-secret deployments)
//! - **RS256**: RSA with SHA-256 (asymmetric, public keys exportable as JWKS)

use std::fmt;
use std::str::FromStr;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use rand::RngCore;
use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::config::SigningConfig;
use crate::error::AuthError;

// ============================================================================
// Signing Algorithm
// ============================================================================

/// Supported signing algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigningAlgorithm {
    /// HMAC with SHA-256 (symmetric).
    HS256,
    /// RSA with SHA-256 (asymmetric).
    RS256,
}

impl SigningAlgorithm {
    /// Converts to the `jsonwebtoken` Algorithm type.
    #[must_use]
    pub fn to_jwt_algorithm(self) -> Algorithm {
        match self {
            Self::HS256 => Algorithm::HS256,
            Self::RS256 => Algorithm::RS256,
        }
    }

    /// Returns the algorithm name as used in JWT headers.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::RS256 => "RS256",
        }
    }

    /// Returns `true` if this is a symmetric algorithm.
    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        matches!(self, Self::HS256)
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SigningAlgorithm {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HS256" => Ok(Self::HS256),
            "RS256" => Ok(Self::RS256),
            other => Err(AuthError::configuration(format!(
                "Unsupported signing algorithm: {other}"
            ))),
        }
    }
}

// ============================================================================
// JWKS Types
// ============================================================================

/// JSON Web Key Set for the ring's asymmetric verification keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Jwks {
    /// The keys in this set.
    pub keys: Vec<Jwk>,
}

/// JSON Web Key (RSA public key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type ("RSA").
    pub kty: String,

    /// Key ID.
    pub kid: String,

    /// Key use ("sig" for signing).
    #[serde(rename = "use")]
    pub use_: String,

    /// Algorithm.
    pub alg: String,

    /// RSA modulus (base64url encoded).
    pub n: String,

    /// RSA exponent (base64url encoded).
    pub e: String,
}

// ============================================================================
// Signing Key
// ============================================================================

/// A single versioned signing key.
pub struct SigningKey {
    /// Key ID, carried in the `kid` header of every token it signs.
    pub kid: String,

    /// Signing algorithm.
    pub algorithm: SigningAlgorithm,

    /// Encoding key (secret or private key) for signing.
    encoding_key: EncodingKey,

    /// Decoding key (secret or public key) for verification.
    decoding_key: DecodingKey,

    /// RSA public key components for JWKS export (None for HMAC).
    rsa_public: Option<RsaPublicComponents>,

    /// When the key was created.
    pub created_at: OffsetDateTime,
}

struct RsaPublicComponents {
    n: Vec<u8>,
    e: Vec<u8>,
}

impl SigningKey {
    /// Generates a new random HMAC key.
    #[must_use]
    pub fn generate_hmac() -> Self {
        let mut secret = [0u8; 32];
        OsRng.fill_bytes(&mut secret);
        Self::from_secret(&secret)
    }

    /// Creates an HMAC key from a shared secret.
    #[must_use]
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            kid: uuid::Uuid::new_v4().to_string(),
            algorithm: SigningAlgorithm::HS256,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            rsa_public: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// Generates a new RSA key pair.
    ///
    /// # Errors
    /// Returns an error if key generation fails.
    pub fn generate_rsa() -> Result<Self, AuthError> {
        let bits = 2048;
        let private_key = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| AuthError::configuration(format!("RSA key generation failed: {e}")))?;

        let public_key = private_key.to_public_key();
        let n = public_key.n().to_bytes_be();
        let e = public_key.e().to_bytes_be();

        let private_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| AuthError::configuration(format!("RSA key export failed: {e}")))?;
        let encoding_key = EncodingKey::from_rsa_pem(private_pem.as_bytes())
            .map_err(|e| AuthError::configuration(format!("Invalid RSA private key: {e}")))?;

        let public_pem = public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| AuthError::configuration(format!("RSA key export failed: {e}")))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem.as_bytes())
            .map_err(|e| AuthError::configuration(format!("Invalid RSA public key: {e}")))?;

        Ok(Self {
            kid: uuid::Uuid::new_v4().to_string(),
            algorithm: SigningAlgorithm::RS256,
            encoding_key,
            decoding_key,
            rsa_public: Some(RsaPublicComponents { n, e }),
            created_at: OffsetDateTime::now_utc(),
        })
    }

    /// Loads an RSA key pair from PEM strings.
    ///
    /// # Errors
    /// Returns an error if the PEM data is invalid.
    pub fn from_rsa_pem(
        kid: impl Into<String>,
        private_pem: &str,
        public_pem: &str,
    ) -> Result<Self, AuthError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_pem.as_bytes())
            .map_err(|e| AuthError::configuration(format!("Invalid RSA private key: {e}")))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem.as_bytes())
            .map_err(|e| AuthError::configuration(format!("Invalid RSA public key: {e}")))?;

        let public_key = RsaPublicKey::from_public_key_pem(public_pem)
            .map_err(|e| AuthError::configuration(format!("Invalid RSA public key: {e}")))?;
        let n = public_key.n().to_bytes_be();
        let e = public_key.e().to_bytes_be();

        Ok(Self {
            kid: kid.into(),
            algorithm: SigningAlgorithm::RS256,
            encoding_key,
            decoding_key,
            rsa_public: Some(RsaPublicComponents { n, e }),
            created_at: OffsetDateTime::now_utc(),
        })
    }

    /// Generates a key for the configured algorithm.
    ///
    /// # Errors
    /// Returns an error if generation fails.
    pub fn generate(algorithm: SigningAlgorithm) -> Result<Self, AuthError> {
        match algorithm {
            SigningAlgorithm::HS256 => Ok(Self::generate_hmac()),
            SigningAlgorithm::RS256 => Self::generate_rsa(),
        }
    }

    /// Returns the encoding key for signing.
    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    /// Returns the decoding key for verification.
    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }

    /// Exports the public key as a JWK (RSA keys only).
    #[must_use]
    pub fn to_jwk(&self) -> Option<Jwk> {
        self.rsa_public.as_ref().map(|public| Jwk {
            kty: "RSA".to_string(),
            kid: self.kid.clone(),
            use_: "sig".to_string(),
            alg: self.algorithm.as_str().to_string(),
            n: URL_SAFE_NO_PAD.encode(&public.n),
            e: URL_SAFE_NO_PAD.encode(&public.e),
        })
    }
}

// ============================================================================
// Signing Key Ring
// ============================================================================

/// Versioned key provider with rotation and grace-period semantics.
///
/// The ring signs with exactly one current key. Retired keys stay in the
/// ring for verification until pushed out by newer rotations, so a token
/// signed just before a rotation still verifies during its lifetime.
pub struct SigningKeyRing {
    current: SigningKey,
    /// Retired keys, newest first. Bounded by `keys_to_keep`.
    previous: Vec<SigningKey>,
    keys_to_keep: usize,
}

impl SigningKeyRing {
    /// Creates a ring around an initial key.
    #[must_use]
    pub fn new(current: SigningKey, keys_to_keep: usize) -> Self {
        Self {
            current,
            previous: Vec::new(),
            keys_to_keep,
        }
    }

    /// Builds a ring with a freshly generated key per the configuration.
    ///
    /// # Errors
    /// Returns an error if the configured algorithm is unknown or key
    /// generation fails.
    pub fn from_config(config: &SigningConfig) -> Result<Self, AuthError> {
        let algorithm: SigningAlgorithm = config.algorithm.parse()?;
        let key = SigningKey::generate(algorithm)?;
        Ok(Self::new(key, config.keys_to_keep as usize))
    }

    /// Installs a replacement signing key.
    ///
    /// The outgoing key is retired into the verification set; the oldest
    /// retired key beyond `keys_to_keep` is dropped, after which tokens it
    /// signed fail verification.
    pub fn rotate(&mut self, replacement: SigningKey) {
        let retired = std::mem::replace(&mut self.current, replacement);
        self.previous.insert(0, retired);
        self.previous.truncate(self.keys_to_keep);
    }

    /// Returns the current signing key.
    #[must_use]
    pub fn current(&self) -> &SigningKey {
        &self.current
    }

    /// Returns the current key id.
    #[must_use]
    pub fn current_kid(&self) -> &str {
        &self.current.kid
    }

    /// Looks up a verification key by id across current and retired keys.
    #[must_use]
    pub fn verification_key(&self, kid: &str) -> Option<&SigningKey> {
        if self.current.kid == kid {
            return Some(&self.current);
        }
        self.previous.iter().find(|k| k.kid == kid)
    }

    /// Returns the JWKS for all asymmetric keys in the ring.
    #[must_use]
    pub fn jwks(&self) -> Jwks {
        let keys = std::iter::once(&self.current)
            .chain(self.previous.iter())
            .filter_map(SigningKey::to_jwk)
            .collect();
        Jwks { keys }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_hmac_key() {
        let key = SigningKey::generate_hmac();
        assert_eq!(key.algorithm, SigningAlgorithm::HS256);
        assert!(!key.kid.is_empty());
        assert!(key.to_jwk().is_none());
    }

    #[test]
    fn test_generate_rsa_key() {
        let key = SigningKey::generate_rsa().unwrap();
        assert_eq!(key.algorithm, SigningAlgorithm::RS256);
        assert!(!key.kid.is_empty());

        let jwk = key.to_jwk().unwrap();
        assert_eq!(jwk.kty, "RSA");
        assert_eq!(jwk.use_, "sig");
        assert_eq!(jwk.alg, "RS256");
        assert!(!jwk.n.is_empty());
        assert!(!jwk.e.is_empty());
    }

    #[test]
    fn test_algorithm_parsing() {
        assert_eq!(
            "HS256".parse::<SigningAlgorithm>().unwrap(),
            SigningAlgorithm::HS256
        );
        assert_eq!(
            "RS256".parse::<SigningAlgorithm>().unwrap(),
            SigningAlgorithm::RS256
        );
        assert!("ES384".parse::<SigningAlgorithm>().is_err());
        assert!(SigningAlgorithm::HS256.is_symmetric());
        assert!(!SigningAlgorithm::RS256.is_symmetric());
    }

    #[test]
    fn test_ring_lookup_current_and_retired() {
        let first = SigningKey::generate_hmac();
        let first_kid = first.kid.clone();
        let mut ring = SigningKeyRing::new(first, 2);

        assert_eq!(ring.current_kid(), first_kid);
        assert!(ring.verification_key(&first_kid).is_some());

        let second = SigningKey::generate_hmac();
        let second_kid = second.kid.clone();
        ring.rotate(second);

        assert_eq!(ring.current_kid(), second_kid);
        // Retired key still verifies during the grace window
        assert!(ring.verification_key(&first_kid).is_some());
        assert!(ring.verification_key("unknown-kid").is_none());
    }

    #[test]
    fn test_ring_drops_keys_beyond_grace() {
        let first = SigningKey::generate_hmac();
        let first_kid = first.kid.clone();
        let mut ring = SigningKeyRing::new(first, 1);

        ring.rotate(SigningKey::generate_hmac());
        assert!(ring.verification_key(&first_kid).is_some());

        ring.rotate(SigningKey::generate_hmac());
        assert!(ring.verification_key(&first_kid).is_none());
    }

    #[test]
    fn test_ring_from_config() {
        let config = SigningConfig {
            algorithm: "HS256".to_string(),
            ..SigningConfig::default()
        };
        let ring = SigningKeyRing::from_config(&config).unwrap();
        assert_eq!(ring.current().algorithm, SigningAlgorithm::HS256);

        let bad = SigningConfig {
            algorithm: "none".to_string(),
            ..SigningConfig::default()
        };
        assert!(SigningKeyRing::from_config(&bad).is_err());
    }

    #[test]
    fn test_jwks_includes_retired_rsa_keys() {
        let first = SigningKey::generate_rsa().unwrap();
        let mut ring = SigningKeyRing::new(first, 2);
        ring.rotate(SigningKey::generate_rsa().unwrap());

        let jwks = ring.jwks();
        assert_eq!(jwks.keys.len(), 2);

        let json = serde_json::to_string(&jwks).unwrap();
        assert!(json.contains("\"keys\":["));
        assert!(json.contains("\"kty\":\"RSA\""));
    }

    #[test]
    fn test_jwks_empty_for_hmac_ring() {
        let ring = SigningKeyRing::new(SigningKey::generate_hmac(), 2);
        assert!(ring.jwks().keys.is_empty());
    }
}
