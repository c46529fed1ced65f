//! Authentication configuration.
//!
//! This module provides configuration types for the token core: token
//! lifetimes, clock-skew tolerance, signing settings, and store behavior.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root authentication configuration.
///
/// # Example (TOML)
///
/// ```toml
/// [auth]
/// issuer = "https://auth.example.com"
///
/// [auth.tokens]
/// access_token_lifetime = "15m"
/// refresh_token_lifetime = "30d"
/// clock_skew_leeway = "30s"
///
/// [auth.signing]
/// algorithm = "RS256"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Server issuer URL (used in the token `iss` claim).
    pub issuer: String,

    /// Token lifetime and expiry-handling configuration.
    pub tokens: TokenLifetimes,

    /// Token signing configuration.
    pub signing: SigningConfig,

    /// Rotate refresh tokens on use.
    /// When enabled, each refresh consumes the presented token and issues a
    /// replacement linked to it. Reuse of a consumed token is treated as
    /// theft and revokes the whole rotation chain.
    pub refresh_token_rotation: bool,

    /// Track revoked access-token ids and consult the index on every
    /// validation. When disabled, access tokens are validated statelessly
    /// (signature + expiry only) and cannot be force-expired.
    pub access_token_revocation: bool,

    /// Upper bound on any single store operation. Operations exceeding
    /// this are surfaced as transient failures, distinct from definitive
    /// rejections.
    #[serde(with = "humantime_serde")]
    pub store_timeout: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "http://localhost:8080".to_string(),
            tokens: TokenLifetimes::default(),
            signing: SigningConfig::default(),
            refresh_token_rotation: true,
            access_token_revocation: true,
            store_timeout: Duration::from_secs(5),
        }
    }
}

/// Token lifetime configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenLifetimes {
    /// Access token lifetime.
    /// Short-lived; validity is determined by signature and expiry alone.
    #[serde(with = "humantime_serde")]
    pub access_token_lifetime: Duration,

    /// Refresh token lifetime.
    /// Long-lived; refresh tokens are persisted and individually revocable.
    #[serde(with = "humantime_serde")]
    pub refresh_token_lifetime: Duration,

    /// Clock-skew tolerance applied when checking `exp` and `iat`.
    /// The single place skew is accounted for.
    #[serde(with = "humantime_serde")]
    pub clock_skew_leeway: Duration,

    /// How long expired refresh-token records and revocation entries are
    /// retained before cleanup removes them.
    #[serde(with = "humantime_serde")]
    pub revocation_retention: Duration,
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            access_token_lifetime: Duration::from_secs(15 * 60), // 15 minutes
            refresh_token_lifetime: Duration::from_secs(30 * 24 * 3600), // 30 days
            clock_skew_leeway: Duration::from_secs(30),
            revocation_retention: Duration::from_secs(7 * 24 * 3600), // 7 days
        }
    }
}

/// Token signing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Signing algorithm.
    /// Supported: "HS256" (symmetric), "RS256" (asymmetric)
    pub algorithm: String,

    /// Key rotation period in days.
    pub key_rotation_days: u32,

    /// Number of retired keys kept for verification.
    /// Tokens signed with a retired key remain valid until they expire.
    pub keys_to_keep: u32,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            algorithm: "RS256".to_string(),
            key_rotation_days: 90,
            keys_to_keep: 2,
        }
    }
}
