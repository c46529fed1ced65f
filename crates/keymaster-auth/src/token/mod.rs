//! Token minting, validation, and lifecycle management.
//!
//! This module provides:
//!
//! - Signed token encoding and decoding
//! - Versioned signing keys with rotation and grace periods
//! - The issuance and refresh engine

pub mod jwt;
pub mod keys;
pub mod service;

pub use jwt::{JwtCodec, TokenClaims, TokenClaimsBuilder, TokenType};
pub use keys::{Jwk, Jwks, SigningAlgorithm, SigningKey, SigningKeyRing};
pub use service::{TokenPair, TokenService};
