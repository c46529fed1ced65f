//! In-memory storage backend for Keymaster token state.
//!
//! This crate provides in-memory implementations of the storage traits
//! from `keymaster-auth`, using sharded concurrent maps. Suitable for
//! single-process deployments and tests; durable backends implement the
//! same traits.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use keymaster_auth::{AuthConfig, JwtCodec, TokenService};
//! use keymaster_auth_memory::{MemoryRefreshTokenStore, MemoryRevocationIndex};
//!
//! let config = AuthConfig::default();
//! let codec = Arc::new(JwtCodec::from_config(&config)?);
//! let service = TokenService::new(
//!     codec,
//!     identity_provider,
//!     Arc::new(MemoryRefreshTokenStore::new()),
//!     Arc::new(MemoryRevocationIndex::new()),
//!     config,
//! );
//! ```

pub mod refresh_token;
pub mod revoked_token;

pub use refresh_token::MemoryRefreshTokenStore;
pub use revoked_token::MemoryRevocationIndex;
