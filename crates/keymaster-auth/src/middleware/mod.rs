//! Per-request validation contract for the web layer.
//!
//! This module provides:
//!
//! - A transport-agnostic access-token validator
//! - An Axum Bearer extractor feeding it
//! - The failure-taxonomy-to-HTTP mapping, owned by this boundary
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

pub mod auth;
pub mod error;
pub mod types;

pub use auth::{AuthState, Authenticator, BearerAuth};
pub use types::AuthContext;
