//! Domain types for the token core.

pub mod principal;
pub mod refresh_token;

pub use principal::Principal;
pub use refresh_token::{RefreshTokenRecord, RefreshTokenStatus, RevocationReason};
