//! Revoked access-token index trait.
//!
//! This module defines the fast-lookup set of revoked access-token ids,
//! consulted on the hot path of every validation when access-token
//! revocation is enabled.
//!
//! # Implementation Notes
//!
//! Access tokens are stateless; only the token id (`jti`) needs tracking
//! because:
//!
//! 1. Validity is otherwise determined by signature and expiry alone
//! 2. The index answers a single membership question
//! 3. Entries can be pruned once the token's natural expiry has passed,
//!    bounding index size

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::AuthResult;

/// Storage trait for revoked access-token ids.
#[async_trait]
pub trait RevocationIndex: Send + Sync {
    /// Marks an access-token id as revoked.
    ///
    /// `expires_at` is the token's natural expiry; the entry is prunable
    /// after that instant.
    ///
    /// # Idempotency
    ///
    /// Revoking an already-revoked id succeeds without error.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn add(&self, jti: &str, expires_at: OffsetDateTime) -> AuthResult<()>;

    /// Checks whether an access-token id has been revoked.
    ///
    /// # Performance
    ///
    /// Called on every validated request; implementations must answer in
    /// O(1) or O(log n).
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn is_revoked(&self, jti: &str) -> AuthResult<bool>;

    /// Deletes entries whose associated token has naturally expired.
    ///
    /// # Returns
    ///
    /// Returns the number of entries deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the cleanup operation fails.
    async fn cleanup_expired(&self) -> AuthResult<u64>;
}
