//! Refresh token store trait.
//!
//! This module defines the persistence interface for refresh-token state.
//!
//! # Security Considerations
//!
//! - `rotate` must be atomic against concurrent callers presenting the
//!   same token id; exactly one caller wins
//! - Revocation must be immediate and cover the whole rotation chain
//! - Expired records should be cleaned up once past the retention window

use async_trait::async_trait;
use time::Duration;
use uuid::Uuid;

use crate::AuthResult;
use crate::types::refresh_token::{RefreshTokenRecord, RefreshTokenStatus, RevocationReason};

/// Storage trait for refresh-token state.
///
/// Implementations back this with any store that supports an atomic
/// conditional update on a single record. An in-memory implementation is
/// provided by the `keymaster-auth-memory` crate.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Stores a newly issued refresh token record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be stored (duplicate id,
    /// store unavailable).
    async fn record(&self, token: &RefreshTokenRecord) -> AuthResult<()>;

    /// Finds a refresh token record by its id.
    ///
    /// Returns records regardless of status; callers check `is_active()`
    /// before relying on one.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<RefreshTokenRecord>>;

    /// Atomically consumes `old_id` and installs its replacement.
    ///
    /// The status transition active -> rotated and the insertion of
    /// `replacement` (whose `parent_id` must point at `old_id`) happen as
    /// one indivisible step. Of N concurrent callers presenting the same
    /// id, exactly one succeeds; the rest observe the post-transition
    /// status.
    ///
    /// # Errors
    ///
    /// - `NotFound` - no record with `old_id` exists
    /// - `AlreadyRotated` - the record was consumed by an earlier rotation
    /// - `Revoked` - the record was explicitly revoked
    /// - `Expired` - the record is past its expiry
    async fn rotate(&self, old_id: Uuid, replacement: &RefreshTokenRecord) -> AuthResult<()>;

    /// Revokes a token and every other member of its rotation chain.
    ///
    /// Walks parent links back to the chain root and revokes every
    /// descendant, so a stolen token cannot leave a live rotated
    /// descendant behind. Idempotent for already-revoked members.
    ///
    /// # Returns
    ///
    /// Returns the number of records newly revoked.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no record with `id` exists, or an error if
    /// the operation fails.
    async fn revoke_chain(&self, id: Uuid, reason: RevocationReason) -> AuthResult<u64>;

    /// Returns the current status of a token.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no record with `id` exists.
    async fn status(&self, id: Uuid) -> AuthResult<RefreshTokenStatus>;

    /// Revokes all refresh tokens issued to a subject.
    ///
    /// Used when a subject's sessions are invalidated wholesale (password
    /// change, account compromise).
    ///
    /// # Returns
    ///
    /// Returns the number of records newly revoked.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation fails.
    async fn revoke_by_subject(&self, subject: &str) -> AuthResult<u64>;

    /// Lists all active tokens for a subject.
    ///
    /// Useful for session management surfaces.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation fails.
    async fn list_by_subject(&self, subject: &str) -> AuthResult<Vec<RefreshTokenRecord>>;

    /// Deletes records whose expiry lies further in the past than
    /// `retention`. Records inside the window are kept for audit.
    ///
    /// # Returns
    ///
    /// Returns the number of records deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the cleanup operation fails.
    async fn cleanup_expired(&self, retention: Duration) -> AuthResult<u64>;
}
