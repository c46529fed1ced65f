//! In-memory revoked access-token index.

use async_trait::async_trait;
use dashmap::DashMap;
use time::OffsetDateTime;

use keymaster_auth::AuthResult;
use keymaster_auth::storage::RevocationIndex;

/// In-memory revocation index backed by a sharded concurrent map.
///
/// Lookups are O(1); entries are pruned once their token's natural
/// expiry has passed, bounding index size.
#[derive(Debug, Default)]
pub struct MemoryRevocationIndex {
    revoked: DashMap<String, OffsetDateTime>,
}

impl MemoryRevocationIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of tracked entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.revoked.len()
    }

    /// Returns `true` if the index holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.revoked.is_empty()
    }
}

#[async_trait]
impl RevocationIndex for MemoryRevocationIndex {
    async fn add(&self, jti: &str, expires_at: OffsetDateTime) -> AuthResult<()> {
        self.revoked.insert(jti.to_string(), expires_at);
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> AuthResult<bool> {
        Ok(self.revoked.contains_key(jti))
    }

    async fn cleanup_expired(&self) -> AuthResult<u64> {
        let now = OffsetDateTime::now_utc();
        let before = self.revoked.len();
        self.revoked.retain(|_, expires_at| *expires_at > now);
        Ok((before - self.revoked.len()) as u64)
    }
}
