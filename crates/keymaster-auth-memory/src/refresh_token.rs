//! In-memory refresh token store.
//!
//! Records are keyed by token id in a sharded concurrent map. The
//! critical check-and-set of `rotate` runs while holding the old
//! record's entry lock, so concurrent rotations of the same id serialize
//! and exactly one wins; rotations of unrelated ids never contend.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use keymaster_auth::AuthResult;
use keymaster_auth::error::AuthError;
use keymaster_auth::storage::RefreshTokenStore;
use keymaster_auth::types::{RefreshTokenRecord, RefreshTokenStatus, RevocationReason};

/// In-memory refresh token store backed by sharded concurrent maps.
#[derive(Debug, Default)]
pub struct MemoryRefreshTokenStore {
    /// Records keyed by token id.
    records: DashMap<Uuid, RefreshTokenRecord>,

    /// Rotation links: token id -> replacement candidates staged for it.
    /// Parent links live on the records themselves; this is the forward
    /// index used to walk a chain toward its tip.
    children: DashMap<Uuid, Vec<Uuid>>,
}

impl MemoryRefreshTokenStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Collects every reachable member of the rotation chain containing
    /// `id`: ancestors via parent links, descendants via the forward
    /// index.
    fn chain_members(&self, id: Uuid) -> Vec<Uuid> {
        let mut root = id;
        loop {
            let parent = self.records.get(&root).and_then(|r| r.parent_id);
            match parent {
                Some(p) if self.records.contains_key(&p) => root = p,
                _ => break,
            }
        }

        let mut members = Vec::new();
        let mut frontier = vec![root];
        while let Some(current) = frontier.pop() {
            members.push(current);
            if let Some(kids) = self.children.get(&current) {
                for child in kids.iter() {
                    if self.records.contains_key(child) && !members.contains(child) {
                        frontier.push(*child);
                    }
                }
            }
        }
        members
    }

    fn unstage(&self, old_id: Uuid, replacement_id: Uuid) {
        self.records.remove(&replacement_id);
        if let Some(mut kids) = self.children.get_mut(&old_id) {
            kids.retain(|k| *k != replacement_id);
        }
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryRefreshTokenStore {
    async fn record(&self, token: &RefreshTokenRecord) -> AuthResult<()> {
        match self.records.entry(token.id) {
            Entry::Occupied(_) => Err(AuthError::internal(format!(
                "duplicate token id {}",
                token.id
            ))),
            Entry::Vacant(entry) => {
                entry.insert(token.clone());
                Ok(())
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<RefreshTokenRecord>> {
        Ok(self.records.get(&id).map(|r| r.clone()))
    }

    async fn rotate(&self, old_id: Uuid, replacement: &RefreshTokenRecord) -> AuthResult<()> {
        // Stage the replacement before the status flip. Anyone who
        // observes the rotated status can therefore reach the
        // replacement through the forward index, so a replay detected by
        // a concurrent caller never misses it when revoking the chain.
        self.records.insert(replacement.id, replacement.clone());
        self.children
            .entry(old_id)
            .or_default()
            .push(replacement.id);

        // The check-and-set happens under the old record's entry lock;
        // of N concurrent callers exactly one sees Active.
        let outcome = match self.records.get_mut(&old_id) {
            None => Err(AuthError::NotFound),
            Some(mut old) => match old.status {
                RefreshTokenStatus::Rotated => Err(AuthError::AlreadyRotated),
                RefreshTokenStatus::Revoked => Err(AuthError::Revoked),
                RefreshTokenStatus::Active if old.is_expired() => Err(AuthError::Expired),
                RefreshTokenStatus::Active => {
                    old.status = RefreshTokenStatus::Rotated;
                    Ok(())
                }
            },
        };

        if outcome.is_err() {
            self.unstage(old_id, replacement.id);
        }
        outcome
    }

    async fn revoke_chain(&self, id: Uuid, reason: RevocationReason) -> AuthResult<u64> {
        if !self.records.contains_key(&id) {
            return Err(AuthError::NotFound);
        }

        let now = OffsetDateTime::now_utc();
        let mut revoked = 0u64;

        // A rotation racing this call can extend the chain between
        // collection and revocation; loop until the member set is stable.
        loop {
            let members = self.chain_members(id);
            let mut changed = false;
            for member in &members {
                if let Some(mut record) = self.records.get_mut(member) {
                    if record.status != RefreshTokenStatus::Revoked {
                        record.status = RefreshTokenStatus::Revoked;
                        record.revoked_at = Some(now);
                        record.revocation_reason = Some(reason);
                        revoked += 1;
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }

        Ok(revoked)
    }

    async fn status(&self, id: Uuid) -> AuthResult<RefreshTokenStatus> {
        self.records
            .get(&id)
            .map(|r| r.status)
            .ok_or(AuthError::NotFound)
    }

    async fn revoke_by_subject(&self, subject: &str) -> AuthResult<u64> {
        let now = OffsetDateTime::now_utc();
        let mut revoked = 0u64;
        for mut record in self.records.iter_mut() {
            if record.subject == subject && record.status != RefreshTokenStatus::Revoked {
                record.status = RefreshTokenStatus::Revoked;
                record.revoked_at = Some(now);
                record.revocation_reason = Some(RevocationReason::Manual);
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn list_by_subject(&self, subject: &str) -> AuthResult<Vec<RefreshTokenRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.subject == subject && r.is_active())
            .map(|r| r.clone())
            .collect())
    }

    async fn cleanup_expired(&self, retention: Duration) -> AuthResult<u64> {
        let cutoff = OffsetDateTime::now_utc() - retention;
        let mut removed: Vec<Uuid> = Vec::new();
        self.records.retain(|id, record| {
            if record.expires_at < cutoff {
                removed.push(*id);
                false
            } else {
                true
            }
        });
        for id in &removed {
            self.children.remove(id);
        }
        self.children.retain(|_, kids| {
            kids.retain(|k| !removed.contains(k));
            !kids.is_empty()
        });
        Ok(removed.len() as u64)
    }
}
