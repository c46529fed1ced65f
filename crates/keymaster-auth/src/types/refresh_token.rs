//! Refresh token domain type.
//!
//! This module defines the persisted refresh-token record used for
//! rotation and revocation tracking.
//!
//! # Security
//!
//! - A record transitions active -> rotated exactly once; a rotated or
//!   revoked record can never mint a new pair
//! - Rotation links each replacement to its predecessor so a compromised
//!   chain can be revoked as a unit
//! - Expired records are retained for a configured window for audit, then
//!   cleaned up

use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;
use uuid::Uuid;

/// Lifecycle status of a persisted refresh token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshTokenStatus {
    /// Usable for exactly one rotation.
    Active,
    /// Consumed by a successful rotation; presenting it again is replay.
    Rotated,
    /// Explicitly invalidated before natural expiry.
    Revoked,
}

impl RefreshTokenStatus {
    /// Returns the status as a string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Rotated => "rotated",
            Self::Revoked => "revoked",
        }
    }
}

impl fmt::Display for RefreshTokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a token was revoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationReason {
    /// The subject logged out.
    Logout,
    /// A rotated or revoked token was presented again.
    ReuseDetected,
    /// Revoked ahead of a suspected compromise.
    Compromise,
    /// Operator-initiated revocation.
    Manual,
}

impl RevocationReason {
    /// Returns the reason as a string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Logout => "logout",
            Self::ReuseDetected => "reuse_detected",
            Self::Compromise => "compromise",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for RevocationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Refresh token record persisted by the token store.
///
/// The record is keyed by the token id embedded in the signed refresh
/// token's `jti` claim; the token string itself is never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRecord {
    /// Token id; matches the `jti` claim of the issued refresh token.
    pub id: Uuid,

    /// Subject (user id) the token was issued to.
    pub subject: String,

    /// Granted scopes (space-separated).
    pub scope: String,

    /// Predecessor in the rotation chain (None for a login-issued root).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,

    /// Current lifecycle status.
    pub status: RefreshTokenStatus,

    /// When this token was issued.
    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,

    /// When this token expires.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,

    /// When this token was revoked (None = not revoked).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub revoked_at: Option<OffsetDateTime>,

    /// Why this token was revoked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocation_reason: Option<RevocationReason>,
}

impl RefreshTokenRecord {
    /// Creates an active root record for a newly issued refresh token.
    #[must_use]
    pub fn issued(
        id: Uuid,
        subject: impl Into<String>,
        scope: impl Into<String>,
        issued_at: OffsetDateTime,
        expires_at: OffsetDateTime,
    ) -> Self {
        Self {
            id,
            subject: subject.into(),
            scope: scope.into(),
            parent_id: None,
            status: RefreshTokenStatus::Active,
            issued_at,
            expires_at,
            revoked_at: None,
            revocation_reason: None,
        }
    }

    /// Creates the active replacement record for a rotation of `self`.
    ///
    /// The replacement carries the same subject and scope and links back
    /// to this record through `parent_id`.
    #[must_use]
    pub fn replacement(
        &self,
        id: Uuid,
        issued_at: OffsetDateTime,
        expires_at: OffsetDateTime,
    ) -> Self {
        Self {
            id,
            subject: self.subject.clone(),
            scope: self.scope.clone(),
            parent_id: Some(self.id),
            status: RefreshTokenStatus::Active,
            issued_at,
            expires_at,
            revoked_at: None,
            revocation_reason: None,
        }
    }

    /// Returns `true` if this token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc() > self.expires_at
    }

    /// Returns `true` if this token is usable for rotation.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == RefreshTokenStatus::Active && !self.is_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn record(expires_in: Duration) -> RefreshTokenRecord {
        let now = OffsetDateTime::now_utc();
        RefreshTokenRecord::issued(Uuid::new_v4(), "alice", "read write", now, now + expires_in)
    }

    #[test]
    fn test_issued_record_is_active_root() {
        let rec = record(Duration::days(30));
        assert_eq!(rec.status, RefreshTokenStatus::Active);
        assert!(rec.parent_id.is_none());
        assert!(rec.revoked_at.is_none());
        assert!(rec.is_active());
    }

    #[test]
    fn test_replacement_links_to_parent() {
        let parent = record(Duration::days(30));
        let now = OffsetDateTime::now_utc();
        let child = parent.replacement(Uuid::new_v4(), now, now + Duration::days(30));

        assert_eq!(child.parent_id, Some(parent.id));
        assert_eq!(child.subject, parent.subject);
        assert_eq!(child.scope, parent.scope);
        assert_ne!(child.id, parent.id);
        assert!(child.is_active());
    }

    #[test]
    fn test_expired_record_is_not_active() {
        let rec = record(Duration::minutes(-1));
        assert!(rec.is_expired());
        assert!(!rec.is_active());
    }

    #[test]
    fn test_rotated_record_is_not_active() {
        let mut rec = record(Duration::days(30));
        rec.status = RefreshTokenStatus::Rotated;
        assert!(!rec.is_active());
    }

    #[test]
    fn test_status_and_reason_strings() {
        assert_eq!(RefreshTokenStatus::Active.to_string(), "active");
        assert_eq!(RefreshTokenStatus::Rotated.to_string(), "rotated");
        assert_eq!(RefreshTokenStatus::Revoked.to_string(), "revoked");
        assert_eq!(RevocationReason::ReuseDetected.to_string(), "reuse_detected");
        assert_eq!(RevocationReason::Logout.to_string(), "logout");
    }

    #[test]
    fn test_serialization_round_trip() {
        let rec = record(Duration::days(30));
        let json = serde_json::to_string(&rec).unwrap();
        let back: RefreshTokenRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(rec.id, back.id);
        assert_eq!(rec.subject, back.subject);
        assert_eq!(rec.status, back.status);
        // Optional fields that are None are not serialized
        assert!(!json.contains("parentId"));
        assert!(!json.contains("revokedAt"));
    }
}
