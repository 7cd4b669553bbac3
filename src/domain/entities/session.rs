//! Session entity and repository trait.
//!
//! Maps to the `user_sessions` table. One row per issued refresh token.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// A refresh-token session.
///
/// Maps to the `user_sessions` table:
/// - id: UUID PRIMARY KEY
/// - profile_id: BIGINT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE
/// - refresh_token_hash: VARCHAR(64) NOT NULL UNIQUE (SHA-256 hex)
/// - user_agent: TEXT NULL
/// - expires_at, created_at, last_used_at: TIMESTAMPTZ
/// - revoked_at: TIMESTAMPTZ NULL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,

    pub profile_id: i64,

    /// SHA-256 hash of the refresh token (never store raw tokens)
    #[serde(skip_serializing)]
    pub refresh_token_hash: String,

    pub user_agent: Option<String>,

    pub expires_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,

    pub last_used_at: DateTime<Utc>,

    pub revoked_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(profile_id: i64, refresh_token_hash: String, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            profile_id,
            refresh_token_hash,
            user_agent: None,
            expires_at,
            created_at: now,
            last_used_at: now,
            revoked_at: None,
        }
    }

    /// Not expired and not revoked.
    pub fn is_active(&self) -> bool {
        self.revoked_at.is_none() && self.expires_at > Utc::now()
    }
}

/// Repository trait for refresh-token sessions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<Session>, AppError>;

    async fn create(&self, session: &Session) -> Result<Session, AppError>;

    /// Token rotation: swap the hash and push out expiry, only while the
    /// session is unrevoked and still holds `old_token_hash`. Returns whether
    /// the swap happened.
    async fn rotate(
        &self,
        id: Uuid,
        old_token_hash: &str,
        new_token_hash: &str,
        new_expires_at: DateTime<Utc>,
    ) -> Result<bool, AppError>;

    async fn revoke(&self, id: Uuid) -> Result<(), AppError>;

    /// Revoke every session of a profile (role changes invalidate old tokens).
    async fn revoke_all_for_profile(&self, profile_id: i64) -> Result<u64, AppError>;
}
