//! Staff invite entity and repository trait.
//!
//! Maps to the `staff_invites` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::entities::Staff;
use crate::shared::error::AppError;

const CODE_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz23456789";
const CODE_LEN: usize = 8;

/// An invitation for someone to join a salon's team.
///
/// Maps to the `staff_invites` table:
/// - code: VARCHAR(16) PRIMARY KEY
/// - salon_id: BIGINT NOT NULL REFERENCES salons(id) ON DELETE CASCADE
/// - email: VARCHAR(255) NOT NULL (lowercase)
/// - display_name: VARCHAR(100) NOT NULL, title: VARCHAR(100) NULL
/// - invited_by: BIGINT NOT NULL REFERENCES profiles(id)
/// - expires_at: TIMESTAMPTZ NOT NULL
/// - accepted_at / accepted_by / revoked_at: NULL until used
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invite {
    pub code: String,
    pub salon_id: i64,
    pub email: String,
    pub display_name: String,
    pub title: Option<String>,
    pub invited_by: i64,
    pub expires_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub accepted_by: Option<i64>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Why an invite can no longer be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InviteState {
    Valid,
    Expired,
    Accepted,
    Revoked,
}

impl Invite {
    pub fn new(
        salon_id: i64,
        email: &str,
        display_name: String,
        title: Option<String>,
        invited_by: i64,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            code: Self::generate_code(),
            salon_id,
            email: email.trim().to_lowercase(),
            display_name,
            title,
            invited_by,
            expires_at: now + ttl,
            accepted_at: None,
            accepted_by: None,
            revoked_at: None,
            created_at: now,
        }
    }

    /// Random code without look-alike characters (0/O, 1/l/I).
    pub fn generate_code() -> String {
        let mut rng = rand::rng();
        (0..CODE_LEN)
            .map(|_| CODE_CHARSET[rng.random_range(0..CODE_CHARSET.len())] as char)
            .collect()
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> InviteState {
        if self.revoked_at.is_some() {
            InviteState::Revoked
        } else if self.accepted_at.is_some() {
            InviteState::Accepted
        } else if self.expires_at <= now {
            InviteState::Expired
        } else {
            InviteState::Valid
        }
    }

    pub fn state(&self) -> InviteState {
        self.state_at(Utc::now())
    }

    pub fn is_valid(&self) -> bool {
        self.state() == InviteState::Valid
    }
}

/// Invite joined with the salon name, for the public preview.
#[derive(Debug, Clone, Serialize)]
pub struct InvitePreview {
    pub invite: Invite,
    pub salon_name: String,
}

/// Repository trait for staff invites.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InviteRepository: Send + Sync {
    async fn find_by_code(&self, code: &str) -> Result<Option<Invite>, AppError>;

    async fn preview(&self, code: &str) -> Result<Option<InvitePreview>, AppError>;

    async fn find_by_salon(&self, salon_id: i64) -> Result<Vec<Invite>, AppError>;

    async fn code_exists(&self, code: &str) -> Result<bool, AppError>;

    async fn create(&self, invite: &Invite) -> Result<Invite, AppError>;

    async fn revoke(&self, code: &str) -> Result<(), AppError>;

    /// Lock the invite, check it is still valid for `profile_id`'s email,
    /// insert `staff` linked to the profile, promote a CUSTOMER to STAFF and
    /// mark the invite accepted, in one transaction.
    ///
    /// Errors: `NotFound` for an unknown code, `Conflict` when the invite is
    /// no longer valid, `Forbidden` on email mismatch.
    async fn accept(&self, code: &str, profile_id: i64, staff: &Staff) -> Result<Staff, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invite() -> Invite {
        Invite::new(1, " New@Salon.com", "Rita".into(), None, 9, Duration::hours(72))
    }

    #[test]
    fn test_generate_code() {
        let code = Invite::generate_code();
        assert_eq!(code.len(), CODE_LEN);
        assert!(code.bytes().all(|b| CODE_CHARSET.contains(&b)));
        assert_ne!(Invite::generate_code(), Invite::generate_code());
    }

    #[test]
    fn test_new_invite_normalizes_email_and_is_valid() {
        let invite = invite();
        assert_eq!(invite.email, "new@salon.com");
        assert!(invite.is_valid());
    }

    #[test]
    fn test_state_precedence() {
        let mut invite = invite();
        let later = invite.expires_at + Duration::seconds(1);
        assert_eq!(invite.state_at(later), InviteState::Expired);

        invite.accepted_at = Some(Utc::now());
        assert_eq!(invite.state_at(later), InviteState::Accepted);

        invite.revoked_at = Some(Utc::now());
        assert_eq!(invite.state(), InviteState::Revoked);
    }
}
