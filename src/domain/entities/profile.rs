//! Profile entity and repository trait.
//!
//! Maps to the `profiles` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::ProfileRole;
use crate::shared::error::AppError;

/// A platform account: customer, salon owner, staff member or admin.
///
/// Maps to the `profiles` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - email: VARCHAR(255) NOT NULL UNIQUE (stored lowercase)
/// - password_hash: VARCHAR(255) NOT NULL
/// - full_name: VARCHAR(100) NOT NULL
/// - phone: VARCHAR(32) NULL
/// - avatar_url: TEXT NULL
/// - role: VARCHAR(20) NOT NULL DEFAULT 'CUSTOMER'
/// - created_at / updated_at: TIMESTAMPTZ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,

    pub email: String,

    /// Argon2 password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub full_name: String,

    pub phone: Option<String>,

    pub avatar_url: Option<String>,

    #[serde(default)]
    pub role: ProfileRole,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Emails are compared case-insensitively everywhere.
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    pub fn has_email(&self, email: &str) -> bool {
        self.email == Self::normalize_email(email)
    }
}

/// Partial update of the caller's own profile.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

/// Repository trait for Profile data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Profile>, AppError>;

    /// Lookup by normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Profile>, AppError>;

    async fn email_exists(&self, email: &str) -> Result<bool, AppError>;

    async fn create(&self, profile: &Profile) -> Result<Profile, AppError>;

    async fn update(&self, id: i64, changes: &ProfileChanges) -> Result<Profile, AppError>;

    async fn set_role(&self, id: i64, role: ProfileRole) -> Result<Profile, AppError>;

    /// Admin listing, newest first.
    async fn list(
        &self,
        role: Option<ProfileRole>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Profile>, AppError>;

    async fn count(&self) -> Result<i64, AppError>;
}
