//! Staff entity and repository trait.
//!
//! Maps to the `staff` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// A bookable employee of a salon.
///
/// Maps to the `staff` table:
/// - id: BIGINT PRIMARY KEY
/// - salon_id: BIGINT NOT NULL REFERENCES salons(id) ON DELETE CASCADE
/// - profile_id: BIGINT NULL REFERENCES profiles(id) -- set once an invite is accepted
/// - display_name: VARCHAR(100) NOT NULL
/// - title: VARCHAR(100) NULL
/// - is_active: BOOLEAN NOT NULL DEFAULT TRUE
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
    pub id: i64,
    pub salon_id: i64,
    pub profile_id: Option<i64>,
    pub display_name: String,
    pub title: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Staff {
    pub fn new(id: i64, salon_id: i64, display_name: String, title: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            salon_id,
            profile_id: None,
            display_name,
            title,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Bookable staff belong to the salon and are active.
    pub fn is_bookable_at(&self, salon_id: i64) -> bool {
        self.is_active && self.salon_id == salon_id
    }

    pub fn is_linked_to(&self, profile_id: i64) -> bool {
        self.profile_id == Some(profile_id)
    }
}

/// Partial staff update.
#[derive(Debug, Clone, Default)]
pub struct StaffChanges {
    pub display_name: Option<String>,
    pub title: Option<String>,
    pub is_active: Option<bool>,
}

/// Outcome of a guarded deactivation.
#[derive(Debug, Clone)]
pub enum Deactivation {
    Done(Staff),
    /// Number of pending or confirmed appointments still ahead
    Blocked(usize),
}

/// Repository trait for Staff data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StaffRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Staff>, AppError>;

    /// All staff of a salon; inactive rows only when `include_inactive`.
    async fn find_by_salon(&self, salon_id: i64, include_inactive: bool)
        -> Result<Vec<Staff>, AppError>;

    /// Staff rows linked to a profile (one per salon the person works at).
    async fn find_by_profile(&self, profile_id: i64) -> Result<Vec<Staff>, AppError>;

    async fn create(&self, staff: &Staff) -> Result<Staff, AppError>;

    async fn update(&self, id: i64, changes: &StaffChanges) -> Result<Staff, AppError>;

    /// Apply `changes` with `is_active = false` while holding the staff row
    /// lock that bookings also take. Refused when a pending or confirmed
    /// appointment ends after `from`.
    async fn deactivate(
        &self,
        id: i64,
        changes: &StaffChanges,
        from: DateTime<Utc>,
    ) -> Result<Deactivation, AppError>;

    async fn count_active(&self, salon_id: i64) -> Result<i64, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bookable() {
        let mut staff = Staff::new(1, 10, "Rita".into(), Some("Colourist".into()));
        assert!(staff.is_bookable_at(10));
        assert!(!staff.is_bookable_at(11));
        staff.is_active = false;
        assert!(!staff.is_bookable_at(10));
    }

    #[test]
    fn test_linked_profile() {
        let mut staff = Staff::new(1, 10, "Rita".into(), None);
        assert!(!staff.is_linked_to(5));
        staff.profile_id = Some(5);
        assert!(staff.is_linked_to(5));
    }
}
