//! Service catalog entities and repository traits.
//!
//! `GlobalService` maps to `global_services` (the platform-wide catalog that
//! admins curate); `SalonService` maps to `salon_services` (what a salon
//! actually sells, with its own price and duration).

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Platform catalog entry.
///
/// Maps to the `global_services` table:
/// - id: BIGINT PRIMARY KEY
/// - name: VARCHAR(100) NOT NULL
/// - category: VARCHAR(50) NOT NULL
/// - description: TEXT NULL
/// - is_active: BOOLEAN NOT NULL DEFAULT TRUE
/// - UNIQUE (lower(name), lower(category))
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalService {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload of a NEW_SERVICE approval request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalServiceDraft {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl GlobalServiceDraft {
    pub fn into_service(self, id: i64) -> GlobalService {
        let now = Utc::now();
        GlobalService {
            id,
            name: self.name,
            category: self.category,
            description: self.description,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial catalog update (admin).
#[derive(Debug, Clone, Default)]
pub struct GlobalServiceChanges {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// A service offered by one salon.
///
/// Maps to the `salon_services` table:
/// - id: BIGINT PRIMARY KEY
/// - salon_id: BIGINT NOT NULL REFERENCES salons(id) ON DELETE CASCADE
/// - global_service_id: BIGINT NULL REFERENCES global_services(id)
/// - name: VARCHAR(100) NOT NULL
/// - category: VARCHAR(50) NOT NULL
/// - price_cents: BIGINT NOT NULL CHECK (price_cents >= 0)
/// - duration_minutes: INTEGER NOT NULL CHECK (duration_minutes > 0)
/// - is_active: BOOLEAN NOT NULL DEFAULT TRUE
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalonService {
    pub id: i64,
    pub salon_id: i64,
    pub global_service_id: Option<i64>,
    pub name: String,
    pub category: String,
    pub price_cents: i64,
    pub duration_minutes: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SalonService {
    pub fn duration(&self) -> Duration {
        Duration::minutes(self.duration_minutes as i64)
    }

    pub fn is_bookable_at(&self, salon_id: i64) -> bool {
        self.is_active && self.salon_id == salon_id
    }
}

/// Partial salon service update (owner).
#[derive(Debug, Clone, Default)]
pub struct SalonServiceChanges {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price_cents: Option<i64>,
    pub duration_minutes: Option<i32>,
    pub is_active: Option<bool>,
}

/// Repository trait for the platform catalog.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GlobalServiceRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<GlobalService>, AppError>;

    /// Active entries, optionally restricted to one category, ordered by category then name.
    async fn list_active(&self, category: Option<String>) -> Result<Vec<GlobalService>, AppError>;

    async fn create(&self, service: &GlobalService) -> Result<GlobalService, AppError>;

    async fn update(&self, id: i64, changes: &GlobalServiceChanges)
        -> Result<GlobalService, AppError>;
}

/// Repository trait for salon services.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SalonServiceRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<SalonService>, AppError>;

    async fn find_by_salon(&self, salon_id: i64, include_inactive: bool)
        -> Result<Vec<SalonService>, AppError>;

    async fn create(&self, service: &SalonService) -> Result<SalonService, AppError>;

    async fn update(&self, id: i64, changes: &SalonServiceChanges)
        -> Result<SalonService, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration() {
        let now = Utc::now();
        let service = SalonService {
            id: 1,
            salon_id: 2,
            global_service_id: None,
            name: "Haircut".into(),
            category: "Hair".into(),
            price_cents: 2500,
            duration_minutes: 45,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(service.duration(), Duration::minutes(45));
        assert!(service.is_bookable_at(2));
        assert!(!service.is_bookable_at(3));
    }

    #[test]
    fn test_draft_into_service() {
        let draft = GlobalServiceDraft {
            name: "Balayage".into(),
            category: "Colour".into(),
            description: None,
        };
        let service = draft.into_service(99);
        assert_eq!(service.id, 99);
        assert!(service.is_active);
        assert_eq!(service.category, "Colour");
    }
}
