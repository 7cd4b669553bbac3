//! Salon entity and repository trait.
//!
//! Maps to the `salons` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveTime, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::ApprovalRequest;
use crate::shared::error::AppError;

/// Listing status of a salon. Only `Approved` salons are public and bookable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SalonStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Suspended,
}

impl SalonStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            "SUSPENDED" => Some(Self::Suspended),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Suspended => "SUSPENDED",
        }
    }
}

/// A business listing on the marketplace.
///
/// Maps to the `salons` table:
/// - id: BIGINT PRIMARY KEY
/// - owner_id: BIGINT NOT NULL REFERENCES profiles(id)
/// - name: VARCHAR(100) NOT NULL
/// - description, address, city, phone, image_url
/// - status: VARCHAR(20) NOT NULL DEFAULT 'PENDING'
/// - opening_time / closing_time: TIME NOT NULL (salon local time)
/// - utc_offset_minutes: INTEGER NOT NULL DEFAULT 0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Salon {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub address: String,
    pub city: String,
    pub phone: Option<String>,
    pub image_url: Option<String>,
    pub status: SalonStatus,
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
    /// Fixed offset of the salon's local time from UTC
    pub utc_offset_minutes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Salon {
    pub fn is_owner(&self, profile_id: i64) -> bool {
        self.owner_id == profile_id
    }

    pub fn is_public(&self) -> bool {
        self.status == SalonStatus::Approved
    }

    /// Falls back to UTC if the stored offset is out of range.
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    /// Apply an approved update request.
    pub fn apply(&mut self, changes: &SalonChanges) {
        if let Some(name) = &changes.name {
            self.name = name.clone();
        }
        if let Some(description) = &changes.description {
            self.description = Some(description.clone());
        }
        if let Some(address) = &changes.address {
            self.address = address.clone();
        }
        if let Some(city) = &changes.city {
            self.city = city.clone();
        }
        if let Some(phone) = &changes.phone {
            self.phone = Some(phone.clone());
        }
        if let Some(image_url) = &changes.image_url {
            self.image_url = Some(image_url.clone());
        }
        if let Some(opening_time) = changes.opening_time {
            self.opening_time = opening_time;
        }
        if let Some(closing_time) = changes.closing_time {
            self.closing_time = closing_time;
        }
        if let Some(offset) = changes.utc_offset_minutes {
            self.utc_offset_minutes = offset;
        }
    }
}

/// Owner-submitted change set, stored as the payload of a SALON_UPDATE
/// approval request until an admin approves it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalonChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closing_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc_offset_minutes: Option<i32>,
}

impl SalonChanges {
    pub fn is_empty(&self) -> bool {
        *self == SalonChanges::default()
    }
}

/// Filter for the public salon directory.
#[derive(Debug, Clone, Default)]
pub struct SalonFilter {
    pub city: Option<String>,
    /// Case-insensitive substring match on name
    pub search: Option<String>,
    pub status: Option<SalonStatus>,
    pub limit: i64,
    pub offset: i64,
}

/// Repository trait for Salon data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SalonRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Salon>, AppError>;

    async fn find_by_owner(&self, owner_id: i64) -> Result<Vec<Salon>, AppError>;

    async fn list(&self, filter: &SalonFilter) -> Result<Vec<Salon>, AppError>;

    /// Insert a PENDING salon together with its NEW_SALON approval request,
    /// promoting the owner's role if needed, in one transaction.
    async fn create_with_request(
        &self,
        salon: &Salon,
        request: &ApprovalRequest,
    ) -> Result<Salon, AppError>;

    async fn set_status(&self, id: i64, status: SalonStatus) -> Result<Salon, AppError>;

    /// Counts grouped by status, for the admin dashboard.
    async fn count_by_status(&self) -> Result<Vec<(SalonStatus, i64)>, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn salon() -> Salon {
        let now = Utc::now();
        Salon {
            id: 1,
            owner_id: 7,
            name: "Cut & Co".into(),
            description: None,
            address: "1 Main St".into(),
            city: "Lisbon".into(),
            phone: None,
            image_url: None,
            status: SalonStatus::Pending,
            opening_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            closing_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            utc_offset_minutes: 60,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_apply_changes_only_touches_given_fields() {
        let mut s = salon();
        s.apply(&SalonChanges {
            name: Some("Cut & Colour".into()),
            closing_time: NaiveTime::from_hms_opt(20, 0, 0),
            ..Default::default()
        });
        assert_eq!(s.name, "Cut & Colour");
        assert_eq!(s.city, "Lisbon");
        assert_eq!(s.closing_time, NaiveTime::from_hms_opt(20, 0, 0).unwrap());
    }

    #[test]
    fn test_changes_json_omits_unset_fields() {
        let changes = SalonChanges {
            city: Some("Porto".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&changes).unwrap();
        assert_eq!(json, serde_json::json!({ "city": "Porto" }));
        assert!(!changes.is_empty());
        assert!(SalonChanges::default().is_empty());
    }

    #[test]
    fn test_offset() {
        assert_eq!(salon().offset().local_minus_utc(), 3600);
        let mut s = salon();
        s.utc_offset_minutes = 100_000;
        assert_eq!(s.offset().local_minus_utc(), 0);
    }
}
