//! Appointment entity and repository trait.
//!
//! Maps to the `appointments` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::TimeRange;
use crate::shared::error::AppError;

/// Lifecycle of a booking.
///
/// ```text
/// PENDING --confirm--> CONFIRMED --complete--> COMPLETED
///    |                     |
///    +------cancel---------+------> CANCELLED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "CONFIRMED" => Some(Self::Confirmed),
            "COMPLETED" => Some(Self::Completed),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Pending and confirmed appointments occupy the staff member's time.
    pub fn blocks_slot(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Confirmed, Completed) | (Pending, Cancelled) | (Confirmed, Cancelled)
        )
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A scheduled booking linking a customer, a staff member and a service.
///
/// Maps to the `appointments` table:
/// - id: BIGINT PRIMARY KEY
/// - salon_id, staff_id, service_id, customer_id: BIGINT NOT NULL (FKs)
/// - starts_at / ends_at: TIMESTAMPTZ NOT NULL, CHECK (ends_at > starts_at)
/// - status: VARCHAR(20) NOT NULL DEFAULT 'PENDING'
/// - price_cents: BIGINT NOT NULL (snapshot of the service price at booking time)
/// - notes: TEXT NULL
/// - cancellation_reason: TEXT NULL
/// - cancelled_by: BIGINT NULL REFERENCES profiles(id)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub salon_id: i64,
    pub staff_id: i64,
    pub service_id: i64,
    pub customer_id: i64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub price_cents: i64,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub cancelled_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn range(&self) -> TimeRange {
        TimeRange {
            start: self.starts_at,
            end: self.ends_at,
        }
    }
}

/// Appointment joined with the names a list or calendar needs to render.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentSummary {
    pub appointment: Appointment,
    pub salon_name: String,
    pub staff_name: String,
    pub service_name: String,
    pub customer_name: String,
}

/// Filter for appointment listings.
#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub salon_id: Option<i64>,
    pub staff_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub status: Option<AppointmentStatus>,
    /// Only appointments starting at or after this instant
    pub from: Option<DateTime<Utc>>,
    /// Only appointments starting before this instant
    pub until: Option<DateTime<Utc>>,
    pub limit: i64,
}

/// Status change written by the repository.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub status: AppointmentStatus,
    pub expected_current: AppointmentStatus,
    pub cancellation_reason: Option<String>,
    pub cancelled_by: Option<i64>,
}

/// Repository trait for Appointment data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Appointment>, AppError>;

    async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<AppointmentSummary>, AppError>;

    /// Slot-blocking appointments of one staff member overlapping `range`.
    async fn find_blocking(&self, staff_id: i64, range: TimeRange)
        -> Result<Vec<Appointment>, AppError>;

    /// Insert unless the staff member already has a slot-blocking appointment
    /// overlapping it. The check and insert run in one transaction holding a
    /// lock on the staff row. Overlap, or a staff member deactivated since
    /// the caller looked, yields `AppError::Conflict`.
    async fn insert_if_free(&self, appointment: &Appointment) -> Result<Appointment, AppError>;

    /// Compare-and-set on status. A concurrent change yields `AppError::Conflict`.
    async fn change_status(&self, id: i64, change: &StatusChange) -> Result<Appointment, AppError>;

    async fn count_starting_between(
        &self,
        salon_id: Option<i64>,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<i64, AppError>;

    /// Sum of `price_cents` over COMPLETED appointments starting in the window.
    async fn completed_revenue(
        &self,
        salon_id: i64,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<i64, AppError>;
}
