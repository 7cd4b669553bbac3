//! Approval request entity and repository trait.
//!
//! Maps to the `approval_requests` table. Salon owners submit changes that
//! only take effect once a platform admin approves them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{GlobalService, SalonChanges};
use crate::shared::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalKind {
    /// A newly created salon waiting to be listed
    NewSalon,
    /// Changes to a listed salon's public details
    SalonUpdate,
    /// A proposed addition to the platform service catalog
    NewService,
}

impl ApprovalKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "NEW_SALON" => Some(Self::NewSalon),
            "SALON_UPDATE" => Some(Self::SalonUpdate),
            "NEW_SERVICE" => Some(Self::NewService),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewSalon => "NEW_SALON",
            Self::SalonUpdate => "SALON_UPDATE",
            Self::NewService => "NEW_SERVICE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

/// Maps to the `approval_requests` table:
/// - id: BIGINT PRIMARY KEY
/// - salon_id: BIGINT NOT NULL REFERENCES salons(id) ON DELETE CASCADE
/// - requested_by: BIGINT NOT NULL REFERENCES profiles(id)
/// - kind / status: VARCHAR(20) NOT NULL
/// - payload: JSONB NOT NULL (SalonChanges or GlobalServiceDraft)
/// - reviewer_id: BIGINT NULL, review_note: TEXT NULL, reviewed_at: TIMESTAMPTZ NULL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub id: i64,
    pub salon_id: i64,
    pub requested_by: i64,
    pub kind: ApprovalKind,
    pub payload: serde_json::Value,
    pub status: ApprovalStatus,
    pub reviewer_id: Option<i64>,
    pub review_note: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ApprovalRequest {
    pub fn new(
        id: i64,
        salon_id: i64,
        requested_by: i64,
        kind: ApprovalKind,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id,
            salon_id,
            requested_by,
            kind,
            payload,
            status: ApprovalStatus::Pending,
            reviewer_id: None,
            review_note: None,
            reviewed_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ApprovalStatus::Pending
    }
}

/// What the repository must write, besides the request row, when a review
/// is recorded. Computed by the approval service from kind and payload.
#[derive(Debug, Clone)]
pub enum ApprovalEffect {
    /// NEW_SALON approved
    ListSalon { salon_id: i64 },
    /// NEW_SALON rejected
    RejectSalon { salon_id: i64 },
    /// SALON_UPDATE approved
    UpdateSalon { salon_id: i64, changes: SalonChanges },
    /// NEW_SERVICE approved
    AddGlobalService(GlobalService),
    /// Rejections of updates and service proposals touch nothing else
    None,
}

/// A review decision recorded on a pending request.
#[derive(Debug, Clone)]
pub struct ApprovalDecision {
    pub status: ApprovalStatus,
    pub reviewer_id: i64,
    pub note: Option<String>,
    pub effect: ApprovalEffect,
}

/// Repository trait for approval requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApprovalRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<ApprovalRequest>, AppError>;

    /// Oldest first, so the admin queue is worked in submission order.
    async fn list(&self, status: Option<ApprovalStatus>) -> Result<Vec<ApprovalRequest>, AppError>;

    async fn find_by_requester(&self, profile_id: i64) -> Result<Vec<ApprovalRequest>, AppError>;

    async fn has_pending(&self, salon_id: i64, kind: ApprovalKind) -> Result<bool, AppError>;

    async fn create(&self, request: &ApprovalRequest) -> Result<ApprovalRequest, AppError>;

    /// Lock the request, apply the effect and record the decision in one
    /// transaction. `Ok(None)` when the request is no longer PENDING.
    async fn resolve(&self, id: i64, decision: &ApprovalDecision)
        -> Result<Option<ApprovalRequest>, AppError>;

    async fn count_pending(&self) -> Result<i64, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_request_is_pending() {
        let req = ApprovalRequest::new(1, 2, 3, ApprovalKind::NewSalon, serde_json::json!({}));
        assert!(req.is_pending());
        assert!(req.reviewed_at.is_none());
    }

    #[test]
    fn test_kind_roundtrip() {
        for kind in [ApprovalKind::NewSalon, ApprovalKind::SalonUpdate, ApprovalKind::NewService] {
            assert_eq!(ApprovalKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ApprovalStatus::parse("rejected"), Some(ApprovalStatus::Rejected));
    }
}
