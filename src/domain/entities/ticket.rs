//! Support ticket entities and repository trait.
//!
//! Maps to the `support_tickets` and `ticket_messages` tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
}

impl TicketStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "OPEN" => Some(Self::Open),
            "IN_PROGRESS" => Some(Self::InProgress),
            "RESOLVED" => Some(Self::Resolved),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::InProgress => "IN_PROGRESS",
            Self::Resolved => "RESOLVED",
        }
    }

    pub fn can_transition_to(&self, next: TicketStatus) -> bool {
        use TicketStatus::*;
        matches!(
            (self, next),
            (Open, InProgress) | (Open, Resolved) | (InProgress, Resolved) | (Resolved, Open)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketPriority {
    Low,
    #[default]
    Normal,
    High,
}

impl TicketPriority {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "LOW" => Some(Self::Low),
            "NORMAL" => Some(Self::Normal),
            "HIGH" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Normal => "NORMAL",
            Self::High => "HIGH",
        }
    }
}

/// Maps to the `support_tickets` table:
/// - id: BIGINT PRIMARY KEY
/// - requester_id: BIGINT NOT NULL REFERENCES profiles(id)
/// - salon_id: BIGINT NULL REFERENCES salons(id) ON DELETE SET NULL
/// - assignee_id: BIGINT NULL REFERENCES profiles(id)
/// - subject: VARCHAR(200) NOT NULL
/// - status / priority: VARCHAR(20) NOT NULL
/// - resolved_at: TIMESTAMPTZ NULL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportTicket {
    pub id: i64,
    pub requester_id: i64,
    pub salon_id: Option<i64>,
    pub assignee_id: Option<i64>,
    pub subject: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SupportTicket {
    pub fn is_requester(&self, profile_id: i64) -> bool {
        self.requester_id == profile_id
    }

    /// Status implied by a new message: a requester reply reopens a
    /// resolved ticket, an admin reply picks up an open one.
    pub fn status_after_reply(&self, from_admin: bool) -> Option<TicketStatus> {
        match (self.status, from_admin) {
            (TicketStatus::Resolved, false) => Some(TicketStatus::Open),
            (TicketStatus::Open, true) => Some(TicketStatus::InProgress),
            _ => None,
        }
    }
}

/// Maps to the `ticket_messages` table:
/// - id: BIGINT PRIMARY KEY (snowflake, so id order is creation order)
/// - ticket_id: BIGINT NOT NULL REFERENCES support_tickets(id) ON DELETE CASCADE
/// - author_id: BIGINT NOT NULL REFERENCES profiles(id)
/// - body: TEXT NOT NULL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketMessage {
    pub id: i64,
    pub ticket_id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Repository trait for support tickets and their messages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TicketRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<SupportTicket>, AppError>;

    /// Newest first; `requester_id` narrows to one user's tickets.
    async fn list(
        &self,
        requester_id: Option<i64>,
        status: Option<TicketStatus>,
    ) -> Result<Vec<SupportTicket>, AppError>;

    /// Insert the ticket and its first message together.
    async fn create(&self, ticket: &SupportTicket, first: &TicketMessage)
        -> Result<SupportTicket, AppError>;

    /// Append a message, optionally moving the ticket to a new status.
    async fn add_message(
        &self,
        message: &TicketMessage,
        new_status: Option<TicketStatus>,
    ) -> Result<TicketMessage, AppError>;

    /// Messages in creation order, strictly after `after_id` when given.
    async fn messages(&self, ticket_id: i64, after_id: Option<i64>)
        -> Result<Vec<TicketMessage>, AppError>;

    async fn set_status(&self, id: i64, status: TicketStatus) -> Result<SupportTicket, AppError>;

    async fn assign(&self, id: i64, assignee_id: Option<i64>) -> Result<SupportTicket, AppError>;

    async fn count_by_status(&self, status: TicketStatus) -> Result<i64, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;
    use TicketStatus::*;

    fn ticket(status: TicketStatus) -> SupportTicket {
        let now = Utc::now();
        SupportTicket {
            id: 1,
            requester_id: 2,
            salon_id: None,
            assignee_id: None,
            subject: "Refund".into(),
            status,
            priority: TicketPriority::Normal,
            resolved_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test_case(Open, InProgress, true)]
    #[test_case(Open, Resolved, true)]
    #[test_case(InProgress, Resolved, true)]
    #[test_case(Resolved, Open, true; "reopen")]
    #[test_case(Resolved, InProgress, false)]
    #[test_case(Open, Open, false)]
    fn test_transitions(from: TicketStatus, to: TicketStatus, allowed: bool) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test_case(Resolved, false, Some(Open); "requester reopens")]
    #[test_case(Open, true, Some(InProgress); "admin picks up")]
    #[test_case(Open, false, None)]
    #[test_case(InProgress, true, None)]
    #[test_case(Resolved, true, None)]
    fn test_status_after_reply(status: TicketStatus, admin: bool, expected: Option<TicketStatus>) {
        assert_eq!(ticket(status).status_after_reply(admin), expected);
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(serde_json::to_string(&InProgress).unwrap(), "\"IN_PROGRESS\"");
        assert_eq!(TicketStatus::parse("in_progress"), Some(InProgress));
        assert_eq!(TicketPriority::parse("high"), Some(TicketPriority::High));
    }
}
