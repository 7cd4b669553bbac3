//! Ticket Service
//!
//! Help desk tickets. Clients poll `list_messages` with the last message id
//! they have seen.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::instrument;

use crate::domain::{
    Actor, ProfileRepository, ProfileRole, SupportTicket, TicketMessage, TicketPriority,
    TicketRepository, TicketStatus,
};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

/// Ticket service trait
#[async_trait]
pub trait TicketService: Send + Sync {
    /// Open a ticket with its first message
    async fn create_ticket(&self, actor: &Actor, request: CreateTicketDto)
        -> Result<SupportTicket, TicketError>;

    async fn list_my_tickets(&self, actor: &Actor) -> Result<Vec<SupportTicket>, TicketError>;

    /// Requester or admin
    async fn get_ticket(&self, actor: &Actor, ticket_id: i64) -> Result<SupportTicket, TicketError>;

    async fn post_message(&self, actor: &Actor, ticket_id: i64, body: String)
        -> Result<TicketMessage, TicketError>;

    /// Messages in order, only those after `after_id` when given
    async fn list_messages(
        &self,
        actor: &Actor,
        ticket_id: i64,
        after_id: Option<i64>,
    ) -> Result<Vec<TicketMessage>, TicketError>;

    /// Admin queue
    async fn list_tickets(&self, actor: &Actor, status: Option<TicketStatus>)
        -> Result<Vec<SupportTicket>, TicketError>;

    async fn update_status(&self, actor: &Actor, ticket_id: i64, status: TicketStatus)
        -> Result<SupportTicket, TicketError>;

    /// Assign to an admin, or clear the assignee with `None`
    async fn assign(&self, actor: &Actor, ticket_id: i64, assignee_id: Option<i64>)
        -> Result<SupportTicket, TicketError>;
}

/// New ticket input
#[derive(Debug, Clone)]
pub struct CreateTicketDto {
    pub subject: String,
    pub body: String,
    pub salon_id: Option<i64>,
    pub priority: Option<TicketPriority>,
}

/// Ticket service errors
#[derive(Debug, thiserror::Error)]
pub enum TicketError {
    #[error("Ticket not found")]
    NotFound,

    #[error("Admin access required")]
    AdminOnly,

    #[error("Ticket is {from} and cannot become {to}")]
    InvalidTransition { from: &'static str, to: &'static str },

    #[error("Tickets can only be assigned to admins")]
    InvalidAssignee,

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<TicketError> for AppError {
    fn from(e: TicketError) -> Self {
        match e {
            TicketError::NotFound => AppError::NotFound(e.to_string()),
            TicketError::AdminOnly => AppError::Forbidden(e.to_string()),
            TicketError::InvalidTransition { .. } => AppError::Conflict(e.to_string()),
            TicketError::InvalidAssignee => AppError::BadRequest(e.to_string()),
            TicketError::Store(inner) => inner,
        }
    }
}

/// TicketService implementation
pub struct TicketServiceImpl<T, P>
where
    T: TicketRepository,
    P: ProfileRepository,
{
    ticket_repo: Arc<T>,
    profile_repo: Arc<P>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<T, P> TicketServiceImpl<T, P>
where
    T: TicketRepository,
    P: ProfileRepository,
{
    pub fn new(ticket_repo: Arc<T>, profile_repo: Arc<P>, id_generator: Arc<SnowflakeGenerator>) -> Self {
        Self {
            ticket_repo,
            profile_repo,
            id_generator,
        }
    }

    /// Ticket visible to the caller; others get 404.
    async fn visible(&self, actor: &Actor, ticket_id: i64) -> Result<SupportTicket, TicketError> {
        self.ticket_repo
            .find_by_id(ticket_id)
            .await?
            .filter(|t| actor.is_admin() || t.is_requester(actor.profile_id))
            .ok_or(TicketError::NotFound)
    }

    async fn author_name(&self, actor: &Actor) -> Result<String, TicketError> {
        Ok(self
            .profile_repo
            .find_by_id(actor.profile_id)
            .await?
            .map(|p| p.full_name)
            .unwrap_or_default())
    }

    fn message(&self, ticket_id: i64, actor: &Actor, author_name: String, body: String) -> TicketMessage {
        TicketMessage {
            id: self.id_generator.generate(),
            ticket_id,
            author_id: actor.profile_id,
            author_name,
            body: body.trim().to_string(),
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
impl<T, P> TicketService for TicketServiceImpl<T, P>
where
    T: TicketRepository + 'static,
    P: ProfileRepository + 'static,
{
    #[instrument(skip(self, request), fields(requester_id = actor.profile_id))]
    async fn create_ticket(
        &self,
        actor: &Actor,
        request: CreateTicketDto,
    ) -> Result<SupportTicket, TicketError> {
        let now = Utc::now();
        let ticket = SupportTicket {
            id: self.id_generator.generate(),
            requester_id: actor.profile_id,
            salon_id: request.salon_id,
            assignee_id: None,
            subject: request.subject.trim().to_string(),
            status: TicketStatus::Open,
            priority: request.priority.unwrap_or_default(),
            resolved_at: None,
            created_at: now,
            updated_at: now,
        };
        let author = self.author_name(actor).await?;
        let first = self.message(ticket.id, actor, author, request.body);

        Ok(self.ticket_repo.create(&ticket, &first).await?)
    }

    async fn list_my_tickets(&self, actor: &Actor) -> Result<Vec<SupportTicket>, TicketError> {
        Ok(self.ticket_repo.list(Some(actor.profile_id), None).await?)
    }

    async fn get_ticket(&self, actor: &Actor, ticket_id: i64) -> Result<SupportTicket, TicketError> {
        self.visible(actor, ticket_id).await
    }

    async fn post_message(
        &self,
        actor: &Actor,
        ticket_id: i64,
        body: String,
    ) -> Result<TicketMessage, TicketError> {
        let ticket = self.visible(actor, ticket_id).await?;
        let new_status = ticket.status_after_reply(actor.is_admin());

        let author = self.author_name(actor).await?;
        let message = self.message(ticket.id, actor, author, body);
        let posted = self.ticket_repo.add_message(&message, new_status).await?;

        if let Some(status) = new_status {
            tracing::info!(ticket_id, status = status.as_str(), "Ticket status changed by reply");
        }
        Ok(posted)
    }

    async fn list_messages(
        &self,
        actor: &Actor,
        ticket_id: i64,
        after_id: Option<i64>,
    ) -> Result<Vec<TicketMessage>, TicketError> {
        self.visible(actor, ticket_id).await?;
        Ok(self.ticket_repo.messages(ticket_id, after_id).await?)
    }

    async fn list_tickets(
        &self,
        actor: &Actor,
        status: Option<TicketStatus>,
    ) -> Result<Vec<SupportTicket>, TicketError> {
        if !actor.is_admin() {
            return Err(TicketError::AdminOnly);
        }
        Ok(self.ticket_repo.list(None, status).await?)
    }

    #[instrument(skip(self), fields(admin_id = actor.profile_id))]
    async fn update_status(
        &self,
        actor: &Actor,
        ticket_id: i64,
        status: TicketStatus,
    ) -> Result<SupportTicket, TicketError> {
        if !actor.is_admin() {
            return Err(TicketError::AdminOnly);
        }
        let ticket = self.visible(actor, ticket_id).await?;
        if !ticket.status.can_transition_to(status) {
            return Err(TicketError::InvalidTransition {
                from: ticket.status.as_str(),
                to: status.as_str(),
            });
        }
        Ok(self.ticket_repo.set_status(ticket_id, status).await?)
    }

    async fn assign(
        &self,
        actor: &Actor,
        ticket_id: i64,
        assignee_id: Option<i64>,
    ) -> Result<SupportTicket, TicketError> {
        if !actor.is_admin() {
            return Err(TicketError::AdminOnly);
        }
        self.visible(actor, ticket_id).await?;

        if let Some(assignee_id) = assignee_id {
            let assignee = self.profile_repo.find_by_id(assignee_id).await?;
            if !assignee.is_some_and(|p| p.role == ProfileRole::Admin) {
                return Err(TicketError::InvalidAssignee);
            }
        }
        Ok(self.ticket_repo.assign(ticket_id, assignee_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MockProfileRepository, MockTicketRepository, Profile};
    use mockall::predicate::eq;

    const REQUESTER: i64 = 4;

    fn ticket(status: TicketStatus) -> SupportTicket {
        let now = Utc::now();
        SupportTicket {
            id: 1,
            requester_id: REQUESTER,
            salon_id: None,
            assignee_id: None,
            subject: "Double charge".into(),
            status,
            priority: TicketPriority::High,
            resolved_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn profile(id: i64, role: ProfileRole) -> Profile {
        let now = Utc::now();
        Profile {
            id,
            email: format!("p{id}@example.com"),
            password_hash: String::new(),
            full_name: format!("Person {id}"),
            phone: None,
            avatar_url: None,
            role,
            created_at: now,
            updated_at: now,
        }
    }

    fn profiles() -> MockProfileRepository {
        let mut profiles = MockProfileRepository::new();
        profiles
            .expect_find_by_id()
            .returning(|id| Ok(Some(profile(id, if id == 1 { ProfileRole::Admin } else { ProfileRole::Customer }))));
        profiles
    }

    fn service(tickets: MockTicketRepository) -> TicketServiceImpl<MockTicketRepository, MockProfileRepository> {
        TicketServiceImpl::new(
            Arc::new(tickets),
            Arc::new(profiles()),
            Arc::new(SnowflakeGenerator::new(1, 1)),
        )
    }

    #[tokio::test]
    async fn test_requester_reply_reopens_resolved_ticket() {
        let mut tickets = MockTicketRepository::new();
        tickets
            .expect_find_by_id()
            .returning(|_| Ok(Some(ticket(TicketStatus::Resolved))));
        tickets
            .expect_add_message()
            .withf(|m, status| m.body == "Still broken" && *status == Some(TicketStatus::Open))
            .returning(|m, _| Ok(m.clone()));

        let actor = Actor::new(REQUESTER, ProfileRole::Customer);
        let message = service(tickets)
            .post_message(&actor, 1, " Still broken ".into())
            .await
            .unwrap();
        assert_eq!(message.author_name, "Person 4");
    }

    #[tokio::test]
    async fn test_admin_reply_moves_open_to_in_progress() {
        let mut tickets = MockTicketRepository::new();
        tickets
            .expect_find_by_id()
            .returning(|_| Ok(Some(ticket(TicketStatus::Open))));
        tickets
            .expect_add_message()
            .withf(|_, status| *status == Some(TicketStatus::InProgress))
            .returning(|m, _| Ok(m.clone()));

        let admin = Actor::new(1, ProfileRole::Admin);
        assert!(service(tickets).post_message(&admin, 1, "Looking".into()).await.is_ok());
    }

    #[tokio::test]
    async fn test_other_users_cannot_see_ticket() {
        let mut tickets = MockTicketRepository::new();
        tickets
            .expect_find_by_id()
            .returning(|_| Ok(Some(ticket(TicketStatus::Open))));

        let other = Actor::new(77, ProfileRole::SalonOwner);
        let err = service(tickets).get_ticket(&other, 1).await.unwrap_err();
        assert!(matches!(err, TicketError::NotFound));
    }

    #[tokio::test]
    async fn test_polling_passes_cursor() {
        let mut tickets = MockTicketRepository::new();
        tickets
            .expect_find_by_id()
            .returning(|_| Ok(Some(ticket(TicketStatus::Open))));
        tickets
            .expect_messages()
            .with(eq(1), eq(Some(500)))
            .returning(|_, _| Ok(vec![]));

        let actor = Actor::new(REQUESTER, ProfileRole::Customer);
        let messages = service(tickets).list_messages(&actor, 1, Some(500)).await.unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_status_transition() {
        let mut tickets = MockTicketRepository::new();
        tickets
            .expect_find_by_id()
            .returning(|_| Ok(Some(ticket(TicketStatus::Resolved))));
        tickets.expect_set_status().never();

        let admin = Actor::new(1, ProfileRole::Admin);
        let err = service(tickets)
            .update_status(&admin, 1, TicketStatus::InProgress)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Ticket is RESOLVED and cannot become IN_PROGRESS");
    }

    #[tokio::test]
    async fn test_assign_only_to_admins() {
        let mut tickets = MockTicketRepository::new();
        tickets
            .expect_find_by_id()
            .returning(|_| Ok(Some(ticket(TicketStatus::Open))));

        let admin = Actor::new(1, ProfileRole::Admin);
        let err = service(tickets).assign(&admin, 1, Some(REQUESTER)).await.unwrap_err();
        assert!(matches!(err, TicketError::InvalidAssignee));
    }

    #[tokio::test]
    async fn test_admin_queue_is_admin_only() {
        let actor = Actor::new(REQUESTER, ProfileRole::Customer);
        let err = service(MockTicketRepository::new())
            .list_tickets(&actor, None)
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::AdminOnly));
    }
}
