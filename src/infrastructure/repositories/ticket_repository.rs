//! Ticket Repository Implementation
//!
//! Support tickets and their message threads. Message ids are snowflakes, so
//! ordering by id is creation order and `after_id` gives cheap polling.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::domain::{
    SupportTicket, TicketMessage, TicketPriority, TicketRepository, TicketStatus,
};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct TicketRow {
    id: i64,
    requester_id: i64,
    salon_id: Option<i64>,
    assignee_id: Option<i64>,
    subject: String,
    status: String,
    priority: String,
    resolved_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TicketRow {
    fn into_ticket(self) -> SupportTicket {
        SupportTicket {
            id: self.id,
            requester_id: self.requester_id,
            salon_id: self.salon_id,
            assignee_id: self.assignee_id,
            subject: self.subject,
            status: TicketStatus::parse(&self.status).unwrap_or_default(),
            priority: TicketPriority::parse(&self.priority).unwrap_or_default(),
            resolved_at: self.resolved_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: i64,
    ticket_id: i64,
    author_id: i64,
    author_name: String,
    body: String,
    created_at: DateTime<Utc>,
}

impl MessageRow {
    fn into_message(self) -> TicketMessage {
        TicketMessage {
            id: self.id,
            ticket_id: self.ticket_id,
            author_id: self.author_id,
            author_name: self.author_name,
            body: self.body,
            created_at: self.created_at,
        }
    }
}

const COLUMNS: &str = "id, requester_id, salon_id, assignee_id, subject, status, priority, \
     resolved_at, created_at, updated_at";

async fn insert_message(conn: &mut PgConnection, message: &TicketMessage) -> Result<TicketMessage, AppError> {
    sqlx::query("INSERT INTO ticket_messages (id, ticket_id, author_id, body) VALUES ($1, $2, $3, $4)")
        .bind(message.id)
        .bind(message.ticket_id)
        .bind(message.author_id)
        .bind(&message.body)
        .execute(&mut *conn)
        .await?;

    sqlx::query("UPDATE support_tickets SET updated_at = NOW() WHERE id = $1")
        .bind(message.ticket_id)
        .execute(&mut *conn)
        .await?;

    Ok(message.clone())
}

/// Keeps message ids increasing within a ticket, so an `after` cursor never
/// skips a message that committed late or came from a node with a lagging clock.
fn next_message_id(candidate: i64, last_id: Option<i64>) -> i64 {
    match last_id {
        Some(last) if candidate <= last => last + 1,
        _ => candidate,
    }
}

async fn update_status(conn: &mut PgConnection, id: i64, status: TicketStatus) -> Result<SupportTicket, AppError> {
    let row = sqlx::query_as::<_, TicketRow>(&format!(
        r#"
        UPDATE support_tickets
        SET status = $2,
            resolved_at = CASE WHEN $2 = 'RESOLVED' THEN NOW() ELSE NULL END,
            updated_at = NOW()
        WHERE id = $1
        RETURNING {COLUMNS}
        "#
    ))
    .bind(id)
    .bind(status.as_str())
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Ticket {} not found", id)))?;

    Ok(row.into_ticket())
}

/// PostgreSQL ticket repository implementation.
#[derive(Clone)]
pub struct PgTicketRepository {
    pool: PgPool,
}

impl PgTicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketRepository for PgTicketRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<SupportTicket>, AppError> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            "SELECT {COLUMNS} FROM support_tickets WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(TicketRow::into_ticket))
    }

    async fn list(
        &self,
        requester_id: Option<i64>,
        status: Option<TicketStatus>,
    ) -> Result<Vec<SupportTicket>, AppError> {
        let rows = sqlx::query_as::<_, TicketRow>(&format!(
            r#"
            SELECT {COLUMNS} FROM support_tickets
            WHERE ($1::bigint IS NULL OR requester_id = $1)
              AND ($2::varchar IS NULL OR status = $2)
            ORDER BY updated_at DESC, id DESC
            LIMIT 500
            "#
        ))
        .bind(requester_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TicketRow::into_ticket).collect())
    }

    async fn create(&self, ticket: &SupportTicket, first: &TicketMessage) -> Result<SupportTicket, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, TicketRow>(&format!(
            r#"
            INSERT INTO support_tickets (id, requester_id, salon_id, assignee_id, subject, status, priority)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(ticket.id)
        .bind(ticket.requester_id)
        .bind(ticket.salon_id)
        .bind(ticket.assignee_id)
        .bind(&ticket.subject)
        .bind(ticket.status.as_str())
        .bind(ticket.priority.as_str())
        .fetch_one(&mut *tx)
        .await?;

        insert_message(&mut tx, first).await?;

        tx.commit().await?;
        Ok(row.into_ticket())
    }

    async fn add_message(
        &self,
        message: &TicketMessage,
        new_status: Option<TicketStatus>,
    ) -> Result<TicketMessage, AppError> {
        let mut tx = self.pool.begin().await?;

        // Serialize writers per ticket so commit order follows id order
        sqlx::query("SELECT id FROM support_tickets WHERE id = $1 FOR UPDATE")
            .bind(message.ticket_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ticket {} not found", message.ticket_id)))?;

        let last_id: Option<i64> =
            sqlx::query_scalar("SELECT MAX(id) FROM ticket_messages WHERE ticket_id = $1")
                .bind(message.ticket_id)
                .fetch_one(&mut *tx)
                .await?;

        let ordered = TicketMessage {
            id: next_message_id(message.id, last_id),
            ..message.clone()
        };
        let saved = insert_message(&mut tx, &ordered).await?;
        if let Some(status) = new_status {
            update_status(&mut tx, message.ticket_id, status).await?;
        }

        tx.commit().await?;
        Ok(saved)
    }

    async fn messages(&self, ticket_id: i64, after_id: Option<i64>) -> Result<Vec<TicketMessage>, AppError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT m.id, m.ticket_id, m.author_id, p.full_name AS author_name, m.body, m.created_at
            FROM ticket_messages m
            JOIN profiles p ON p.id = m.author_id
            WHERE m.ticket_id = $1 AND ($2::bigint IS NULL OR m.id > $2)
            ORDER BY m.id ASC
            "#,
        )
        .bind(ticket_id)
        .bind(after_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(MessageRow::into_message).collect())
    }

    async fn set_status(&self, id: i64, status: TicketStatus) -> Result<SupportTicket, AppError> {
        let mut conn = self.pool.acquire().await?;
        update_status(&mut conn, id, status).await
    }

    async fn assign(&self, id: i64, assignee_id: Option<i64>) -> Result<SupportTicket, AppError> {
        let row = sqlx::query_as::<_, TicketRow>(&format!(
            "UPDATE support_tickets SET assignee_id = $2, updated_at = NOW() WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(assignee_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Ticket {} not found", id)))?;

        Ok(row.into_ticket())
    }

    async fn count_by_status(&self, status: TicketStatus) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM support_tickets WHERE status = $1")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_kept_when_newer() {
        assert_eq!(next_message_id(101, Some(100)), 101);
        assert_eq!(next_message_id(7, None), 7);
    }

    #[test]
    fn test_stale_message_id_moves_past_last() {
        // Generated before a concurrent post that committed first
        assert_eq!(next_message_id(100, Some(101)), 102);
        assert_eq!(next_message_id(101, Some(101)), 102);
    }
}
