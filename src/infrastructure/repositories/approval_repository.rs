//! Approval Repository Implementation
//!
//! Review decisions are recorded and applied in one transaction: the request
//! row is locked, re-checked for PENDING, the effect is written, then the
//! decision is stamped.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::domain::{
    ApprovalDecision, ApprovalEffect, ApprovalKind, ApprovalRepository, ApprovalRequest,
    ApprovalStatus, SalonChanges, SalonStatus,
};
use crate::shared::error::AppError;

use super::salon_repository::{self, SalonRow, SALON_COLUMNS};
use super::service_repository::insert_global_service;
use super::unique_violation;

#[derive(Debug, sqlx::FromRow)]
struct ApprovalRow {
    id: i64,
    salon_id: i64,
    requested_by: i64,
    kind: String,
    payload: serde_json::Value,
    status: String,
    reviewer_id: Option<i64>,
    review_note: Option<String>,
    reviewed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl ApprovalRow {
    fn into_request(self) -> Result<ApprovalRequest, AppError> {
        let kind = ApprovalKind::parse(&self.kind)
            .ok_or_else(|| AppError::Internal(format!("unknown approval kind {}", self.kind)))?;
        Ok(ApprovalRequest {
            id: self.id,
            salon_id: self.salon_id,
            requested_by: self.requested_by,
            kind,
            payload: self.payload,
            status: ApprovalStatus::parse(&self.status).unwrap_or_default(),
            reviewer_id: self.reviewer_id,
            review_note: self.review_note,
            reviewed_at: self.reviewed_at,
            created_at: self.created_at,
        })
    }
}

fn into_requests(rows: Vec<ApprovalRow>) -> Result<Vec<ApprovalRequest>, AppError> {
    rows.into_iter().map(ApprovalRow::into_request).collect()
}

const COLUMNS: &str = "id, salon_id, requested_by, kind, payload, status, reviewer_id, \
     review_note, reviewed_at, created_at";

/// Write an approved SALON_UPDATE onto the salon row.
async fn update_salon(conn: &mut PgConnection, salon_id: i64, changes: &SalonChanges) -> Result<(), AppError> {
    let mut salon = sqlx::query_as::<_, SalonRow>(&format!(
        "SELECT {SALON_COLUMNS} FROM salons WHERE id = $1 FOR UPDATE"
    ))
    .bind(salon_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Salon {} not found", salon_id)))?
    .into_salon();

    salon.apply(changes);
    if salon.opening_time >= salon.closing_time {
        return Err(AppError::Conflict(
            "Approving this update would leave the salon with empty opening hours".into(),
        ));
    }

    sqlx::query(
        r#"
        UPDATE salons
        SET name = $2, description = $3, address = $4, city = $5, phone = $6,
            image_url = $7, opening_time = $8, closing_time = $9,
            utc_offset_minutes = $10, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(salon.id)
    .bind(&salon.name)
    .bind(&salon.description)
    .bind(&salon.address)
    .bind(&salon.city)
    .bind(&salon.phone)
    .bind(&salon.image_url)
    .bind(salon.opening_time)
    .bind(salon.closing_time)
    .bind(salon.utc_offset_minutes)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// PostgreSQL approval repository implementation.
#[derive(Clone)]
pub struct PgApprovalRepository {
    pool: PgPool,
}

impl PgApprovalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApprovalRepository for PgApprovalRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<ApprovalRequest>, AppError> {
        let row = sqlx::query_as::<_, ApprovalRow>(&format!(
            "SELECT {COLUMNS} FROM approval_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ApprovalRow::into_request).transpose()
    }

    async fn list(&self, status: Option<ApprovalStatus>) -> Result<Vec<ApprovalRequest>, AppError> {
        let rows = sqlx::query_as::<_, ApprovalRow>(&format!(
            r#"
            SELECT {COLUMNS} FROM approval_requests
            WHERE ($1::varchar IS NULL OR status = $1)
            ORDER BY created_at ASC, id ASC
            LIMIT 500
            "#
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        into_requests(rows)
    }

    async fn find_by_requester(&self, profile_id: i64) -> Result<Vec<ApprovalRequest>, AppError> {
        let rows = sqlx::query_as::<_, ApprovalRow>(&format!(
            "SELECT {COLUMNS} FROM approval_requests WHERE requested_by = $1 ORDER BY created_at DESC"
        ))
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?;

        into_requests(rows)
    }

    async fn has_pending(&self, salon_id: i64, kind: ApprovalKind) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM approval_requests
                WHERE salon_id = $1 AND kind = $2 AND status = 'PENDING'
            )
            "#,
        )
        .bind(salon_id)
        .bind(kind.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create(&self, request: &ApprovalRequest) -> Result<ApprovalRequest, AppError> {
        let row = sqlx::query_as::<_, ApprovalRow>(&format!(
            r#"
            INSERT INTO approval_requests (id, salon_id, requested_by, kind, payload, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(request.id)
        .bind(request.salon_id)
        .bind(request.requested_by)
        .bind(request.kind.as_str())
        .bind(&request.payload)
        .bind(request.status.as_str())
        .fetch_one(&self.pool)
        .await
        // Partial unique index: one pending SALON_UPDATE per salon
        .map_err(unique_violation("An update for this salon is already awaiting review"))?;

        row.into_request()
    }

    async fn resolve(
        &self,
        id: i64,
        decision: &ApprovalDecision,
    ) -> Result<Option<ApprovalRequest>, AppError> {
        let mut tx = self.pool.begin().await?;

        let current: String =
            sqlx::query_scalar("SELECT status FROM approval_requests WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Approval request {} not found", id)))?;

        if ApprovalStatus::parse(&current) != Some(ApprovalStatus::Pending) {
            return Ok(None);
        }

        match &decision.effect {
            ApprovalEffect::ListSalon { salon_id } => {
                salon_repository::update_status(&mut tx, *salon_id, SalonStatus::Approved).await?;
            }
            ApprovalEffect::RejectSalon { salon_id } => {
                salon_repository::update_status(&mut tx, *salon_id, SalonStatus::Rejected).await?;
            }
            ApprovalEffect::UpdateSalon { salon_id, changes } => {
                update_salon(&mut tx, *salon_id, changes).await?;
            }
            ApprovalEffect::AddGlobalService(service) => {
                insert_global_service(&mut tx, service).await?;
            }
            ApprovalEffect::None => {}
        }

        let row = sqlx::query_as::<_, ApprovalRow>(&format!(
            r#"
            UPDATE approval_requests
            SET status = $2, reviewer_id = $3, review_note = $4, reviewed_at = NOW()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(decision.status.as_str())
        .bind(decision.reviewer_id)
        .bind(&decision.note)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.into_request().map(Some)
    }

    async fn count_pending(&self) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM approval_requests WHERE status = 'PENDING'")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
