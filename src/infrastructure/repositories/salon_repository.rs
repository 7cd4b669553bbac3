//! Salon Repository Implementation
//!
//! PostgreSQL implementation of the SalonRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::domain::{
    ApprovalRequest, ProfileRole, Salon, SalonFilter, SalonRepository, SalonStatus,
};
use crate::shared::error::AppError;

/// Database row representation of the salons table.
#[derive(Debug, sqlx::FromRow)]
pub(super) struct SalonRow {
    id: i64,
    owner_id: i64,
    name: String,
    description: Option<String>,
    address: String,
    city: String,
    phone: Option<String>,
    image_url: Option<String>,
    status: String,
    opening_time: NaiveTime,
    closing_time: NaiveTime,
    utc_offset_minutes: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SalonRow {
    pub(super) fn into_salon(self) -> Salon {
        Salon {
            id: self.id,
            owner_id: self.owner_id,
            name: self.name,
            description: self.description,
            address: self.address,
            city: self.city,
            phone: self.phone,
            image_url: self.image_url,
            status: SalonStatus::parse(&self.status).unwrap_or_default(),
            opening_time: self.opening_time,
            closing_time: self.closing_time,
            utc_offset_minutes: self.utc_offset_minutes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

pub(super) const SALON_COLUMNS: &str = "id, owner_id, name, description, address, city, phone, \
     image_url, status, opening_time, closing_time, utc_offset_minutes, created_at, updated_at";

/// Status update shared with approval review, which runs it inside its own transaction.
pub(super) async fn update_status(
    conn: &mut PgConnection,
    id: i64,
    status: SalonStatus,
) -> Result<Salon, AppError> {
    let row = sqlx::query_as::<_, SalonRow>(&format!(
        "UPDATE salons SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {SALON_COLUMNS}"
    ))
    .bind(id)
    .bind(status.as_str())
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Salon {} not found", id)))?;

    Ok(row.into_salon())
}

/// PostgreSQL salon repository implementation.
#[derive(Clone)]
pub struct PgSalonRepository {
    pool: PgPool,
}

impl PgSalonRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SalonRepository for PgSalonRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Salon>, AppError> {
        let row = sqlx::query_as::<_, SalonRow>(&format!(
            "SELECT {SALON_COLUMNS} FROM salons WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SalonRow::into_salon))
    }

    async fn find_by_owner(&self, owner_id: i64) -> Result<Vec<Salon>, AppError> {
        let rows = sqlx::query_as::<_, SalonRow>(&format!(
            "SELECT {SALON_COLUMNS} FROM salons WHERE owner_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SalonRow::into_salon).collect())
    }

    async fn list(&self, filter: &SalonFilter) -> Result<Vec<Salon>, AppError> {
        let search = filter
            .search
            .as_ref()
            .map(|s| format!("%{}%", s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")));

        let rows = sqlx::query_as::<_, SalonRow>(&format!(
            r#"
            SELECT {SALON_COLUMNS} FROM salons
            WHERE ($1::varchar IS NULL OR status = $1)
              AND ($2::varchar IS NULL OR lower(city) = lower($2))
              AND ($3::varchar IS NULL OR name ILIKE $3 OR description ILIKE $3)
            ORDER BY name ASC, id ASC
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(&filter.city)
        .bind(search)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SalonRow::into_salon).collect())
    }

    async fn create_with_request(
        &self,
        salon: &Salon,
        request: &ApprovalRequest,
    ) -> Result<Salon, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, SalonRow>(&format!(
            r#"
            INSERT INTO salons (
                id, owner_id, name, description, address, city, phone, image_url,
                status, opening_time, closing_time, utc_offset_minutes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {SALON_COLUMNS}
            "#
        ))
        .bind(salon.id)
        .bind(salon.owner_id)
        .bind(&salon.name)
        .bind(&salon.description)
        .bind(&salon.address)
        .bind(&salon.city)
        .bind(&salon.phone)
        .bind(&salon.image_url)
        .bind(salon.status.as_str())
        .bind(salon.opening_time)
        .bind(salon.closing_time)
        .bind(salon.utc_offset_minutes)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO approval_requests (id, salon_id, requested_by, kind, payload, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(request.id)
        .bind(request.salon_id)
        .bind(request.requested_by)
        .bind(request.kind.as_str())
        .bind(&request.payload)
        .bind(request.status.as_str())
        .execute(&mut *tx)
        .await?;

        // Customers become owners with their first salon
        sqlx::query("UPDATE profiles SET role = $2, updated_at = NOW() WHERE id = $1 AND role = $3")
            .bind(salon.owner_id)
            .bind(ProfileRole::SalonOwner.as_str())
            .bind(ProfileRole::Customer.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row.into_salon())
    }

    async fn set_status(&self, id: i64, status: SalonStatus) -> Result<Salon, AppError> {
        let mut conn = self.pool.acquire().await?;
        update_status(&mut conn, id, status).await
    }

    async fn count_by_status(&self) -> Result<Vec<(SalonStatus, i64)>, AppError> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM salons GROUP BY status ORDER BY status")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(status, count)| SalonStatus::parse(&status).map(|s| (s, count)))
            .collect())
    }
}
