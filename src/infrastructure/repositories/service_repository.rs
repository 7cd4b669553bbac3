//! Service Repository Implementations
//!
//! The platform catalog (`global_services`) and each salon's menu
//! (`salon_services`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::domain::{
    GlobalService, GlobalServiceChanges, GlobalServiceRepository, SalonService,
    SalonServiceChanges, SalonServiceRepository,
};
use crate::shared::error::AppError;

use super::unique_violation;

#[derive(Debug, sqlx::FromRow)]
struct GlobalServiceRow {
    id: i64,
    name: String,
    category: String,
    description: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GlobalServiceRow {
    fn into_service(self) -> GlobalService {
        GlobalService {
            id: self.id,
            name: self.name,
            category: self.category,
            description: self.description,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const GLOBAL_COLUMNS: &str = "id, name, category, description, is_active, created_at, updated_at";

/// Insert shared with approval review, which runs it inside its own transaction.
pub(super) async fn insert_global_service(
    conn: &mut PgConnection,
    service: &GlobalService,
) -> Result<GlobalService, AppError> {
    let row = sqlx::query_as::<_, GlobalServiceRow>(&format!(
        r#"
        INSERT INTO global_services (id, name, category, description, is_active)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {GLOBAL_COLUMNS}
        "#
    ))
    .bind(service.id)
    .bind(&service.name)
    .bind(&service.category)
    .bind(&service.description)
    .bind(service.is_active)
    .fetch_one(conn)
    .await
    .map_err(unique_violation("A service with this name already exists in the category"))?;

    Ok(row.into_service())
}

/// PostgreSQL catalog repository implementation.
#[derive(Clone)]
pub struct PgGlobalServiceRepository {
    pool: PgPool,
}

impl PgGlobalServiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GlobalServiceRepository for PgGlobalServiceRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<GlobalService>, AppError> {
        let row = sqlx::query_as::<_, GlobalServiceRow>(&format!(
            "SELECT {GLOBAL_COLUMNS} FROM global_services WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(GlobalServiceRow::into_service))
    }

    async fn list_active(&self, category: Option<String>) -> Result<Vec<GlobalService>, AppError> {
        let rows = sqlx::query_as::<_, GlobalServiceRow>(&format!(
            r#"
            SELECT {GLOBAL_COLUMNS} FROM global_services
            WHERE is_active AND ($1::varchar IS NULL OR lower(category) = lower($1))
            ORDER BY category ASC, name ASC
            "#
        ))
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(GlobalServiceRow::into_service).collect())
    }

    async fn create(&self, service: &GlobalService) -> Result<GlobalService, AppError> {
        let mut conn = self.pool.acquire().await?;
        insert_global_service(&mut conn, service).await
    }

    async fn update(&self, id: i64, changes: &GlobalServiceChanges) -> Result<GlobalService, AppError> {
        let row = sqlx::query_as::<_, GlobalServiceRow>(&format!(
            r#"
            UPDATE global_services
            SET name = COALESCE($2, name),
                category = COALESCE($3, category),
                description = COALESCE($4, description),
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {GLOBAL_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.category)
        .bind(&changes.description)
        .bind(changes.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(unique_violation("A service with this name already exists in the category"))?
        .ok_or_else(|| AppError::NotFound(format!("Service {} not found", id)))?;

        Ok(row.into_service())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SalonServiceRow {
    id: i64,
    salon_id: i64,
    global_service_id: Option<i64>,
    name: String,
    category: String,
    price_cents: i64,
    duration_minutes: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SalonServiceRow {
    fn into_service(self) -> SalonService {
        SalonService {
            id: self.id,
            salon_id: self.salon_id,
            global_service_id: self.global_service_id,
            name: self.name,
            category: self.category,
            price_cents: self.price_cents,
            duration_minutes: self.duration_minutes,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const SALON_COLUMNS: &str = "id, salon_id, global_service_id, name, category, price_cents, \
     duration_minutes, is_active, created_at, updated_at";

/// PostgreSQL salon service repository implementation.
#[derive(Clone)]
pub struct PgSalonServiceRepository {
    pool: PgPool,
}

impl PgSalonServiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SalonServiceRepository for PgSalonServiceRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<SalonService>, AppError> {
        let row = sqlx::query_as::<_, SalonServiceRow>(&format!(
            "SELECT {SALON_COLUMNS} FROM salon_services WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SalonServiceRow::into_service))
    }

    async fn find_by_salon(&self, salon_id: i64, include_inactive: bool) -> Result<Vec<SalonService>, AppError> {
        let rows = sqlx::query_as::<_, SalonServiceRow>(&format!(
            r#"
            SELECT {SALON_COLUMNS} FROM salon_services
            WHERE salon_id = $1 AND ($2 OR is_active)
            ORDER BY category ASC, name ASC
            "#
        ))
        .bind(salon_id)
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SalonServiceRow::into_service).collect())
    }

    async fn create(&self, service: &SalonService) -> Result<SalonService, AppError> {
        let row = sqlx::query_as::<_, SalonServiceRow>(&format!(
            r#"
            INSERT INTO salon_services (
                id, salon_id, global_service_id, name, category,
                price_cents, duration_minutes, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {SALON_COLUMNS}
            "#
        ))
        .bind(service.id)
        .bind(service.salon_id)
        .bind(service.global_service_id)
        .bind(&service.name)
        .bind(&service.category)
        .bind(service.price_cents)
        .bind(service.duration_minutes)
        .bind(service.is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_service())
    }

    async fn update(&self, id: i64, changes: &SalonServiceChanges) -> Result<SalonService, AppError> {
        let row = sqlx::query_as::<_, SalonServiceRow>(&format!(
            r#"
            UPDATE salon_services
            SET name = COALESCE($2, name),
                category = COALESCE($3, category),
                price_cents = COALESCE($4, price_cents),
                duration_minutes = COALESCE($5, duration_minutes),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {SALON_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.category)
        .bind(changes.price_cents)
        .bind(changes.duration_minutes)
        .bind(changes.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Service {} not found", id)))?;

        Ok(row.into_service())
    }
}
