//! Staff Repository Implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::domain::{Deactivation, Staff, StaffChanges, StaffRepository};
use crate::shared::error::AppError;

use super::unique_violation;

#[derive(Debug, sqlx::FromRow)]
struct StaffRow {
    id: i64,
    salon_id: i64,
    profile_id: Option<i64>,
    display_name: String,
    title: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StaffRow {
    fn into_staff(self) -> Staff {
        Staff {
            id: self.id,
            salon_id: self.salon_id,
            profile_id: self.profile_id,
            display_name: self.display_name,
            title: self.title,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const COLUMNS: &str =
    "id, salon_id, profile_id, display_name, title, is_active, created_at, updated_at";

/// Insert shared with invite acceptance, which runs it inside its own transaction.
pub(super) async fn insert_staff(conn: &mut PgConnection, staff: &Staff) -> Result<Staff, AppError> {
    let row = sqlx::query_as::<_, StaffRow>(&format!(
        r#"
        INSERT INTO staff (id, salon_id, profile_id, display_name, title, is_active)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(staff.id)
    .bind(staff.salon_id)
    .bind(staff.profile_id)
    .bind(&staff.display_name)
    .bind(&staff.title)
    .bind(staff.is_active)
    .fetch_one(conn)
    .await
    .map_err(unique_violation("Already a staff member of this salon"))?;

    Ok(row.into_staff())
}

/// PostgreSQL staff repository implementation.
#[derive(Clone)]
pub struct PgStaffRepository {
    pool: PgPool,
}

impl PgStaffRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StaffRepository for PgStaffRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Staff>, AppError> {
        let row = sqlx::query_as::<_, StaffRow>(&format!("SELECT {COLUMNS} FROM staff WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(StaffRow::into_staff))
    }

    async fn find_by_salon(&self, salon_id: i64, include_inactive: bool) -> Result<Vec<Staff>, AppError> {
        let rows = sqlx::query_as::<_, StaffRow>(&format!(
            r#"
            SELECT {COLUMNS} FROM staff
            WHERE salon_id = $1 AND ($2 OR is_active)
            ORDER BY display_name ASC, id ASC
            "#
        ))
        .bind(salon_id)
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(StaffRow::into_staff).collect())
    }

    async fn find_by_profile(&self, profile_id: i64) -> Result<Vec<Staff>, AppError> {
        let rows = sqlx::query_as::<_, StaffRow>(&format!(
            "SELECT {COLUMNS} FROM staff WHERE profile_id = $1 ORDER BY created_at ASC"
        ))
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(StaffRow::into_staff).collect())
    }

    async fn create(&self, staff: &Staff) -> Result<Staff, AppError> {
        let mut conn = self.pool.acquire().await?;
        insert_staff(&mut conn, staff).await
    }

    async fn update(&self, id: i64, changes: &StaffChanges) -> Result<Staff, AppError> {
        let row = sqlx::query_as::<_, StaffRow>(&format!(
            r#"
            UPDATE staff
            SET display_name = COALESCE($2, display_name),
                title = COALESCE($3, title),
                is_active = COALESCE($4, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.display_name)
        .bind(&changes.title)
        .bind(changes.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Staff {} not found", id)))?;

        Ok(row.into_staff())
    }

    async fn deactivate(
        &self,
        id: i64,
        changes: &StaffChanges,
        from: DateTime<Utc>,
    ) -> Result<Deactivation, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT id FROM staff WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Staff {} not found", id)))?;

        let upcoming: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM appointments
            WHERE staff_id = $1
              AND status IN ('PENDING', 'CONFIRMED')
              AND ends_at > $2
            "#,
        )
        .bind(id)
        .bind(from)
        .fetch_one(&mut *tx)
        .await?;

        if upcoming > 0 {
            return Ok(Deactivation::Blocked(upcoming as usize));
        }

        let row = sqlx::query_as::<_, StaffRow>(&format!(
            r#"
            UPDATE staff
            SET display_name = COALESCE($2, display_name),
                title = COALESCE($3, title),
                is_active = FALSE,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.display_name)
        .bind(&changes.title)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Deactivation::Done(row.into_staff()))
    }

    async fn count_active(&self, salon_id: i64) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM staff WHERE salon_id = $1 AND is_active")
            .bind(salon_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
