//! Appointment Repository Implementation
//!
//! Bookings and the joined listings used by lists and calendars. Overlap
//! detection and insert share a transaction that locks the staff row, so two
//! concurrent bookings for the same staff member serialize.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{
    Appointment, AppointmentFilter, AppointmentRepository, AppointmentStatus, AppointmentSummary,
    StatusChange, TimeRange,
};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct AppointmentRow {
    id: i64,
    salon_id: i64,
    staff_id: i64,
    service_id: i64,
    customer_id: i64,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    status: String,
    price_cents: i64,
    notes: Option<String>,
    cancellation_reason: Option<String>,
    cancelled_by: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AppointmentRow {
    fn into_appointment(self) -> Appointment {
        Appointment {
            id: self.id,
            salon_id: self.salon_id,
            staff_id: self.staff_id,
            service_id: self.service_id,
            customer_id: self.customer_id,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            status: AppointmentStatus::parse(&self.status).unwrap_or_default(),
            price_cents: self.price_cents,
            notes: self.notes,
            cancellation_reason: self.cancellation_reason,
            cancelled_by: self.cancelled_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    #[sqlx(flatten)]
    appointment: AppointmentRow,
    salon_name: String,
    staff_name: String,
    service_name: String,
    customer_name: String,
}

impl SummaryRow {
    fn into_summary(self) -> AppointmentSummary {
        AppointmentSummary {
            appointment: self.appointment.into_appointment(),
            salon_name: self.salon_name,
            staff_name: self.staff_name,
            service_name: self.service_name,
            customer_name: self.customer_name,
        }
    }
}

const COLUMNS: &str = "id, salon_id, staff_id, service_id, customer_id, starts_at, ends_at, \
     status, price_cents, notes, cancellation_reason, cancelled_by, created_at, updated_at";

const BLOCKING: [&str; 2] = ["PENDING", "CONFIRMED"];

/// PostgreSQL appointment repository implementation.
#[derive(Clone)]
pub struct PgAppointmentRepository {
    pool: PgPool,
}

impl PgAppointmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AppointmentRepository for PgAppointmentRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Appointment>, AppError> {
        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            "SELECT {COLUMNS} FROM appointments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(AppointmentRow::into_appointment))
    }

    async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<AppointmentSummary>, AppError> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT a.id, a.salon_id, a.staff_id, a.service_id, a.customer_id,
                   a.starts_at, a.ends_at, a.status, a.price_cents, a.notes,
                   a.cancellation_reason, a.cancelled_by, a.created_at, a.updated_at,
                   s.name AS salon_name,
                   st.display_name AS staff_name,
                   sv.name AS service_name,
                   p.full_name AS customer_name
            FROM appointments a
            JOIN salons s ON s.id = a.salon_id
            JOIN staff st ON st.id = a.staff_id
            JOIN salon_services sv ON sv.id = a.service_id
            JOIN profiles p ON p.id = a.customer_id
            WHERE ($1::bigint IS NULL OR a.salon_id = $1)
              AND ($2::bigint IS NULL OR a.staff_id = $2)
              AND ($3::bigint IS NULL OR a.customer_id = $3)
              AND ($4::varchar IS NULL OR a.status = $4)
              AND ($5::timestamptz IS NULL OR a.starts_at >= $5)
              AND ($6::timestamptz IS NULL OR a.starts_at < $6)
            ORDER BY a.starts_at ASC, a.id ASC
            LIMIT $7
            "#,
        )
        .bind(filter.salon_id)
        .bind(filter.staff_id)
        .bind(filter.customer_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.from)
        .bind(filter.until)
        .bind(filter.limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SummaryRow::into_summary).collect())
    }

    async fn find_blocking(&self, staff_id: i64, range: TimeRange) -> Result<Vec<Appointment>, AppError> {
        let rows = sqlx::query_as::<_, AppointmentRow>(&format!(
            r#"
            SELECT {COLUMNS} FROM appointments
            WHERE staff_id = $1
              AND status = ANY($2)
              AND starts_at < $4 AND ends_at > $3
            ORDER BY starts_at ASC
            "#
        ))
        .bind(staff_id)
        .bind(&BLOCKING[..])
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(AppointmentRow::into_appointment).collect())
    }

    async fn insert_if_free(&self, appointment: &Appointment) -> Result<Appointment, AppError> {
        let mut tx = self.pool.begin().await?;

        // Deactivation takes the same row lock, so the flag read here is current
        let is_active: bool = sqlx::query_scalar("SELECT is_active FROM staff WHERE id = $1 FOR UPDATE")
            .bind(appointment.staff_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Staff member not found".into()))?;
        if !is_active {
            return Err(AppError::Conflict(
                "The staff member is no longer taking bookings".into(),
            ));
        }

        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM appointments
                WHERE staff_id = $1
                  AND status = ANY($2)
                  AND starts_at < $4 AND ends_at > $3
            )
            "#,
        )
        .bind(appointment.staff_id)
        .bind(&BLOCKING[..])
        .bind(appointment.starts_at)
        .bind(appointment.ends_at)
        .fetch_one(&mut *tx)
        .await?;

        if taken {
            return Err(AppError::Conflict(
                "The staff member is already booked at that time".into(),
            ));
        }

        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            r#"
            INSERT INTO appointments (
                id, salon_id, staff_id, service_id, customer_id,
                starts_at, ends_at, status, price_cents, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(appointment.id)
        .bind(appointment.salon_id)
        .bind(appointment.staff_id)
        .bind(appointment.service_id)
        .bind(appointment.customer_id)
        .bind(appointment.starts_at)
        .bind(appointment.ends_at)
        .bind(appointment.status.as_str())
        .bind(appointment.price_cents)
        .bind(&appointment.notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into_appointment())
    }

    async fn change_status(&self, id: i64, change: &StatusChange) -> Result<Appointment, AppError> {
        let row = sqlx::query_as::<_, AppointmentRow>(&format!(
            r#"
            UPDATE appointments
            SET status = $2,
                cancellation_reason = COALESCE($4, cancellation_reason),
                cancelled_by = COALESCE($5, cancelled_by),
                updated_at = NOW()
            WHERE id = $1 AND status = $3
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(change.status.as_str())
        .bind(change.expected_current.as_str())
        .bind(&change.cancellation_reason)
        .bind(change.cancelled_by)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(row.into_appointment()),
            None => {
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM appointments WHERE id = $1)")
                        .bind(id)
                        .fetch_one(&self.pool)
                        .await?;
                if exists {
                    Err(AppError::Conflict("Appointment was changed concurrently".into()))
                } else {
                    Err(AppError::NotFound(format!("Appointment {} not found", id)))
                }
            }
        }
    }

    async fn count_starting_between(
        &self,
        salon_id: Option<i64>,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM appointments
            WHERE ($1::bigint IS NULL OR salon_id = $1)
              AND starts_at >= $2 AND starts_at < $3
              AND status <> 'CANCELLED'
            "#,
        )
        .bind(salon_id)
        .bind(from)
        .bind(until)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn completed_revenue(
        &self,
        salon_id: i64,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(price_cents), 0)::bigint FROM appointments
            WHERE salon_id = $1 AND status = 'COMPLETED'
              AND starts_at >= $2 AND starts_at < $3
            "#,
        )
        .bind(salon_id)
        .bind(from)
        .bind(until)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}
