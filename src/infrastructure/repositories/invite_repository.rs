//! Invite Repository Implementation
//!
//! Staff invite codes. Acceptance locks the invite row so a code can only
//! ever produce one staff membership.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Invite, InvitePreview, InviteRepository, InviteState, ProfileRole, Staff};
use crate::shared::error::AppError;

use super::staff_repository::insert_staff;
use super::unique_violation;

#[derive(Debug, sqlx::FromRow)]
struct InviteRow {
    code: String,
    salon_id: i64,
    email: String,
    display_name: String,
    title: Option<String>,
    invited_by: i64,
    expires_at: DateTime<Utc>,
    accepted_at: Option<DateTime<Utc>>,
    accepted_by: Option<i64>,
    revoked_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl InviteRow {
    fn into_invite(self) -> Invite {
        Invite {
            code: self.code,
            salon_id: self.salon_id,
            email: self.email,
            display_name: self.display_name,
            title: self.title,
            invited_by: self.invited_by,
            expires_at: self.expires_at,
            accepted_at: self.accepted_at,
            accepted_by: self.accepted_by,
            revoked_at: self.revoked_at,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PreviewRow {
    #[sqlx(flatten)]
    invite: InviteRow,
    salon_name: String,
}

const COLUMNS: &str = "code, salon_id, email, display_name, title, invited_by, expires_at, \
     accepted_at, accepted_by, revoked_at, created_at";

/// PostgreSQL invite repository implementation.
#[derive(Clone)]
pub struct PgInviteRepository {
    pool: PgPool,
}

impl PgInviteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InviteRepository for PgInviteRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<Invite>, AppError> {
        let row = sqlx::query_as::<_, InviteRow>(&format!(
            "SELECT {COLUMNS} FROM staff_invites WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(InviteRow::into_invite))
    }

    async fn preview(&self, code: &str) -> Result<Option<InvitePreview>, AppError> {
        let row = sqlx::query_as::<_, PreviewRow>(
            r#"
            SELECT i.code, i.salon_id, i.email, i.display_name, i.title, i.invited_by,
                   i.expires_at, i.accepted_at, i.accepted_by, i.revoked_at, i.created_at,
                   s.name AS salon_name
            FROM staff_invites i
            JOIN salons s ON s.id = i.salon_id
            WHERE i.code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| InvitePreview {
            invite: r.invite.into_invite(),
            salon_name: r.salon_name,
        }))
    }

    async fn find_by_salon(&self, salon_id: i64) -> Result<Vec<Invite>, AppError> {
        let rows = sqlx::query_as::<_, InviteRow>(&format!(
            "SELECT {COLUMNS} FROM staff_invites WHERE salon_id = $1 ORDER BY created_at DESC"
        ))
        .bind(salon_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(InviteRow::into_invite).collect())
    }

    async fn code_exists(&self, code: &str) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM staff_invites WHERE code = $1)")
                .bind(code)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn create(&self, invite: &Invite) -> Result<Invite, AppError> {
        let row = sqlx::query_as::<_, InviteRow>(&format!(
            r#"
            INSERT INTO staff_invites (code, salon_id, email, display_name, title, invited_by, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&invite.code)
        .bind(invite.salon_id)
        .bind(&invite.email)
        .bind(&invite.display_name)
        .bind(&invite.title)
        .bind(invite.invited_by)
        .bind(invite.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(unique_violation("Invite code collision"))?;

        Ok(row.into_invite())
    }

    async fn revoke(&self, code: &str) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE staff_invites SET revoked_at = NOW() WHERE code = $1 AND revoked_at IS NULL AND accepted_at IS NULL",
        )
        .bind(code)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn accept(&self, code: &str, profile_id: i64, staff: &Staff) -> Result<Staff, AppError> {
        let mut tx = self.pool.begin().await?;

        let invite = sqlx::query_as::<_, InviteRow>(&format!(
            "SELECT {COLUMNS} FROM staff_invites WHERE code = $1 FOR UPDATE"
        ))
        .bind(code)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Invite not found".into()))?
        .into_invite();

        if invite.state() != InviteState::Valid {
            return Err(AppError::Conflict("Invite can no longer be used".into()));
        }

        let email: String = sqlx::query_scalar("SELECT email FROM profiles WHERE id = $1")
            .bind(profile_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".into()))?;
        if !email.eq_ignore_ascii_case(&invite.email) {
            return Err(AppError::Forbidden("Invite was issued to a different email".into()));
        }

        let mut member = staff.clone();
        member.profile_id = Some(profile_id);
        let created = insert_staff(&mut tx, &member).await?;

        sqlx::query("UPDATE profiles SET role = $2, updated_at = NOW() WHERE id = $1 AND role = $3")
            .bind(profile_id)
            .bind(ProfileRole::Staff.as_str())
            .bind(ProfileRole::Customer.as_str())
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE staff_invites SET accepted_at = NOW(), accepted_by = $2 WHERE code = $1")
            .bind(code)
            .bind(profile_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(created)
    }
}
