//! Profile Repository Implementation
//!
//! PostgreSQL implementation of the ProfileRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Profile, ProfileChanges, ProfileRepository, ProfileRole};
use crate::shared::error::AppError;

use super::unique_violation;

/// Database row representation of the profiles table.
#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: i64,
    email: String,
    password_hash: String,
    full_name: String,
    phone: Option<String>,
    avatar_url: Option<String>,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProfileRow {
    fn into_profile(self) -> Profile {
        Profile {
            id: self.id,
            email: self.email,
            password_hash: self.password_hash,
            full_name: self.full_name,
            phone: self.phone,
            avatar_url: self.avatar_url,
            role: ProfileRole::parse(&self.role).unwrap_or_default(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const COLUMNS: &str =
    "id, email, password_hash, full_name, phone, avatar_url, role, created_at, updated_at";

/// PostgreSQL profile repository implementation.
#[derive(Clone)]
pub struct PgProfileRepository {
    pool: PgPool,
}

impl PgProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileRepository for PgProfileRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Profile>, AppError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {COLUMNS} FROM profiles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ProfileRow::into_profile))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Profile>, AppError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {COLUMNS} FROM profiles WHERE lower(email) = lower($1)"
        ))
        .bind(Profile::normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ProfileRow::into_profile))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM profiles WHERE lower(email) = lower($1))",
        )
        .bind(Profile::normalize_email(email))
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn create(&self, profile: &Profile) -> Result<Profile, AppError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            r#"
            INSERT INTO profiles (id, email, password_hash, full_name, phone, avatar_url, role)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(profile.id)
        .bind(&profile.email)
        .bind(&profile.password_hash)
        .bind(&profile.full_name)
        .bind(&profile.phone)
        .bind(&profile.avatar_url)
        .bind(profile.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(unique_violation("Email already registered"))?;

        Ok(row.into_profile())
    }

    async fn update(&self, id: i64, changes: &ProfileChanges) -> Result<Profile, AppError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            r#"
            UPDATE profiles
            SET full_name = COALESCE($2, full_name),
                phone = COALESCE($3, phone),
                avatar_url = COALESCE($4, avatar_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.full_name)
        .bind(&changes.phone)
        .bind(&changes.avatar_url)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", id)))?;

        Ok(row.into_profile())
    }

    async fn set_role(&self, id: i64, role: ProfileRole) -> Result<Profile, AppError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "UPDATE profiles SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", id)))?;

        Ok(row.into_profile())
    }

    async fn list(
        &self,
        role: Option<ProfileRole>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Profile>, AppError> {
        let rows = sqlx::query_as::<_, ProfileRow>(&format!(
            r#"
            SELECT {COLUMNS} FROM profiles
            WHERE ($1::varchar IS NULL OR role = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(role.map(|r| r.as_str()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ProfileRow::into_profile).collect())
    }

    async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
