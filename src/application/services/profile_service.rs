//! Profile Service
//!
//! The caller's own profile, plus admin listing and role management.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use crate::domain::{Actor, Profile, ProfileChanges, ProfileRepository, ProfileRole, SessionRepository};
use crate::shared::error::AppError;

/// Profile service trait
#[async_trait]
pub trait ProfileService: Send + Sync {
    async fn get_me(&self, actor: &Actor) -> Result<Profile, ProfileError>;

    async fn update_me(&self, actor: &Actor, changes: ProfileChanges) -> Result<Profile, ProfileError>;

    /// Admin: page through profiles, optionally by role
    async fn list_profiles(
        &self,
        actor: &Actor,
        role: Option<ProfileRole>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Profile>, ProfileError>;

    /// Admin: change a profile's role. Existing sessions are revoked.
    async fn set_role(&self, actor: &Actor, profile_id: i64, role: ProfileRole)
        -> Result<Profile, ProfileError>;
}

/// Profile service errors
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Profile not found")]
    NotFound,

    #[error("Admin access required")]
    Forbidden,

    #[error("Admins cannot change their own role")]
    SelfDemotion,

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<ProfileError> for AppError {
    fn from(e: ProfileError) -> Self {
        match e {
            ProfileError::NotFound => AppError::NotFound(e.to_string()),
            ProfileError::Forbidden => AppError::Forbidden(e.to_string()),
            ProfileError::SelfDemotion => AppError::Conflict(e.to_string()),
            ProfileError::Store(inner) => inner,
        }
    }
}

/// ProfileService implementation
pub struct ProfileServiceImpl<P, S>
where
    P: ProfileRepository,
    S: SessionRepository,
{
    profile_repo: Arc<P>,
    session_repo: Arc<S>,
}

impl<P, S> ProfileServiceImpl<P, S>
where
    P: ProfileRepository,
    S: SessionRepository,
{
    pub fn new(profile_repo: Arc<P>, session_repo: Arc<S>) -> Self {
        Self {
            profile_repo,
            session_repo,
        }
    }
}

#[async_trait]
impl<P, S> ProfileService for ProfileServiceImpl<P, S>
where
    P: ProfileRepository + 'static,
    S: SessionRepository + 'static,
{
    async fn get_me(&self, actor: &Actor) -> Result<Profile, ProfileError> {
        self.profile_repo
            .find_by_id(actor.profile_id)
            .await?
            .ok_or(ProfileError::NotFound)
    }

    async fn update_me(&self, actor: &Actor, changes: ProfileChanges) -> Result<Profile, ProfileError> {
        let changes = ProfileChanges {
            full_name: changes.full_name.map(|n| n.trim().to_string()),
            ..changes
        };
        Ok(self.profile_repo.update(actor.profile_id, &changes).await?)
    }

    async fn list_profiles(
        &self,
        actor: &Actor,
        role: Option<ProfileRole>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Profile>, ProfileError> {
        if !actor.is_admin() {
            return Err(ProfileError::Forbidden);
        }
        Ok(self
            .profile_repo
            .list(role, limit.clamp(1, 100), offset.max(0))
            .await?)
    }

    #[instrument(skip(self), fields(admin_id = actor.profile_id))]
    async fn set_role(
        &self,
        actor: &Actor,
        profile_id: i64,
        role: ProfileRole,
    ) -> Result<Profile, ProfileError> {
        if !actor.is_admin() {
            return Err(ProfileError::Forbidden);
        }
        if profile_id == actor.profile_id {
            return Err(ProfileError::SelfDemotion);
        }

        let current = self
            .profile_repo
            .find_by_id(profile_id)
            .await?
            .ok_or(ProfileError::NotFound)?;
        if current.role == role {
            return Ok(current);
        }

        let updated = self.profile_repo.set_role(profile_id, role).await?;
        let revoked = self.session_repo.revoke_all_for_profile(profile_id).await?;

        tracing::info!(profile_id, role = %role, revoked, "Profile role changed");
        Ok(updated)
    }
}
