//! Invite Service
//!
//! Staff invitations: owners invite by email, the invitee accepts with the code.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use tracing::instrument;

use crate::domain::services::AccessPolicy;
use crate::domain::{
    Actor, Invite, InvitePreview, InviteRepository, InviteState, ProfileRepository, Salon,
    SalonRepository, Staff, StaffRepository,
};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

const MAX_CODE_ATTEMPTS: u32 = 5;

/// Invite service trait defining invite operations.
#[async_trait]
pub trait InviteService: Send + Sync {
    async fn create_invite(&self, actor: &Actor, salon_id: i64, request: CreateInviteDto)
        -> Result<Invite, InviteError>;

    async fn list_salon_invites(&self, actor: &Actor, salon_id: i64) -> Result<Vec<Invite>, InviteError>;

    async fn revoke_invite(&self, actor: &Actor, code: &str) -> Result<(), InviteError>;

    /// Public: what the invite is for and whether it can still be used
    async fn preview_invite(&self, code: &str) -> Result<InvitePreview, InviteError>;

    /// Join the salon's team as the invited staff member
    async fn accept_invite(&self, actor: &Actor, code: &str) -> Result<Staff, InviteError>;
}

/// Request DTO for creating an invite.
#[derive(Debug, Clone)]
pub struct CreateInviteDto {
    pub email: String,
    pub display_name: String,
    pub title: Option<String>,
}

/// Invite service errors
#[derive(Debug, thiserror::Error)]
pub enum InviteError {
    #[error("Invite not found")]
    NotFound,

    #[error("Salon not found")]
    SalonNotFound,

    #[error("You do not manage this salon")]
    Forbidden,

    #[error("This invite was sent to a different email address")]
    EmailMismatch,

    #[error("Invite is no longer valid ({0:?})")]
    Unusable(InviteState),

    #[error("You are already on this salon's team")]
    AlreadyMember,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<InviteError> for AppError {
    fn from(e: InviteError) -> Self {
        match e {
            InviteError::NotFound | InviteError::SalonNotFound => AppError::NotFound(e.to_string()),
            InviteError::Forbidden | InviteError::EmailMismatch => AppError::Forbidden(e.to_string()),
            InviteError::Unusable(_) | InviteError::AlreadyMember => AppError::Conflict(e.to_string()),
            InviteError::Internal(msg) => AppError::Internal(msg),
            InviteError::Store(inner) => inner,
        }
    }
}

/// InviteService implementation
pub struct InviteServiceImpl<I, S, P, T>
where
    I: InviteRepository,
    S: SalonRepository,
    P: ProfileRepository,
    T: StaffRepository,
{
    invite_repo: Arc<I>,
    salon_repo: Arc<S>,
    profile_repo: Arc<P>,
    staff_repo: Arc<T>,
    id_generator: Arc<SnowflakeGenerator>,
    expiry: Duration,
}

impl<I, S, P, T> InviteServiceImpl<I, S, P, T>
where
    I: InviteRepository,
    S: SalonRepository,
    P: ProfileRepository,
    T: StaffRepository,
{
    pub fn new(
        invite_repo: Arc<I>,
        salon_repo: Arc<S>,
        profile_repo: Arc<P>,
        staff_repo: Arc<T>,
        id_generator: Arc<SnowflakeGenerator>,
        expiry_hours: i64,
    ) -> Self {
        Self {
            invite_repo,
            salon_repo,
            profile_repo,
            staff_repo,
            id_generator,
            expiry: Duration::hours(expiry_hours),
        }
    }

    async fn managed_salon(&self, actor: &Actor, salon_id: i64) -> Result<Salon, InviteError> {
        let salon = self
            .salon_repo
            .find_by_id(salon_id)
            .await?
            .ok_or(InviteError::SalonNotFound)?;
        if !AccessPolicy::can_manage_salon(actor, &salon) {
            return Err(InviteError::Forbidden);
        }
        Ok(salon)
    }
}

#[async_trait]
impl<I, S, P, T> InviteService for InviteServiceImpl<I, S, P, T>
where
    I: InviteRepository + 'static,
    S: SalonRepository + 'static,
    P: ProfileRepository + 'static,
    T: StaffRepository + 'static,
{
    #[instrument(skip(self, request), fields(actor_id = actor.profile_id))]
    async fn create_invite(
        &self,
        actor: &Actor,
        salon_id: i64,
        request: CreateInviteDto,
    ) -> Result<Invite, InviteError> {
        self.managed_salon(actor, salon_id).await?;

        let mut invite = Invite::new(
            salon_id,
            &request.email,
            request.display_name.trim().to_string(),
            request.title,
            actor.profile_id,
            self.expiry,
        );

        // Collision retry on the random code
        let mut attempts = 0;
        while self.invite_repo.code_exists(&invite.code).await? {
            attempts += 1;
            if attempts >= MAX_CODE_ATTEMPTS {
                return Err(InviteError::Internal("Failed to generate unique invite code".into()));
            }
            invite.code = Invite::generate_code();
        }

        Ok(self.invite_repo.create(&invite).await?)
    }

    async fn list_salon_invites(&self, actor: &Actor, salon_id: i64) -> Result<Vec<Invite>, InviteError> {
        self.managed_salon(actor, salon_id).await?;
        Ok(self.invite_repo.find_by_salon(salon_id).await?)
    }

    async fn revoke_invite(&self, actor: &Actor, code: &str) -> Result<(), InviteError> {
        let invite = self
            .invite_repo
            .find_by_code(code)
            .await?
            .ok_or(InviteError::NotFound)?;
        self.managed_salon(actor, invite.salon_id).await?;

        match invite.state() {
            InviteState::Accepted => Err(InviteError::Unusable(InviteState::Accepted)),
            InviteState::Revoked => Ok(()),
            _ => Ok(self.invite_repo.revoke(code).await?),
        }
    }

    async fn preview_invite(&self, code: &str) -> Result<InvitePreview, InviteError> {
        self.invite_repo
            .preview(code)
            .await?
            .ok_or(InviteError::NotFound)
    }

    #[instrument(skip(self), fields(profile_id = actor.profile_id))]
    async fn accept_invite(&self, actor: &Actor, code: &str) -> Result<Staff, InviteError> {
        let invite = self
            .invite_repo
            .find_by_code(code)
            .await?
            .ok_or(InviteError::NotFound)?;

        let state = invite.state();
        if state != InviteState::Valid {
            return Err(InviteError::Unusable(state));
        }

        let profile = self
            .profile_repo
            .find_by_id(actor.profile_id)
            .await?
            .ok_or(InviteError::NotFound)?;
        if !profile.has_email(&invite.email) {
            return Err(InviteError::EmailMismatch);
        }

        let memberships = self.staff_repo.find_by_profile(actor.profile_id).await?;
        if memberships.iter().any(|s| s.salon_id == invite.salon_id) {
            return Err(InviteError::AlreadyMember);
        }

        let staff = Staff::new(
            self.id_generator.generate(),
            invite.salon_id,
            invite.display_name.clone(),
            invite.title.clone(),
        );
        let staff = self
            .invite_repo
            .accept(code, actor.profile_id, &staff)
            .await?;

        tracing::info!(salon_id = staff.salon_id, staff_id = staff.id, "Invite accepted");
        Ok(staff)
    }
}
