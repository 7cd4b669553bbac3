//! Staff Service
//!
//! Salon team management for owners and the staff member's own view.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::instrument;

use crate::domain::services::AccessPolicy;
use crate::domain::{
    Actor, Deactivation, Salon, SalonRepository, Staff, StaffChanges, StaffRepository,
};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

/// Staff service trait
#[async_trait]
pub trait StaffService: Send + Sync {
    async fn add_staff(
        &self,
        actor: &Actor,
        salon_id: i64,
        display_name: String,
        title: Option<String>,
    ) -> Result<Staff, StaffError>;

    async fn update_staff(&self, actor: &Actor, staff_id: i64, changes: StaffChanges)
        -> Result<Staff, StaffError>;

    /// Soft delete. Refused while the staff member has upcoming bookings.
    async fn remove_staff(&self, actor: &Actor, staff_id: i64) -> Result<Staff, StaffError>;

    /// Salons the caller works at
    async fn my_memberships(&self, actor: &Actor) -> Result<Vec<Staff>, StaffError>;
}

/// Staff service errors
#[derive(Debug, thiserror::Error)]
pub enum StaffError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("You do not manage this salon")]
    Forbidden,

    #[error("Staff member has {0} upcoming appointment(s); cancel or reassign them first")]
    HasUpcomingAppointments(usize),

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<StaffError> for AppError {
    fn from(e: StaffError) -> Self {
        match e {
            StaffError::NotFound(_) => AppError::NotFound(e.to_string()),
            StaffError::Forbidden => AppError::Forbidden(e.to_string()),
            StaffError::HasUpcomingAppointments(_) => AppError::Conflict(e.to_string()),
            StaffError::Store(inner) => inner,
        }
    }
}

/// StaffService implementation
pub struct StaffServiceImpl<T, S>
where
    T: StaffRepository,
    S: SalonRepository,
{
    staff_repo: Arc<T>,
    salon_repo: Arc<S>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<T, S> StaffServiceImpl<T, S>
where
    T: StaffRepository,
    S: SalonRepository,
{
    pub fn new(staff_repo: Arc<T>, salon_repo: Arc<S>, id_generator: Arc<SnowflakeGenerator>) -> Self {
        Self {
            staff_repo,
            salon_repo,
            id_generator,
        }
    }

    async fn managed_salon(&self, actor: &Actor, salon_id: i64) -> Result<Salon, StaffError> {
        let salon = self
            .salon_repo
            .find_by_id(salon_id)
            .await?
            .ok_or(StaffError::NotFound("Salon"))?;
        if !AccessPolicy::can_manage_salon(actor, &salon) {
            return Err(StaffError::Forbidden);
        }
        Ok(salon)
    }

    async fn managed_staff(&self, actor: &Actor, staff_id: i64) -> Result<Staff, StaffError> {
        let staff = self
            .staff_repo
            .find_by_id(staff_id)
            .await?
            .ok_or(StaffError::NotFound("Staff member"))?;
        self.managed_salon(actor, staff.salon_id).await?;
        Ok(staff)
    }

    async fn deactivate(&self, staff_id: i64, changes: &StaffChanges) -> Result<Staff, StaffError> {
        match self.staff_repo.deactivate(staff_id, changes, Utc::now()).await? {
            Deactivation::Done(staff) => {
                tracing::info!(staff_id, salon_id = staff.salon_id, "Staff member deactivated");
                Ok(staff)
            }
            Deactivation::Blocked(upcoming) => Err(StaffError::HasUpcomingAppointments(upcoming)),
        }
    }
}

#[async_trait]
impl<T, S> StaffService for StaffServiceImpl<T, S>
where
    T: StaffRepository + 'static,
    S: SalonRepository + 'static,
{
    #[instrument(skip(self, display_name, title), fields(actor_id = actor.profile_id))]
    async fn add_staff(
        &self,
        actor: &Actor,
        salon_id: i64,
        display_name: String,
        title: Option<String>,
    ) -> Result<Staff, StaffError> {
        self.managed_salon(actor, salon_id).await?;
        let staff = Staff::new(
            self.id_generator.generate(),
            salon_id,
            display_name.trim().to_string(),
            title,
        );
        Ok(self.staff_repo.create(&staff).await?)
    }

    async fn update_staff(
        &self,
        actor: &Actor,
        staff_id: i64,
        changes: StaffChanges,
    ) -> Result<Staff, StaffError> {
        let staff = self.managed_staff(actor, staff_id).await?;
        if staff.is_active && changes.is_active == Some(false) {
            return self.deactivate(staff_id, &changes).await;
        }
        Ok(self.staff_repo.update(staff_id, &changes).await?)
    }

    #[instrument(skip(self), fields(actor_id = actor.profile_id))]
    async fn remove_staff(&self, actor: &Actor, staff_id: i64) -> Result<Staff, StaffError> {
        self.managed_staff(actor, staff_id).await?;
        self.deactivate(staff_id, &StaffChanges::default()).await
    }

    async fn my_memberships(&self, actor: &Actor) -> Result<Vec<Staff>, StaffError> {
        Ok(self.staff_repo.find_by_profile(actor.profile_id).await?)
    }
}
