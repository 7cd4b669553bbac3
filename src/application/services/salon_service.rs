//! Salon Service
//!
//! Public directory, owner back office and admin moderation of salons.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveTime, Utc};
use serde_json::json;
use tracing::instrument;

use crate::domain::services::AccessPolicy;
use crate::domain::{
    Actor, ApprovalKind, ApprovalRepository, ApprovalRequest, Salon, SalonChanges, SalonFilter,
    SalonRepository, SalonService, SalonServiceRepository, SalonStatus, Staff, StaffRepository,
};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

/// Salon service trait
#[async_trait]
pub trait SalonDirectory: Send + Sync {
    /// Public listing of approved salons
    async fn list_salons(&self, filter: SalonFilter) -> Result<Vec<Salon>, SalonError>;

    /// Approved salons for everyone; others for their owner and admins
    async fn get_salon(&self, actor: Option<&Actor>, salon_id: i64) -> Result<Salon, SalonError>;

    async fn list_salon_services(
        &self,
        actor: Option<&Actor>,
        salon_id: i64,
    ) -> Result<Vec<SalonService>, SalonError>;

    async fn list_salon_staff(&self, actor: Option<&Actor>, salon_id: i64)
        -> Result<Vec<Staff>, SalonError>;

    /// Create a PENDING salon and queue it for admin review
    async fn create_salon(&self, actor: &Actor, request: CreateSalonDto) -> Result<Salon, SalonError>;

    async fn list_my_salons(&self, actor: &Actor) -> Result<Vec<Salon>, SalonError>;

    /// Queue a change set for admin review; one pending update per salon
    async fn request_salon_update(
        &self,
        actor: &Actor,
        salon_id: i64,
        changes: SalonChanges,
    ) -> Result<ApprovalRequest, SalonError>;

    /// Admin: approve, reject or suspend a listing directly
    async fn set_salon_status(
        &self,
        actor: &Actor,
        salon_id: i64,
        status: SalonStatus,
    ) -> Result<Salon, SalonError>;
}

/// Create salon input
#[derive(Debug, Clone)]
pub struct CreateSalonDto {
    pub name: String,
    pub description: Option<String>,
    pub address: String,
    pub city: String,
    pub phone: Option<String>,
    pub image_url: Option<String>,
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
    pub utc_offset_minutes: i32,
}

/// Salon service errors
#[derive(Debug, thiserror::Error)]
pub enum SalonError {
    #[error("Salon not found")]
    NotFound,

    #[error("You do not manage this salon")]
    Forbidden,

    #[error("Closing time must be after opening time")]
    InvalidHours,

    #[error("No changes submitted")]
    NoChanges,

    #[error("An update for this salon is already awaiting review")]
    UpdatePending,

    #[error("Status must be APPROVED, REJECTED or SUSPENDED")]
    InvalidStatus,

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<SalonError> for AppError {
    fn from(e: SalonError) -> Self {
        match e {
            SalonError::NotFound => AppError::NotFound(e.to_string()),
            SalonError::Forbidden => AppError::Forbidden(e.to_string()),
            SalonError::InvalidHours => AppError::field("closing_time", &e.to_string()),
            SalonError::NoChanges | SalonError::InvalidStatus => AppError::BadRequest(e.to_string()),
            SalonError::UpdatePending => AppError::Conflict(e.to_string()),
            SalonError::Store(inner) => inner,
        }
    }
}

/// SalonDirectory implementation
pub struct SalonServiceImpl<S, A, V, T>
where
    S: SalonRepository,
    A: ApprovalRepository,
    V: SalonServiceRepository,
    T: StaffRepository,
{
    salon_repo: Arc<S>,
    approval_repo: Arc<A>,
    service_repo: Arc<V>,
    staff_repo: Arc<T>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<S, A, V, T> SalonServiceImpl<S, A, V, T>
where
    S: SalonRepository,
    A: ApprovalRepository,
    V: SalonServiceRepository,
    T: StaffRepository,
{
    pub fn new(
        salon_repo: Arc<S>,
        approval_repo: Arc<A>,
        service_repo: Arc<V>,
        staff_repo: Arc<T>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            salon_repo,
            approval_repo,
            service_repo,
            staff_repo,
            id_generator,
        }
    }

    async fn load(&self, salon_id: i64) -> Result<Salon, SalonError> {
        self.salon_repo
            .find_by_id(salon_id)
            .await?
            .ok_or(SalonError::NotFound)
    }

    async fn load_visible(&self, actor: Option<&Actor>, salon_id: i64) -> Result<Salon, SalonError> {
        let salon = self.load(salon_id).await?;
        // Hidden salons look missing rather than forbidden
        if !AccessPolicy::can_view_salon(actor, &salon) {
            return Err(SalonError::NotFound);
        }
        Ok(salon)
    }
}

#[async_trait]
impl<S, A, V, T> SalonDirectory for SalonServiceImpl<S, A, V, T>
where
    S: SalonRepository + 'static,
    A: ApprovalRepository + 'static,
    V: SalonServiceRepository + 'static,
    T: StaffRepository + 'static,
{
    async fn list_salons(&self, filter: SalonFilter) -> Result<Vec<Salon>, SalonError> {
        let filter = SalonFilter {
            status: Some(SalonStatus::Approved),
            limit: filter.limit.clamp(1, 100),
            offset: filter.offset.max(0),
            ..filter
        };
        Ok(self.salon_repo.list(&filter).await?)
    }

    async fn get_salon(&self, actor: Option<&Actor>, salon_id: i64) -> Result<Salon, SalonError> {
        self.load_visible(actor, salon_id).await
    }

    async fn list_salon_services(
        &self,
        actor: Option<&Actor>,
        salon_id: i64,
    ) -> Result<Vec<SalonService>, SalonError> {
        let salon = self.load_visible(actor, salon_id).await?;
        let include_inactive = actor.is_some_and(|a| AccessPolicy::can_manage_salon(a, &salon));
        Ok(self.service_repo.find_by_salon(salon_id, include_inactive).await?)
    }

    async fn list_salon_staff(
        &self,
        actor: Option<&Actor>,
        salon_id: i64,
    ) -> Result<Vec<Staff>, SalonError> {
        let salon = self.load_visible(actor, salon_id).await?;
        let include_inactive = actor.is_some_and(|a| AccessPolicy::can_manage_salon(a, &salon));
        Ok(self.staff_repo.find_by_salon(salon_id, include_inactive).await?)
    }

    #[instrument(skip(self, request), fields(owner_id = actor.profile_id))]
    async fn create_salon(&self, actor: &Actor, request: CreateSalonDto) -> Result<Salon, SalonError> {
        if request.closing_time <= request.opening_time {
            return Err(SalonError::InvalidHours);
        }

        let now = Utc::now();
        let salon = Salon {
            id: self.id_generator.generate(),
            owner_id: actor.profile_id,
            name: request.name.trim().to_string(),
            description: request.description,
            address: request.address.trim().to_string(),
            city: request.city.trim().to_string(),
            phone: request.phone,
            image_url: request.image_url,
            status: SalonStatus::Pending,
            opening_time: request.opening_time,
            closing_time: request.closing_time,
            utc_offset_minutes: request.utc_offset_minutes,
            created_at: now,
            updated_at: now,
        };
        let approval = ApprovalRequest::new(
            self.id_generator.generate(),
            salon.id,
            actor.profile_id,
            ApprovalKind::NewSalon,
            json!({ "name": salon.name, "city": salon.city, "address": salon.address }),
        );

        let salon = self.salon_repo.create_with_request(&salon, &approval).await?;
        tracing::info!(salon_id = salon.id, "Salon submitted for review");
        Ok(salon)
    }

    async fn list_my_salons(&self, actor: &Actor) -> Result<Vec<Salon>, SalonError> {
        Ok(self.salon_repo.find_by_owner(actor.profile_id).await?)
    }

    #[instrument(skip(self, changes), fields(actor_id = actor.profile_id))]
    async fn request_salon_update(
        &self,
        actor: &Actor,
        salon_id: i64,
        changes: SalonChanges,
    ) -> Result<ApprovalRequest, SalonError> {
        let salon = self.load(salon_id).await?;
        if !AccessPolicy::can_manage_salon(actor, &salon) {
            return Err(SalonError::Forbidden);
        }
        if changes.is_empty() {
            return Err(SalonError::NoChanges);
        }

        let mut preview = salon.clone();
        preview.apply(&changes);
        if preview.closing_time <= preview.opening_time {
            return Err(SalonError::InvalidHours);
        }

        if self
            .approval_repo
            .has_pending(salon_id, ApprovalKind::SalonUpdate)
            .await?
        {
            return Err(SalonError::UpdatePending);
        }

        let payload = serde_json::to_value(&changes)
            .map_err(|e| AppError::Internal(format!("Serialize salon changes: {}", e)))?;
        let request = ApprovalRequest::new(
            self.id_generator.generate(),
            salon_id,
            actor.profile_id,
            ApprovalKind::SalonUpdate,
            payload,
        );

        Ok(self.approval_repo.create(&request).await?)
    }

    #[instrument(skip(self), fields(admin_id = actor.profile_id))]
    async fn set_salon_status(
        &self,
        actor: &Actor,
        salon_id: i64,
        status: SalonStatus,
    ) -> Result<Salon, SalonError> {
        if !actor.is_admin() {
            return Err(SalonError::Forbidden);
        }
        if status == SalonStatus::Pending {
            return Err(SalonError::InvalidStatus);
        }

        self.load(salon_id).await?;
        let salon = self.salon_repo.set_status(salon_id, status).await?;
        tracing::info!(salon_id, status = status.as_str(), "Salon status changed");
        Ok(salon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        MockApprovalRepository, MockSalonRepository, MockSalonServiceRepository,
        MockStaffRepository, ProfileRole,
    };

    type Svc = SalonServiceImpl<
        MockSalonRepository,
        MockApprovalRepository,
        MockSalonServiceRepository,
        MockStaffRepository,
    >;

    const OWNER: i64 = 7;

    fn service(salons: MockSalonRepository, approvals: MockApprovalRepository) -> Svc {
        SalonServiceImpl::new(
            Arc::new(salons),
            Arc::new(approvals),
            Arc::new(MockSalonServiceRepository::new()),
            Arc::new(MockStaffRepository::new()),
            Arc::new(SnowflakeGenerator::new(1, 1)),
        )
    }

    fn time(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    fn salon(status: SalonStatus) -> Salon {
        let now = Utc::now();
        Salon {
            id: 1,
            owner_id: OWNER,
            name: "Shear Joy".into(),
            description: None,
            address: "9 Elm Rd".into(),
            city: "Bristol".into(),
            phone: None,
            image_url: None,
            status,
            opening_time: time(9),
            closing_time: time(18),
            utc_offset_minutes: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn create_dto(open: u32, close: u32) -> CreateSalonDto {
        CreateSalonDto {
            name: " Shear Joy ".into(),
            description: None,
            address: "9 Elm Rd".into(),
            city: "Bristol".into(),
            phone: None,
            image_url: None,
            opening_time: time(open),
            closing_time: time(close),
            utc_offset_minutes: 0,
        }
    }

    #[tokio::test]
    async fn test_create_salon_is_pending_with_request() {
        let mut salons = MockSalonRepository::new();
        salons
            .expect_create_with_request()
            .withf(|s, r| {
                s.status == SalonStatus::Pending
                    && s.name == "Shear Joy"
                    && r.kind == ApprovalKind::NewSalon
                    && r.salon_id == s.id
            })
            .returning(|s, _| Ok(s.clone()));

        let svc = service(salons, MockApprovalRepository::new());
        let actor = Actor::new(OWNER, ProfileRole::Customer);
        let created = svc.create_salon(&actor, create_dto(9, 18)).await.unwrap();
        assert_eq!(created.owner_id, OWNER);
    }

    #[tokio::test]
    async fn test_create_salon_rejects_inverted_hours() {
        let svc = service(MockSalonRepository::new(), MockApprovalRepository::new());
        let actor = Actor::new(OWNER, ProfileRole::Customer);
        let err = svc.create_salon(&actor, create_dto(18, 9)).await.unwrap_err();
        assert!(matches!(err, SalonError::InvalidHours));
        assert!(matches!(AppError::from(err), AppError::InvalidFields(_)));
    }

    #[tokio::test]
    async fn test_pending_salon_hidden_from_public() {
        let mut salons = MockSalonRepository::new();
        salons
            .expect_find_by_id()
            .returning(|_| Ok(Some(salon(SalonStatus::Pending))));
        let svc = service(salons, MockApprovalRepository::new());

        assert!(matches!(svc.get_salon(None, 1).await, Err(SalonError::NotFound)));
        let owner = Actor::new(OWNER, ProfileRole::SalonOwner);
        assert!(svc.get_salon(Some(&owner), 1).await.is_ok());
    }

    #[tokio::test]
    async fn test_second_pending_update_conflicts() {
        let mut salons = MockSalonRepository::new();
        salons
            .expect_find_by_id()
            .returning(|_| Ok(Some(salon(SalonStatus::Approved))));
        let mut approvals = MockApprovalRepository::new();
        approvals.expect_has_pending().returning(|_, _| Ok(true));
        approvals.expect_create().never();

        let svc = service(salons, approvals);
        let changes = SalonChanges {
            name: Some("Shear Delight".into()),
            ..Default::default()
        };
        let err = svc
            .request_salon_update(&Actor::new(OWNER, ProfileRole::SalonOwner), 1, changes)
            .await
            .unwrap_err();
        assert!(matches!(err, SalonError::UpdatePending));
    }

    #[tokio::test]
    async fn test_update_request_checks_resulting_hours() {
        let mut salons = MockSalonRepository::new();
        salons
            .expect_find_by_id()
            .returning(|_| Ok(Some(salon(SalonStatus::Approved))));
        let svc = service(salons, MockApprovalRepository::new());

        let changes = SalonChanges {
            opening_time: Some(time(19)),
            ..Default::default()
        };
        let err = svc
            .request_salon_update(&Actor::new(OWNER, ProfileRole::SalonOwner), 1, changes)
            .await
            .unwrap_err();
        assert!(matches!(err, SalonError::InvalidHours));
    }

    #[tokio::test]
    async fn test_only_owner_requests_updates() {
        let mut salons = MockSalonRepository::new();
        salons
            .expect_find_by_id()
            .returning(|_| Ok(Some(salon(SalonStatus::Approved))));
        let svc = service(salons, MockApprovalRepository::new());

        let err = svc
            .request_salon_update(
                &Actor::new(99, ProfileRole::SalonOwner),
                1,
                SalonChanges::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SalonError::Forbidden));
    }

    #[tokio::test]
    async fn test_set_status_requires_admin() {
        let svc = service(MockSalonRepository::new(), MockApprovalRepository::new());
        let err = svc
            .set_salon_status(&Actor::new(OWNER, ProfileRole::SalonOwner), 1, SalonStatus::Approved)
            .await
            .unwrap_err();
        assert!(matches!(err, SalonError::Forbidden));
    }

    #[tokio::test]
    async fn test_list_forces_approved_filter() {
        let mut salons = MockSalonRepository::new();
        salons
            .expect_list()
            .withf(|f| f.status == Some(SalonStatus::Approved) && f.limit == 20)
            .returning(|_| Ok(vec![]));
        let svc = service(salons, MockApprovalRepository::new());

        let filter = SalonFilter {
            status: Some(SalonStatus::Pending),
            limit: 20,
            ..Default::default()
        };
        assert!(svc.list_salons(filter).await.unwrap().is_empty());
    }
}
