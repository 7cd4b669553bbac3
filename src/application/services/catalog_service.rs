//! Catalog Service
//!
//! The platform-wide service catalog and the services each salon sells.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::instrument;

use crate::domain::services::AccessPolicy;
use crate::domain::{
    Actor, ApprovalKind, ApprovalRepository, ApprovalRequest, GlobalService, GlobalServiceChanges,
    GlobalServiceDraft, GlobalServiceRepository, Salon, SalonRepository, SalonService,
    SalonServiceChanges, SalonServiceRepository,
};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

pub const MIN_DURATION_MINUTES: i32 = 5;
pub const MAX_DURATION_MINUTES: i32 = 480;
pub const DURATION_STEP_MINUTES: i32 = 5;

/// Read-through cache of the active global catalog.
///
/// Implementations swallow and log their own failures; a cache outage only
/// costs a database query.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogCache: Send + Sync {
    async fn load(&self) -> Option<Vec<GlobalService>>;

    async fn store(&self, services: &[GlobalService]);

    async fn invalidate(&self);
}

/// Catalog service trait
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Active catalog entries, optionally for one category
    async fn list_global_services(&self, category: Option<String>)
        -> Result<Vec<GlobalService>, CatalogError>;

    async fn create_global_service(&self, actor: &Actor, draft: GlobalServiceDraft)
        -> Result<GlobalService, CatalogError>;

    async fn update_global_service(
        &self,
        actor: &Actor,
        id: i64,
        changes: GlobalServiceChanges,
    ) -> Result<GlobalService, CatalogError>;

    async fn deactivate_global_service(&self, actor: &Actor, id: i64)
        -> Result<GlobalService, CatalogError>;

    /// Owner proposal for a new catalog entry, reviewed by an admin
    async fn request_global_service(
        &self,
        actor: &Actor,
        salon_id: i64,
        draft: GlobalServiceDraft,
    ) -> Result<ApprovalRequest, CatalogError>;

    async fn add_salon_service(
        &self,
        actor: &Actor,
        salon_id: i64,
        request: NewSalonServiceDto,
    ) -> Result<SalonService, CatalogError>;

    async fn update_salon_service(
        &self,
        actor: &Actor,
        service_id: i64,
        changes: SalonServiceChanges,
    ) -> Result<SalonService, CatalogError>;

    /// Soft delete: the service stops being bookable, history keeps it
    async fn remove_salon_service(&self, actor: &Actor, service_id: i64)
        -> Result<SalonService, CatalogError>;
}

/// New salon service input. Name and category fall back to the linked
/// catalog entry when omitted.
#[derive(Debug, Clone, Default)]
pub struct NewSalonServiceDto {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price_cents: i64,
    pub duration_minutes: i32,
    pub global_service_id: Option<i64>,
}

/// Catalog service errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Admin access required")]
    AdminOnly,

    #[error("You do not manage this salon")]
    Forbidden,

    #[error("Catalog service is not available")]
    GlobalServiceInactive,

    #[error("{field}: {message}")]
    Invalid {
        field: &'static str,
        message: &'static str,
    },

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<CatalogError> for AppError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::NotFound(_) => AppError::NotFound(e.to_string()),
            CatalogError::AdminOnly | CatalogError::Forbidden => AppError::Forbidden(e.to_string()),
            CatalogError::GlobalServiceInactive => AppError::BadRequest(e.to_string()),
            CatalogError::Invalid { field, message } => AppError::field(field, message),
            CatalogError::Store(inner) => inner,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_price(price_cents: i64) -> Result<(), CatalogError> {
    if price_cents < 0 {
        return Err(CatalogError::Invalid {
            field: "price_cents",
            message: "Price cannot be negative",
        });
    }
    Ok(())
}

fn check_duration(minutes: i32) -> Result<(), CatalogError> {
    if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&minutes)
        || minutes % DURATION_STEP_MINUTES != 0
    {
        return Err(CatalogError::Invalid {
            field: "duration_minutes",
            message: "Duration must be 5 to 480 minutes in steps of 5",
        });
    }
    Ok(())
}

/// CatalogService implementation
pub struct CatalogServiceImpl<G, V, S, A, C>
where
    G: GlobalServiceRepository,
    V: SalonServiceRepository,
    S: SalonRepository,
    A: ApprovalRepository,
    C: CatalogCache,
{
    global_repo: Arc<G>,
    service_repo: Arc<V>,
    salon_repo: Arc<S>,
    approval_repo: Arc<A>,
    cache: Arc<C>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<G, V, S, A, C> CatalogServiceImpl<G, V, S, A, C>
where
    G: GlobalServiceRepository,
    V: SalonServiceRepository,
    S: SalonRepository,
    A: ApprovalRepository,
    C: CatalogCache,
{
    pub fn new(
        global_repo: Arc<G>,
        service_repo: Arc<V>,
        salon_repo: Arc<S>,
        approval_repo: Arc<A>,
        cache: Arc<C>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            global_repo,
            service_repo,
            salon_repo,
            approval_repo,
            cache,
            id_generator,
        }
    }

    async fn managed_salon(&self, actor: &Actor, salon_id: i64) -> Result<Salon, CatalogError> {
        let salon = self
            .salon_repo
            .find_by_id(salon_id)
            .await?
            .ok_or(CatalogError::NotFound("Salon"))?;
        if !AccessPolicy::can_manage_salon(actor, &salon) {
            return Err(CatalogError::Forbidden);
        }
        Ok(salon)
    }

    async fn managed_service(&self, actor: &Actor, service_id: i64) -> Result<SalonService, CatalogError> {
        let service = self
            .service_repo
            .find_by_id(service_id)
            .await?
            .ok_or(CatalogError::NotFound("Service"))?;
        self.managed_salon(actor, service.salon_id).await?;
        Ok(service)
    }

    async fn active_catalog(&self) -> Result<Vec<GlobalService>, CatalogError> {
        if let Some(cached) = self.cache.load().await {
            return Ok(cached);
        }
        let services = self.global_repo.list_active(None).await?;
        self.cache.store(&services).await;
        Ok(services)
    }
}

#[async_trait]
impl<G, V, S, A, C> CatalogService for CatalogServiceImpl<G, V, S, A, C>
where
    G: GlobalServiceRepository + 'static,
    V: SalonServiceRepository + 'static,
    S: SalonRepository + 'static,
    A: ApprovalRepository + 'static,
    C: CatalogCache + 'static,
{
    async fn list_global_services(
        &self,
        category: Option<String>,
    ) -> Result<Vec<GlobalService>, CatalogError> {
        let services = self.active_catalog().await?;
        Ok(match non_blank(category) {
            Some(category) => services
                .into_iter()
                .filter(|s| s.category.eq_ignore_ascii_case(&category))
                .collect(),
            None => services,
        })
    }

    #[instrument(skip(self, draft), fields(admin_id = actor.profile_id))]
    async fn create_global_service(
        &self,
        actor: &Actor,
        draft: GlobalServiceDraft,
    ) -> Result<GlobalService, CatalogError> {
        if !actor.is_admin() {
            return Err(CatalogError::AdminOnly);
        }
        let service = draft.into_service(self.id_generator.generate());
        let created = self.global_repo.create(&service).await?;
        self.cache.invalidate().await;
        Ok(created)
    }

    #[instrument(skip(self, changes), fields(admin_id = actor.profile_id))]
    async fn update_global_service(
        &self,
        actor: &Actor,
        id: i64,
        changes: GlobalServiceChanges,
    ) -> Result<GlobalService, CatalogError> {
        if !actor.is_admin() {
            return Err(CatalogError::AdminOnly);
        }
        self.global_repo
            .find_by_id(id)
            .await?
            .ok_or(CatalogError::NotFound("Catalog service"))?;
        let updated = self.global_repo.update(id, &changes).await?;
        self.cache.invalidate().await;
        Ok(updated)
    }

    async fn deactivate_global_service(
        &self,
        actor: &Actor,
        id: i64,
    ) -> Result<GlobalService, CatalogError> {
        let changes = GlobalServiceChanges {
            is_active: Some(false),
            ..Default::default()
        };
        self.update_global_service(actor, id, changes).await
    }

    #[instrument(skip(self, draft), fields(actor_id = actor.profile_id))]
    async fn request_global_service(
        &self,
        actor: &Actor,
        salon_id: i64,
        draft: GlobalServiceDraft,
    ) -> Result<ApprovalRequest, CatalogError> {
        self.managed_salon(actor, salon_id).await?;

        let payload = serde_json::to_value(&draft)
            .map_err(|e| AppError::Internal(format!("Serialize service draft: {}", e)))?;
        let request = ApprovalRequest::new(
            self.id_generator.generate(),
            salon_id,
            actor.profile_id,
            ApprovalKind::NewService,
            payload,
        );
        Ok(self.approval_repo.create(&request).await?)
    }

    #[instrument(skip(self, request), fields(actor_id = actor.profile_id))]
    async fn add_salon_service(
        &self,
        actor: &Actor,
        salon_id: i64,
        request: NewSalonServiceDto,
    ) -> Result<SalonService, CatalogError> {
        let mut name = non_blank(request.name);
        let mut category = non_blank(request.category);

        if let Some(global_id) = request.global_service_id {
            let global = self
                .global_repo
                .find_by_id(global_id)
                .await?
                .ok_or(CatalogError::NotFound("Catalog service"))?;
            if !global.is_active {
                return Err(CatalogError::GlobalServiceInactive);
            }
            name = name.or(Some(global.name));
            category = category.or(Some(global.category));
        }

        let category = category.ok_or(CatalogError::Invalid {
            field: "category",
            message: "Category is required",
        })?;
        let name = name.ok_or(CatalogError::Invalid {
            field: "name",
            message: "Name is required",
        })?;
        check_price(request.price_cents)?;
        check_duration(request.duration_minutes)?;

        self.managed_salon(actor, salon_id).await?;

        let now = Utc::now();
        let service = SalonService {
            id: self.id_generator.generate(),
            salon_id,
            global_service_id: request.global_service_id,
            name,
            category,
            price_cents: request.price_cents,
            duration_minutes: request.duration_minutes,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        Ok(self.service_repo.create(&service).await?)
    }

    async fn update_salon_service(
        &self,
        actor: &Actor,
        service_id: i64,
        changes: SalonServiceChanges,
    ) -> Result<SalonService, CatalogError> {
        if let Some(price) = changes.price_cents {
            check_price(price)?;
        }
        if let Some(minutes) = changes.duration_minutes {
            check_duration(minutes)?;
        }
        if matches!(&changes.category, Some(c) if c.trim().is_empty()) {
            return Err(CatalogError::Invalid {
                field: "category",
                message: "Category is required",
            });
        }

        self.managed_service(actor, service_id).await?;
        Ok(self.service_repo.update(service_id, &changes).await?)
    }

    async fn remove_salon_service(
        &self,
        actor: &Actor,
        service_id: i64,
    ) -> Result<SalonService, CatalogError> {
        self.managed_service(actor, service_id).await?;
        let changes = SalonServiceChanges {
            is_active: Some(false),
            ..Default::default()
        };
        Ok(self.service_repo.update(service_id, &changes).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        MockApprovalRepository, MockGlobalServiceRepository, MockSalonRepository,
        MockSalonServiceRepository, ProfileRole, SalonStatus,
    };
    use chrono::NaiveTime;
    use test_case::test_case;

    type Svc = CatalogServiceImpl<
        MockGlobalServiceRepository,
        MockSalonServiceRepository,
        MockSalonRepository,
        MockApprovalRepository,
        MockCatalogCache,
    >;

    const OWNER: i64 = 3;

    struct Mocks {
        global: MockGlobalServiceRepository,
        services: MockSalonServiceRepository,
        salons: MockSalonRepository,
        approvals: MockApprovalRepository,
        cache: MockCatalogCache,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                global: MockGlobalServiceRepository::new(),
                services: MockSalonServiceRepository::new(),
                salons: MockSalonRepository::new(),
                approvals: MockApprovalRepository::new(),
                cache: MockCatalogCache::new(),
            }
        }

        fn with_owned_salon(mut self) -> Self {
            self.salons.expect_find_by_id().returning(|id| Ok(Some(salon(id))));
            self
        }

        fn build(self) -> Svc {
            CatalogServiceImpl::new(
                Arc::new(self.global),
                Arc::new(self.services),
                Arc::new(self.salons),
                Arc::new(self.approvals),
                Arc::new(self.cache),
                Arc::new(SnowflakeGenerator::new(1, 1)),
            )
        }
    }

    fn salon(id: i64) -> Salon {
        let now = Utc::now();
        Salon {
            id,
            owner_id: OWNER,
            name: "Glow".into(),
            description: None,
            address: "1 Side St".into(),
            city: "York".into(),
            phone: None,
            image_url: None,
            status: SalonStatus::Approved,
            opening_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            closing_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            utc_offset_minutes: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn global(id: i64, category: &str, active: bool) -> GlobalService {
        let now = Utc::now();
        GlobalService {
            id,
            name: format!("Service {id}"),
            category: category.into(),
            description: None,
            is_active: active,
            created_at: now,
            updated_at: now,
        }
    }

    fn owner() -> Actor {
        Actor::new(OWNER, ProfileRole::SalonOwner)
    }

    #[tokio::test]
    async fn test_missing_category_is_a_field_error() {
        let svc = Mocks::new().build();
        let request = NewSalonServiceDto {
            name: Some("Beard trim".into()),
            category: Some("   ".into()),
            price_cents: 1500,
            duration_minutes: 20,
            global_service_id: None,
        };

        let err = svc.add_salon_service(&owner(), 1, request).await.unwrap_err();
        assert_eq!(err.to_string(), "category: Category is required");
        match AppError::from(err) {
            AppError::InvalidFields(fields) => assert_eq!(fields[0].field, "category"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_category_falls_back_to_catalog_entry() {
        let mut mocks = Mocks::new().with_owned_salon();
        mocks
            .global
            .expect_find_by_id()
            .returning(|id| Ok(Some(global(id, "Hair", true))));
        mocks
            .services
            .expect_create()
            .withf(|s| s.category == "Hair" && s.name == "Service 9" && s.global_service_id == Some(9))
            .returning(|s| Ok(s.clone()));

        let request = NewSalonServiceDto {
            price_cents: 3000,
            duration_minutes: 45,
            global_service_id: Some(9),
            ..Default::default()
        };
        let created = mocks.build().add_salon_service(&owner(), 1, request).await.unwrap();
        assert!(created.is_active);
    }

    #[tokio::test]
    async fn test_inactive_catalog_entry_rejected() {
        let mut mocks = Mocks::new();
        mocks
            .global
            .expect_find_by_id()
            .returning(|id| Ok(Some(global(id, "Hair", false))));

        let request = NewSalonServiceDto {
            global_service_id: Some(9),
            price_cents: 100,
            duration_minutes: 30,
            ..Default::default()
        };
        let err = mocks.build().add_salon_service(&owner(), 1, request).await.unwrap_err();
        assert!(matches!(err, CatalogError::GlobalServiceInactive));
    }

    #[test_case(0, false)]
    #[test_case(5, true)]
    #[test_case(42, false; "not a multiple of five")]
    #[test_case(480, true)]
    #[test_case(485, false)]
    fn test_duration_rules(minutes: i32, ok: bool) {
        assert_eq!(check_duration(minutes).is_ok(), ok);
    }

    #[tokio::test]
    async fn test_other_owner_cannot_add_service() {
        let svc = Mocks::new().with_owned_salon().build();
        let request = NewSalonServiceDto {
            name: Some("Trim".into()),
            category: Some("Hair".into()),
            price_cents: 100,
            duration_minutes: 30,
            global_service_id: None,
        };
        let stranger = Actor::new(77, ProfileRole::SalonOwner);
        let err = svc.add_salon_service(&stranger, 1, request).await.unwrap_err();
        assert!(matches!(err, CatalogError::Forbidden));
    }

    #[tokio::test]
    async fn test_listing_uses_cache_and_filters_category() {
        let mut mocks = Mocks::new();
        mocks
            .cache
            .expect_load()
            .returning(|| Some(vec![global(1, "Hair", true), global(2, "Nails", true)]));
        mocks.global.expect_list_active().never();

        let listed = mocks
            .build()
            .list_global_services(Some("nails".into()))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, 2);
    }

    #[tokio::test]
    async fn test_cache_miss_populates_cache() {
        let mut mocks = Mocks::new();
        mocks.cache.expect_load().returning(|| None);
        mocks
            .global
            .expect_list_active()
            .times(1)
            .returning(|_| Ok(vec![global(1, "Hair", true)]));
        mocks.cache.expect_store().times(1).return_const(());

        let listed = mocks.build().list_global_services(None).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_admin_write_invalidates_cache() {
        let mut mocks = Mocks::new();
        mocks.global.expect_create().returning(|s| Ok(s.clone()));
        mocks.cache.expect_invalidate().times(1).return_const(());

        let draft = GlobalServiceDraft {
            name: "Gel nails".into(),
            category: "Nails".into(),
            description: None,
        };
        let admin = Actor::new(1, ProfileRole::Admin);
        assert!(mocks.build().create_global_service(&admin, draft).await.is_ok());
    }

    #[tokio::test]
    async fn test_catalog_writes_are_admin_only() {
        let draft = GlobalServiceDraft {
            name: "Gel nails".into(),
            category: "Nails".into(),
            description: None,
        };
        let err = Mocks::new()
            .build()
            .create_global_service(&owner(), draft)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::AdminOnly));
    }

    #[tokio::test]
    async fn test_service_request_creates_approval() {
        let mut mocks = Mocks::new().with_owned_salon();
        mocks
            .approvals
            .expect_create()
            .withf(|r| r.kind == ApprovalKind::NewService && r.payload["category"] == "Brows")
            .returning(|r| Ok(r.clone()));

        let draft = GlobalServiceDraft {
            name: "Brow lamination".into(),
            category: "Brows".into(),
            description: None,
        };
        let request = mocks.build().request_global_service(&owner(), 1, draft).await.unwrap();
        assert!(request.is_pending());
    }
}
