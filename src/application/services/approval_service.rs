//! Approval Service
//!
//! Admin review of owner-submitted changes. Approving applies the change in
//! the same transaction that records the decision.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use crate::application::services::catalog_service::CatalogCache;
use crate::domain::{
    Actor, ApprovalDecision, ApprovalEffect, ApprovalKind, ApprovalRepository, ApprovalRequest,
    ApprovalStatus, GlobalServiceDraft, SalonChanges,
};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

/// Approval service trait
#[async_trait]
pub trait ApprovalService: Send + Sync {
    /// Requests the caller submitted, newest first
    async fn list_my_requests(&self, actor: &Actor) -> Result<Vec<ApprovalRequest>, ApprovalError>;

    /// Admin queue, oldest first
    async fn list_requests(&self, actor: &Actor, status: Option<ApprovalStatus>)
        -> Result<Vec<ApprovalRequest>, ApprovalError>;

    async fn approve(&self, actor: &Actor, request_id: i64, note: Option<String>)
        -> Result<ApprovalRequest, ApprovalError>;

    /// A note explaining the rejection is mandatory
    async fn reject(&self, actor: &Actor, request_id: i64, note: Option<String>)
        -> Result<ApprovalRequest, ApprovalError>;
}

/// Approval service errors
#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    #[error("Approval request not found")]
    NotFound,

    #[error("Admin access required")]
    AdminOnly,

    #[error("Request has already been reviewed")]
    AlreadyReviewed,

    #[error("A note is required when rejecting")]
    NoteRequired,

    #[error("Request payload is malformed: {0}")]
    BadPayload(String),

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<ApprovalError> for AppError {
    fn from(e: ApprovalError) -> Self {
        match e {
            ApprovalError::NotFound => AppError::NotFound(e.to_string()),
            ApprovalError::AdminOnly => AppError::Forbidden(e.to_string()),
            ApprovalError::AlreadyReviewed => AppError::Conflict(e.to_string()),
            ApprovalError::NoteRequired => AppError::field("note", &e.to_string()),
            ApprovalError::BadPayload(_) => AppError::Internal(e.to_string()),
            ApprovalError::Store(inner) => inner,
        }
    }
}

/// ApprovalService implementation
pub struct ApprovalServiceImpl<A, C>
where
    A: ApprovalRepository,
    C: CatalogCache,
{
    approval_repo: Arc<A>,
    catalog_cache: Arc<C>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<A, C> ApprovalServiceImpl<A, C>
where
    A: ApprovalRepository,
    C: CatalogCache,
{
    pub fn new(approval_repo: Arc<A>, catalog_cache: Arc<C>, id_generator: Arc<SnowflakeGenerator>) -> Self {
        Self {
            approval_repo,
            catalog_cache,
            id_generator,
        }
    }

    async fn pending(&self, actor: &Actor, request_id: i64) -> Result<ApprovalRequest, ApprovalError> {
        if !actor.is_admin() {
            return Err(ApprovalError::AdminOnly);
        }
        let request = self
            .approval_repo
            .find_by_id(request_id)
            .await?
            .ok_or(ApprovalError::NotFound)?;
        if !request.is_pending() {
            return Err(ApprovalError::AlreadyReviewed);
        }
        Ok(request)
    }

    fn approval_effect(&self, request: &ApprovalRequest) -> Result<ApprovalEffect, ApprovalError> {
        let salon_id = request.salon_id;
        Ok(match request.kind {
            ApprovalKind::NewSalon => ApprovalEffect::ListSalon { salon_id },
            ApprovalKind::SalonUpdate => {
                let changes: SalonChanges = serde_json::from_value(request.payload.clone())
                    .map_err(|e| ApprovalError::BadPayload(e.to_string()))?;
                ApprovalEffect::UpdateSalon { salon_id, changes }
            }
            ApprovalKind::NewService => {
                let draft: GlobalServiceDraft = serde_json::from_value(request.payload.clone())
                    .map_err(|e| ApprovalError::BadPayload(e.to_string()))?;
                ApprovalEffect::AddGlobalService(draft.into_service(self.id_generator.generate()))
            }
        })
    }

    async fn resolve(
        &self,
        actor: &Actor,
        request: &ApprovalRequest,
        status: ApprovalStatus,
        note: Option<String>,
        effect: ApprovalEffect,
    ) -> Result<ApprovalRequest, ApprovalError> {
        let touches_catalog = matches!(effect, ApprovalEffect::AddGlobalService(_));
        let decision = ApprovalDecision {
            status,
            reviewer_id: actor.profile_id,
            note,
            effect,
        };

        // The repository re-checks PENDING under a row lock
        let resolved = self
            .approval_repo
            .resolve(request.id, &decision)
            .await?
            .ok_or(ApprovalError::AlreadyReviewed)?;

        if touches_catalog {
            self.catalog_cache.invalidate().await;
        }
        tracing::info!(
            request_id = request.id,
            kind = request.kind.as_str(),
            status = status.as_str(),
            "Approval request reviewed"
        );
        Ok(resolved)
    }
}

#[async_trait]
impl<A, C> ApprovalService for ApprovalServiceImpl<A, C>
where
    A: ApprovalRepository + 'static,
    C: CatalogCache + 'static,
{
    async fn list_my_requests(&self, actor: &Actor) -> Result<Vec<ApprovalRequest>, ApprovalError> {
        Ok(self.approval_repo.find_by_requester(actor.profile_id).await?)
    }

    async fn list_requests(
        &self,
        actor: &Actor,
        status: Option<ApprovalStatus>,
    ) -> Result<Vec<ApprovalRequest>, ApprovalError> {
        if !actor.is_admin() {
            return Err(ApprovalError::AdminOnly);
        }
        Ok(self.approval_repo.list(status).await?)
    }

    #[instrument(skip(self, note), fields(admin_id = actor.profile_id))]
    async fn approve(
        &self,
        actor: &Actor,
        request_id: i64,
        note: Option<String>,
    ) -> Result<ApprovalRequest, ApprovalError> {
        let request = self.pending(actor, request_id).await?;
        let effect = self.approval_effect(&request)?;
        let note = note.filter(|n| !n.trim().is_empty());
        self.resolve(actor, &request, ApprovalStatus::Approved, note, effect)
            .await
    }

    #[instrument(skip(self, note), fields(admin_id = actor.profile_id))]
    async fn reject(
        &self,
        actor: &Actor,
        request_id: i64,
        note: Option<String>,
    ) -> Result<ApprovalRequest, ApprovalError> {
        let note = note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or(ApprovalError::NoteRequired)?;
        let request = self.pending(actor, request_id).await?;

        let effect = match request.kind {
            ApprovalKind::NewSalon => ApprovalEffect::RejectSalon {
                salon_id: request.salon_id,
            },
            ApprovalKind::SalonUpdate | ApprovalKind::NewService => ApprovalEffect::None,
        };
        self.resolve(actor, &request, ApprovalStatus::Rejected, Some(note), effect)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::catalog_service::MockCatalogCache;
    use crate::domain::{MockApprovalRepository, ProfileRole};
    use serde_json::json;

    fn admin() -> Actor {
        Actor::new(1, ProfileRole::Admin)
    }

    fn request(kind: ApprovalKind, payload: serde_json::Value) -> ApprovalRequest {
        ApprovalRequest::new(50, 10, 7, kind, payload)
    }

    fn service(
        approvals: MockApprovalRepository,
        cache: MockCatalogCache,
    ) -> ApprovalServiceImpl<MockApprovalRepository, MockCatalogCache> {
        ApprovalServiceImpl::new(
            Arc::new(approvals),
            Arc::new(cache),
            Arc::new(SnowflakeGenerator::new(1, 1)),
        )
    }

    fn resolved(decision: &ApprovalDecision, kind: ApprovalKind) -> ApprovalRequest {
        let mut r = request(kind, json!({}));
        r.status = decision.status;
        r.reviewer_id = Some(decision.reviewer_id);
        r.review_note = decision.note.clone();
        r
    }

    #[tokio::test]
    async fn test_approve_new_salon_lists_it() {
        let mut approvals = MockApprovalRepository::new();
        approvals
            .expect_find_by_id()
            .returning(|_| Ok(Some(request(ApprovalKind::NewSalon, json!({ "name": "A" })))));
        approvals
            .expect_resolve()
            .withf(|_, d| {
                d.status == ApprovalStatus::Approved
                    && matches!(d.effect, ApprovalEffect::ListSalon { salon_id: 10 })
            })
            .returning(|_, d| Ok(Some(resolved(d, ApprovalKind::NewSalon))));

        let approved = service(approvals, MockCatalogCache::new())
            .approve(&admin(), 50, None)
            .await
            .unwrap();
        assert_eq!(approved.status, ApprovalStatus::Approved);
    }

    #[tokio::test]
    async fn test_approve_salon_update_carries_changes() {
        let mut approvals = MockApprovalRepository::new();
        approvals.expect_find_by_id().returning(|_| {
            Ok(Some(request(ApprovalKind::SalonUpdate, json!({ "city": "Porto", "closing_time": "20:00:00" }))))
        });
        approvals
            .expect_resolve()
            .withf(|_, d| match &d.effect {
                ApprovalEffect::UpdateSalon { changes, .. } => {
                    changes.city.as_deref() == Some("Porto") && changes.closing_time.is_some()
                }
                _ => false,
            })
            .returning(|_, d| Ok(Some(resolved(d, ApprovalKind::SalonUpdate))));

        assert!(service(approvals, MockCatalogCache::new())
            .approve(&admin(), 50, Some("ok".into()))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_approve_new_service_invalidates_catalog() {
        let mut approvals = MockApprovalRepository::new();
        approvals.expect_find_by_id().returning(|_| {
            Ok(Some(request(ApprovalKind::NewService, json!({ "name": "Lash lift", "category": "Lashes" }))))
        });
        approvals
            .expect_resolve()
            .withf(|_, d| matches!(&d.effect, ApprovalEffect::AddGlobalService(s) if s.category == "Lashes"))
            .returning(|_, d| Ok(Some(resolved(d, ApprovalKind::NewService))));
        let mut cache = MockCatalogCache::new();
        cache.expect_invalidate().times(1).return_const(());

        assert!(service(approvals, cache).approve(&admin(), 50, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_reject_requires_note() {
        let err = service(MockApprovalRepository::new(), MockCatalogCache::new())
            .reject(&admin(), 50, Some("   ".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApprovalError::NoteRequired));
        assert!(matches!(AppError::from(err), AppError::InvalidFields(_)));
    }

    #[tokio::test]
    async fn test_reject_new_salon_marks_salon_rejected() {
        let mut approvals = MockApprovalRepository::new();
        approvals
            .expect_find_by_id()
            .returning(|_| Ok(Some(request(ApprovalKind::NewSalon, json!({})))));
        approvals
            .expect_resolve()
            .withf(|_, d| {
                matches!(d.effect, ApprovalEffect::RejectSalon { salon_id: 10 })
                    && d.note.as_deref() == Some("Missing address proof")
            })
            .returning(|_, d| Ok(Some(resolved(d, ApprovalKind::NewSalon))));

        let rejected = service(approvals, MockCatalogCache::new())
            .reject(&admin(), 50, Some(" Missing address proof ".into()))
            .await
            .unwrap();
        assert_eq!(rejected.status, ApprovalStatus::Rejected);
    }

    #[tokio::test]
    async fn test_reviewed_request_conflicts() {
        let mut approvals = MockApprovalRepository::new();
        approvals.expect_find_by_id().returning(|_| {
            let mut r = request(ApprovalKind::NewSalon, json!({}));
            r.status = ApprovalStatus::Approved;
            Ok(Some(r))
        });
        approvals.expect_resolve().never();

        let err = service(approvals, MockCatalogCache::new())
            .approve(&admin(), 50, None)
            .await
            .unwrap_err();
        assert!(matches!(AppError::from(err), AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_concurrent_review_maps_to_already_reviewed() {
        let mut approvals = MockApprovalRepository::new();
        approvals
            .expect_find_by_id()
            .returning(|_| Ok(Some(request(ApprovalKind::NewSalon, json!({})))));
        approvals
            .expect_resolve()
            .returning(|_, _| Ok(None));

        let err = service(approvals, MockCatalogCache::new())
            .approve(&admin(), 50, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApprovalError::AlreadyReviewed));
    }

    #[tokio::test]
    async fn test_duplicate_catalog_entry_keeps_its_own_conflict() {
        let mut approvals = MockApprovalRepository::new();
        approvals.expect_find_by_id().returning(|_| {
            Ok(Some(request(ApprovalKind::NewService, json!({ "name": "Lash lift", "category": "Lashes" }))))
        });
        approvals.expect_resolve().returning(|_, _| {
            Err(AppError::Conflict(
                "A service with this name already exists in the category".into(),
            ))
        });
        let mut cache = MockCatalogCache::new();
        cache.expect_invalidate().never();

        let err = service(approvals, cache)
            .approve(&admin(), 50, None)
            .await
            .unwrap_err();

        assert!(!matches!(err, ApprovalError::AlreadyReviewed));
        match AppError::from(err) {
            AppError::Conflict(msg) => {
                assert_eq!(msg, "A service with this name already exists in the category")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_opening_hours_conflict_is_not_reported_as_reviewed() {
        let mut approvals = MockApprovalRepository::new();
        approvals.expect_find_by_id().returning(|_| {
            Ok(Some(request(ApprovalKind::SalonUpdate, json!({ "closing_time": "08:00:00" }))))
        });
        approvals.expect_resolve().returning(|_, _| {
            Err(AppError::Conflict(
                "Approving this update would leave the salon with empty opening hours".into(),
            ))
        });

        let err = service(approvals, MockCatalogCache::new())
            .approve(&admin(), 50, None)
            .await
            .unwrap_err();

        assert!(matches!(&err, ApprovalError::Store(AppError::Conflict(msg)) if msg.contains("opening hours")));
    }

    #[tokio::test]
    async fn test_owners_cannot_review() {
        let owner = Actor::new(7, ProfileRole::SalonOwner);
        let err = service(MockApprovalRepository::new(), MockCatalogCache::new())
            .approve(&owner, 50, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApprovalError::AdminOnly));
    }
}
