//! Catalog Handlers
//!
//! Platform service catalog and per-salon service menus.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::request::{
    parse_field_id, CatalogQuery, CreateSalonServiceRequest, GlobalServiceRequest,
    UpdateGlobalServiceRequest, UpdateSalonServiceRequest,
};
use crate::application::dto::response::{
    list, ApprovalResponse, GlobalServiceResponse, SalonServiceResponse,
};
use crate::application::services::{CatalogService, CatalogServiceImpl};
use crate::infrastructure::cache::RedisCatalogCache;
use crate::infrastructure::repositories::{
    PgApprovalRepository, PgGlobalServiceRepository, PgSalonRepository, PgSalonServiceRepository,
};
use crate::presentation::http::extractors::ValidatedJson;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

type Catalog = CatalogServiceImpl<
    PgGlobalServiceRepository,
    PgSalonServiceRepository,
    PgSalonRepository,
    PgApprovalRepository,
    RedisCatalogCache,
>;

fn service(state: &AppState) -> Catalog {
    CatalogServiceImpl::new(
        Arc::new(PgGlobalServiceRepository::new(state.db.clone())),
        Arc::new(PgSalonServiceRepository::new(state.db.clone())),
        Arc::new(PgSalonRepository::new(state.db.clone())),
        Arc::new(PgApprovalRepository::new(state.db.clone())),
        state.catalog_cache.clone(),
        state.snowflake.clone(),
    )
}

pub async fn list_global_services(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<GlobalServiceResponse>>, AppError> {
    let services = service(&state).list_global_services(query.category).await?;
    Ok(Json(list(services)))
}

pub async fn create_global_service(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(body): ValidatedJson<GlobalServiceRequest>,
) -> Result<(StatusCode, Json<GlobalServiceResponse>), AppError> {
    let created = service(&state)
        .create_global_service(&user.actor(), body.into())
        .await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

pub async fn update_global_service(
    State(state): State<AppState>,
    user: AuthUser,
    Path(service_id): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdateGlobalServiceRequest>,
) -> Result<Json<GlobalServiceResponse>, AppError> {
    let service_id = parse_field_id("service_id", &service_id)?;
    let updated = service(&state)
        .update_global_service(&user.actor(), service_id, body.into())
        .await?;
    Ok(Json(updated.into()))
}

pub async fn deactivate_global_service(
    State(state): State<AppState>,
    user: AuthUser,
    Path(service_id): Path<String>,
) -> Result<Json<GlobalServiceResponse>, AppError> {
    let service_id = parse_field_id("service_id", &service_id)?;
    let updated = service(&state)
        .deactivate_global_service(&user.actor(), service_id)
        .await?;
    Ok(Json(updated.into()))
}

/// Owner proposal for a new catalog entry
pub async fn request_global_service(
    State(state): State<AppState>,
    user: AuthUser,
    Path(salon_id): Path<String>,
    ValidatedJson(body): ValidatedJson<GlobalServiceRequest>,
) -> Result<(StatusCode, Json<ApprovalResponse>), AppError> {
    let salon_id = parse_field_id("salon_id", &salon_id)?;
    let request = service(&state)
        .request_global_service(&user.actor(), salon_id, body.into())
        .await?;
    Ok((StatusCode::ACCEPTED, Json(request.into())))
}

pub async fn add_salon_service(
    State(state): State<AppState>,
    user: AuthUser,
    Path(salon_id): Path<String>,
    ValidatedJson(body): ValidatedJson<CreateSalonServiceRequest>,
) -> Result<(StatusCode, Json<SalonServiceResponse>), AppError> {
    let salon_id = parse_field_id("salon_id", &salon_id)?;
    let created = service(&state)
        .add_salon_service(&user.actor(), salon_id, body.into_dto()?)
        .await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

pub async fn update_salon_service(
    State(state): State<AppState>,
    user: AuthUser,
    Path(service_id): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdateSalonServiceRequest>,
) -> Result<Json<SalonServiceResponse>, AppError> {
    let service_id = parse_field_id("service_id", &service_id)?;
    let updated = service(&state)
        .update_salon_service(&user.actor(), service_id, body.into())
        .await?;
    Ok(Json(updated.into()))
}

pub async fn remove_salon_service(
    State(state): State<AppState>,
    user: AuthUser,
    Path(service_id): Path<String>,
) -> Result<Json<SalonServiceResponse>, AppError> {
    let service_id = parse_field_id("service_id", &service_id)?;
    let removed = service(&state)
        .remove_salon_service(&user.actor(), service_id)
        .await?;
    Ok(Json(removed.into()))
}
