//! Approval Handlers
//!
//! Owner submissions awaiting review and the admin review queue.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::application::dto::request::{parse_field_id, ReviewRequest, StatusQuery};
use crate::application::dto::response::{list, ApprovalResponse};
use crate::application::services::{ApprovalService, ApprovalServiceImpl};
use crate::infrastructure::cache::RedisCatalogCache;
use crate::infrastructure::repositories::PgApprovalRepository;
use crate::presentation::http::extractors::OptionalJson;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

fn service(state: &AppState) -> ApprovalServiceImpl<PgApprovalRepository, RedisCatalogCache> {
    ApprovalServiceImpl::new(
        Arc::new(PgApprovalRepository::new(state.db.clone())),
        state.catalog_cache.clone(),
        state.snowflake.clone(),
    )
}

pub async fn list_my_requests(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<ApprovalResponse>>, AppError> {
    let requests = service(&state).list_my_requests(&user.actor()).await?;
    Ok(Json(list(requests)))
}

pub async fn list_requests(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<ApprovalResponse>>, AppError> {
    let status = query.approval_status()?;
    let requests = service(&state).list_requests(&user.actor(), status).await?;
    Ok(Json(list(requests)))
}

pub async fn approve(
    State(state): State<AppState>,
    user: AuthUser,
    Path(request_id): Path<String>,
    OptionalJson(body): OptionalJson<ReviewRequest>,
) -> Result<Json<ApprovalResponse>, AppError> {
    let request_id = parse_field_id("request_id", &request_id)?;
    let request = service(&state)
        .approve(&user.actor(), request_id, body.note)
        .await?;
    Ok(Json(request.into()))
}

/// A note explaining the rejection is required
pub async fn reject(
    State(state): State<AppState>,
    user: AuthUser,
    Path(request_id): Path<String>,
    OptionalJson(body): OptionalJson<ReviewRequest>,
) -> Result<Json<ApprovalResponse>, AppError> {
    let request_id = parse_field_id("request_id", &request_id)?;
    let request = service(&state)
        .reject(&user.actor(), request_id, body.note)
        .await?;
    Ok(Json(request.into()))
}
