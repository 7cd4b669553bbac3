//! Salon Handlers
//!
//! Public directory, owner submissions and admin moderation.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::request::{
    parse_field_id, CreateSalonRequest, SalonQuery, SetSalonStatusRequest, UpdateSalonRequest,
};
use crate::application::dto::response::{
    list, ApprovalResponse, SalonResponse, SalonServiceResponse, StaffResponse,
};
use crate::application::services::{SalonDirectory, SalonServiceImpl};
use crate::domain::SalonFilter;
use crate::infrastructure::repositories::{
    PgApprovalRepository, PgSalonRepository, PgSalonServiceRepository, PgStaffRepository,
};
use crate::presentation::http::extractors::{MaybeUser, ValidatedJson};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

type Directory =
    SalonServiceImpl<PgSalonRepository, PgApprovalRepository, PgSalonServiceRepository, PgStaffRepository>;

fn service(state: &AppState) -> Directory {
    SalonServiceImpl::new(
        Arc::new(PgSalonRepository::new(state.db.clone())),
        Arc::new(PgApprovalRepository::new(state.db.clone())),
        Arc::new(PgSalonServiceRepository::new(state.db.clone())),
        Arc::new(PgStaffRepository::new(state.db.clone())),
        state.snowflake.clone(),
    )
}

pub async fn list_salons(
    State(state): State<AppState>,
    Query(query): Query<SalonQuery>,
) -> Result<Json<Vec<SalonResponse>>, AppError> {
    let filter = SalonFilter {
        city: query.city,
        search: query.search,
        status: None,
        limit: query.limit.unwrap_or(20),
        offset: query.offset.unwrap_or(0),
    };
    let salons = service(&state).list_salons(filter).await?;
    Ok(Json(list(salons)))
}

pub async fn get_salon(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(salon_id): Path<String>,
) -> Result<Json<SalonResponse>, AppError> {
    let salon_id = parse_field_id("salon_id", &salon_id)?;
    let actor = user.map(|u| u.actor());
    let salon = service(&state).get_salon(actor.as_ref(), salon_id).await?;
    Ok(Json(salon.into()))
}

pub async fn list_salon_services(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(salon_id): Path<String>,
) -> Result<Json<Vec<SalonServiceResponse>>, AppError> {
    let salon_id = parse_field_id("salon_id", &salon_id)?;
    let actor = user.map(|u| u.actor());
    let services = service(&state)
        .list_salon_services(actor.as_ref(), salon_id)
        .await?;
    Ok(Json(list(services)))
}

pub async fn list_salon_staff(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(salon_id): Path<String>,
) -> Result<Json<Vec<StaffResponse>>, AppError> {
    let salon_id = parse_field_id("salon_id", &salon_id)?;
    let actor = user.map(|u| u.actor());
    let staff = service(&state).list_salon_staff(actor.as_ref(), salon_id).await?;
    Ok(Json(list(staff)))
}

/// Submit a new salon for review
pub async fn create_salon(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(body): ValidatedJson<CreateSalonRequest>,
) -> Result<(StatusCode, Json<SalonResponse>), AppError> {
    let salon = service(&state).create_salon(&user.actor(), body.into()).await?;
    Ok((StatusCode::CREATED, Json(salon.into())))
}

pub async fn list_my_salons(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<SalonResponse>>, AppError> {
    let salons = service(&state).list_my_salons(&user.actor()).await?;
    Ok(Json(list(salons)))
}

/// Queue an edit for admin review; the salon itself is unchanged until approved
pub async fn request_salon_update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(salon_id): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdateSalonRequest>,
) -> Result<(StatusCode, Json<ApprovalResponse>), AppError> {
    let salon_id = parse_field_id("salon_id", &salon_id)?;
    let request = service(&state)
        .request_salon_update(&user.actor(), salon_id, body.into())
        .await?;
    Ok((StatusCode::ACCEPTED, Json(request.into())))
}

pub async fn set_salon_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(salon_id): Path<String>,
    Json(body): Json<SetSalonStatusRequest>,
) -> Result<Json<SalonResponse>, AppError> {
    let salon_id = parse_field_id("salon_id", &salon_id)?;
    let status = body.status()?;
    let salon = service(&state)
        .set_salon_status(&user.actor(), salon_id, status)
        .await?;
    Ok(Json(salon.into()))
}
