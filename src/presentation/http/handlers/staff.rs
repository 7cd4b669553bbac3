//! Staff Handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::request::{parse_field_id, CreateStaffRequest, UpdateStaffRequest};
use crate::application::dto::response::{list, StaffResponse};
use crate::application::services::{StaffService, StaffServiceImpl};
use crate::infrastructure::repositories::{PgSalonRepository, PgStaffRepository};
use crate::presentation::http::extractors::ValidatedJson;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

fn service(state: &AppState) -> StaffServiceImpl<PgStaffRepository, PgSalonRepository> {
    StaffServiceImpl::new(
        Arc::new(PgStaffRepository::new(state.db.clone())),
        Arc::new(PgSalonRepository::new(state.db.clone())),
        state.snowflake.clone(),
    )
}

pub async fn add_staff(
    State(state): State<AppState>,
    user: AuthUser,
    Path(salon_id): Path<String>,
    ValidatedJson(body): ValidatedJson<CreateStaffRequest>,
) -> Result<(StatusCode, Json<StaffResponse>), AppError> {
    let salon_id = parse_field_id("salon_id", &salon_id)?;
    let staff = service(&state)
        .add_staff(
            &user.actor(),
            salon_id,
            body.display_name.trim().to_string(),
            body.title,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(staff.into())))
}

pub async fn update_staff(
    State(state): State<AppState>,
    user: AuthUser,
    Path(staff_id): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdateStaffRequest>,
) -> Result<Json<StaffResponse>, AppError> {
    let staff_id = parse_field_id("staff_id", &staff_id)?;
    let staff = service(&state)
        .update_staff(&user.actor(), staff_id, body.into())
        .await?;
    Ok(Json(staff.into()))
}

/// Soft removal; refused while the member has upcoming bookings
pub async fn remove_staff(
    State(state): State<AppState>,
    user: AuthUser,
    Path(staff_id): Path<String>,
) -> Result<Json<StaffResponse>, AppError> {
    let staff_id = parse_field_id("staff_id", &staff_id)?;
    let staff = service(&state).remove_staff(&user.actor(), staff_id).await?;
    Ok(Json(staff.into()))
}

pub async fn my_memberships(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<StaffResponse>>, AppError> {
    let staff = service(&state).my_memberships(&user.actor()).await?;
    Ok(Json(list(staff)))
}
