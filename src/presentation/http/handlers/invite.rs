//! Invite Handlers
//!
//! Staff invitation codes: issue, list, revoke, preview and accept.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::request::{parse_field_id, CreateInviteRequest};
use crate::application::dto::response::{list, InvitePreviewResponse, InviteResponse, StaffResponse};
use crate::application::services::{InviteService, InviteServiceImpl};
use crate::infrastructure::repositories::{
    PgInviteRepository, PgProfileRepository, PgSalonRepository, PgStaffRepository,
};
use crate::presentation::http::extractors::ValidatedJson;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

type Invites = InviteServiceImpl<PgInviteRepository, PgSalonRepository, PgProfileRepository, PgStaffRepository>;

fn service(state: &AppState) -> Invites {
    InviteServiceImpl::new(
        Arc::new(PgInviteRepository::new(state.db.clone())),
        Arc::new(PgSalonRepository::new(state.db.clone())),
        Arc::new(PgProfileRepository::new(state.db.clone())),
        Arc::new(PgStaffRepository::new(state.db.clone())),
        state.snowflake.clone(),
        state.settings.invites.expiry_hours,
    )
}

pub async fn create_invite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(salon_id): Path<String>,
    ValidatedJson(body): ValidatedJson<CreateInviteRequest>,
) -> Result<(StatusCode, Json<InviteResponse>), AppError> {
    let salon_id = parse_field_id("salon_id", &salon_id)?;
    let invite = service(&state)
        .create_invite(&user.actor(), salon_id, body.into())
        .await?;
    Ok((StatusCode::CREATED, Json(invite.into())))
}

pub async fn list_salon_invites(
    State(state): State<AppState>,
    user: AuthUser,
    Path(salon_id): Path<String>,
) -> Result<Json<Vec<InviteResponse>>, AppError> {
    let salon_id = parse_field_id("salon_id", &salon_id)?;
    let invites = service(&state)
        .list_salon_invites(&user.actor(), salon_id)
        .await?;
    Ok(Json(list(invites)))
}

pub async fn revoke_invite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(code): Path<String>,
) -> Result<StatusCode, AppError> {
    service(&state).revoke_invite(&user.actor(), &code).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Public; lets the invitee see what they are joining before signing in
pub async fn preview_invite(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<InvitePreviewResponse>, AppError> {
    let preview = service(&state).preview_invite(&code).await?;
    Ok(Json(preview.into()))
}

pub async fn accept_invite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(code): Path<String>,
) -> Result<(StatusCode, Json<StaffResponse>), AppError> {
    let staff = service(&state).accept_invite(&user.actor(), &code).await?;
    Ok((StatusCode::CREATED, Json(staff.into())))
}
