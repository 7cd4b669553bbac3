//! Profile Handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::application::dto::request::{parse_field_id, ProfileQuery, SetRoleRequest, UpdateProfileRequest};
use crate::application::dto::response::{list, ProfileResponse};
use crate::application::services::{ProfileService, ProfileServiceImpl};
use crate::infrastructure::repositories::{PgProfileRepository, PgSessionRepository};
use crate::presentation::http::extractors::ValidatedJson;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

fn service(state: &AppState) -> ProfileServiceImpl<PgProfileRepository, PgSessionRepository> {
    ProfileServiceImpl::new(
        Arc::new(PgProfileRepository::new(state.db.clone())),
        Arc::new(PgSessionRepository::new(state.db.clone())),
    )
}

pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = service(&state).get_me(&user.actor()).await?;
    Ok(Json(profile.into()))
}

pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(body): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = service(&state).update_me(&user.actor(), body.into()).await?;
    Ok(Json(profile.into()))
}

/// Admin listing
pub async fn list_profiles(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ProfileQuery>,
) -> Result<Json<Vec<ProfileResponse>>, AppError> {
    let role = query.role()?;
    let profiles = service(&state)
        .list_profiles(
            &user.actor(),
            role,
            query.limit.unwrap_or(50),
            query.offset.unwrap_or(0),
        )
        .await?;
    Ok(Json(list(profiles)))
}

pub async fn set_role(
    State(state): State<AppState>,
    user: AuthUser,
    Path(profile_id): Path<String>,
    Json(body): Json<SetRoleRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile_id = parse_field_id("profile_id", &profile_id)?;
    let role = body.role()?;
    let profile = service(&state).set_role(&user.actor(), profile_id, role).await?;
    Ok(Json(profile.into()))
}
