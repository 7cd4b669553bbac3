//! Authentication Handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use crate::application::dto::request::{LoginRequest, RefreshTokenRequest, RegisterRequest};
use crate::application::dto::response::{SessionResponse, TokenResponse};
use crate::application::services::{AuthService, AuthServiceImpl};
use crate::infrastructure::repositories::{PgProfileRepository, PgSessionRepository};
use crate::presentation::http::extractors::ValidatedJson;
use crate::shared::error::AppError;
use crate::startup::AppState;

fn service(state: &AppState) -> AuthServiceImpl<PgProfileRepository, PgSessionRepository> {
    AuthServiceImpl::new(
        Arc::new(PgProfileRepository::new(state.db.clone())),
        Arc::new(PgSessionRepository::new(state.db.clone())),
        state.snowflake.clone(),
        state.settings.jwt.clone(),
    )
}

/// Register a new customer account
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let (profile, tokens) = service(&state).register(body.into()).await?;
    Ok((StatusCode::CREATED, Json(SessionResponse::new(profile, tokens))))
}

/// Login with credentials
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let (profile, tokens) = service(&state).login(&body.email, &body.password).await?;
    Ok(Json(SessionResponse::new(profile, tokens)))
}

/// Rotate a refresh token
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(body): Json<RefreshTokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let tokens = service(&state).refresh(&body.refresh_token).await?;
    Ok(Json(tokens.into()))
}

/// Logout (revoke refresh token)
pub async fn logout(
    State(state): State<AppState>,
    Json(body): Json<RefreshTokenRequest>,
) -> Result<StatusCode, AppError> {
    service(&state).logout(&body.refresh_token).await?;
    Ok(StatusCode::NO_CONTENT)
}
