//! Route Configuration
//!
//! Configures all HTTP routes for the API.
//!
//! Paths that serve both anonymous and signed-in callers (salon pages, the
//! catalog, invite previews) live in the public router; their write methods
//! demand a token through the `AuthUser` extractor. Everything else sits
//! behind `auth_middleware`.

use axum::{
    http::header,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post, put},
    Router,
};

use super::handlers::{
    appointment, approval, auth, catalog, dashboard, health, invite, profile, salon, staff, ticket,
};
use crate::infrastructure::metrics;
use crate::presentation::middleware::{
    auth_middleware, optional_auth_middleware, rate_limit_api, rate_limit_auth, track_metrics,
};
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes(state.clone()))
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn(track_metrics))
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> Result<impl IntoResponse, AppError> {
    let body = metrics::gather_metrics()
        .map_err(|e| AppError::Internal(format!("Failed to encode metrics: {}", e)))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    ))
}

/// API v1 routes
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(auth_routes(state.clone()))
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        // Identify the caller first so the limiter can key by profile
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit_api))
        .layer(middleware::from_fn_with_state(state, optional_auth_middleware))
}

/// Authentication routes (stricter rate limiting)
fn auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh_token))
        .route("/auth/logout", post(auth::logout))
        .route_layer(middleware::from_fn_with_state(state, rate_limit_auth))
}

/// Routes readable without a token
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/salons", get(salon::list_salons).post(salon::create_salon))
        .route(
            "/salons/{salon_id}",
            get(salon::get_salon).patch(salon::request_salon_update),
        )
        .route(
            "/salons/{salon_id}/services",
            get(salon::list_salon_services).post(catalog::add_salon_service),
        )
        .route(
            "/salons/{salon_id}/staff",
            get(salon::list_salon_staff).post(staff::add_staff),
        )
        .route("/salons/{salon_id}/availability", get(appointment::availability))
        .route(
            "/catalog/services",
            get(catalog::list_global_services).post(catalog::create_global_service),
        )
        .route(
            "/invites/{code}",
            get(invite::preview_invite).delete(invite::revoke_invite),
        )
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(me_routes())
        .merge(owner_routes())
        .merge(appointment_routes())
        .merge(ticket_routes())
        .merge(admin_routes())
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// The caller's own records
fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(profile::get_me).patch(profile::update_me))
        .route("/me/salons", get(salon::list_my_salons))
        .route("/me/appointments", get(appointment::list_my_appointments))
        .route("/me/schedule", get(appointment::my_schedule))
        .route("/me/staff", get(staff::my_memberships))
        .route("/me/tickets", get(ticket::list_my_tickets))
        .route("/me/approvals", get(approval::list_my_requests))
}

/// Salon back office
fn owner_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/salons/{salon_id}/service-requests",
            post(catalog::request_global_service),
        )
        .route(
            "/salons/{salon_id}/invites",
            get(invite::list_salon_invites).post(invite::create_invite),
        )
        .route(
            "/salons/{salon_id}/appointments",
            get(appointment::list_salon_appointments),
        )
        .route("/salons/{salon_id}/calendar", get(appointment::salon_day_calendar))
        .route("/salons/{salon_id}/dashboard", get(dashboard::owner_dashboard))
        .route(
            "/salon-services/{service_id}",
            patch(catalog::update_salon_service).delete(catalog::remove_salon_service),
        )
        .route(
            "/staff/{staff_id}",
            patch(staff::update_staff).delete(staff::remove_staff),
        )
        .route("/invites/{code}/accept", post(invite::accept_invite))
}

fn appointment_routes() -> Router<AppState> {
    Router::new()
        .route("/appointments", post(appointment::book))
        .route("/appointments/{appointment_id}/cancel", post(appointment::cancel))
        .route("/appointments/{appointment_id}/confirm", post(appointment::confirm))
        .route("/appointments/{appointment_id}/complete", post(appointment::complete))
}

fn ticket_routes() -> Router<AppState> {
    Router::new()
        .route("/tickets", get(ticket::list_tickets).post(ticket::create_ticket))
        .route("/tickets/{ticket_id}", get(ticket::get_ticket))
        .route(
            "/tickets/{ticket_id}/messages",
            get(ticket::list_messages).post(ticket::post_message),
        )
        .route("/tickets/{ticket_id}/status", put(ticket::update_status))
        .route("/tickets/{ticket_id}/assignee", put(ticket::assign))
}

/// Platform moderation
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/salons/{salon_id}/status", put(salon::set_salon_status))
        .route(
            "/catalog/services/{service_id}",
            patch(catalog::update_global_service).delete(catalog::deactivate_global_service),
        )
        .route("/approvals", get(approval::list_requests))
        .route("/approvals/{request_id}/approve", post(approval::approve))
        .route("/approvals/{request_id}/reject", post(approval::reject))
        .route("/profiles", get(profile::list_profiles))
        .route("/profiles/{profile_id}/role", put(profile::set_role))
        .route("/admin/dashboard", get(dashboard::admin_dashboard))
}
