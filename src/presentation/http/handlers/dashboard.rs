//! Dashboard Handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::application::dto::request::parse_field_id;
use crate::application::dto::response::OwnerDashboardResponse;
use crate::application::services::{AdminDashboard, DashboardService, DashboardServiceImpl};
use crate::infrastructure::repositories::{
    PgAppointmentRepository, PgApprovalRepository, PgProfileRepository, PgSalonRepository,
    PgStaffRepository, PgTicketRepository,
};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

type Dashboards = DashboardServiceImpl<
    PgSalonRepository,
    PgApprovalRepository,
    PgTicketRepository,
    PgProfileRepository,
    PgAppointmentRepository,
    PgStaffRepository,
>;

fn service(state: &AppState) -> Dashboards {
    DashboardServiceImpl::new(
        Arc::new(PgSalonRepository::new(state.db.clone())),
        Arc::new(PgApprovalRepository::new(state.db.clone())),
        Arc::new(PgTicketRepository::new(state.db.clone())),
        Arc::new(PgProfileRepository::new(state.db.clone())),
        Arc::new(PgAppointmentRepository::new(state.db.clone())),
        Arc::new(PgStaffRepository::new(state.db.clone())),
    )
}

pub async fn admin_dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<AdminDashboard>, AppError> {
    Ok(Json(service(&state).admin_dashboard(&user.actor()).await?))
}

pub async fn owner_dashboard(
    State(state): State<AppState>,
    user: AuthUser,
    Path(salon_id): Path<String>,
) -> Result<Json<OwnerDashboardResponse>, AppError> {
    let salon_id = parse_field_id("salon_id", &salon_id)?;
    let dashboard = service(&state)
        .owner_dashboard(&user.actor(), salon_id)
        .await?;
    Ok(Json(dashboard.into()))
}
