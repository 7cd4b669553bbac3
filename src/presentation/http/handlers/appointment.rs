//! Appointment Handlers
//!
//! Booking, lifecycle transitions, calendars and availability.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::request::{
    parse_appointment_status, parse_field_id, AvailabilityQuery, BookAppointmentRequest,
    CancelAppointmentRequest, DateQuery, MyAppointmentsQuery, SalonAppointmentsQuery,
};
use crate::application::dto::response::{
    list, AppointmentListItem, AppointmentResponse, AvailabilityResponse, DayCalendarResponse,
};
use crate::application::services::{AppointmentService, AppointmentServiceImpl};
use crate::domain::AppointmentFilter;
use crate::infrastructure::metrics;
use crate::infrastructure::repositories::{
    PgAppointmentRepository, PgSalonRepository, PgSalonServiceRepository, PgStaffRepository,
};
use crate::presentation::http::extractors::{OptionalJson, ValidatedJson};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

type Bookings = AppointmentServiceImpl<
    PgAppointmentRepository,
    PgSalonRepository,
    PgStaffRepository,
    PgSalonServiceRepository,
>;

fn service(state: &AppState) -> Bookings {
    AppointmentServiceImpl::new(
        Arc::new(PgAppointmentRepository::new(state.db.clone())),
        Arc::new(PgSalonRepository::new(state.db.clone())),
        Arc::new(PgStaffRepository::new(state.db.clone())),
        Arc::new(PgSalonServiceRepository::new(state.db.clone())),
        state.snowflake.clone(),
        &state.settings.booking,
    )
}

pub async fn book(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(body): ValidatedJson<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<AppointmentResponse>), AppError> {
    let appointment = service(&state).book(&user.actor(), body.into_dto()?).await?;
    metrics::record_appointment_event("booked");
    Ok((StatusCode::CREATED, Json(appointment.into())))
}

pub async fn list_my_appointments(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<MyAppointmentsQuery>,
) -> Result<Json<Vec<AppointmentListItem>>, AppError> {
    let status = parse_appointment_status(query.status.as_deref())?;
    let appointments = service(&state)
        .list_my_appointments(&user.actor(), status, query.upcoming)
        .await?;
    Ok(Json(list(appointments)))
}

pub async fn list_salon_appointments(
    State(state): State<AppState>,
    user: AuthUser,
    Path(salon_id): Path<String>,
    Query(query): Query<SalonAppointmentsQuery>,
) -> Result<Json<Vec<AppointmentListItem>>, AppError> {
    let salon_id = parse_field_id("salon_id", &salon_id)?;
    let filter = AppointmentFilter {
        salon_id: Some(salon_id),
        staff_id: query.staff_id()?,
        customer_id: None,
        status: parse_appointment_status(query.status.as_deref())?,
        from: query.from,
        until: query.until,
        limit: query.limit.unwrap_or(200),
    };
    let appointments = service(&state)
        .list_salon_appointments(&user.actor(), salon_id, filter)
        .await?;
    Ok(Json(list(appointments)))
}

/// `POST /appointments/{id}/cancel`; the body is optional
pub async fn cancel(
    State(state): State<AppState>,
    user: AuthUser,
    Path(appointment_id): Path<String>,
    OptionalJson(body): OptionalJson<CancelAppointmentRequest>,
) -> Result<Json<AppointmentResponse>, AppError> {
    let appointment_id = parse_field_id("appointment_id", &appointment_id)?;
    let appointment = service(&state)
        .cancel(&user.actor(), appointment_id, body.reason())
        .await?;
    metrics::record_appointment_event("cancelled");
    Ok(Json(appointment.into()))
}

pub async fn confirm(
    State(state): State<AppState>,
    user: AuthUser,
    Path(appointment_id): Path<String>,
) -> Result<Json<AppointmentResponse>, AppError> {
    let appointment_id = parse_field_id("appointment_id", &appointment_id)?;
    let appointment = service(&state).confirm(&user.actor(), appointment_id).await?;
    metrics::record_appointment_event("confirmed");
    Ok(Json(appointment.into()))
}

pub async fn complete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(appointment_id): Path<String>,
) -> Result<Json<AppointmentResponse>, AppError> {
    let appointment_id = parse_field_id("appointment_id", &appointment_id)?;
    let appointment = service(&state).complete(&user.actor(), appointment_id).await?;
    metrics::record_appointment_event("completed");
    Ok(Json(appointment.into()))
}

/// Slot rows by staff columns for one local day
pub async fn salon_day_calendar(
    State(state): State<AppState>,
    user: AuthUser,
    Path(salon_id): Path<String>,
    Query(query): Query<DateQuery>,
) -> Result<Json<DayCalendarResponse>, AppError> {
    let salon_id = parse_field_id("salon_id", &salon_id)?;
    let calendar = service(&state)
        .salon_day_calendar(&user.actor(), salon_id, query.date)
        .await?;
    Ok(Json(calendar.into()))
}

pub async fn my_schedule(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<DateQuery>,
) -> Result<Json<Vec<AppointmentListItem>>, AppError> {
    let appointments = service(&state).my_schedule(&user.actor(), query.date).await?;
    Ok(Json(list(appointments)))
}

pub async fn availability(
    State(state): State<AppState>,
    Path(salon_id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let salon_id = parse_field_id("salon_id", &salon_id)?;
    let staff_id = parse_field_id("staff_id", &query.staff_id)?;
    let service_id = parse_field_id("service_id", &query.service_id)?;
    let starts = service(&state)
        .availability(salon_id, staff_id, service_id, query.date)
        .await?;
    Ok(Json(AvailabilityResponse {
        date: query.date,
        starts,
    }))
}
