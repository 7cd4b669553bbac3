//! Support Ticket Handlers
//!
//! Clients poll `GET /tickets/{id}/messages?after=<last id>` at a fixed
//! interval to pick up new replies.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::request::{
    parse_field_id, AssignTicketRequest, CreateTicketRequest, MessagesQuery, PostMessageRequest,
    StatusQuery, TicketStatusRequest,
};
use crate::application::dto::response::{list, TicketMessageResponse, TicketResponse};
use crate::application::services::{TicketService, TicketServiceImpl};
use crate::infrastructure::repositories::{PgProfileRepository, PgTicketRepository};
use crate::presentation::http::extractors::ValidatedJson;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

fn service(state: &AppState) -> TicketServiceImpl<PgTicketRepository, PgProfileRepository> {
    TicketServiceImpl::new(
        Arc::new(PgTicketRepository::new(state.db.clone())),
        Arc::new(PgProfileRepository::new(state.db.clone())),
        state.snowflake.clone(),
    )
}

pub async fn create_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(body): ValidatedJson<CreateTicketRequest>,
) -> Result<(StatusCode, Json<TicketResponse>), AppError> {
    let ticket = service(&state)
        .create_ticket(&user.actor(), body.into_dto()?)
        .await?;
    Ok((StatusCode::CREATED, Json(ticket.into())))
}

pub async fn list_my_tickets(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<TicketResponse>>, AppError> {
    let tickets = service(&state).list_my_tickets(&user.actor()).await?;
    Ok(Json(list(tickets)))
}

pub async fn get_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Path(ticket_id): Path<String>,
) -> Result<Json<TicketResponse>, AppError> {
    let ticket_id = parse_field_id("ticket_id", &ticket_id)?;
    let ticket = service(&state).get_ticket(&user.actor(), ticket_id).await?;
    Ok(Json(ticket.into()))
}

pub async fn post_message(
    State(state): State<AppState>,
    user: AuthUser,
    Path(ticket_id): Path<String>,
    ValidatedJson(body): ValidatedJson<PostMessageRequest>,
) -> Result<(StatusCode, Json<TicketMessageResponse>), AppError> {
    let ticket_id = parse_field_id("ticket_id", &ticket_id)?;
    let message = service(&state)
        .post_message(&user.actor(), ticket_id, body.body)
        .await?;
    Ok((StatusCode::CREATED, Json(message.into())))
}

pub async fn list_messages(
    State(state): State<AppState>,
    user: AuthUser,
    Path(ticket_id): Path<String>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Vec<TicketMessageResponse>>, AppError> {
    let ticket_id = parse_field_id("ticket_id", &ticket_id)?;
    let after = query.after()?;
    let messages = service(&state)
        .list_messages(&user.actor(), ticket_id, after)
        .await?;
    Ok(Json(list(messages)))
}

/// Admin queue
pub async fn list_tickets(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<TicketResponse>>, AppError> {
    let status = query.ticket_status()?;
    let tickets = service(&state).list_tickets(&user.actor(), status).await?;
    Ok(Json(list(tickets)))
}

pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(ticket_id): Path<String>,
    Json(body): Json<TicketStatusRequest>,
) -> Result<Json<TicketResponse>, AppError> {
    let ticket_id = parse_field_id("ticket_id", &ticket_id)?;
    let status = body.status()?;
    let ticket = service(&state)
        .update_status(&user.actor(), ticket_id, status)
        .await?;
    Ok(Json(ticket.into()))
}

pub async fn assign(
    State(state): State<AppState>,
    user: AuthUser,
    Path(ticket_id): Path<String>,
    Json(body): Json<AssignTicketRequest>,
) -> Result<Json<TicketResponse>, AppError> {
    let ticket_id = parse_field_id("ticket_id", &ticket_id)?;
    let assignee_id = body.assignee_id()?;
    let ticket = service(&state)
        .assign(&user.actor(), ticket_id, assignee_id)
        .await?;
    Ok(Json(ticket.into()))
}
