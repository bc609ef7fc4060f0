use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::core::shared::state::AppState;

use super::error::TicketError;
use super::types::{
    CreateCommentRequest, StaffActionRequest, SupportTicket, TicketComment, TicketDetail,
    TicketStats,
};

pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SupportTicket>>, TicketError> {
    Ok(Json(state.tickets.list_tickets().await?))
}

pub async fn get_ticket_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TicketStats>, TicketError> {
    Ok(Json(state.tickets.stats().await?))
}

pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<TicketDetail>, TicketError> {
    Ok(Json(state.tickets.detail(id).await?))
}

pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SupportTicket>, TicketError> {
    Ok(Json(state.tickets.mark_read(id).await?))
}

pub async fn claim_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    payload: Result<Json<StaffActionRequest>, JsonRejection>,
) -> Result<Json<SupportTicket>, TicketError> {
    let Json(req) = payload?;
    Ok(Json(state.tickets.claim(id, &req.staff).await?))
}

pub async fn complete_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    payload: Result<Json<StaffActionRequest>, JsonRejection>,
) -> Result<Json<SupportTicket>, TicketError> {
    let Json(req) = payload?;
    Ok(Json(state.tickets.complete(id, &req.staff).await?))
}

pub async fn delete_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, TicketError> {
    state.tickets.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(ticket_id): Path<i64>,
) -> Result<Json<Vec<TicketComment>>, TicketError> {
    Ok(Json(state.tickets.list_comments(ticket_id).await?))
}

pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    Path(ticket_id): Path<i64>,
    payload: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> Result<Json<Vec<TicketComment>>, TicketError> {
    let Json(req) = payload?;
    Ok(Json(
        state
            .tickets
            .add_comment(ticket_id, &req.author, &req.text)
            .await?,
    ))
}

pub async fn list_images(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<String>>, TicketError> {
    Ok(Json(state.tickets.get_ticket(id).await?.image_urls()))
}
