use crate::middleware::guards::{RoomParticipant, User};
use crate::mirror::MirrorMessage;
use crate::models::message::StoredMessage;
use crate::services::chat_service::ChatService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

pub async fn send_message(
    State(state): State<AppState>,
    user: User,
    Path(room_id): Path<Uuid>,
    Json(body): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<StoredMessage>), crate::error::AppError> {
    let participant = RoomParticipant::verify(&state.db, user.id, room_id).await?;
    let stored = ChatService::send(
        &state.db,
        state.mirror.as_ref(),
        &participant.room,
        user.id,
        &body.content,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// Latest mirror entries for the room. Fetching them marks the
/// counterpart's unread messages as read.
pub async fn fetch_latest(
    State(state): State<AppState>,
    user: User,
    Path(room_id): Path<Uuid>,
) -> Result<Json<Vec<MirrorMessage>>, crate::error::AppError> {
    let participant = RoomParticipant::verify(&state.db, user.id, room_id).await?;
    let feed = ChatService::fetch_latest(
        &state.db,
        state.mirror.as_ref(),
        &participant.room,
        user.id,
        state.config.latest_limit,
    )
    .await?;
    Ok(Json(feed))
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub before_id: Option<Uuid>,
    pub page_size: Option<i64>,
}

pub async fn fetch_history(
    State(state): State<AppState>,
    user: User,
    Path(room_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<StoredMessage>>, crate::error::AppError> {
    let participant = RoomParticipant::verify(&state.db, user.id, room_id).await?;
    let page_size = query
        .page_size
        .unwrap_or(state.config.history_page_size)
        .clamp(1, 100);
    let page = ChatService::fetch_history(
        &state.db,
        &participant.room,
        user.id,
        query.before_id,
        page_size,
    )
    .await?;
    Ok(Json(page))
}
