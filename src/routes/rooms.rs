use crate::middleware::guards::{RoomParticipant, User};
use crate::models::room::Room;
use crate::services::chat_service::{ChatService, RoomSummary};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Deserialize)]
pub struct ListRoomsQuery {
    pub page: Option<i64>,
}

pub async fn list_rooms(
    State(state): State<AppState>,
    user: User,
    Query(query): Query<ListRoomsQuery>,
) -> Result<Json<Vec<RoomSummary>>, crate::error::AppError> {
    let page = query.page.unwrap_or(1);
    let summaries = ChatService::list_rooms(
        &state.db,
        state.mirror.as_ref(),
        user.id,
        page,
        state.config.room_page_size,
    )
    .await?;
    Ok(Json(summaries))
}

#[derive(Deserialize)]
pub struct CreateRoomRequest {
    pub user_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct CreateRoomResponse {
    #[serde(flatten)]
    pub room: Room,
    pub created: bool,
}

/// Get-or-create the room with the given counterpart. Responds 201 only
/// when this call created the room.
pub async fn create_room(
    State(state): State<AppState>,
    user: User,
    Json(body): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<CreateRoomResponse>), crate::error::AppError> {
    let other = body.user_id.ok_or_else(|| {
        crate::error::AppError::BadRequest("user_id: target user id is required".into())
    })?;
    let (room, created) =
        ChatService::create_room(&state.db, state.mirror.as_ref(), user.id, other).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(CreateRoomResponse { room, created })))
}

/// Explicit mark-as-read for a room
pub async fn mark_read(
    State(state): State<AppState>,
    user: User,
    Path(room_id): Path<Uuid>,
) -> Result<StatusCode, crate::error::AppError> {
    let participant = RoomParticipant::verify(&state.db, user.id, room_id).await?;
    ChatService::mark_read(&state.db, state.mirror.as_ref(), &participant.room, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
