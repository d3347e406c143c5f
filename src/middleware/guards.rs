//! Authorization guards that enforce permission checks at the type level
//! This prevents handlers from accidentally bypassing authorization

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::room::Room;
use crate::services::room_service::RoomService;

/// Represents an authenticated user extracted from JWT claims
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for User
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by the auth middleware
        let user_id = parts
            .extensions
            .get::<Uuid>()
            .cloned()
            .ok_or(AppError::Unauthorized)?;

        Ok(User { id: user_id })
    }
}

/// A verified room participant: the room exists and the user is one of its
/// two members. Handlers that hold one of these have already passed the
/// membership check.
#[derive(Debug, Clone)]
pub struct RoomParticipant {
    pub user_id: Uuid,
    pub room: Room,
}

impl RoomParticipant {
    pub async fn verify(db: &PgPool, user_id: Uuid, room_id: Uuid) -> Result<Self, AppError> {
        let room = RoomService::find(db, room_id).await?.ok_or(AppError::NotFound)?;
        if !room.has_participant(user_id) {
            return Err(AppError::Forbidden);
        }
        Ok(RoomParticipant { user_id, room })
    }
}
