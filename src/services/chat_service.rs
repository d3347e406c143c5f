use crate::error::{AppError, AppResult};
use crate::mirror::{LastMessage, MirrorMessage, MirrorStore};
use crate::models::message::StoredMessage;
use crate::models::room::Room;
use crate::models::UserProfile;
use crate::services::directory_service::DirectoryService;
use crate::services::message_service::MessageService;
use crate::services::room_service::RoomService;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

/// One chat-list entry: the counterpart's profile, the denormalized last
/// message, and the read state computed from the mirror projection.
#[derive(Debug, Clone, Serialize)]
pub struct RoomSummary {
    pub id: Uuid,
    pub counterpart: UserProfile,
    pub last_message: Option<String>,
    pub last_message_time: Option<DateTime<Utc>>,
    pub is_read: bool,
}

/// Composes the room resolver, the durable store and the mirror client
/// into the list/create/send/fetch/mark-read operations.
pub struct ChatService;

impl ChatService {
    pub async fn create_room(
        db: &Pool<Postgres>,
        mirror: &dyn MirrorStore,
        user: Uuid,
        other: Uuid,
    ) -> AppResult<(Room, bool)> {
        RoomService::create_or_get(db, mirror, user, other).await
    }

    pub async fn list_rooms(
        db: &Pool<Postgres>,
        mirror: &dyn MirrorStore,
        user: Uuid,
        page: i64,
        page_size: i64,
    ) -> AppResult<Vec<RoomSummary>> {
        let rooms = RoomService::list_for_user(db, user, page, page_size).await?;
        let mut out = Vec::with_capacity(rooms.len());
        for room in rooms {
            let counterpart_id = room.counterpart_of(user).ok_or(AppError::Internal)?;
            let counterpart = DirectoryService::profile(db, counterpart_id).await?;
            // Read unless the counterpart sent the last message and its
            // mirror flag is still unread.
            let is_read = match mirror.last_message(room.id).await? {
                Some(last) => last.sender_id == user || last.is_read,
                None => true,
            };
            out.push(RoomSummary {
                id: room.id,
                counterpart,
                last_message: room.last_message,
                last_message_time: room.last_message_time,
                is_read,
            });
        }
        Ok(out)
    }

    /// Sends a message: mirror feed first, then the durable row, then the
    /// room's denormalized fields and the projection. The two stores are
    /// not covered by one transaction; when a later step fails the earlier
    /// writes stand and the error is surfaced, leaving a logged divergence
    /// for an out-of-band reconciliation job.
    pub async fn send(
        db: &Pool<Postgres>,
        mirror: &dyn MirrorStore,
        room: &Room,
        sender: Uuid,
        content: &str,
    ) -> AppResult<StoredMessage> {
        if !room.has_participant(sender) {
            return Err(AppError::Forbidden);
        }
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::BadRequest(
                "content: message content cannot be empty".into(),
            ));
        }

        // One id for both stores.
        let message_id = Uuid::new_v4();
        let mirror_time = mirror.append_message(room.id, message_id, sender, content).await?;

        let stored = match MessageService::append(db, message_id, room.id, sender, content).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::error!(
                    room_id = %room.id,
                    %message_id,
                    error = %e,
                    "durable write failed after mirror append; orphaned mirror entry awaits reconciliation"
                );
                return Err(e);
            }
        };

        RoomService::touch_last_message(db, room.id, content, stored.created_at).await?;

        let projection = LastMessage {
            room_id: room.id,
            last_message: content.to_string(),
            timestamp: mirror_time,
            sender_id: sender,
            is_read: false,
            participant_ids: room.participant_ids().to_vec(),
        };
        if let Err(e) = mirror.upsert_last_message(&projection).await {
            tracing::error!(
                room_id = %room.id,
                %message_id,
                error = %e,
                "projection update failed after send; chat list lags until the next send"
            );
            return Err(e.into());
        }

        Ok(stored)
    }

    /// Mirror bootstrap view for a room. Fetching it counts as reading:
    /// unread counterpart messages are marked read in both stores. The
    /// returned entries carry the flags as they were before this read.
    pub async fn fetch_latest(
        db: &Pool<Postgres>,
        mirror: &dyn MirrorStore,
        room: &Room,
        reader: Uuid,
        limit: usize,
    ) -> AppResult<Vec<MirrorMessage>> {
        if !room.has_participant(reader) {
            return Err(AppError::Forbidden);
        }
        let feed = mirror.latest(room.id, limit).await?;
        Self::mark_read(db, mirror, room, reader).await?;
        Ok(feed)
    }

    /// Backward pagination over the durable store.
    pub async fn fetch_history(
        db: &Pool<Postgres>,
        room: &Room,
        reader: Uuid,
        before: Option<Uuid>,
        page_size: i64,
    ) -> AppResult<Vec<StoredMessage>> {
        if !room.has_participant(reader) {
            return Err(AppError::Forbidden);
        }
        MessageService::list_before(db, room.id, before, page_size).await
    }

    /// Flips unread -> read for the counterpart's messages in both stores,
    /// and on the projection row when its sender is not the reader. The
    /// transition is one-directional; repeating it changes nothing.
    pub async fn mark_read(
        db: &Pool<Postgres>,
        mirror: &dyn MirrorStore,
        room: &Room,
        reader: Uuid,
    ) -> AppResult<()> {
        if !room.has_participant(reader) {
            return Err(AppError::Forbidden);
        }
        mirror.mark_unread_as_read(room.id, reader).await?;
        MessageService::mark_all_read(db, room.id, reader).await?;

        if let Some(last) = mirror.last_message(room.id).await? {
            if last.sender_id != reader && !last.is_read {
                mirror.set_last_message_read(room.id, true).await?;
            }
        }
        Ok(())
    }
}
