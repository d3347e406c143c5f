use crate::error::{AppError, AppResult};
use crate::models::message::StoredMessage;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

pub struct MessageService;

impl MessageService {
    /// Inserts an immutable message row. The id is supplied by the caller
    /// so the durable key and the mirror key stay correlatable across the
    /// two stores.
    pub async fn append(
        db: &Pool<Postgres>,
        message_id: Uuid,
        room_id: Uuid,
        sender_id: Uuid,
        content: &str,
    ) -> AppResult<StoredMessage> {
        let message = sqlx::query_as::<_, StoredMessage>(
            r#"
            INSERT INTO messages (id, room_id, sender_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, room_id, sender_id, content, is_read, created_at
            "#,
        )
        .bind(message_id)
        .bind(room_id)
        .bind(sender_id)
        .bind(content)
        .fetch_one(db)
        .await?;
        Ok(message)
    }

    /// One page of history strictly older than the cursor, newest first.
    ///
    /// Ordering is `(created_at, id)` descending rather than id alone, so
    /// it holds across stores with different id schemes, and the composite
    /// comparison keeps pages stable: concatenating pages enumerates every
    /// message in the room exactly once even when timestamps collide.
    pub async fn list_before(
        db: &Pool<Postgres>,
        room_id: Uuid,
        before: Option<Uuid>,
        page_size: i64,
    ) -> AppResult<Vec<StoredMessage>> {
        let cursor: Option<(DateTime<Utc>, Uuid)> = match before {
            Some(id) => {
                let created_at: Option<DateTime<Utc>> = sqlx::query_scalar(
                    "SELECT created_at FROM messages WHERE id = $1 AND room_id = $2",
                )
                .bind(id)
                .bind(room_id)
                .fetch_optional(db)
                .await?;
                Some((created_at.ok_or(AppError::NotFound)?, id))
            }
            None => None,
        };

        let messages = match cursor {
            Some((created_at, id)) => {
                sqlx::query_as::<_, StoredMessage>(
                    r#"
                    SELECT id, room_id, sender_id, content, is_read, created_at
                    FROM messages
                    WHERE room_id = $1 AND (created_at, id) < ($2, $3)
                    ORDER BY created_at DESC, id DESC
                    LIMIT $4
                    "#,
                )
                .bind(room_id)
                .bind(created_at)
                .bind(id)
                .bind(page_size)
                .fetch_all(db)
                .await?
            }
            None => {
                sqlx::query_as::<_, StoredMessage>(
                    r#"
                    SELECT id, room_id, sender_id, content, is_read, created_at
                    FROM messages
                    WHERE room_id = $1
                    ORDER BY created_at DESC, id DESC
                    LIMIT $2
                    "#,
                )
                .bind(room_id)
                .bind(page_size)
                .fetch_all(db)
                .await?
            }
        };
        Ok(messages)
    }

    /// Marks every message in the room not sent by `reader` as read.
    /// Idempotent: a second call affects zero rows.
    pub async fn mark_all_read(
        db: &Pool<Postgres>,
        room_id: Uuid,
        reader: Uuid,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE messages SET is_read = TRUE \
             WHERE room_id = $1 AND sender_id <> $2 AND is_read = FALSE",
        )
        .bind(room_id)
        .bind(reader)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }
}
