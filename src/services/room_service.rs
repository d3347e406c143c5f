use crate::error::{AppError, AppResult};
use crate::mirror::MirrorStore;
use crate::models::room::Room;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

pub struct RoomService;

impl RoomService {
    /// Stores the pair canonically ordered so the DB uniqueness constraint
    /// covers the unordered pair.
    pub fn canonical_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
        if a < b {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Get-or-create for the room between `requester` and `other`. Returns
    /// the room and whether this call created it. Two participants racing
    /// to create simultaneously both land on the same surviving row: the
    /// insert uses ON CONFLICT DO NOTHING and the loser re-reads.
    pub async fn create_or_get(
        db: &Pool<Postgres>,
        mirror: &dyn MirrorStore,
        requester: Uuid,
        other: Uuid,
    ) -> AppResult<(Room, bool)> {
        if requester == other {
            return Err(AppError::BadRequest(
                "user_id: cannot open a chat room with yourself".into(),
            ));
        }
        let target_exists: Option<i32> = sqlx::query_scalar("SELECT 1 FROM users WHERE id = $1")
            .bind(other)
            .fetch_optional(db)
            .await?;
        if target_exists.is_none() {
            return Err(AppError::NotFound);
        }

        let (a, b) = Self::canonical_pair(requester, other);
        if let Some(room) = Self::find_by_pair(db, a, b).await? {
            return Ok((room, false));
        }

        let inserted = sqlx::query_as::<_, Room>(
            r#"
            INSERT INTO rooms (id, user_a, user_b)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_a, user_b) DO NOTHING
            RETURNING id, user_a, user_b, last_message, last_message_time, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(a)
        .bind(b)
        .fetch_optional(db)
        .await?;

        match inserted {
            Some(room) => {
                // First contact: provision the mirror container.
                mirror.ensure_room(room.id, &room.participant_ids()).await?;
                Ok((room, true))
            }
            // Lost the creation race; the conflict resolves as a lookup.
            None => {
                let room = Self::find_by_pair(db, a, b).await?.ok_or(AppError::Internal)?;
                Ok((room, false))
            }
        }
    }

    pub async fn find(db: &Pool<Postgres>, room_id: Uuid) -> AppResult<Option<Room>> {
        let room = sqlx::query_as::<_, Room>(
            "SELECT id, user_a, user_b, last_message, last_message_time, created_at \
             FROM rooms WHERE id = $1",
        )
        .bind(room_id)
        .fetch_optional(db)
        .await?;
        Ok(room)
    }

    async fn find_by_pair(db: &Pool<Postgres>, a: Uuid, b: Uuid) -> AppResult<Option<Room>> {
        let room = sqlx::query_as::<_, Room>(
            "SELECT id, user_a, user_b, last_message, last_message_time, created_at \
             FROM rooms WHERE user_a = $1 AND user_b = $2",
        )
        .bind(a)
        .bind(b)
        .fetch_optional(db)
        .await?;
        Ok(room)
    }

    /// Rooms the user participates in, most recently active first. Rooms
    /// that never saw a message sort after the active ones. `page` is
    /// 1-based.
    pub async fn list_for_user(
        db: &Pool<Postgres>,
        user_id: Uuid,
        page: i64,
        page_size: i64,
    ) -> AppResult<Vec<Room>> {
        let offset = (page.max(1) - 1) * page_size;
        let rooms = sqlx::query_as::<_, Room>(
            r#"
            SELECT id, user_a, user_b, last_message, last_message_time, created_at
            FROM rooms
            WHERE user_a = $1 OR user_b = $1
            ORDER BY last_message_time DESC NULLS LAST, created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(page_size)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rooms)
    }

    /// Refresh the denormalized last-message fields on every send.
    pub async fn touch_last_message(
        db: &Pool<Postgres>,
        room_id: Uuid,
        content: &str,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query("UPDATE rooms SET last_message = $2, last_message_time = $3 WHERE id = $1")
            .bind(room_id)
            .bind(content)
            .bind(at)
            .execute(db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_pair_is_order_invariant() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(
            RoomService::canonical_pair(a, b),
            RoomService::canonical_pair(b, a)
        );
    }

    #[test]
    fn canonical_pair_orders_ascending() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let (lo, hi) = RoomService::canonical_pair(a, b);
        assert!(lo < hi);
    }
}
