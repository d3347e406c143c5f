use super::{LastMessage, MirrorError, MirrorMessage, MirrorStore};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use uuid::Uuid;

fn room_key(room_id: Uuid) -> String {
    format!("chat:room:{room_id}")
}

fn feed_key(room_id: Uuid) -> String {
    format!("chat:room:{room_id}:feed")
}

fn msg_key(room_id: Uuid, message_id: Uuid) -> String {
    format!("chat:room:{room_id}:msg:{message_id}")
}

fn unread_key(room_id: Uuid) -> String {
    format!("chat:room:{room_id}:unread")
}

fn last_key(room_id: Uuid) -> String {
    format!("chat:last:{room_id}")
}

fn parse_uuid(map: &HashMap<String, String>, field: &str) -> Result<Uuid, MirrorError> {
    map.get(field)
        .and_then(|v| Uuid::parse_str(v).ok())
        .ok_or_else(|| MirrorError::Malformed(format!("missing or invalid {field}")))
}

fn parse_millis(map: &HashMap<String, String>, field: &str) -> Result<DateTime<Utc>, MirrorError> {
    map.get(field)
        .and_then(|v| v.parse::<i64>().ok())
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .ok_or_else(|| MirrorError::Malformed(format!("missing or invalid {field}")))
}

/// Mirror store client backed by Redis. Feed ordering uses the Redis
/// server clock (`TIME`) so concurrent senders get store-assigned
/// timestamps rather than caller clocks.
#[derive(Clone)]
pub struct RedisMirror {
    conn: ConnectionManager,
}

impl RedisMirror {
    pub async fn connect(redis_url: &str) -> Result<Self, MirrorError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    async fn server_time_millis(&self) -> Result<i64, MirrorError> {
        let mut conn = self.conn.clone();
        let (secs, micros): (i64, i64) = redis::cmd("TIME").query_async(&mut conn).await?;
        Ok(secs * 1_000 + micros / 1_000)
    }
}

#[async_trait]
impl MirrorStore for RedisMirror {
    async fn ensure_room(
        &self,
        room_id: Uuid,
        participant_ids: &[Uuid],
    ) -> Result<(), MirrorError> {
        let mut conn = self.conn.clone();
        let key = room_key(room_id);
        let exists: bool = conn.exists(&key).await?;
        if exists {
            return Ok(());
        }
        let participants = serde_json::to_string(participant_ids)
            .map_err(|e| MirrorError::Malformed(e.to_string()))?;
        let now = self.server_time_millis().await?;
        let fields: [(&str, String); 2] =
            [("participant_ids", participants), ("created_at", now.to_string())];
        conn.hset_multiple::<_, _, _, ()>(&key, &fields).await?;
        Ok(())
    }

    async fn append_message(
        &self,
        room_id: Uuid,
        message_id: Uuid,
        sender_id: Uuid,
        content: &str,
    ) -> Result<DateTime<Utc>, MirrorError> {
        let mut conn = self.conn.clone();
        let ms = self.server_time_millis().await?;
        let member = message_id.to_string();
        let msg_fields: [(&str, String); 4] = [
            ("sender_id", sender_id.to_string()),
            ("content", content.to_string()),
            ("timestamp", ms.to_string()),
            ("is_read", "0".to_string()),
        ];
        let room_fields: [(&str, String); 2] = [
            ("last_message", content.to_string()),
            ("last_message_time", ms.to_string()),
        ];
        redis::pipe()
            .atomic()
            .hset_multiple(msg_key(room_id, message_id), &msg_fields)
            .ignore()
            .zadd(feed_key(room_id), &member, ms)
            .ignore()
            .sadd(unread_key(room_id), &member)
            .ignore()
            .hset_multiple(room_key(room_id), &room_fields)
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await?;

        Utc.timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| MirrorError::Malformed("server timestamp out of range".into()))
    }

    async fn latest(&self, room_id: Uuid, limit: usize) -> Result<Vec<MirrorMessage>, MirrorError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let stop = limit.saturating_sub(1) as isize;
        let ids: Vec<String> = conn.zrevrange(feed_key(room_id), 0, stop).await?;

        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            let message_id = Uuid::parse_str(&id)
                .map_err(|_| MirrorError::Malformed(format!("feed entry {id} is not a uuid")))?;
            let map: HashMap<String, String> = conn.hgetall(msg_key(room_id, message_id)).await?;
            if map.is_empty() {
                // Feed entry without a message hash: skip rather than fail
                // the whole bootstrap.
                tracing::warn!(%room_id, %message_id, "dangling mirror feed entry");
                continue;
            }
            out.push(MirrorMessage {
                room_id,
                message_id,
                sender_id: parse_uuid(&map, "sender_id")?,
                content: map.get("content").cloned().unwrap_or_default(),
                timestamp: parse_millis(&map, "timestamp")?,
                is_read: map.get("is_read").map(|v| v == "1").unwrap_or(false),
            });
        }
        Ok(out)
    }

    async fn mark_unread_as_read(
        &self,
        room_id: Uuid,
        reader_id: Uuid,
    ) -> Result<u64, MirrorError> {
        let mut conn = self.conn.clone();
        let unread: Vec<String> = conn.smembers(unread_key(room_id)).await?;
        let reader = reader_id.to_string();

        let mut flipped = 0u64;
        for id in unread {
            let Ok(message_id) = Uuid::parse_str(&id) else {
                continue;
            };
            let sender: Option<String> = conn.hget(msg_key(room_id, message_id), "sender_id").await?;
            let Some(sender) = sender else {
                // Unread entry without a message hash: drop it instead of
                // writing a flag-only hash back into place.
                tracing::warn!(%room_id, %message_id, "dangling mirror unread entry");
                conn.srem::<_, _, ()>(unread_key(room_id), &id).await?;
                continue;
            };
            // The reader's own messages stay unread until the counterpart
            // reads them.
            if sender == reader {
                continue;
            }
            redis::pipe()
                .atomic()
                .hset(msg_key(room_id, message_id), "is_read", "1")
                .ignore()
                .srem(unread_key(room_id), &id)
                .ignore()
                .query_async::<_, ()>(&mut conn)
                .await?;
            flipped += 1;
        }
        Ok(flipped)
    }

    async fn upsert_last_message(&self, entry: &LastMessage) -> Result<(), MirrorError> {
        let mut conn = self.conn.clone();
        let participants = serde_json::to_string(&entry.participant_ids)
            .map_err(|e| MirrorError::Malformed(e.to_string()))?;
        let fields: [(&str, String); 6] = [
            ("room_id", entry.room_id.to_string()),
            ("last_message", entry.last_message.clone()),
            ("timestamp", entry.timestamp.timestamp_millis().to_string()),
            ("sender_id", entry.sender_id.to_string()),
            ("is_read", if entry.is_read { "1" } else { "0" }.to_string()),
            ("participant_ids", participants),
        ];
        conn.hset_multiple::<_, _, _, ()>(last_key(entry.room_id), &fields)
            .await?;
        Ok(())
    }

    async fn last_message(&self, room_id: Uuid) -> Result<Option<LastMessage>, MirrorError> {
        let mut conn = self.conn.clone();
        let map: HashMap<String, String> = conn.hgetall(last_key(room_id)).await?;
        if map.is_empty() {
            return Ok(None);
        }
        let participant_ids: Vec<Uuid> = map
            .get("participant_ids")
            .and_then(|v| serde_json::from_str(v).ok())
            .ok_or_else(|| MirrorError::Malformed("missing or invalid participant_ids".into()))?;
        Ok(Some(LastMessage {
            room_id,
            last_message: map.get("last_message").cloned().unwrap_or_default(),
            timestamp: parse_millis(&map, "timestamp")?,
            sender_id: parse_uuid(&map, "sender_id")?,
            is_read: map.get("is_read").map(|v| v == "1").unwrap_or(false),
            participant_ids,
        }))
    }

    async fn set_last_message_read(
        &self,
        room_id: Uuid,
        is_read: bool,
    ) -> Result<(), MirrorError> {
        let mut conn = self.conn.clone();
        conn.hset::<_, _, _, ()>(last_key(room_id), "is_read", if is_read { "1" } else { "0" })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced_per_room() {
        let room = Uuid::new_v4();
        let msg = Uuid::new_v4();
        assert_eq!(room_key(room), format!("chat:room:{room}"));
        assert_eq!(feed_key(room), format!("chat:room:{room}:feed"));
        assert_eq!(msg_key(room, msg), format!("chat:room:{room}:msg:{msg}"));
        assert_eq!(unread_key(room), format!("chat:room:{room}:unread"));
        assert_eq!(last_key(room), format!("chat:last:{room}"));
    }

    #[test]
    fn parse_millis_rejects_garbage() {
        let mut map = HashMap::new();
        map.insert("timestamp".to_string(), "not-a-number".to_string());
        assert!(parse_millis(&map, "timestamp").is_err());
        map.insert("timestamp".to_string(), "1700000000000".to_string());
        assert!(parse_millis(&map, "timestamp").is_ok());
    }
}
