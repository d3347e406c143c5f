use super::{LastMessage, MirrorError, MirrorMessage, MirrorStore};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct RoomEntry {
    participants: Vec<Uuid>,
    feed: Vec<MirrorMessage>,
    last: Option<LastMessage>,
}

/// In-process mirror store used by tests. Behaves like the Redis client:
/// store-assigned strictly increasing timestamps, unread entries flipped
/// only for the counterpart, unconditional projection overwrite.
pub struct MemoryMirror {
    rooms: Mutex<HashMap<Uuid, RoomEntry>>,
    clock: AtomicI64,
}

impl MemoryMirror {
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            clock: AtomicI64::new(Utc::now().timestamp_millis()),
        }
    }

    fn tick(&self) -> DateTime<Utc> {
        let ms = self.clock.fetch_add(1, Ordering::SeqCst) + 1;
        Utc.timestamp_millis_opt(ms)
            .single()
            .expect("in-range millisecond timestamp")
    }
}

impl Default for MemoryMirror {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MirrorStore for MemoryMirror {
    async fn ensure_room(
        &self,
        room_id: Uuid,
        participant_ids: &[Uuid],
    ) -> Result<(), MirrorError> {
        let mut rooms = self.rooms.lock().expect("mirror lock");
        rooms.entry(room_id).or_default().participants = participant_ids.to_vec();
        Ok(())
    }

    async fn append_message(
        &self,
        room_id: Uuid,
        message_id: Uuid,
        sender_id: Uuid,
        content: &str,
    ) -> Result<DateTime<Utc>, MirrorError> {
        let timestamp = self.tick();
        let mut rooms = self.rooms.lock().expect("mirror lock");
        rooms.entry(room_id).or_default().feed.push(MirrorMessage {
            room_id,
            message_id,
            sender_id,
            content: content.to_string(),
            timestamp,
            is_read: false,
        });
        Ok(timestamp)
    }

    async fn latest(&self, room_id: Uuid, limit: usize) -> Result<Vec<MirrorMessage>, MirrorError> {
        let rooms = self.rooms.lock().expect("mirror lock");
        let Some(entry) = rooms.get(&room_id) else {
            return Ok(Vec::new());
        };
        Ok(entry.feed.iter().rev().take(limit).cloned().collect())
    }

    async fn mark_unread_as_read(
        &self,
        room_id: Uuid,
        reader_id: Uuid,
    ) -> Result<u64, MirrorError> {
        let mut rooms = self.rooms.lock().expect("mirror lock");
        let Some(entry) = rooms.get_mut(&room_id) else {
            return Ok(0);
        };
        let mut flipped = 0;
        for msg in entry.feed.iter_mut() {
            if !msg.is_read && msg.sender_id != reader_id {
                msg.is_read = true;
                flipped += 1;
            }
        }
        Ok(flipped)
    }

    async fn upsert_last_message(&self, entry: &LastMessage) -> Result<(), MirrorError> {
        let mut rooms = self.rooms.lock().expect("mirror lock");
        rooms.entry(entry.room_id).or_default().last = Some(entry.clone());
        Ok(())
    }

    async fn last_message(&self, room_id: Uuid) -> Result<Option<LastMessage>, MirrorError> {
        let rooms = self.rooms.lock().expect("mirror lock");
        Ok(rooms.get(&room_id).and_then(|e| e.last.clone()))
    }

    async fn set_last_message_read(
        &self,
        room_id: Uuid,
        is_read: bool,
    ) -> Result<(), MirrorError> {
        let mut rooms = self.rooms.lock().expect("mirror lock");
        if let Some(last) = rooms.get_mut(&room_id).and_then(|e| e.last.as_mut()) {
            last.is_read = is_read;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (Uuid, Uuid, Uuid) {
        (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4())
    }

    #[tokio::test]
    async fn feed_is_ordered_newest_first_and_limited() {
        let mirror = MemoryMirror::new();
        let (room, alice, _) = ids();
        for i in 0..5 {
            mirror
                .append_message(room, Uuid::new_v4(), alice, &format!("m{i}"))
                .await
                .unwrap();
        }
        let latest = mirror.latest(room, 3).await.unwrap();
        assert_eq!(latest.len(), 3);
        assert_eq!(latest[0].content, "m4");
        assert_eq!(latest[2].content, "m2");
        assert!(latest[0].timestamp > latest[1].timestamp);
    }

    #[tokio::test]
    async fn new_entries_start_unread() {
        let mirror = MemoryMirror::new();
        let (room, alice, _) = ids();
        mirror
            .append_message(room, Uuid::new_v4(), alice, "hi")
            .await
            .unwrap();
        let latest = mirror.latest(room, 10).await.unwrap();
        assert!(!latest[0].is_read);
    }

    #[tokio::test]
    async fn read_marking_skips_readers_own_messages() {
        let mirror = MemoryMirror::new();
        let (room, alice, bob) = ids();
        mirror
            .append_message(room, Uuid::new_v4(), alice, "from alice")
            .await
            .unwrap();
        mirror
            .append_message(room, Uuid::new_v4(), bob, "from bob")
            .await
            .unwrap();

        let flipped = mirror.mark_unread_as_read(room, bob).await.unwrap();
        assert_eq!(flipped, 1);

        let feed = mirror.latest(room, 10).await.unwrap();
        let from_alice = feed.iter().find(|m| m.sender_id == alice).unwrap();
        let from_bob = feed.iter().find(|m| m.sender_id == bob).unwrap();
        assert!(from_alice.is_read);
        // Bob's own message stays unread until Alice reads it.
        assert!(!from_bob.is_read);
    }

    #[tokio::test]
    async fn read_marking_is_idempotent() {
        let mirror = MemoryMirror::new();
        let (room, alice, bob) = ids();
        mirror
            .append_message(room, Uuid::new_v4(), alice, "hi")
            .await
            .unwrap();
        assert_eq!(mirror.mark_unread_as_read(room, bob).await.unwrap(), 1);
        assert_eq!(mirror.mark_unread_as_read(room, bob).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn projection_overwrite_is_unconditional() {
        let mirror = MemoryMirror::new();
        let (room, alice, bob) = ids();
        let newer = LastMessage {
            room_id: room,
            last_message: "newer".into(),
            timestamp: Utc::now(),
            sender_id: alice,
            is_read: false,
            participant_ids: vec![alice, bob],
        };
        let stale = LastMessage {
            last_message: "stale".into(),
            timestamp: newer.timestamp - chrono::Duration::seconds(30),
            ..newer.clone()
        };
        mirror.upsert_last_message(&newer).await.unwrap();
        mirror.upsert_last_message(&stale).await.unwrap();

        // No sequence guard: the later write wins even with an older timestamp.
        let current = mirror.last_message(room).await.unwrap().unwrap();
        assert_eq!(current.last_message, "stale");
    }

    #[tokio::test]
    async fn projection_read_flag_flips_without_touching_text() {
        let mirror = MemoryMirror::new();
        let (room, alice, bob) = ids();
        mirror
            .upsert_last_message(&LastMessage {
                room_id: room,
                last_message: "hi".into(),
                timestamp: Utc::now(),
                sender_id: alice,
                is_read: false,
                participant_ids: vec![alice, bob],
            })
            .await
            .unwrap();
        mirror.set_last_message_read(room, true).await.unwrap();
        let current = mirror.last_message(room).await.unwrap().unwrap();
        assert!(current.is_read);
        assert_eq!(current.last_message, "hi");
    }

    #[tokio::test]
    async fn missing_room_yields_empty_views() {
        let mirror = MemoryMirror::new();
        let room = Uuid::new_v4();
        assert!(mirror.latest(room, 10).await.unwrap().is_empty());
        assert!(mirror.last_message(room).await.unwrap().is_none());
        assert_eq!(mirror.mark_unread_as_read(room, Uuid::new_v4()).await.unwrap(), 0);
    }
}
