//! Real-time mirror store client.
//!
//! The mirror keeps a per-room append-only feed plus read flags and the
//! per-room last-message projection consumed by the chat list. It is
//! authoritative for the live view only; the relational store remains
//! authoritative for history. Writes here are not transactional with the
//! durable store: the send path orders them explicitly and treats a
//! divergence as a defined degraded mode.

pub mod memory;
pub mod redis;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use self::redis::RedisMirror;

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("redis: {0}")]
    Backend(#[from] ::redis::RedisError),

    #[error("malformed mirror entry: {0}")]
    Malformed(String),
}

/// One entry in a room's real-time feed. The key is the durable message id,
/// which keeps the two stores correlatable; the timestamp is assigned by
/// the mirror server, not the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorMessage {
    pub room_id: Uuid,
    pub message_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
}

/// Denormalized per-room summary row, unconditionally overwritten on every
/// send. There is no sequence guard: a retried stale send can win the
/// overwrite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastMessage {
    pub room_id: Uuid,
    pub last_message: String,
    pub timestamp: DateTime<Utc>,
    pub sender_id: Uuid,
    pub is_read: bool,
    pub participant_ids: Vec<Uuid>,
}

/// Client handle for the mirror store. Constructed once at startup and
/// injected into `AppState`; never a hidden process-wide global.
#[async_trait]
pub trait MirrorStore: Send + Sync {
    /// Idempotent container creation: participant set, empty feed, null
    /// last-message fields. Re-provisioning an existing room is a no-op.
    async fn ensure_room(&self, room_id: Uuid, participant_ids: &[Uuid])
        -> Result<(), MirrorError>;

    /// Appends a feed entry keyed by `message_id`, ordered by the store's
    /// server-assigned timestamp. New entries start unread. Returns the
    /// assigned timestamp.
    async fn append_message(
        &self,
        room_id: Uuid,
        message_id: Uuid,
        sender_id: Uuid,
        content: &str,
    ) -> Result<DateTime<Utc>, MirrorError>;

    /// Most recent `limit` entries, newest first. Bootstrap view for a
    /// client opening the room.
    async fn latest(&self, room_id: Uuid, limit: usize) -> Result<Vec<MirrorMessage>, MirrorError>;

    /// Scans unread entries and flips those not sent by `reader_id`.
    /// Returns how many entries were flipped; a second call returns 0.
    async fn mark_unread_as_read(&self, room_id: Uuid, reader_id: Uuid)
        -> Result<u64, MirrorError>;

    /// Unconditional overwrite of the chat-list projection row.
    async fn upsert_last_message(&self, entry: &LastMessage) -> Result<(), MirrorError>;

    async fn last_message(&self, room_id: Uuid) -> Result<Option<LastMessage>, MirrorError>;

    /// Coarse read flag on the projection row, flipped when the counterpart
    /// reads the room.
    async fn set_last_message_read(&self, room_id: Uuid, is_read: bool)
        -> Result<(), MirrorError>;
}
