pub mod message;
pub mod room;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display data for a room participant, read from the externally-owned
/// user directory. The chat subsystem never creates or deletes these rows.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
}

/// Optional role extension record, keyed by user id. A user has at most
/// one; most users have none.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum RoleExtension {
    Alumni {
        student_code: String,
        is_verified: bool,
    },
    Teacher {
        must_change_password: bool,
    },
}
