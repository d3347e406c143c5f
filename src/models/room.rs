use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A direct-message room between exactly two users. `user_a < user_b`
/// always holds (the pair is canonicalized on insert), so one row exists
/// per unordered pair. `last_message`/`last_message_time` are denormalized
/// copies refreshed on every send.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Room {
    pub id: Uuid,
    pub user_a: Uuid,
    pub user_b: Uuid,
    pub last_message: Option<String>,
    pub last_message_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.user_a == user_id || self.user_b == user_id
    }

    /// The other participant relative to `user_id`. `None` when `user_id`
    /// is not a participant.
    pub fn counterpart_of(&self, user_id: Uuid) -> Option<Uuid> {
        if user_id == self.user_a {
            Some(self.user_b)
        } else if user_id == self.user_b {
            Some(self.user_a)
        } else {
            None
        }
    }

    pub fn participant_ids(&self) -> [Uuid; 2] {
        [self.user_a, self.user_b]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(a: Uuid, b: Uuid) -> Room {
        Room {
            id: Uuid::new_v4(),
            user_a: a,
            user_b: b,
            last_message: None,
            last_message_time: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn counterpart_resolves_both_sides() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let r = room(a, b);
        assert_eq!(r.counterpart_of(a), Some(b));
        assert_eq!(r.counterpart_of(b), Some(a));
        assert_eq!(r.counterpart_of(Uuid::new_v4()), None);
    }

    #[test]
    fn membership_check_covers_both_participants() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let r = room(a, b);
        assert!(r.has_participant(a));
        assert!(r.has_participant(b));
        assert!(!r.has_participant(Uuid::new_v4()));
    }
}
