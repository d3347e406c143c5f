use crate::error::{AppError, AppResult};
use crate::models::{RoleExtension, UserProfile};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

/// Read-only view of the platform's user directory. The chat subsystem
/// consumes profiles for counterpart display and never mutates them.
pub struct DirectoryService;

impl DirectoryService {
    pub async fn profile(db: &Pool<Postgres>, user_id: Uuid) -> AppResult<UserProfile> {
        sqlx::query_as::<_, UserProfile>(
            "SELECT id, username, first_name, last_name, avatar_url FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound)
    }

    /// Typed lookup of the optional role extension record. At most one of
    /// the extension tables holds a row for a given user.
    pub async fn role_extension(
        db: &Pool<Postgres>,
        user_id: Uuid,
    ) -> AppResult<Option<RoleExtension>> {
        if let Some(row) = sqlx::query(
            "SELECT student_code, is_verified FROM alumni_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?
        {
            return Ok(Some(RoleExtension::Alumni {
                student_code: row.get("student_code"),
                is_verified: row.get("is_verified"),
            }));
        }

        if let Some(row) =
            sqlx::query("SELECT must_change_password FROM teacher_profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(db)
                .await?
        {
            return Ok(Some(RoleExtension::Teacher {
                must_change_password: row.get("must_change_password"),
            }));
        }

        Ok(None)
    }
}
