use crate::middleware::guards::User;
use crate::models::{RoleExtension, UserProfile};
use crate::services::directory_service::DirectoryService;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

#[derive(Serialize)]
pub struct UserResponse {
    #[serde(flatten)]
    pub profile: UserProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<RoleExtension>,
}

/// Counterpart profile for display, with the optional role extension.
pub async fn get_user(
    State(state): State<AppState>,
    _user: User,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, crate::error::AppError> {
    let profile = DirectoryService::profile(&state.db, user_id).await?;
    let extension = DirectoryService::role_extension(&state.db, user_id).await?;
    Ok(Json(UserResponse { profile, extension }))
}
