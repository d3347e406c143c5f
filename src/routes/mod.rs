use crate::state::AppState;
use axum::middleware;
use axum::{
    routing::{get, post},
    Router,
};

pub mod messages;
pub mod rooms;
pub mod users;

use messages::{fetch_history, fetch_latest, send_message};
use rooms::{create_room, list_rooms, mark_read};
use users::get_user;

pub fn build_router(state: AppState) -> Router {
    // Introspection stays public for healthchecks
    let introspection = Router::new().route("/health", get(|| async { "OK" }));

    let api_v1 = Router::new()
        .route("/rooms", get(list_rooms).post(create_room))
        .route("/rooms/:id/messages", get(fetch_latest).post(send_message))
        .route("/rooms/:id/history", get(fetch_history))
        .route("/rooms/:id/read", post(mark_read))
        .route("/users/:id", get(get_user));

    // Apply auth middleware only to API v1
    let secured_api_v1 = api_v1.layer(middleware::from_fn_with_state(
        state.clone(),
        crate::middleware::auth::auth_middleware,
    ));

    let router = introspection.merge(Router::new().nest("/api/v1", secured_api_v1));

    crate::middleware::with_defaults(router).with_state(state)
}
