use std::sync::Arc;

use chat_service::config::Config;
use chat_service::error::AppError;
use chat_service::mirror::RedisMirror;
use chat_service::state::AppState;
use chat_service::{db, logging, routes};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    logging::init_tracing();

    let config = Config::from_env()?;
    let port = config.port;

    let pool = db::init_pool(&config.database_url).await?;

    // Treat migration failures as fatal
    db::MIGRATOR
        .run(&pool)
        .await
        .map_err(|e| AppError::Config(format!("migration failed: {e}")))?;

    let mirror = RedisMirror::connect(&config.redis_url)
        .await
        .map_err(|e| AppError::Config(format!("redis connection failed: {e}")))?;

    let state = AppState {
        db: pool,
        mirror: Arc::new(mirror),
        config: Arc::new(config),
    };

    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::StartServer(format!("failed to bind {addr}: {e}")))?;
    info!("chat-service listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::StartServer(e.to_string()))?;

    Ok(())
}
