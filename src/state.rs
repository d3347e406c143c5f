use crate::{config::Config, mirror::MirrorStore};
use sqlx::{Pool, Postgres};
use std::sync::Arc;

/// Shared request state. The mirror handle is constructed once at startup
/// and injected here rather than living behind a process-wide global.
#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Postgres>,
    pub mirror: Arc<dyn MirrorStore>,
    pub config: Arc<Config>,
}
