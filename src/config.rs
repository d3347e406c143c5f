use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub port: u16,
    pub jwt_secret: String,
    /// Chat-list page size.
    pub room_page_size: i64,
    /// Durable history page size.
    pub history_page_size: i64,
    /// How many mirror entries the bootstrap view returns.
    pub latest_limit: usize,
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self, crate::error::AppError> {
        dotenv().ok();
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| crate::error::AppError::Config("DATABASE_URL missing".into()))?;
        let redis_url = env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| crate::error::AppError::Config("JWT_SECRET missing".into()))?;
        let port = env_parse("PORT", 3000);

        Ok(Self {
            database_url,
            redis_url,
            port,
            jwt_secret,
            room_page_size: env_parse("CHAT_ROOM_PAGE_SIZE", 8),
            history_page_size: env_parse("CHAT_HISTORY_PAGE_SIZE", 8),
            latest_limit: env_parse("CHAT_LATEST_LIMIT", 50),
        })
    }

    pub fn test_defaults() -> Self {
        Self {
            database_url: "postgres://localhost/test".into(),
            redis_url: "redis://127.0.0.1:6379/0".into(),
            port: 3000,
            jwt_secret: "test-secret".into(),
            room_page_size: 8,
            history_page_size: 8,
            latest_limit: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_page_sizes() {
        let cfg = Config::test_defaults();
        assert_eq!(cfg.room_page_size, 8);
        assert_eq!(cfg.history_page_size, 8);
        assert_eq!(cfg.latest_limit, 50);
    }
}
