use crate::error::AppError;
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

/// Unified API error body, shared across the platform's services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status: u16,
    pub error_type: String,
    pub code: String,
    pub timestamp: String,
}

/// Map domain errors to HTTP responses
pub fn map_error(err: &AppError) -> (StatusCode, ErrorResponse) {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let (error_type, code) = match err {
        AppError::BadRequest(_) => ("validation_error", "INVALID_REQUEST"),
        AppError::Unauthorized => ("authentication_error", "UNAUTHORIZED"),
        AppError::Forbidden => ("authorization_error", "FORBIDDEN"),
        AppError::NotFound => ("not_found_error", "NOT_FOUND"),
        AppError::Mirror(_) => ("upstream_error", "MIRROR_STORE_ERROR"),
        AppError::Database(_) => ("server_error", "DATABASE_ERROR"),
        AppError::Config(_) | AppError::StartServer(_) | AppError::Internal => {
            ("server_error", "INTERNAL_SERVER_ERROR")
        }
    };

    let response = ErrorResponse {
        error: match status {
            StatusCode::BAD_REQUEST => "Bad Request",
            StatusCode::UNAUTHORIZED => "Unauthorized",
            StatusCode::FORBIDDEN => "Forbidden",
            StatusCode::NOT_FOUND => "Not Found",
            StatusCode::BAD_GATEWAY => "Bad Gateway",
            StatusCode::INTERNAL_SERVER_ERROR => "Internal Server Error",
            _ => "Error",
        }
        .to_string(),
        message: err.to_string(),
        status: status.as_u16(),
        error_type: error_type.to_string(),
        code: code.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    (status, response)
}

pub fn into_response(err: AppError) -> impl IntoResponse {
    let (status, response) = map_error(&err);
    (status, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_keep_the_field_message() {
        let (status, body) = map_error(&AppError::BadRequest(
            "content: message content cannot be empty".into(),
        ));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "INVALID_REQUEST");
        assert!(body.message.contains("content:"));
    }

    #[test]
    fn mirror_failures_map_to_bad_gateway() {
        let err = AppError::Mirror(crate::mirror::MirrorError::Malformed("x".into()));
        let (status, body) = map_error(&err);
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.error_type, "upstream_error");
    }
}
