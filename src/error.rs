//! Error types and HTTP error response handling.
//!
//! Every rejection the gateway or webhook processor can produce is a
//! variant here, mapped onto a status code and a canonical JSON body of
//! the form `{"error": "<message>"}`. The quota variant carries extra
//! machine-readable fields (`limit`, `used`, `reset`).

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde_json::json;

/// Application-wide error type.
///
/// Authentication failures deliberately collapse to two messages only:
/// a missing credential says "API key required" and everything else says
/// "Invalid API key", so a caller cannot distinguish a revoked key from
/// one that never existed.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed. Surfaced as a generic 500 so webhook
    /// senders treat it as retryable and API callers learn nothing
    /// about internals.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// No bearer credential on the request.
    #[error("API key required")]
    MissingApiKey,

    /// Credential present but unknown or revoked. Same message for both.
    #[error("Invalid API key")]
    InvalidApiKey,

    /// Authenticated key's owning user lacks the admin role.
    #[error("Admin access required")]
    AdminRequired,

    /// Resource exists but belongs to another team. Same body shape as
    /// a not-found so nothing about the resource leaks.
    #[error("Access denied")]
    AccessDenied,

    /// Resource does not exist. The &str names the resource kind.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Team is at or over its daily request limit.
    #[error("Daily request limit exceeded")]
    QuotaExceeded {
        limit: i64,
        used: i64,
        reset: DateTime<Utc>,
    },

    /// Request body exceeds the configured byte cap.
    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// Webhook signature missing, malformed, stale or mismatched.
    /// One message for every failure mode; verification fails closed.
    #[error("Invalid webhook signature")]
    InvalidSignature,

    /// Malformed or incomplete request payload.
    #[error("{0}")]
    InvalidRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::MissingApiKey | AppError::InvalidApiKey => StatusCode::UNAUTHORIZED,
            AppError::AdminRequired | AppError::AccessDenied => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::InvalidSignature | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = match &self {
            // Hide database details from the client.
            AppError::Database(err) => {
                tracing::error!("database error: {err}");
                json!({ "error": "Internal server error" })
            }
            AppError::QuotaExceeded { limit, used, reset } => json!({
                "error": self.to_string(),
                "limit": limit,
                "used": used,
                "reset": reset.to_rfc3339(),
            }),
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use chrono::TimeZone;

    async fn parts(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn missing_key_is_401_with_required_message() {
        let (status, body) = parts(AppError::MissingApiKey).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "API key required");
    }

    #[tokio::test]
    async fn invalid_key_is_401_generic() {
        let (status, body) = parts(AppError::InvalidApiKey).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid API key");
    }

    #[tokio::test]
    async fn quota_exceeded_carries_limit_used_and_reset() {
        let reset = Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap();
        let (status, body) = parts(AppError::QuotaExceeded {
            limit: 100,
            used: 100,
            reset,
        })
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["limit"], 100);
        assert_eq!(body["used"], 100);
        assert_eq!(body["reset"], "2025-06-02T00:00:00+00:00");
    }

    #[tokio::test]
    async fn payload_too_large_is_413() {
        let (status, body) = parts(AppError::PayloadTooLarge { limit: 102_400 }).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"], "Request body exceeds 102400 bytes");
    }

    #[tokio::test]
    async fn admin_required_is_distinct_from_auth_failures() {
        let (status, body) = parts(AppError::AdminRequired).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Admin access required");
        assert_ne!(body["error"], AppError::InvalidApiKey.to_string());
    }

    #[tokio::test]
    async fn access_denied_matches_error_shape_of_not_found() {
        let (denied_status, denied) = parts(AppError::AccessDenied).await;
        let (missing_status, missing) = parts(AppError::NotFound("Play")).await;
        assert_eq!(denied_status, StatusCode::FORBIDDEN);
        assert_eq!(missing_status, StatusCode::NOT_FOUND);
        // Same shape: a single "error" string, nothing else.
        assert_eq!(denied.as_object().unwrap().len(), 1);
        assert_eq!(missing.as_object().unwrap().len(), 1);
    }
}
