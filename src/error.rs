use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::response::{apply_security_headers, sanitize_message};

/// Client-facing messages, in Khmer like the rest of the product surface.
pub mod messages {
    pub const UNAUTHORIZED: &str = "សូមចូលគណនីជាមុនសិន";
    pub const FORBIDDEN: &str = "អ្នកមិនមានសិទ្ធិចូលប្រើធនធាននេះទេ";
    pub const NOT_FOUND: &str = "រកមិនឃើញទិន្នន័យនេះទេ";
    pub const RATE_LIMITED: &str = "សំណើច្រើនពេក សូមព្យាយាមម្ដងទៀតនៅពេលក្រោយ";
    pub const INTERNAL: &str = "មានបញ្ហាបច្ចេកទេស សូមព្យាយាមម្ដងទៀត";
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("rate limit exceeded")]
    RateLimited {
        limit: u32,
        reset_ms: u64,
        retry_after_secs: u64,
    },
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    pub code: u16,
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                messages::UNAUTHORIZED.to_string(),
            ),
            ApiError::Forbidden => (
                StatusCode::FORBIDDEN,
                "forbidden",
                messages::FORBIDDEN.to_string(),
            ),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                "not_found",
                messages::NOT_FOUND.to_string(),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            ApiError::RateLimited { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limit_exceeded",
                messages::RATE_LIMITED.to_string(),
            ),
            ApiError::Internal(detail) => {
                // Full detail stays server-side; the client gets a generic message.
                tracing::error!(target: "komnot::error", error = %detail, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    messages::INTERNAL.to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: code,
            message: sanitize_message(&message),
            code: status.as_u16(),
        };

        let mut response = (status, Json(body)).into_response();
        apply_security_headers(response.headers_mut());

        if let ApiError::RateLimited { limit, reset_ms, retry_after_secs } = self {
            let headers = response.headers_mut();
            headers.insert("X-RateLimit-Limit", header_value(limit));
            headers.insert(
                "X-RateLimit-Remaining",
                axum::http::HeaderValue::from_static("0"),
            );
            headers.insert("X-RateLimit-Reset", header_value(reset_ms / 1000));
            headers.insert("Retry-After", header_value(retry_after_secs));
        }

        response
    }
}

fn header_value(v: impl ToString) -> axum::http::HeaderValue {
    axum::http::HeaderValue::from_str(&v.to_string())
        .unwrap_or(axum::http::HeaderValue::from_static("0"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_response_carries_headers() {
        let err = ApiError::RateLimited {
            limit: 30,
            reset_ms: 1_700_000_060_000,
            retry_after_secs: 42,
        };
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let headers = response.headers();
        assert_eq!(headers.get("X-RateLimit-Limit").unwrap(), "30");
        assert_eq!(headers.get("X-RateLimit-Remaining").unwrap(), "0");
        assert_eq!(headers.get("X-RateLimit-Reset").unwrap(), "1700000060");
        assert_eq!(headers.get("Retry-After").unwrap(), "42");
        assert_eq!(headers.get("X-Content-Type-Options").unwrap(), "nosniff");
    }

    #[test]
    fn error_responses_disable_caching() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get("Cache-Control").unwrap(),
            "no-store, no-cache"
        );
    }

    #[test]
    fn internal_detail_never_reaches_the_body() {
        let body = ErrorBody {
            error: "internal_error",
            message: messages::INTERNAL.to_string(),
            code: 500,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("database"));
        assert!(json.contains("internal_error"));
    }
}
