//! Response helpers shared by handlers and the error type.

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Fixed security headers every API response carries.
pub fn apply_security_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
}

/// Strip angle brackets so reflected message content cannot smuggle markup.
pub fn sanitize_message(message: &str) -> String {
    message.replace(['<', '>'], "")
}

/// 200 OK with a JSON body and security headers.
pub fn ok<T: Serialize>(data: T) -> Response {
    with_status(StatusCode::OK, data)
}

/// 201 Created with a JSON body and security headers.
pub fn created<T: Serialize>(data: T) -> Response {
    with_status(StatusCode::CREATED, data)
}

fn with_status<T: Serialize>(status: StatusCode, data: T) -> Response {
    let mut response = (status, Json(data)).into_response();
    apply_security_headers(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sanitize_strips_angle_brackets() {
        assert_eq!(sanitize_message("<b>bold</b>"), "bbold/b");
        assert_eq!(sanitize_message("plain text"), "plain text");
        assert_eq!(sanitize_message(""), "");
    }

    #[test]
    fn ok_response_has_security_headers() {
        let response = ok(json!({ "hello": "world" }));
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers.get("Cache-Control").unwrap(), "no-store, no-cache");
        assert_eq!(headers.get("Pragma").unwrap(), "no-cache");
        assert_eq!(headers.get("X-Content-Type-Options").unwrap(), "nosniff");
    }

    #[test]
    fn created_sets_201() {
        let response = created(json!({ "id": "abc" }));
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
