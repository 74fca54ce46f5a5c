use axum::{extract::Request, middleware::Next, response::Response};
use tracing::info;

use crate::client_ip;

/// Logging middleware for request/response tracking
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let client = client_ip::resolve(request.headers());

    info!(
        target: "komnot::http",
        method = %method,
        uri = %uri,
        client = %client,
        "Incoming request"
    );

    let response = next.run(request).await;

    info!(
        target: "komnot::http",
        method = %method,
        uri = %uri,
        status = %response.status(),
        "Request completed"
    );

    response
}
