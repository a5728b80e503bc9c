use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};
use std::time::Instant;

use super::jwt_auth::ORGANIZATION_HEADER;

/// Header carrying the request id set by `SetRequestIdLayer`
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Middleware that logs one line per request and one per response
///
/// Bodies are not logged; they carry student personal data.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let request_id = header_value(request.headers(), REQUEST_ID_HEADER)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let organization = header_value(request.headers(), ORGANIZATION_HEADER).unwrap_or_default();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        organization = %organization,
        "→ Request"
    );

    let response = next.run(request).await;

    let status = response.status();
    let latency = start.elapsed();

    if status.is_server_error() {
        tracing::error!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            latency_ms = %latency.as_millis(),
            "← Response"
        );
    } else {
        tracing::info!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            latency_ms = %latency.as_millis(),
            "← Response"
        );
    }

    response
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| truncate(v, 64))
}

/// Truncate a header value for logging
fn truncate(value: &str, max_len: usize) -> String {
    match value.char_indices().nth(max_len) {
        Some((idx, _)) => format!("{}...", &value[..idx]),
        None => value.to_string(),
    }
}
