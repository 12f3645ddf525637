//! Request ID propagation, request logging and HTTP metrics.
//!
//! Each request runs inside a tracing span carrying its request ID, so log
//! lines emitted by handlers and by the auth core can be correlated.

use axum::{
    extract::{MatchedPath, Request},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::metrics;

/// Header name for request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest client-supplied request ID that is echoed back
const MAX_REQUEST_ID_LEN: usize = 128;

/// Reuse a sane client-supplied ID, otherwise generate one
fn get_or_generate_request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| {
            !s.is_empty()
                && s.len() <= MAX_REQUEST_ID_LEN
                && s.chars().all(|c| c.is_ascii_graphic())
        })
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Tag the request with an ID, log its completion, record metrics and echo
/// the ID in the `x-request-id` response header.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = get_or_generate_request_id(request.headers());

    let method = request.method().clone();
    // Route template, not the raw path, to keep metric labels bounded
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        uri = %request.uri(),
    );

    let started = Instant::now();
    let mut response = next.run(request).instrument(span.clone()).await;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    let status = response.status().as_u16();

    span.in_scope(|| {
        tracing::info!(status, elapsed_ms, "Request completed");
    });
    metrics::http_request(method.as_str(), &route, status, elapsed_ms);

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, header_value);
    }

    response
}
