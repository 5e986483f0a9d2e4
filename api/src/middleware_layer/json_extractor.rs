use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, HeaderName, HeaderValue, Request, header},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use serde::Serialize;
use tracing::debug;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Upper bound when buffering a non-JSON error body for rewriting.
const MAX_ERROR_BODY: usize = 64 * 1024;

#[derive(Serialize)]
struct RejectionBody<'a> {
    error: &'a str,
    message: &'a str,
}

fn generate_request_id() -> String {
    let nanos = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| Utc::now().timestamp_micros() * 1000);
    format!("req-{nanos}")
}

/// Request id set by [`ensure_request_id`], for handler logs.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
}

/// Propagates a non-empty incoming `X-Request-Id` or generates one, and
/// echoes it on the response.
pub async fn ensure_request_id(mut req: Request<Body>, next: Next) -> Response {
    let incoming = req
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| HeaderValue::from_str(v).ok());

    let id = match incoming {
        Some(id) => id,
        None => match HeaderValue::from_str(&generate_request_id()) {
            Ok(id) => id,
            Err(_) => return next.run(req).await,
        },
    };

    req.headers_mut().insert(REQUEST_ID_HEADER, id.clone());
    let mut res = next.run(req).await;
    res.headers_mut().insert(REQUEST_ID_HEADER, id);
    res
}

/// Rewrites non-JSON 4xx responses (extractor rejections, unknown routes,
/// wrong methods) into `{error, message}` JSON with the same status.
pub async fn json_error_mapper(req: Request<Body>, next: Next) -> Response {
    let res = next.run(req).await;
    let status = res.status();

    if !status.is_client_error() || is_json(res.headers()) {
        return res;
    }

    let (mut parts, body) = res.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_ERROR_BODY)
        .await
        .unwrap_or_else(|_| Bytes::new());
    let original = String::from_utf8_lossy(&bytes);

    let error = status.canonical_reason().unwrap_or("Client Error");
    let message = original.trim();
    debug!(status = status.as_u16(), message, "rewriting client error body as JSON");

    let body = match serde_json::to_vec(&RejectionBody { error, message }) {
        Ok(v) => v,
        Err(_) => bytes.to_vec(),
    };

    parts.headers.remove(header::CONTENT_LENGTH);
    parts
        .headers
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Response::from_parts(parts, Body::from(body))
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}
