//! Cross-origin headers for the webhook routes.
//!
//! The allow-origin value echoes the caller when it is the configured origin
//! or a loopback dev server, and falls back to the configured origin for
//! everyone else. Browsers then refuse third-party reads on their own.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::services::WebhookRelay;
use crate::utils::{extract_origin, is_local_origin};

pub const ALLOWED_METHODS: &str = "POST, OPTIONS";
pub const ALLOWED_HEADERS: &str = "Content-Type";
pub const MAX_AGE_SECS: &str = "86400";

/// Pick the `Access-Control-Allow-Origin` value for a caller.
pub fn allow_origin_for<'a>(origin: &'a str, allowed_origin: &'a str) -> &'a str {
    if origin == allowed_origin || is_local_origin(origin) {
        origin
    } else {
        allowed_origin
    }
}

/// Write the CORS header set into `headers`.
pub fn apply_cors_headers(headers: &mut HeaderMap, origin: &str, allowed_origin: &str) {
    let value = HeaderValue::from_str(allow_origin_for(origin, allowed_origin))
        .or_else(|_| HeaderValue::from_str(allowed_origin));
    if let Ok(value) = value {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(MAX_AGE_SECS),
    );
    headers.insert(header::VARY, HeaderValue::from_static("Origin"));
}

/// Attach CORS headers to every response, gate failures included.
pub async fn relay_cors_middleware(
    State(relay): State<WebhookRelay>,
    request: Request,
    next: Next,
) -> Response {
    let origin = extract_origin(request.headers()).to_string();
    let mut response = next.run(request).await;
    apply_cors_headers(
        response.headers_mut(),
        &origin,
        &relay.config().allowed_origin,
    );
    response
}
