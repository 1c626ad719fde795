// Caller details pulled from inbound request headers

use axum::http::HeaderMap;

/// Best-effort client IP for the `X-Forwarded-For` header on forwarded calls.
///
/// Checks the edge-provided `CF-Connecting-IP` first, then the first hop of
/// `X-Forwarded-For`, then `X-Real-IP`.
pub fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(ip) = header_str(headers, "cf-connecting-ip") {
        return Some(ip.to_string());
    }

    if let Some(forwarded_for) = header_str(headers, "x-forwarded-for") {
        // X-Forwarded-For can contain multiple IPs, take the first one
        let ip = forwarded_for.split(',').next().unwrap_or("").trim();
        if !ip.is_empty() {
            return Some(ip.to_string());
        }
    }

    header_str(headers, "x-real-ip").map(str::to_string)
}

/// Caller's `Origin` header, empty when absent or not valid text.
pub fn extract_origin(headers: &HeaderMap) -> &str {
    headers
        .get("origin")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("")
}

/// Loopback origins are always accepted so local dev servers work.
pub fn is_local_origin(origin: &str) -> bool {
    origin.contains("localhost") || origin.contains("127.0.0.1")
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
