use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use metrics::{counter, gauge, histogram};
use std::time::{Duration, Instant};

/// Metrics middleware that tracks request metrics
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    // Route template keeps label cardinality bounded
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let start = Instant::now();

    gauge!("http_requests_in_flight").increment(1.0);
    counter!("http_requests_total", "method" => method.clone(), "path" => path.clone())
        .increment(1);

    let response = next.run(request).await;

    gauge!("http_requests_in_flight").decrement(1.0);

    let status = response.status().as_u16().to_string();
    histogram!(
        "http_request_duration_seconds",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status.clone()
    )
    .record(start.elapsed().as_secs_f64());

    if response.status().is_server_error() {
        counter!(
            "http_errors_total",
            "method" => method,
            "path" => path,
            "status" => status
        )
        .increment(1);
    }

    response
}

/// Track the final outcome of a relay call
pub fn track_relay_outcome(action: &str, outcome: &str) {
    counter!(
        "webhook_relay_requests_total",
        "action" => action.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Track how long the downstream took to answer
pub fn track_forward_duration(action: &str, duration: Duration) {
    histogram!("webhook_forward_duration_seconds", "action" => action.to_string())
        .record(duration.as_secs_f64());
}

/// Track phone validation batches sent by the dispatcher
pub fn track_dispatch_batch(succeeded: usize, failed: usize) {
    counter!("dispatch_calls_total", "success" => "true").increment(succeeded as u64);
    counter!("dispatch_calls_total", "success" => "false").increment(failed as u64);
}
