//! Router configuration module.
//!
//! The webhook routes (and the catch-all fallback) carry the relay CORS
//! middleware; the service routes do not.

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{any, get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::app_state::AppState;
use crate::handlers::{
    get_prometheus_metrics, health_check, invalid_path, preview_template, relay_webhook,
};
use crate::middleware::{metrics_middleware, relay_cors_middleware, request_logger_middleware};

/// Build the application router.
pub fn build_router(app_state: AppState) -> Router {
    let request_timeout = Duration::from_secs(app_state.config.request_timeout_secs);

    let relay = Router::new()
        .route("/webhook/{action}", any(relay_webhook))
        .fallback(invalid_path)
        .layer(from_fn_with_state(
            app_state.relay.clone(),
            relay_cors_middleware,
        ));

    let service = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(get_prometheus_metrics))
        .route("/templates/preview", post(preview_template));

    service
        .merge(relay)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::with_status_code(
                    axum::http::StatusCode::REQUEST_TIMEOUT,
                    request_timeout,
                ))
                .layer(from_fn(request_logger_middleware))
                .layer(from_fn(metrics_middleware)),
        )
        .with_state(app_state)
}
