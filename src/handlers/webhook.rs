use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::error::RelayError;
use crate::services::WebhookRelay;

/// `ANY /webhook/{action}`
///
/// OPTIONS is answered as a CORS preflight, POST runs the relay pipeline and
/// every other method is rejected.
pub async fn relay_webhook(
    State(relay): State<WebhookRelay>,
    method: Method,
    Path(action): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match method {
        Method::OPTIONS => StatusCode::NO_CONTENT.into_response(),
        Method::POST => match relay.relay(&action, &headers, &body).await {
            Ok((status, reply)) => (status, Json(reply)).into_response(),
            Err(e) => e.into_response(),
        },
        _ => RelayError::MethodNotAllowed.into_response(),
    }
}

/// Fallback for every path outside `/webhook/{action}`.
pub async fn invalid_path(method: Method) -> Response {
    match method {
        Method::OPTIONS => StatusCode::NO_CONTENT.into_response(),
        Method::POST => RelayError::InvalidPath.into_response(),
        _ => RelayError::MethodNotAllowed.into_response(),
    }
}
