use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::models::WebhookAction;

pub type Result<T> = std::result::Result<T, RelayError>;

/// JSON body of every relay error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(rename = "validActions", skip_serializing_if = "Option::is_none")]
    pub valid_actions: Option<Vec<String>>,
}

/// Gate failures of the relay pipeline.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Invalid path. Use /webhook/{{action}}")]
    InvalidPath,

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Invalid body: {0}")]
    InvalidBody(String),

    #[error("Invalid validate_phone input: {0}")]
    InvalidPhoneInput(String),

    #[error("Webhook {0} not configured")]
    NotConfigured(WebhookAction),

    #[error("Forbidden")]
    Forbidden,

    #[error("Failed to reach downstream")]
    Downstream(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::InvalidPath
            | RelayError::UnknownAction(_)
            | RelayError::InvalidBody(_)
            | RelayError::InvalidPhoneInput(_) => StatusCode::BAD_REQUEST,
            RelayError::Forbidden => StatusCode::FORBIDDEN,
            RelayError::NotConfigured(_) | RelayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            RelayError::Downstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            RelayError::Downstream(details) => Some(details.clone()),
            _ => None,
        }
    }

    fn valid_actions(&self) -> Option<Vec<String>> {
        match self {
            RelayError::UnknownAction(_) => Some(WebhookAction::valid_actions()),
            _ => None,
        }
    }

    /// Log error with appropriate level
    fn log_error(&self) {
        match self.status_code() {
            status if status.is_server_error() => {
                error!(status = %status, error = %self, details = ?self.details(), "Relay request failed");
            }
            status if status.is_client_error() => {
                warn!(status = %status, error = %self, "Relay request rejected");
            }
            _ => {}
        }
    }

    pub fn to_body(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
            details: self.details(),
            valid_actions: self.valid_actions(),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        self.log_error();
        (self.status_code(), Json(self.to_body())).into_response()
    }
}
