use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::app_state::AppState;
use crate::config::SigningMode;
use crate::models::WebhookAction;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
    pub environment: String,
    pub signing_enabled: bool,
    pub signing_mode: SigningMode,
    /// Whether a destination URL is set, keyed by action tag
    pub webhooks: BTreeMap<String, bool>,
}

impl HealthStatus {
    pub fn from_state(state: &AppState) -> Self {
        let relay = &state.config.relay;
        let webhooks: BTreeMap<String, bool> = WebhookAction::ALL
            .iter()
            .map(|action| (action.as_str().to_string(), relay.is_configured(*action)))
            .collect();

        // Serving but unable to forward some actions
        let status = if webhooks.values().all(|configured| *configured) {
            "healthy"
        } else {
            "degraded"
        };

        Self {
            status: status.to_string(),
            timestamp: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: state.config.environment.clone(),
            signing_enabled: relay.signing_enabled(),
            signing_mode: relay.signing_mode,
            webhooks,
        }
    }
}

/// Basic health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus::from_state(&state))
}
