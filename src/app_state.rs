//! Application state shared across all handlers.

use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::Config;
use crate::services::WebhookRelay;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Config,
    /// Signing relay built from `config.relay`
    pub relay: WebhookRelay,
    /// Prometheus render handle, absent when no recorder is installed
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: Config, metrics_handle: Option<PrometheusHandle>) -> anyhow::Result<Self> {
        let relay = WebhookRelay::new(config.relay.clone())?;
        Ok(Self {
            config,
            relay,
            metrics_handle,
        })
    }
}

impl axum::extract::FromRef<AppState> for WebhookRelay {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.relay.clone()
    }
}
