//! Application startup and initialization logic.

use anyhow::Result;
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::config::Config;
use crate::models::WebhookAction;

/// Install the metrics recorder, build the relay and create the AppState.
pub fn initialize_app(config: &Config) -> Result<AppState> {
    info!("🚀 Starting LeadFlow webhook relay");

    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;
    info!("✅ Prometheus metrics initialized");

    log_relay_configuration(config);

    let state = AppState::new(config.clone(), Some(metrics_handle))?;
    info!(
        timeout_secs = config.relay.forward_timeout_secs,
        "✅ Webhook relay initialized"
    );
    Ok(state)
}

fn log_relay_configuration(config: &Config) {
    let relay = &config.relay;
    for action in WebhookAction::ALL {
        if relay.is_configured(action) {
            info!(action = %action, "Webhook destination configured");
        } else {
            warn!(
                action = %action,
                env_var = crate::config::RelayConfig::destination_env_var(action),
                "Webhook destination not configured - calls will fail with 500"
            );
        }
    }

    if !relay.signing_enabled() {
        warn!("⚠️  WEBHOOK_SECRET not set - requests will be forwarded unsigned");
    }
    if relay.enforce_origin {
        info!(allowed_origin = %relay.allowed_origin, "Origin enforcement enabled");
    }
    info!(signing_mode = ?relay.signing_mode, "Signing mode selected");
}
