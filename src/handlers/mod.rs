// HTTP handlers: webhook relay, health, template preview and metrics

pub mod health;
pub mod metrics;
pub mod templates;
pub mod webhook;

pub use health::{health_check, HealthStatus};
pub use metrics::get_prometheus_metrics;
pub use templates::{preview_template, PreviewRequest, PreviewResponse};
pub use webhook::{invalid_path, relay_webhook};
