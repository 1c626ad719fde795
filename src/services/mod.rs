// Business logic services
// Signing relay and the caller-side dispatcher.

pub mod dispatcher;
pub mod webhook_relay;

pub use dispatcher::{load_leads, BatchSummary, WebhookDispatcher, WebhookResult};
pub use webhook_relay::{normalize_response, WebhookRelay};
