use anyhow::{Context, Result};
use futures::future::join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::middleware::metrics::track_dispatch_batch;
use crate::models::{LeadDescriptor, WebhookAction, WebhookPayload};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Outcome of a single relay call, as seen by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookResult {
    fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Tally of a concurrent phone validation batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Client for the relay's `/webhook/{action}` endpoint
#[derive(Clone)]
pub struct WebhookDispatcher {
    client: Client,
    base_url: String,
}

impl WebhookDispatcher {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self, action: WebhookAction) -> String {
        format!("{}/webhook/{}", self.base_url, action)
    }

    /// Post `payload` to the relay. Never fails: transport and relay errors
    /// are folded into the result.
    pub async fn send(&self, action: WebhookAction, payload: &WebhookPayload) -> WebhookResult {
        let response = match self.client.post(self.endpoint(action)).json(payload).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(action = %action, error = %e, "Webhook request failed");
                return WebhookResult::failed(e.to_string());
            }
        };

        let status = response.status();
        let body: Option<Value> = response.json().await.ok();

        if status.is_success() {
            info!(action = %action, "Webhook sent successfully");
            return WebhookResult::ok();
        }

        let error = body
            .as_ref()
            .and_then(|b| b.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        warn!(action = %action, status = %status, error = %error, "Webhook rejected");
        WebhookResult::failed(error)
    }

    pub async fn validate_phone(&self, lead: LeadDescriptor) -> WebhookResult {
        self.send(WebhookAction::ValidatePhone, &WebhookPayload::for_lead(lead))
            .await
    }

    /// Fire one `validate_phone` call per lead concurrently and tally the
    /// results once every call has settled.
    pub async fn dispatch_phone_validations(&self, leads: Vec<LeadDescriptor>) -> BatchSummary {
        let total = leads.len();
        let results = join_all(leads.into_iter().map(|lead| self.validate_phone(lead))).await;

        let succeeded = results.iter().filter(|r| r.success).count();
        let summary = BatchSummary {
            total,
            succeeded,
            failed: total - succeeded,
        };

        track_dispatch_batch(summary.succeeded, summary.failed);
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Phone validation batch finished"
        );
        summary
    }
}

/// Read a JSON array of leads from disk.
pub fn load_leads(path: impl AsRef<Path>) -> Result<Vec<LeadDescriptor>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read leads file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse leads file {}", path.display()))
}
