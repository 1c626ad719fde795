use axum::http::{header, HeaderMap, StatusCode};
use reqwest::Client;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::config::{RelayConfig, SigningMode};
use crate::error::{RelayError, Result};
use crate::middleware::metrics::{track_forward_duration, track_relay_outcome};
use crate::models::{RelayResponse, WebhookAction, WebhookPayload};
use crate::template::lexer::is_variable_name;
use crate::utils::signature::{ACTION_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::utils::{extract_client_ip, extract_origin, is_local_origin, SignedRequest};

/// Signs inbound action requests and forwards them to the configured
/// automation endpoint. Holds no per-request state; clones share the client.
#[derive(Clone)]
pub struct WebhookRelay {
    client: Client,
    config: Arc<RelayConfig>,
}

impl WebhookRelay {
    pub fn new(config: RelayConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.forward_timeout_secs))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Map a path tag to its action and destination URL.
    pub fn resolve(&self, tag: &str) -> Result<(WebhookAction, &str)> {
        if !is_variable_name(tag) {
            return Err(RelayError::InvalidPath);
        }
        let action: WebhookAction = tag
            .parse()
            .map_err(|_| RelayError::UnknownAction(tag.to_string()))?;
        let url = self
            .config
            .destination(action)
            .ok_or(RelayError::NotConfigured(action))?;
        Ok((action, url))
    }

    /// Reject callers whose origin is neither the allowed one nor loopback.
    /// A no-op unless origin enforcement is switched on.
    pub fn check_origin(&self, origin: &str) -> Result<()> {
        if !self.config.enforce_origin
            || origin == self.config.allowed_origin
            || is_local_origin(origin)
        {
            return Ok(());
        }
        Err(RelayError::Forbidden)
    }

    /// Lay out the forwarded body for `action` and sign it at `timestamp`.
    pub fn prepare(&self, action: WebhookAction, body: &[u8], timestamp: i64) -> Result<SignedRequest> {
        let text = std::str::from_utf8(body)
            .map_err(|_| RelayError::InvalidBody("body must be UTF-8 text".to_string()))?;

        if action == WebhookAction::ValidatePhone {
            check_phone_input(text)?;
        }

        let forwarded = match self.config.signing_mode {
            SigningMode::Proxy => body.to_vec(),
            SigningMode::Embedded => embed_metadata(text, action, timestamp)?,
        };

        SignedRequest::new(forwarded, timestamp, self.config.secret.as_deref())
            .map_err(|e| RelayError::Internal(e.to_string()))
    }

    /// Run a POST through every gate and forward it.
    ///
    /// Returns the status to answer with (200 on downstream success, the
    /// downstream status otherwise) and the normalized body.
    pub async fn relay(
        &self,
        tag: &str,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<(StatusCode, RelayResponse)> {
        let outcome = self.relay_inner(tag, headers, body).await;
        let label = match &outcome {
            Ok((_, reply)) if reply.success => "forwarded",
            Ok(_) => "downstream_rejected",
            Err(e) => relay_error_label(e),
        };
        let action = tag
            .parse::<WebhookAction>()
            .map(|a| a.as_str())
            .unwrap_or("unknown");
        track_relay_outcome(action, label);
        outcome
    }

    async fn relay_inner(
        &self,
        tag: &str,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<(StatusCode, RelayResponse)> {
        let (action, url) = self.resolve(tag)?;
        self.check_origin(extract_origin(headers))?;

        let timestamp = chrono::Utc::now().timestamp_millis();
        let signed = self.prepare(action, body, timestamp)?;
        if signed.signature.is_none() {
            warn!(action = %action, "WEBHOOK_SECRET not configured - forwarding unsigned request");
        }

        let client_ip = extract_client_ip(headers);
        self.forward(action, url, signed, client_ip.as_deref()).await
    }

    async fn forward(
        &self,
        action: WebhookAction,
        url: &str,
        signed: SignedRequest,
        client_ip: Option<&str>,
    ) -> Result<(StatusCode, RelayResponse)> {
        let mut request = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(TIMESTAMP_HEADER, signed.timestamp.to_string())
            .header(ACTION_HEADER, action.as_str());

        if let Some(signature) = &signed.signature {
            request = request.header(SIGNATURE_HEADER, signature.as_str());
        }
        if let Some(ip) = client_ip {
            request = request.header("x-forwarded-for", ip);
        }

        debug!(action = %action, bytes = signed.body.len(), "Forwarding webhook");
        let start = Instant::now();

        let response = request.body(signed.body).send().await.map_err(|e| {
            error!(action = %action, error = %e, "Webhook forward failed");
            RelayError::Downstream(e.to_string())
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            error!(action = %action, error = %e, "Failed to read downstream response");
            RelayError::Downstream(e.to_string())
        })?;
        track_forward_duration(action.as_str(), start.elapsed());

        if status.is_success() {
            info!(action = %action, status = %status, "Webhook forwarded successfully");
        } else {
            warn!(action = %action, status = %status, "Downstream rejected webhook");
        }

        Ok(normalize_response(status, &text))
    }
}

/// Wrap a downstream answer as `{success, status, data}`.
///
/// Non-JSON bodies become `{"raw": text}`. The returned status is 200 when
/// the downstream succeeded and the downstream status otherwise.
pub fn normalize_response(status: StatusCode, text: &str) -> (StatusCode, RelayResponse) {
    let data = serde_json::from_str::<Value>(text).unwrap_or_else(|_| json!({ "raw": text }));
    let success = status.is_success();
    let reply = RelayResponse {
        success,
        status: status.as_u16(),
        data,
    };
    let code = if success { StatusCode::OK } else { status };
    (code, reply)
}

/// Inject `action` and `timestamp` into the caller's JSON object.
fn embed_metadata(text: &str, action: WebhookAction, timestamp: i64) -> Result<Vec<u8>> {
    let mut object: Map<String, Value> = if text.trim().is_empty() {
        Map::new()
    } else {
        serde_json::from_str(text)
            .map_err(|e| RelayError::InvalidBody(format!("expected a JSON object: {}", e)))?
    };
    object.insert("action".to_string(), json!(action.as_str()));
    object.insert("timestamp".to_string(), json!(timestamp));
    serde_json::to_vec(&object).map_err(|e| RelayError::Internal(e.to_string()))
}

/// A `validate_phone` call must carry a lead with an id and a phone number.
fn check_phone_input(text: &str) -> Result<()> {
    let payload: WebhookPayload = serde_json::from_str(text)
        .map_err(|e| RelayError::InvalidPhoneInput(format!("malformed payload: {}", e)))?;
    let lead = payload
        .lead
        .ok_or_else(|| RelayError::InvalidPhoneInput("missing lead".to_string()))?;
    if lead.id.trim().is_empty() {
        return Err(RelayError::InvalidPhoneInput("lead.id is empty".to_string()));
    }
    if lead.telefone.trim().is_empty() {
        return Err(RelayError::InvalidPhoneInput("lead.telefone is empty".to_string()));
    }
    Ok(())
}

fn relay_error_label(error: &RelayError) -> &'static str {
    match error {
        RelayError::MethodNotAllowed => "method_not_allowed",
        RelayError::InvalidPath => "invalid_path",
        RelayError::UnknownAction(_) => "unknown_action",
        RelayError::InvalidBody(_) | RelayError::InvalidPhoneInput(_) => "invalid_input",
        RelayError::NotConfigured(_) => "not_configured",
        RelayError::Forbidden => "forbidden",
        RelayError::Downstream(_) => "unreachable",
        RelayError::Internal(_) => "internal",
    }
}
