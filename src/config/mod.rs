use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::str::FromStr;
use tracing::{info, warn};

use crate::models::WebhookAction;

pub const DEFAULT_PORT: u16 = 8787;
pub const DEFAULT_ALLOWED_ORIGIN: &str = "https://leadflow.vistalivretech.com.br";
pub const DEFAULT_FORWARD_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LOG_FILTER: &str = "leadflow_relay=debug,tower_http=info";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub environment: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub relay: RelayConfig,
}

/// How the relay lays out the forwarded body before signing it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigningMode {
    /// Forward the caller's body byte for byte.
    #[default]
    Proxy,
    /// Inject `action` and `timestamp` into the JSON object before signing.
    Embedded,
}

impl FromStr for SigningMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "proxy" => Ok(SigningMode::Proxy),
            "embedded" | "direct" => Ok(SigningMode::Embedded),
            other => Err(anyhow!("unknown signing mode: {}", other)),
        }
    }
}

/// Immutable relay settings, handed to `WebhookRelay::new`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Destination URL per action; a missing entry means "not configured".
    pub destinations: BTreeMap<WebhookAction, String>,
    /// Shared HMAC secret. `None` forwards unsigned.
    #[serde(skip_serializing)]
    pub secret: Option<String>,
    /// Origin echoed in CORS headers and checked when `enforce_origin` is set.
    pub allowed_origin: String,
    pub enforce_origin: bool,
    pub signing_mode: SigningMode,
    pub forward_timeout_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            destinations: BTreeMap::new(),
            secret: None,
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
            enforce_origin: false,
            signing_mode: SigningMode::Proxy,
            forward_timeout_secs: DEFAULT_FORWARD_TIMEOUT_SECS,
        }
    }
}

impl RelayConfig {
    /// Environment variable holding the destination of `action`.
    pub fn destination_env_var(action: WebhookAction) -> &'static str {
        match action {
            WebhookAction::Launch => "N8N_WEBHOOK_LAUNCH",
            WebhookAction::Pause => "N8N_WEBHOOK_PAUSE",
            WebhookAction::Resume => "N8N_WEBHOOK_RESUME",
            WebhookAction::ValidatePhone => "N8N_WEBHOOK_VALIDATE_PHONE",
        }
    }

    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        for action in WebhookAction::ALL {
            if let Some(url) = non_empty_var(Self::destination_env_var(action)) {
                config.destinations.insert(action, url);
            }
        }

        config.secret = non_empty_var("WEBHOOK_SECRET");

        if let Some(origin) = non_empty_var("ALLOWED_ORIGIN") {
            config.allowed_origin = origin;
        }

        if let Ok(val) = env::var("ENFORCE_ORIGIN") {
            match val.parse::<bool>() {
                Ok(enforce) => config.enforce_origin = enforce,
                Err(_) => warn!("Failed to parse ENFORCE_ORIGIN: {}, using default", val),
            }
        }

        if let Ok(val) = env::var("SIGNING_MODE") {
            config.signing_mode = val.parse()?;
        }

        if let Ok(val) = env::var("FORWARD_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) if (1..=120).contains(&secs) => {
                    config.forward_timeout_secs = secs;
                    info!("Using custom forward timeout: {}s", secs);
                }
                Ok(_) => warn!(
                    "Invalid forward timeout: {}, must be between 1 and 120, using default",
                    val
                ),
                Err(_) => warn!("Failed to parse forward timeout: {}, using default", val),
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject destinations that are not absolute http(s) URLs.
    pub fn validate(&self) -> Result<()> {
        for (action, url) in &self.destinations {
            let parsed = reqwest::Url::parse(url)
                .map_err(|e| anyhow!("Invalid destination URL for {}: {}", action, e))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(anyhow!(
                    "Destination URL for {} must use http or https, got {}",
                    action,
                    parsed.scheme()
                ));
            }
        }
        Ok(())
    }

    pub fn destination(&self, action: WebhookAction) -> Option<&str> {
        self.destinations.get(&action).map(String::as_str)
    }

    pub fn is_configured(&self, action: WebhookAction) -> bool {
        self.destinations.contains_key(&action)
    }

    pub fn signing_enabled(&self) -> bool {
        self.secret.is_some()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let mut config = Config {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            port: match env::var("PORT") {
                Ok(val) => val
                    .parse()
                    .map_err(|e| anyhow!("PORT must be a valid port number: {}", e))?,
                Err(_) => DEFAULT_PORT,
            },
            request_timeout_secs: parse_request_timeout(env::var("REQUEST_TIMEOUT_SECS").ok()),
            relay: RelayConfig::from_env()?,
        };
        config.enforce_timeout_ordering();
        Ok(config)
    }

    /// Cap the forward timeout strictly below the inbound request timeout.
    pub fn enforce_timeout_ordering(&mut self) {
        if self.relay.forward_timeout_secs >= self.request_timeout_secs {
            let capped = self.request_timeout_secs.saturating_sub(1).max(1);
            warn!(
                "Forward timeout {}s must be below request timeout {}s, using {}s",
                self.relay.forward_timeout_secs, self.request_timeout_secs, capped
            );
            self.relay.forward_timeout_secs = capped;
        }
    }
}

/// Filter used when `RUST_LOG` is unset: `LOG_LEVEL`, else the crate default.
pub fn log_filter() -> String {
    non_empty_var("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

fn parse_request_timeout(val: Option<String>) -> u64 {
    let Some(val) = val else {
        return DEFAULT_REQUEST_TIMEOUT_SECS;
    };
    match val.trim().parse::<u64>() {
        Ok(secs) if (2..=600).contains(&secs) => {
            info!("Using custom request timeout: {}s", secs);
            secs
        }
        Ok(_) => {
            warn!(
                "Invalid request timeout: {}, must be between 2 and 600, using default",
                val
            );
            DEFAULT_REQUEST_TIMEOUT_SECS
        }
        Err(_) => {
            warn!("Failed to parse request timeout: {}, using default", val);
            DEFAULT_REQUEST_TIMEOUT_SECS
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
