use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Downstream automation flow a relay call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookAction {
    Launch,
    Pause,
    Resume,
    ValidatePhone,
}

impl WebhookAction {
    pub const ALL: [WebhookAction; 4] = [
        WebhookAction::Launch,
        WebhookAction::Pause,
        WebhookAction::Resume,
        WebhookAction::ValidatePhone,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookAction::Launch => "launch",
            WebhookAction::Pause => "pause",
            WebhookAction::Resume => "resume",
            WebhookAction::ValidatePhone => "validate_phone",
        }
    }

    /// Tags of every known action, in table order.
    pub fn valid_actions() -> Vec<String> {
        Self::ALL.iter().map(|a| a.as_str().to_string()).collect()
    }
}

impl fmt::Display for WebhookAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAction(pub String);

impl fmt::Display for UnknownAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown webhook action: {}", self.0)
    }
}

impl std::error::Error for UnknownAction {}

impl FromStr for WebhookAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}

/// Campaign sent along with a `launch` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignDescriptor {
    pub nome: String,
    pub qtd_disparos: u32,
    pub status: String,
    pub data_inicio: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horario_inicio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horario_fim: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intervalo_minutos: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disparos_por_hora: Option<u32>,
}

/// Lead entry of a campaign launch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignLead {
    pub id_lead: String,
    pub nome: String,
    pub telefone: String,
    pub condominio: String,
}

/// A single lead, as sent for phone validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadDescriptor {
    pub id: String,
    pub nome: String,
    pub telefone: String,
    #[serde(default)]
    pub condominio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origem: Option<String>,
}

/// Template reference handed to the automation engine for rotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRef {
    pub id_template: String,
    pub nome: String,
}

/// Open key/value document carried by a relay call.
///
/// The known shapes are typed; anything else rides along in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campanha: Option<CampaignDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leads: Option<Vec<CampaignLead>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead: Option<LeadDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templates: Option<Vec<TemplateRef>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WebhookPayload {
    pub fn for_campaign(campaign_id: impl Into<String>) -> Self {
        Self {
            campaign_id: Some(campaign_id.into()),
            ..Default::default()
        }
    }

    pub fn for_lead(lead: LeadDescriptor) -> Self {
        Self {
            lead: Some(lead),
            ..Default::default()
        }
    }
}

/// Body the relay returns once the downstream answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayResponse {
    pub success: bool,
    pub status: u16,
    pub data: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_round_trips_through_str() {
        for action in WebhookAction::ALL {
            assert_eq!(action.as_str().parse::<WebhookAction>(), Ok(action));
        }
        assert_eq!(
            "unknown".parse::<WebhookAction>(),
            Err(UnknownAction("unknown".to_string()))
        );
        assert!("Launch".parse::<WebhookAction>().is_err());
    }

    #[test]
    fn test_action_serde_matches_path_tag() {
        assert_eq!(
            serde_json::to_value(WebhookAction::ValidatePhone).unwrap(),
            json!("validate_phone")
        );
        assert_eq!(
            WebhookAction::valid_actions(),
            vec!["launch", "pause", "resume", "validate_phone"]
        );
    }

    #[test]
    fn test_payload_keeps_unknown_keys() {
        let raw = json!({
            "campaign_id": "c-1",
            "priority": "high",
        });
        let payload: WebhookPayload = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(payload.campaign_id.as_deref(), Some("c-1"));
        assert_eq!(payload.extra.get("priority"), Some(&json!("high")));
        assert_eq!(serde_json::to_value(&payload).unwrap(), raw);
    }

    #[test]
    fn test_lead_payload_shape() {
        let payload = WebhookPayload::for_lead(LeadDescriptor {
            id: "l-1".into(),
            nome: "Ana".into(),
            telefone: "+5511999990000".into(),
            condominio: None,
            origem: Some("CSV".into()),
        });
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "lead": {
                    "id": "l-1",
                    "nome": "Ana",
                    "telefone": "+5511999990000",
                    "condominio": null,
                    "origem": "CSV"
                }
            })
        );
    }
}
