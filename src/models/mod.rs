// Wire types shared by the relay, the dispatcher and the handlers.

pub mod webhook;

pub use webhook::{
    CampaignDescriptor, CampaignLead, LeadDescriptor, RelayResponse, TemplateRef, UnknownAction,
    WebhookAction, WebhookPayload,
};
