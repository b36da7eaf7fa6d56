use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use care_core::platforms::whatsapp::sender::{DEFAULT_API_BASE, DEFAULT_API_VERSION};
use care_core::{FeedbackTemplate, WhatsAppCreds};

pub const DEFAULT_SURVEY_ACK: &str = "Thanks for your feedback! We appreciate your time. 🙌";
pub const DEFAULT_MESSAGE_ACK: &str = "Thanks for your message! We'll get back to you soon.";

#[derive(Debug, Clone)]
pub struct IngressConfig {
    pub addr: SocketAddr,
    pub database_path: PathBuf,
    pub creds: WhatsAppCreds,
    pub verify_token: String,
    /// Versioned Graph root, e.g. `https://graph.facebook.com/v17.0`.
    pub api_base: String,
    pub template: FeedbackTemplate,
    pub survey_ack: String,
    pub message_ack: String,
}

impl IngressConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            get(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{key} must be set"))
        };

        let bind = get("BIND").unwrap_or_else(|| "0.0.0.0".into());
        let ip = IpAddr::from_str(&bind).with_context(|| format!("invalid BIND address {bind}"))?;
        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("invalid PORT {raw}"))?,
            None => 3000,
        };

        let api_base = format!(
            "{}/{}",
            get("WA_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.into())
                .trim_end_matches('/'),
            get("WA_API_VERSION").unwrap_or_else(|| DEFAULT_API_VERSION.into())
        );

        let defaults = FeedbackTemplate::default();
        let template = FeedbackTemplate {
            name: get("FEEDBACK_TEMPLATE_NAME").unwrap_or(defaults.name),
            language: get("FEEDBACK_TEMPLATE_LANG").unwrap_or(defaults.language),
            business_name: get("BUSINESS_NAME").unwrap_or(defaults.business_name),
            flow_token: get("FEEDBACK_FLOW_TOKEN").filter(|t| !t.is_empty()),
            ..defaults
        };

        Ok(Self {
            addr: SocketAddr::new(ip, port),
            database_path: get("DATABASE_PATH")
                .unwrap_or_else(|| "care.db".into())
                .into(),
            creds: WhatsAppCreds::new(
                required("WHATSAPP_PHONE_ID")?,
                required("WHATSAPP_ACCESS_TOKEN")?,
            ),
            verify_token: required("WHATSAPP_VERIFY_TOKEN")?,
            api_base,
            template,
            survey_ack: get("SURVEY_ACK_TEXT").unwrap_or_else(|| DEFAULT_SURVEY_ACK.into()),
            message_ack: get("MESSAGE_ACK_TEXT").unwrap_or_else(|| DEFAULT_MESSAGE_ACK.into()),
        })
    }
}
