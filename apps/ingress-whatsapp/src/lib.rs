//! WhatsApp webhook receiver for customer feedback.
//!
//! Meta delivers events to `POST /webhook`; survey replies land in `feedbacks`, plain
//! text messages in `messages`, and each sender gets an acknowledgment in the background.
//! `POST /send-feedback-request` invites a customer to the survey flow.

pub mod config;
pub mod error;
pub mod http;

use std::sync::Arc;

use anyhow::{Context, Result};
use care_core::WhatsAppSender;
use care_store::SqliteRecordStore;

pub use config::IngressConfig;
pub use error::IngressError;
pub use http::{AppState, Stage, build_router};

/// Opens the record store and the Graph API client described by `config`.
pub fn build_state(config: &IngressConfig) -> Result<AppState> {
    let store = SqliteRecordStore::open(&config.database_path).with_context(|| {
        format!(
            "failed to open record store at {}",
            config.database_path.display()
        )
    })?;
    let sender = WhatsAppSender::new(
        reqwest::Client::new(),
        config.creds.clone(),
        Some(config.api_base.clone()),
    );

    Ok(AppState {
        store: Arc::new(store),
        notifier: Arc::new(sender),
        verify_token: config.verify_token.clone(),
        template: config.template.clone(),
        survey_ack: config.survey_ack.clone(),
        message_ack: config.message_ack.clone(),
    })
}
