use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use care_core::{FeedbackTemplate, InboundRecord, Notifier, WebhookEnvelope, normalize};
use care_store::SharedRecordStore;
use metrics::counter;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{Instrument, Span, debug, error, field, info, info_span, warn};

use crate::error::IngressError;

const SUBSCRIBE_MODE: &str = "subscribe";

/// Everything a request handler needs, built once at start-up.
pub struct AppState {
    pub store: SharedRecordStore,
    pub notifier: Arc<dyn Notifier>,
    pub verify_token: String,
    pub template: FeedbackTemplate,
    pub survey_ack: String,
    pub message_ack: String,
}

impl AppState {
    fn ack_text(&self, record: &InboundRecord) -> &str {
        match record {
            InboundRecord::Survey(_) => &self.survey_ack,
            InboundRecord::Text(_) => &self.message_ack,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", get(verify).post(receive))
        .route("/send-feedback-request", post(send_feedback_request))
        .route("/healthz", get(healthz))
        .with_state(Arc::new(state))
}

/// Progress of one webhook delivery, recorded on the `webhook.handle` span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Normalizing,
    Persisting,
    Notifying,
    Responded,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Validating => "validating",
            Stage::Normalizing => "normalizing",
            Stage::Persisting => "persisting",
            Stage::Notifying => "notifying",
            Stage::Responded => "responded",
        }
    }

    fn enter(self, span: &Span) {
        span.record("stage", self.as_str());
    }
}

#[derive(Deserialize)]
pub struct VerifyQs {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
    #[serde(rename = "hub.verify_token")]
    token: Option<String>,
}

async fn verify(
    State(state): State<Arc<AppState>>,
    Query(q): Query<VerifyQs>,
) -> impl IntoResponse {
    let mode_ok = q.mode.as_deref().is_none_or(|mode| mode == SUBSCRIBE_MODE);
    if mode_ok && q.token.as_deref() == Some(state.verify_token.as_str()) {
        info!("webhook verified");
        (StatusCode::OK, q.challenge.unwrap_or_default())
    } else {
        warn!(mode = ?q.mode, "webhook verification rejected");
        (StatusCode::FORBIDDEN, String::new())
    }
}

async fn receive(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<StatusCode, IngressError> {
    let span = info_span!("webhook.handle", stage = field::Empty, records = field::Empty);
    handle_event(state, body).instrument(span).await
}

async fn handle_event(state: Arc<AppState>, body: Bytes) -> Result<StatusCode, IngressError> {
    let span = Span::current();
    Stage::Validating.enter(&span);

    let envelope: WebhookEnvelope = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(err) => {
            debug!(error = %err, "payload is not a webhook envelope");
            return Ok(ignored(&span));
        }
    };
    if !envelope.is_whatsapp_business() || envelope.entry.is_none() {
        debug!(object = ?envelope.object, "event ignored");
        return Ok(ignored(&span));
    }

    Stage::Normalizing.enter(&span);
    let records = normalize(&envelope, OffsetDateTime::now_utc()).map_err(|err| {
        error!(error = %err, "failed to normalize webhook event");
        err
    })?;
    span.record("records", records.len());
    if records.is_empty() {
        return Ok(ignored(&span));
    }

    Stage::Persisting.enter(&span);
    for (stored, record) in records.iter().enumerate() {
        let id = match state.store.insert(record).await {
            Ok(id) => id,
            Err(err) => {
                counter!("feedback_store_errors_total").increment(1);
                error!(
                    error = %err,
                    kind = record.kind(),
                    stored,
                    "failed to persist record"
                );
                // earlier records of this delivery are already committed
                Stage::Notifying.enter(&span);
                for saved in &records[..stored] {
                    spawn_acknowledgment(&state, saved);
                }
                return Err(err.into());
            }
        };
        counter!("feedback_records_total", "kind" => record.kind()).increment(1);
        info!(
            id = %id,
            kind = record.kind(),
            collection = record.collection().as_str(),
            phone = %record.phone_number(),
            "record stored"
        );
    }

    Stage::Notifying.enter(&span);
    for record in &records {
        spawn_acknowledgment(&state, record);
    }

    Stage::Responded.enter(&span);
    Ok(StatusCode::OK)
}

fn ignored(span: &Span) -> StatusCode {
    counter!("feedback_webhook_ignored_total").increment(1);
    Stage::Responded.enter(span);
    StatusCode::OK
}

/// Replies to the sender without holding up the webhook response.
fn spawn_acknowledgment(state: &AppState, record: &InboundRecord) {
    let notifier = Arc::clone(&state.notifier);
    let to = record.phone_number().to_string();
    let text = state.ack_text(record).to_string();
    let kind = record.kind();
    tokio::spawn(
        async move {
            match notifier.send_acknowledgment(&to, &text).await {
                Ok(sent) => {
                    debug!(phone = %to, message_id = ?sent.message_id, "acknowledgment sent")
                }
                Err(err) => {
                    counter!("feedback_notify_errors_total", "kind" => kind).increment(1);
                    warn!(error = %err, phone = %to, "acknowledgment failed");
                }
            }
        }
        .in_current_span(),
    );
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub phone_number: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

async fn send_feedback_request(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<FeedbackRequest>, JsonRejection>,
) -> Result<Json<MessageBody>, IngressError> {
    let phone = payload
        .ok()
        .and_then(|Json(req)| req.phone_number)
        .map(|phone| phone.trim().to_string())
        .filter(|phone| !phone.is_empty())
        .ok_or(IngressError::MissingPhone)?;

    let sent = state
        .notifier
        .send_template_invitation(&phone, &state.template)
        .await
        .map_err(|err| {
            counter!("feedback_notify_errors_total", "kind" => "template").increment(1);
            error!(error = %err, phone = %phone, "failed to send feedback request");
            err
        })?;

    info!(phone = %phone, message_id = ?sent.message_id, "feedback request sent");
    Ok(Json(MessageBody {
        message: "Feedback request sent successfully".into(),
    }))
}

async fn healthz() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}
