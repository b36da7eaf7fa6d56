//! Turns a webhook envelope into the records the receiver persists.

use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::envelope::{ChangeValue, InboundMessage, MessageKind, WebhookEnvelope};
use crate::labels::LabelCategory;
use crate::types::{FeedbackRecord, InboundRecord, Recommendation, TextMessageRecord};

/// Stored when the survey comment box was left empty.
pub const DEFAULT_COMMENT: &str = "No comment";
/// Stored when the webhook carries no contact profile name.
pub const UNKNOWN_SENDER: &str = "Unknown";

const RECOMMEND_FIELD: &str = "screen_0_recommend_3";
const CLEANING_QUALITY_FIELD: &str = "screen_0_cleaning_quality_0";
const TURNAROUND_FIELD: &str = "screen_0_turnaround_1";
const CUSTOMER_SERVICE_FIELD: &str = "screen_0_customer_service_2";
const COMMENT_FIELD: &str = "screen_0_comment_4";

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("flow reply from {from} has no response_json")]
    MissingResponse { from: String },
    #[error("flow reply from {from} carries malformed response_json")]
    MalformedResponse {
        from: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("flow reply from {from} response_json is not a JSON object")]
    NotAnObject { from: String },
}

/// Coded answers decoded from a flow reply's `response_json`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurveyAnswers {
    pub recommend: Option<String>,
    pub cleaning_quality: Option<String>,
    pub turnaround: Option<String>,
    pub customer_service: Option<String>,
    pub comment: Option<String>,
}

impl SurveyAnswers {
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        Self {
            // exact string match only, a numeric 0 is not the affirmative code
            recommend: fields
                .get(RECOMMEND_FIELD)
                .and_then(Value::as_str)
                .map(str::to_string),
            cleaning_quality: option_code(fields, CLEANING_QUALITY_FIELD),
            turnaround: option_code(fields, TURNAROUND_FIELD),
            customer_service: option_code(fields, CUSTOMER_SERVICE_FIELD),
            comment: fields
                .get(COMMENT_FIELD)
                .and_then(Value::as_str)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        }
    }

    pub fn into_record(
        self,
        phone_number: String,
        name: String,
        now: OffsetDateTime,
    ) -> FeedbackRecord {
        FeedbackRecord {
            phone_number,
            name,
            recommend: Recommendation::from_code(self.recommend.as_deref()),
            cleaning_quality: LabelCategory::CleaningQuality
                .resolve_opt(self.cleaning_quality.as_deref())
                .to_string(),
            turnaround_time: LabelCategory::Turnaround
                .resolve_opt(self.turnaround.as_deref())
                .to_string(),
            customer_service: LabelCategory::CustomerService
                .resolve_opt(self.customer_service.as_deref())
                .to_string(),
            comment: self.comment.unwrap_or_else(|| DEFAULT_COMMENT.to_string()),
            timestamp: now,
        }
    }
}

fn option_code(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(code) => Some(code.clone()),
        Value::Number(code) => Some(code.to_string()),
        _ => None,
    }
}

/// Extracts one record per survey reply or text message found in `envelope`.
///
/// Anything that is not a WhatsApp Business message (wrong `object`, missing `entry`,
/// `changes`, `value` or `messages`, unsupported message types, messages without a sender)
/// yields no record. `now` stamps every record; event timestamps are ignored.
pub fn normalize(
    envelope: &WebhookEnvelope,
    now: OffsetDateTime,
) -> Result<Vec<InboundRecord>, NormalizeError> {
    let mut out = Vec::new();
    if !envelope.is_whatsapp_business() {
        return Ok(out);
    }
    let Some(entries) = envelope.entry.as_ref() else {
        return Ok(out);
    };

    for entry in entries {
        let Some(changes) = entry.changes.as_ref() else {
            continue;
        };
        for change in changes {
            let Some(value) = change.value.as_ref() else {
                continue;
            };
            let Some(messages) = value.messages.as_ref() else {
                continue;
            };
            for message in messages {
                if let Some(record) = normalize_message(value, message, now)? {
                    out.push(record);
                }
            }
        }
    }
    Ok(out)
}

fn normalize_message(
    value: &ChangeValue,
    message: &InboundMessage,
    now: OffsetDateTime,
) -> Result<Option<InboundRecord>, NormalizeError> {
    let Some(kind) = message.classify() else {
        return Ok(None);
    };
    let Some(from) = message.from.as_deref().filter(|f| !f.is_empty()) else {
        tracing::debug!(msg_id = ?message.id, "message without sender skipped");
        return Ok(None);
    };

    let record = match kind {
        MessageKind::SurveyReply { response_json } => {
            let answers = parse_response(from, response_json)?;
            let name = value.sender_name().unwrap_or(UNKNOWN_SENDER).to_string();
            InboundRecord::Survey(answers.into_record(from.to_string(), name, now))
        }
        MessageKind::Text { body } => InboundRecord::Text(TextMessageRecord {
            phone_number: from.to_string(),
            message: body.to_string(),
            timestamp: now,
        }),
    };
    Ok(Some(record))
}

fn parse_response(from: &str, raw: Option<&str>) -> Result<SurveyAnswers, NormalizeError> {
    let raw = raw.ok_or_else(|| NormalizeError::MissingResponse {
        from: from.to_string(),
    })?;
    let parsed: Value =
        serde_json::from_str(raw).map_err(|source| NormalizeError::MalformedResponse {
            from: from.to_string(),
            source,
        })?;
    // A scalar or array body carries no answers at all; it is rejected instead of being
    // stored as an all-default survey.
    match parsed {
        Value::Object(fields) => Ok(SurveyAnswers::from_fields(&fields)),
        _ => Err(NormalizeError::NotAnObject {
            from: from.to_string(),
        }),
    }
}
