use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

/// Answer to "would you recommend us?".
///
/// ```
/// use care_core::Recommendation;
///
/// assert_eq!(Recommendation::from_code(Some("0")), Recommendation::Yes);
/// assert_eq!(Recommendation::from_code(Some("1")), Recommendation::No);
/// assert_eq!(Recommendation::from_code(None).as_str(), "No");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    Yes,
    No,
}

impl Recommendation {
    /// Option id the survey flow uses for "yes".
    pub const AFFIRMATIVE_CODE: &'static str = "0";

    /// Only an exact match on [`Self::AFFIRMATIVE_CODE`] is a yes.
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some(Self::AFFIRMATIVE_CODE) => Recommendation::Yes,
            _ => Recommendation::No,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Yes => "Yes",
            Recommendation::No => "No",
        }
    }
}

/// Survey answers submitted through the feedback flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    pub phone_number: String,
    pub name: String,
    pub recommend: Recommendation,
    pub cleaning_quality: String,
    pub turnaround_time: String,
    pub customer_service: String,
    pub comment: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Freeform text sent by a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMessageRecord {
    pub phone_number: String,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Document collections, one per record variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Feedbacks,
    Messages,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Feedbacks, Collection::Messages];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Feedbacks => "feedbacks",
            Collection::Messages => "messages",
        }
    }
}

/// Normalized record extracted from one inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InboundRecord {
    Survey(FeedbackRecord),
    Text(TextMessageRecord),
}

impl InboundRecord {
    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            InboundRecord::Survey(_) => "survey",
            InboundRecord::Text(_) => "text",
        }
    }

    pub fn collection(&self) -> Collection {
        match self {
            InboundRecord::Survey(_) => Collection::Feedbacks,
            InboundRecord::Text(_) => Collection::Messages,
        }
    }

    pub fn phone_number(&self) -> &str {
        match self {
            InboundRecord::Survey(record) => &record.phone_number,
            InboundRecord::Text(record) => &record.phone_number,
        }
    }

    pub fn timestamp(&self) -> OffsetDateTime {
        match self {
            InboundRecord::Survey(record) => record.timestamp,
            InboundRecord::Text(record) => record.timestamp,
        }
    }

    /// The document written to [`collection`](Self::collection), without the variant tag.
    pub fn to_document(&self) -> serde_json::Result<Value> {
        match self {
            InboundRecord::Survey(record) => serde_json::to_value(record),
            InboundRecord::Text(record) => serde_json::to_value(record),
        }
    }
}
