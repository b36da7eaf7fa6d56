//! Outbound WhatsApp message payloads and the notifier contract.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

pub const MESSAGING_PRODUCT: &str = "whatsapp";

/// Body of a `POST /{phone_id}/messages` call.
///
/// ```
/// use care_core::OutboundMessage;
///
/// let msg = OutboundMessage::text("15551234567", "hello");
/// let json = serde_json::to_value(&msg).unwrap();
/// assert_eq!(json["type"], "text");
/// assert_eq!(json["text"]["body"], "hello");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub messaging_product: &'static str,
    pub to: String,
    #[serde(flatten)]
    pub body: OutboundBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundBody {
    Text { text: TextBody },
    Template { template: TemplateBody },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextBody {
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateBody {
    pub name: String,
    pub language: TemplateLanguage,
    pub components: Vec<TemplateComponent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateLanguage {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TemplateComponent {
    Body {
        parameters: Vec<TemplateParameter>,
    },
    Button {
        sub_type: String,
        index: String,
        parameters: Vec<TemplateParameter>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TemplateParameter {
    Text { text: String },
    Action { action: FlowAction },
}

/// Action bound to a flow button. An empty object lets the template's flow start as
/// configured in WhatsApp Manager.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlowAction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_token: Option<String>,
}

/// Approved template inviting a customer to fill in the feedback flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackTemplate {
    pub name: String,
    pub language: String,
    pub business_name: String,
    pub service_category: String,
    pub survey_type: String,
    pub experience_type: String,
    pub flow_token: Option<String>,
}

impl Default for FeedbackTemplate {
    fn default() -> Self {
        Self {
            name: "feedback_request".into(),
            language: "en".into(),
            business_name: "Sneaklin".into(),
            service_category: "shoe care service".into(),
            survey_type: "short survey".into(),
            experience_type: "recent order".into(),
            flow_token: None,
        }
    }
}

impl FeedbackTemplate {
    /// Body parameters in template placeholder order ({{1}}..{{4}}).
    pub fn parameters(&self) -> [&str; 4] {
        [
            &self.business_name,
            &self.service_category,
            &self.survey_type,
            &self.experience_type,
        ]
    }
}

impl OutboundMessage {
    pub fn text(to: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            messaging_product: MESSAGING_PRODUCT,
            to: to.into(),
            body: OutboundBody::Text {
                text: TextBody { body: body.into() },
            },
        }
    }

    pub fn feedback_invitation(to: impl Into<String>, template: &FeedbackTemplate) -> Self {
        let body = TemplateComponent::Body {
            parameters: template
                .parameters()
                .iter()
                .map(|text| TemplateParameter::Text {
                    text: (*text).to_string(),
                })
                .collect(),
        };
        let button = TemplateComponent::Button {
            sub_type: "flow".into(),
            index: "0".into(),
            parameters: vec![TemplateParameter::Action {
                action: FlowAction {
                    flow_token: template.flow_token.clone(),
                },
            }],
        };
        Self {
            messaging_product: MESSAGING_PRODUCT,
            to: to.into(),
            body: OutboundBody::Template {
                template: TemplateBody {
                    name: template.name.clone(),
                    language: TemplateLanguage {
                        code: template.language.clone(),
                    },
                    components: vec![body, button],
                },
            },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self.body {
            OutboundBody::Text { .. } => "text",
            OutboundBody::Template { .. } => "template",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SendResult {
    pub message_id: Option<String>,
    pub raw: Option<Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("whatsapp transport error")]
    Transport(#[from] reqwest::Error),
    #[error("whatsapp rejected message: status={status} body={body}")]
    Rejected { status: u16, body: String },
}

/// Sends messages to customers through the messaging platform.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, message: OutboundMessage) -> Result<SendResult, NotifyError>;

    /// Free-text reply, e.g. thanking a customer for their feedback.
    async fn send_acknowledgment(&self, to: &str, text: &str) -> Result<SendResult, NotifyError> {
        self.deliver(OutboundMessage::text(to, text)).await
    }

    /// Business-initiated template carrying the feedback flow button.
    async fn send_template_invitation(
        &self,
        to: &str,
        template: &FeedbackTemplate,
    ) -> Result<SendResult, NotifyError> {
        self.deliver(OutboundMessage::feedback_invitation(to, template))
            .await
    }
}
