//! Typed model of the WhatsApp Cloud API webhook payload.
//!
//! Every level is optional: Meta sends status callbacks, account updates and messages
//! through the same endpoint, so a missing branch only means the event is not one we
//! act on.

use serde::Deserialize;

/// `object` value carried by WhatsApp Business webhooks.
pub const WHATSAPP_BUSINESS_ACCOUNT: &str = "whatsapp_business_account";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookEnvelope {
    pub object: Option<String>,
    pub entry: Option<Vec<Entry>>,
}

impl WebhookEnvelope {
    pub fn is_whatsapp_business(&self) -> bool {
        self.object.as_deref() == Some(WHATSAPP_BUSINESS_ACCOUNT)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Entry {
    pub id: Option<String>,
    pub changes: Option<Vec<Change>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Change {
    pub field: Option<String>,
    pub value: Option<ChangeValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeValue {
    pub messaging_product: Option<String>,
    pub contacts: Option<Vec<Contact>>,
    pub messages: Option<Vec<InboundMessage>>,
}

impl ChangeValue {
    /// Profile name of the first contact, when Meta included one.
    pub fn sender_name(&self) -> Option<&str> {
        self.contacts
            .as_ref()?
            .first()?
            .profile
            .as_ref()?
            .name
            .as_deref()
            .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Contact {
    pub wa_id: Option<String>,
    pub profile: Option<Profile>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Profile {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundMessage {
    pub from: Option<String>,
    pub id: Option<String>,
    pub timestamp: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub text: Option<TextContent>,
    pub interactive: Option<Interactive>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextContent {
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Interactive {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub nfm_reply: Option<NfmReply>,
}

/// Reply produced by a WhatsApp Flow ("native flow message").
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NfmReply {
    pub name: Option<String>,
    pub body: Option<String>,
    pub response_json: Option<String>,
}

/// Message subtypes the receiver acts on, dispatched on the declared `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind<'a> {
    /// `interactive` / `nfm_reply`; carries the raw `response_json` when present.
    SurveyReply { response_json: Option<&'a str> },
    Text { body: &'a str },
}

impl InboundMessage {
    pub fn classify(&self) -> Option<MessageKind<'_>> {
        match self.kind.as_deref()? {
            "interactive" => {
                let interactive = self.interactive.as_ref()?;
                if interactive.kind.as_deref() != Some("nfm_reply") {
                    return None;
                }
                let response_json = interactive
                    .nfm_reply
                    .as_ref()
                    .and_then(|reply| reply.response_json.as_deref());
                Some(MessageKind::SurveyReply { response_json })
            }
            "text" => {
                let body = self.text.as_ref()?.body.as_deref()?;
                Some(MessageKind::Text { body })
            }
            _ => None,
        }
    }
}
