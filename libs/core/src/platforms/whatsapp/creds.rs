use std::fmt;

/// Credentials for the WhatsApp Cloud API messages endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct WhatsAppCreds {
    pub phone_id: String,
    pub access_token: String,
}

impl WhatsAppCreds {
    pub fn new(phone_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            phone_id: phone_id.into(),
            access_token: access_token.into(),
        }
    }
}

impl fmt::Debug for WhatsAppCreds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WhatsAppCreds")
            .field("phone_id", &self.phone_id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}
