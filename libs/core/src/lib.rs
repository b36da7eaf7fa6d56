//! Care feedback core contracts and value types.
//!
//! This crate holds the records persisted by the webhook receiver, the typed model of the
//! WhatsApp Cloud webhook envelope, the normalizer turning one into the other, and the
//! outbound notifier used to reply through the Graph API.
pub mod envelope;
pub mod labels;
pub mod normalize;
pub mod outbound;
pub mod platforms;
pub mod types;

pub use envelope::*;
pub use labels::*;
pub use normalize::*;
pub use outbound::*;
pub use platforms::whatsapp::creds::WhatsAppCreds;
pub use platforms::whatsapp::sender::WhatsAppSender;
pub use types::*;
