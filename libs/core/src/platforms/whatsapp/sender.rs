use async_trait::async_trait;
use metrics::counter;
use serde_json::Value;

use super::creds::WhatsAppCreds;
use crate::outbound::{Notifier, NotifyError, OutboundMessage, SendResult};

pub const DEFAULT_API_BASE: &str = "https://graph.facebook.com";
pub const DEFAULT_API_VERSION: &str = "v17.0";

/// Sends messages through the WhatsApp Cloud API.
///
/// An `api_base` starting with `mock://` skips the network and reports a synthetic
/// message id, which is handy for local runs without a Meta app.
pub struct WhatsAppSender {
    http: reqwest::Client,
    creds: WhatsAppCreds,
    api_base: String,
}

impl WhatsAppSender {
    /// `api_base` is the versioned Graph root, e.g. `https://graph.facebook.com/v17.0`.
    pub fn new(http: reqwest::Client, creds: WhatsAppCreds, api_base: Option<String>) -> Self {
        let base =
            api_base.unwrap_or_else(|| format!("{DEFAULT_API_BASE}/{DEFAULT_API_VERSION}"));
        Self {
            http,
            creds,
            api_base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn build_url(&self) -> String {
        format!("{}/{}/messages", self.api_base, self.creds.phone_id)
    }
}

#[async_trait]
impl Notifier for WhatsAppSender {
    async fn deliver(&self, message: OutboundMessage) -> Result<SendResult, NotifyError> {
        let kind = message.kind();

        if self.api_base.starts_with("mock://") {
            let raw = serde_json::to_value(&message).unwrap_or(Value::Null);
            return Ok(SendResult {
                message_id: Some(format!("mock:{}", self.creds.phone_id)),
                raw: Some(raw),
            });
        }

        let response = self
            .http
            .post(self.build_url())
            .bearer_auth(&self.creds.access_token)
            .json(&message)
            .send()
            .await
            .map_err(|err| {
                counter!("whatsapp_send_errors_total", "reason" => "transport", "kind" => kind)
                    .increment(1);
                NotifyError::Transport(err)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            counter!("whatsapp_send_errors_total", "reason" => "rejected", "kind" => kind)
                .increment(1);
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let raw: Value = response.json().await.unwrap_or(Value::Null);
        let message_id = raw
            .get("messages")
            .and_then(|v| v.get(0))
            .and_then(|v| v.get("id"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        tracing::debug!(kind, message_id = ?message_id, "whatsapp message accepted");

        Ok(SendResult {
            message_id,
            raw: Some(raw),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound::FeedbackTemplate;
    use axum::{
        Json, Router,
        extract::{Path, State},
        http::{HeaderMap, StatusCode},
        routing::post,
    };
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Vec<(String, Option<String>, Value)>>>;

    async fn record_send(
        State((seen, status)): State<(Seen, StatusCode)>,
        Path(phone_id): Path<String>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        seen.lock().unwrap().push((phone_id, auth, body));
        (status, Json(json!({ "messages": [{ "id": "wamid.HBg" }] })))
    }

    async fn spawn_graph(status: StatusCode) -> (String, Seen) {
        let seen: Seen = Arc::default();
        let app = Router::new()
            .route("/v17.0/{phone_id}/messages", post(record_send))
            .with_state((seen.clone(), status));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/v17.0"), seen)
    }

    fn sender(base: &str) -> WhatsAppSender {
        WhatsAppSender::new(
            reqwest::Client::new(),
            WhatsAppCreds::new("123", "token"),
            Some(base.to_string()),
        )
    }

    #[tokio::test]
    async fn mock_base_skips_network() {
        let res = sender("mock://wa")
            .send_acknowledgment("441100111222", "hello")
            .await
            .unwrap();
        assert_eq!(res.message_id.as_deref(), Some("mock:123"));
        assert_eq!(res.raw.unwrap()["text"]["body"], "hello");
    }

    #[tokio::test]
    async fn posts_bearer_authenticated_json() {
        let (base, seen) = spawn_graph(StatusCode::OK).await;
        let res = sender(&base)
            .send_template_invitation("15551234567", &FeedbackTemplate::default())
            .await
            .unwrap();
        assert_eq!(res.message_id.as_deref(), Some("wamid.HBg"));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (phone_id, auth, body) = &seen[0];
        assert_eq!(phone_id, "123");
        assert_eq!(auth.as_deref(), Some("Bearer token"));
        assert_eq!(body["type"], "template");
        assert_eq!(body["to"], "15551234567");
        assert_eq!(body["template"]["name"], "feedback_request");
    }

    #[tokio::test]
    async fn non_success_status_is_rejected() {
        let (base, _) = spawn_graph(StatusCode::UNAUTHORIZED).await;
        let err = sender(&base)
            .send_acknowledgment("1", "hi")
            .await
            .expect_err("rejected");
        match err {
            NotifyError::Rejected { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("wamid.HBg"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let err = sender(&format!("http://{addr}/v17.0"))
            .send_acknowledgment("1", "hi")
            .await
            .expect_err("transport");
        assert!(matches!(err, NotifyError::Transport(_)));
    }

    #[test]
    fn urls_are_scoped_to_phone_and_version() {
        let default = WhatsAppSender::new(
            reqwest::Client::new(),
            WhatsAppCreds::new("123", "t"),
            None,
        );
        assert_eq!(default.build_url(), "https://graph.facebook.com/v17.0/123/messages");

        let alt = sender("https://graph.facebook.com/v19.0/");
        assert_eq!(alt.api_base(), "https://graph.facebook.com/v19.0");
        assert_eq!(alt.build_url(), "https://graph.facebook.com/v19.0/123/messages");
    }
}
