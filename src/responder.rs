use crate::error::SendError;
use crate::settings::MessengerSettings;
use async_trait::async_trait;
use serde_json::{json, Value};

const ELLIPSIS: &str = "...";

#[async_trait]
pub trait Responder: Send + Sync {
    async fn send_text(&self, recipient: &str, text: &str) -> Result<(), SendError>;

    async fn send_quick_replies(
        &self,
        recipient: &str,
        text: &str,
        options: &[String],
    ) -> Result<(), SendError>;

    async fn send_read_receipt(&self, recipient: &str) -> Result<(), SendError>;

    async fn send_typing_indicator(&self, recipient: &str, on: bool) -> Result<(), SendError>;
}

/// Shortens a quick-reply title to `max` characters, ending it with `...`.
pub fn truncate_title(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(ELLIPSIS.len());
    let mut title: String = text.chars().take(keep).collect();
    title.push_str(ELLIPSIS);
    title
}

// --- Messenger Send API ---

pub struct MessengerResponder {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
    max_quick_replies: usize,
    title_max: usize,
}

impl MessengerResponder {
    pub fn new(settings: &MessengerSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/me/messages", settings.graph_api_url.trim_end_matches('/')),
            access_token: settings.page_access_token.clone(),
            max_quick_replies: settings.max_quick_replies,
            title_max: settings.quick_reply_title_max,
        }
    }

    fn quick_reply_body(&self, recipient: &str, text: &str, options: &[String]) -> Value {
        if options.len() > self.max_quick_replies {
            log::debug!(
                "Dropping {} quick replies over the limit of {}",
                options.len() - self.max_quick_replies,
                self.max_quick_replies
            );
        }
        let quick_replies: Vec<Value> = options
            .iter()
            .take(self.max_quick_replies)
            .map(|option| {
                let title = truncate_title(option, self.title_max);
                json!({"content_type": "text", "title": title, "payload": title})
            })
            .collect();
        json!({
            "recipient": {"id": recipient},
            "message": {"text": text, "quick_replies": quick_replies},
        })
    }

    async fn post(&self, body: Value) -> Result<(), SendError> {
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("access_token", self.access_token.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(SendError::Rejected { status: status.as_u16(), body })
        }
    }

    async fn sender_action(&self, recipient: &str, action: &str) -> Result<(), SendError> {
        self.post(json!({"recipient": {"id": recipient}, "sender_action": action}))
            .await
    }
}

#[async_trait]
impl Responder for MessengerResponder {
    async fn send_text(&self, recipient: &str, text: &str) -> Result<(), SendError> {
        self.post(json!({"recipient": {"id": recipient}, "message": {"text": text}}))
            .await
    }

    async fn send_quick_replies(
        &self,
        recipient: &str,
        text: &str,
        options: &[String],
    ) -> Result<(), SendError> {
        if options.is_empty() {
            return self.send_text(recipient, text).await;
        }
        self.post(self.quick_reply_body(recipient, text, options)).await
    }

    async fn send_read_receipt(&self, recipient: &str) -> Result<(), SendError> {
        self.sender_action(recipient, "mark_seen").await
    }

    async fn send_typing_indicator(&self, recipient: &str, on: bool) -> Result<(), SendError> {
        self.sender_action(recipient, if on { "typing_on" } else { "typing_off" })
            .await
    }
}
