use serde::Deserialize;
use serde_json::Value;

/// One messaging event, already classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    TextMessage { sender_id: String, text: String },
    QuickReplyClick { sender_id: String, text: String, payload: String },
    AttachmentOnly { sender_id: String },
    Echo { sender_id: String },
    Postback { sender_id: String, payload: String },
    DeliveryReceipt { sender_id: String },
    ReadReceipt { sender_id: String },
    AccountLink { sender_id: String },
    Unrecognized { sender_id: Option<String> },
}

impl InboundEvent {
    pub fn sender_id(&self) -> Option<&str> {
        match self {
            InboundEvent::TextMessage { sender_id, .. }
            | InboundEvent::QuickReplyClick { sender_id, .. }
            | InboundEvent::AttachmentOnly { sender_id }
            | InboundEvent::Echo { sender_id }
            | InboundEvent::Postback { sender_id, .. }
            | InboundEvent::DeliveryReceipt { sender_id }
            | InboundEvent::ReadReceipt { sender_id }
            | InboundEvent::AccountLink { sender_id } => Some(sender_id.as_str()),
            InboundEvent::Unrecognized { sender_id } => sender_id.as_deref(),
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            InboundEvent::TextMessage { .. } => "text",
            InboundEvent::QuickReplyClick { .. } => "quick_reply",
            InboundEvent::AttachmentOnly { .. } => "attachment",
            InboundEvent::Echo { .. } => "echo",
            InboundEvent::Postback { .. } => "postback",
            InboundEvent::DeliveryReceipt { .. } => "delivery",
            InboundEvent::ReadReceipt { .. } => "read",
            InboundEvent::AccountLink { .. } => "account_linking",
            InboundEvent::Unrecognized { .. } => "unrecognized",
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct WebhookBatch {
    pub object: String,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct WebhookEntry {
    #[serde(default)]
    pub messaging: Vec<MessagingItem>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Party {
    pub id: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct QuickReplyPayload {
    pub payload: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct MessagePayload {
    #[serde(default)]
    pub is_echo: bool,
    pub text: Option<String>,
    pub quick_reply: Option<QuickReplyPayload>,
    #[serde(default)]
    pub attachments: Vec<Value>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PostbackPayload {
    #[serde(default)]
    pub payload: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct MessagingItem {
    pub sender: Option<Party>,
    pub message: Option<MessagePayload>,
    pub postback: Option<PostbackPayload>,
    pub delivery: Option<Value>,
    pub read: Option<Value>,
    pub account_linking: Option<Value>,
}

impl MessagingItem {
    pub fn into_event(self) -> InboundEvent {
        let Some(sender_id) = self.sender.map(|s| s.id) else {
            return InboundEvent::Unrecognized { sender_id: None };
        };

        if let Some(message) = self.message {
            if message.is_echo {
                return InboundEvent::Echo { sender_id };
            }
            let text = message.text.filter(|t| !t.trim().is_empty());
            return match (text, message.quick_reply) {
                (Some(text), Some(reply)) => InboundEvent::QuickReplyClick {
                    sender_id,
                    text,
                    payload: reply.payload,
                },
                (Some(text), None) => InboundEvent::TextMessage { sender_id, text },
                (None, _) if !message.attachments.is_empty() => {
                    InboundEvent::AttachmentOnly { sender_id }
                }
                (None, _) => InboundEvent::Unrecognized { sender_id: Some(sender_id) },
            };
        }

        if let Some(postback) = self.postback {
            InboundEvent::Postback { sender_id, payload: postback.payload }
        } else if self.delivery.is_some() {
            InboundEvent::DeliveryReceipt { sender_id }
        } else if self.read.is_some() {
            InboundEvent::ReadReceipt { sender_id }
        } else if self.account_linking.is_some() {
            InboundEvent::AccountLink { sender_id }
        } else {
            InboundEvent::Unrecognized { sender_id: Some(sender_id) }
        }
    }
}

impl WebhookBatch {
    pub fn is_page(&self) -> bool {
        self.object == "page"
    }

    /// Events in delivery order across all entries.
    pub fn into_events(self) -> Vec<InboundEvent> {
        self.entry
            .into_iter()
            .flat_map(|entry| entry.messaging)
            .map(MessagingItem::into_event)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn events(messaging: Value) -> Vec<InboundEvent> {
        let batch: WebhookBatch =
            serde_json::from_value(json!({"object": "page", "entry": [{"messaging": messaging}]}))
                .unwrap();
        assert!(batch.is_page());
        batch.into_events()
    }

    #[test]
    fn classifies_messages() {
        let parsed = events(json!([
            {"sender": {"id": "1"}, "message": {"mid": "m1", "text": "hello"}},
            {"sender": {"id": "1"}, "message": {"text": "Admissi...", "quick_reply": {"payload": "Admissi..."}}},
            {"sender": {"id": "1"}, "message": {"attachments": [{"type": "image"}]}},
            {"sender": {"id": "1"}, "message": {"is_echo": true, "text": "bot said"}},
        ]));
        assert_eq!(
            parsed,
            vec![
                InboundEvent::TextMessage { sender_id: "1".into(), text: "hello".into() },
                InboundEvent::QuickReplyClick {
                    sender_id: "1".into(),
                    text: "Admissi...".into(),
                    payload: "Admissi...".into()
                },
                InboundEvent::AttachmentOnly { sender_id: "1".into() },
                InboundEvent::Echo { sender_id: "1".into() },
            ]
        );
    }

    #[test]
    fn classifies_non_message_events() {
        let parsed = events(json!([
            {"sender": {"id": "2"}, "postback": {"payload": "GET_STARTED"}},
            {"sender": {"id": "2"}, "delivery": {"watermark": 1}},
            {"sender": {"id": "2"}, "read": {"watermark": 1}},
            {"sender": {"id": "2"}, "account_linking": {"status": "linked"}},
            {"sender": {"id": "2"}, "optin": {}},
            {"recipient": {"id": "page"}},
        ]));
        let categories: Vec<_> = parsed.iter().map(InboundEvent::category).collect();
        assert_eq!(
            categories,
            ["postback", "delivery", "read", "account_linking", "unrecognized", "unrecognized"]
        );
        assert_eq!(parsed[5].sender_id(), None);
    }

    #[test]
    fn blank_text_is_not_a_text_message() {
        let parsed = events(json!([{"sender": {"id": "3"}, "message": {"text": "   "}}]));
        assert_eq!(parsed, vec![InboundEvent::Unrecognized { sender_id: Some("3".into()) }]);
    }
}
