#![allow(dead_code)]

use ailza_helpdesk::error::{NotifyError, SendError, StoreError};
use ailza_helpdesk::notify::Notifier;
use ailza_helpdesk::responder::Responder;
use ailza_helpdesk::store::{PersistenceSink, StoreKind};
use ailza_helpdesk::{DialogueEngine, EngineConfig, InboundEvent, KnowledgeBase};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub const KNOWLEDGE_BASE: &str = include_str!("../../data/knowledge_base.json");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text(String),
    QuickReplies(String, Vec<String>),
    ReadReceipt,
    Typing,
}

/// Records every outbound call. Arm `fail_next` to make the next N calls fail.
#[derive(Default)]
pub struct RecordingResponder {
    sent: Mutex<Vec<(String, Sent)>>,
    fail_next: AtomicUsize,
}

impl RecordingResponder {
    pub fn fail_next(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    fn record(&self, recipient: &str, sent: Sent) -> Result<(), SendError> {
        let armed = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if armed {
            return Err(SendError::Transport("connection reset".into()));
        }
        self.sent.lock().push((recipient.to_string(), sent));
        Ok(())
    }

    /// Text and quick-reply messages only, in order.
    pub fn messages(&self) -> Vec<Sent> {
        self.sent
            .lock()
            .iter()
            .map(|(_, sent)| sent.clone())
            .filter(|sent| matches!(sent, Sent::Text(_) | Sent::QuickReplies(..)))
            .collect()
    }

    /// Message bodies only, in order.
    pub fn texts(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .map(|sent| match sent {
                Sent::Text(text) | Sent::QuickReplies(text, _) => text,
                _ => unreachable!(),
            })
            .collect()
    }

    pub fn all(&self) -> Vec<(String, Sent)> {
        self.sent.lock().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

#[async_trait]
impl Responder for RecordingResponder {
    async fn send_text(&self, recipient: &str, text: &str) -> Result<(), SendError> {
        self.record(recipient, Sent::Text(text.to_string()))
    }

    async fn send_quick_replies(
        &self,
        recipient: &str,
        text: &str,
        options: &[String],
    ) -> Result<(), SendError> {
        self.record(recipient, Sent::QuickReplies(text.to_string(), options.to_vec()))
    }

    async fn send_read_receipt(&self, recipient: &str) -> Result<(), SendError> {
        self.record(recipient, Sent::ReadReceipt)
    }

    async fn send_typing_indicator(&self, recipient: &str, _on: bool) -> Result<(), SendError> {
        self.record(recipient, Sent::Typing)
    }
}

#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<(StoreKind, Value)>>,
}

impl MemorySink {
    pub fn records(&self, store: StoreKind) -> Vec<Value> {
        self.records
            .lock()
            .iter()
            .filter(|(kind, _)| *kind == store)
            .map(|(_, record)| record.clone())
            .collect()
    }
}

#[async_trait]
impl PersistenceSink for MemorySink {
    async fn append_record(&self, store: StoreKind, record: Value) -> Result<(), StoreError> {
        self.records.lock().push((store, record));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Mail>,
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn notify_by_email(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        self.tx
            .send(Mail {
                to: to.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            })
            .map_err(|e| NotifyError::Send(e.to_string()))
    }
}

pub struct Harness {
    pub engine: DialogueEngine,
    pub responder: Arc<RecordingResponder>,
    pub sink: Arc<MemorySink>,
    pub mail: mpsc::UnboundedReceiver<Mail>,
}

pub fn config() -> EngineConfig {
    EngineConfig {
        reply_delay: Duration::ZERO,
        reprompt_delay: Duration::ZERO,
        error_notice: "Something went wrong.".to_string(),
        log_exempt_answers: Vec::new(),
        complaint_address: Some("complaints@example.edu".to_string()),
        feedback_address: None,
    }
}

pub fn harness() -> Harness {
    harness_with(config())
}

pub fn harness_with(config: EngineConfig) -> Harness {
    let _ = env_logger::builder().is_test(true).try_init();
    let kb = KnowledgeBase::from_json(KNOWLEDGE_BASE).unwrap();
    let responder = Arc::new(RecordingResponder::default());
    let sink = Arc::new(MemorySink::default());
    let (tx, mail) = mpsc::unbounded_channel();
    let engine = DialogueEngine::new(
        kb,
        responder.clone(),
        sink.clone(),
        Arc::new(ChannelNotifier { tx }),
        config,
    );
    Harness { engine, responder, sink, mail }
}

pub fn text(sender: &str, text: &str) -> InboundEvent {
    InboundEvent::TextMessage {
        sender_id: sender.to_string(),
        text: text.to_string(),
    }
}

pub fn click(sender: &str, title: &str) -> InboundEvent {
    InboundEvent::QuickReplyClick {
        sender_id: sender.to_string(),
        text: title.to_string(),
        payload: title.to_string(),
    }
}
