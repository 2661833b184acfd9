use crate::error::SendError;
use crate::event::InboundEvent;
use crate::form::{self, FormFields, FormKind, FormOutcome, FormStep};
use crate::fuzzy::FuzzyResolver;
use crate::matcher::{self, LogExemptions};
use crate::model::{DialogueEntry, KnowledgeBase, Role};
use crate::notify::Notifier;
use crate::responder::Responder;
use crate::session::{SessionState, SessionStore};
use crate::settings::Settings;
use crate::store::{stamped, PersistenceSink, StoreKind};
use crate::triggers::{self, TriggerRule, DEFAULT_RULES};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// What a turn carries once non-dialogue events are filtered out.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Text(String),
    Click(String),
    Attachment,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub reply_delay: Duration,
    pub reprompt_delay: Duration,
    pub error_notice: String,
    pub log_exempt_answers: Vec<String>,
    pub complaint_address: Option<String>,
    pub feedback_address: Option<String>,
}

impl EngineConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            reply_delay: Duration::from_millis(settings.dialogue.reply_delay_ms),
            reprompt_delay: Duration::from_millis(settings.dialogue.reprompt_delay_ms),
            error_notice: settings.dialogue.error_notice.clone(),
            log_exempt_answers: settings.dialogue.log_exempt_answers.clone(),
            complaint_address: settings.notify.complaint_address.clone(),
            feedback_address: settings.notify.feedback_address.clone(),
        }
    }

    fn notify_address(&self, kind: FormKind) -> Option<&str> {
        match kind {
            FormKind::Complaint => self.complaint_address.as_deref(),
            FormKind::Feedback => self.feedback_address.as_deref(),
        }
    }
}

pub struct DialogueEngine {
    kb: KnowledgeBase,
    fuzzy: FuzzyResolver,
    sessions: SessionStore,
    exemptions: LogExemptions,
    rules: Vec<TriggerRule>,
    responder: Arc<dyn Responder>,
    sink: Arc<dyn PersistenceSink>,
    notifier: Arc<dyn Notifier>,
    config: EngineConfig,
}

impl DialogueEngine {
    pub fn new(
        kb: KnowledgeBase,
        responder: Arc<dyn Responder>,
        sink: Arc<dyn PersistenceSink>,
        notifier: Arc<dyn Notifier>,
        config: EngineConfig,
    ) -> Self {
        let fuzzy = FuzzyResolver::new(&kb);
        let exemptions = LogExemptions::for_knowledge_base(&kb, &config.log_exempt_answers);
        Self {
            kb,
            fuzzy,
            sessions: SessionStore::new(),
            exemptions,
            rules: DEFAULT_RULES.to_vec(),
            responder,
            sink,
            notifier,
            config,
        }
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.kb
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    // --- Turn entry point ---

    /// Processes one event to completion. Never fails: send errors end the
    /// turn with a best-effort notice, storage errors are only logged.
    pub async fn handle_turn(&self, event: InboundEvent) {
        let (sender_id, input) = match event {
            InboundEvent::TextMessage { sender_id, text } => (sender_id, Input::Text(text)),
            InboundEvent::QuickReplyClick { sender_id, text, .. } => (sender_id, Input::Click(text)),
            InboundEvent::AttachmentOnly { sender_id } => (sender_id, Input::Attachment),
            InboundEvent::Echo { .. } => return,
            InboundEvent::Unrecognized { sender_id } => {
                log::info!("Ignoring unrecognized event from {:?}", sender_id);
                return;
            }
            other => {
                log::info!(
                    "Received {} event from {}",
                    other.category(),
                    other.sender_id().unwrap_or("unknown")
                );
                return;
            }
        };

        let handle = self.sessions.handle(&sender_id);
        let mut state = handle.lock().await;
        if let Err(e) = self.process(&mut state, &sender_id, input).await {
            log::error!("Failed to send to {}: {}", sender_id, e);
            if let Err(e) = self
                .responder
                .send_text(&sender_id, &self.config.error_notice)
                .await
            {
                log::error!("Failed to notify {} about the error: {}", sender_id, e);
            }
        }
    }

    async fn process(
        &self,
        state: &mut SessionState,
        sender: &str,
        input: Input,
    ) -> Result<(), SendError> {
        if state.is_first_contact {
            state.is_first_contact = false;
            let greeting = self.kb.reserved(Role::Greeting);
            // A first "hi" is answered with the greeting itself below.
            let asks_for_greeting = match &input {
                Input::Text(text) | Input::Click(text) => {
                    matcher::match_exact(&self.kb, text).is_some_and(|e| e.id == greeting.id)
                }
                Input::Attachment => false,
            };
            if !asks_for_greeting {
                self.responder.send_text(sender, &greeting.answer).await?;
            }
        }

        match input {
            Input::Attachment => {
                let entry = self.kb.reserved(Role::Attachment);
                self.render(state, sender, entry, &entry.answer).await
            }
            Input::Click(text) => self.handle_click(state, sender, &text).await,
            Input::Text(text) => self.handle_text(state, sender, text.trim()).await,
        }
    }

    async fn handle_click(
        &self,
        state: &mut SessionState,
        sender: &str,
        text: &str,
    ) -> Result<(), SendError> {
        let recovered = matcher::recover_click(&self.kb, text, state.last_offered_entry_id);
        state.last_user_question = recovered.clone();
        let entry = matcher::match_exact(&self.kb, &recovered);

        if let Some(kind) = entry.and_then(|e| triggers::start_kind(&self.kb, e)) {
            if state.mode.form_kind() == Some(kind) && state.form_step == FormStep::AskName {
                return self.prompt(state, sender, kind).await;
            }
            return self.switch_form(state, sender, kind).await;
        }

        if state.mode.form_kind().is_some() {
            return self.continue_form(state, sender, &recovered).await;
        }
        match entry {
            Some(entry) => self.answer(state, sender, entry).await,
            None => self.resolve(state, sender, &recovered).await,
        }
    }

    async fn handle_text(
        &self,
        state: &mut SessionState,
        sender: &str,
        text: &str,
    ) -> Result<(), SendError> {
        state.last_user_question = text.to_string();
        let current = state.mode.form_kind();

        // Keywords for the form already in progress are form input.
        match triggers::detect(&self.rules, text) {
            Some(kind) if current != Some(kind) => self.switch_form(state, sender, kind).await,
            _ if current.is_some() => self.continue_form(state, sender, text).await,
            _ => self.resolve(state, sender, text).await,
        }
    }

    /// Abandons any form in progress and starts `kind` from its first step.
    async fn switch_form(
        &self,
        state: &mut SessionState,
        sender: &str,
        kind: FormKind,
    ) -> Result<(), SendError> {
        if let Some(current) = state.mode.form_kind() {
            log::info!(
                "{} left the {:?} form at step {} for {:?}",
                sender,
                current,
                state.form_step.index(),
                kind
            );
            state.reset_form();
        }
        self.start_form(state, sender, kind).await
    }

    /// Exact match, then fuzzy match, then the clarification entry.
    async fn resolve(
        &self,
        state: &mut SessionState,
        sender: &str,
        text: &str,
    ) -> Result<(), SendError> {
        if let Some(entry) = matcher::match_exact(&self.kb, text) {
            return self.answer(state, sender, entry).await;
        }

        // Phrases always reference a loaded entry; orphans are dropped at load.
        let fuzzy = self
            .fuzzy
            .resolve(text)
            .and_then(|idx| self.kb.entry(self.kb.phrases()[idx].entry_id));
        if let Some(entry) = fuzzy {
            return self.answer(state, sender, entry).await;
        }

        log::info!("No answer for '{}' from {}", text, sender);
        self.persist(
            StoreKind::UnknownQuestions,
            json!({"sender": sender, "question": text}),
        )
        .await;
        let entry = self.kb.reserved(Role::Clarification);
        self.render(state, sender, entry, &entry.answer).await
    }

    /// Renders a matched entry and logs the exchange unless it is a redirect.
    async fn answer(
        &self,
        state: &mut SessionState,
        sender: &str,
        entry: &DialogueEntry,
    ) -> Result<(), SendError> {
        if let Some(kind) = triggers::start_kind(&self.kb, entry) {
            return self.start_form(state, sender, kind).await;
        }

        if !self.exemptions.is_exempt(&state.last_user_question, &entry.answer) {
            self.persist(
                StoreKind::ConversationLog,
                json!({
                    "sender": sender,
                    "question": state.last_user_question,
                    "answer": entry.answer,
                }),
            )
            .await;
        }
        self.render(state, sender, entry, &entry.answer).await
    }

    async fn start_form(
        &self,
        state: &mut SessionState,
        sender: &str,
        kind: FormKind,
    ) -> Result<(), SendError> {
        log::info!("{} started a {:?} form", sender, kind);
        state.enter_form(kind);
        let intro = self.kb.reserved(kind.start_role());
        self.render(state, sender, intro, &intro.answer).await?;
        self.prompt(state, sender, kind).await
    }

    async fn continue_form(
        &self,
        state: &mut SessionState,
        sender: &str,
        text: &str,
    ) -> Result<(), SendError> {
        let Some(kind) = state.mode.form_kind() else {
            return Ok(());
        };

        match form::advance(state.form_step, &mut state.form_fields, text) {
            FormOutcome::Advanced(next) => {
                state.form_step = next;
                self.prompt(state, sender, kind).await
            }
            FormOutcome::Rejected(step) => {
                log::debug!("{} gave invalid input at step {}", sender, step.index());
                let invalid = self.kb.reserved(Role::InvalidInput);
                self.render(state, sender, invalid, &invalid.answer).await?;
                self.pause(self.config.reprompt_delay).await;
                self.prompt(state, sender, kind).await
            }
            FormOutcome::Commit => {
                let fields = std::mem::take(&mut state.form_fields);
                state.reset_form();
                self.commit(sender, kind, &fields).await;
                let done = self.kb.reserved(Role::Committed);
                self.render(state, sender, done, &done.answer).await
            }
            FormOutcome::Abort => {
                log::info!("{} cancelled the {:?} form", sender, kind);
                state.reset_form();
                let aborted = self.kb.reserved(Role::Aborted);
                self.render(state, sender, aborted, &aborted.answer).await
            }
        }
    }

    // --- Intake forms ---

    /// Sends the prompt for the session's current form step.
    async fn prompt(
        &self,
        state: &mut SessionState,
        sender: &str,
        kind: FormKind,
    ) -> Result<(), SendError> {
        let entry = self.kb.reserved(state.form_step.prompt_role(kind));
        let text = match state.form_step {
            FormStep::Confirm => state.form_fields.render(&entry.answer),
            _ => entry.answer.clone(),
        };
        self.render(state, sender, entry, &text).await
    }

    async fn commit(&self, sender: &str, kind: FormKind, fields: &FormFields) {
        let store = match kind {
            FormKind::Complaint => StoreKind::ComplaintRecords,
            FormKind::Feedback => StoreKind::FeedbackRecords,
        };
        let mut record = json!({
            "sender": sender,
            "name": fields.name,
            "phone": fields.phone,
            "email": fields.email,
        });
        record[kind.body_field()] = json!(fields.body);
        self.persist(store, record).await;

        if let Some(address) = self.config.notify_address(kind) {
            let notifier = self.notifier.clone();
            let address = address.to_string();
            let subject = format!("New {} from {}", kind.body_field(), fields.name);
            let body = format!(
                "Name: {}\nPhone: {}\nEmail: {}\n\n{}",
                fields.name, fields.phone, fields.email, fields.body
            );
            tokio::spawn(async move {
                if let Err(e) = notifier.notify_by_email(&address, &subject, &body).await {
                    log::error!("Failed to email {}: {}", address, e);
                }
            });
        }
    }

    async fn persist(&self, store: StoreKind, record: Value) {
        if let Err(e) = self.sink.append_record(store, stamped(record)).await {
            log::error!("Failed to append to {}: {}", store.file_name(), e);
        }
    }

    /// Read receipt, typing indicator, the reply delay, then the entry's text
    /// with its replies offered as quick replies.
    async fn render(
        &self,
        state: &mut SessionState,
        sender: &str,
        entry: &DialogueEntry,
        text: &str,
    ) -> Result<(), SendError> {
        state.last_offered_entry_id = Some(entry.id);
        self.responder.send_read_receipt(sender).await?;
        self.responder.send_typing_indicator(sender, true).await?;
        self.pause(self.config.reply_delay).await;
        if entry.replies.is_empty() {
            self.responder.send_text(sender, text).await
        } else {
            self.responder
                .send_quick_replies(sender, text, &entry.replies)
                .await
        }
    }

    async fn pause(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
