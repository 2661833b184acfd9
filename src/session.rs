use crate::form::{FormFields, FormKind, FormStep};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Default,
    Complaint,
    Feedback,
}

impl Mode {
    pub fn form_kind(&self) -> Option<FormKind> {
        match self {
            Mode::Default => None,
            Mode::Complaint => Some(FormKind::Complaint),
            Mode::Feedback => Some(FormKind::Feedback),
        }
    }
}

impl From<FormKind> for Mode {
    fn from(kind: FormKind) -> Self {
        match kind {
            FormKind::Complaint => Mode::Complaint,
            FormKind::Feedback => Mode::Feedback,
        }
    }
}

/// Conversation context for one sender, kept for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub mode: Mode,
    pub is_first_contact: bool,
    pub last_offered_entry_id: Option<u32>,
    pub form_step: FormStep,
    pub form_fields: FormFields,
    pub last_user_question: String,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            mode: Mode::Default,
            is_first_contact: true,
            last_offered_entry_id: None,
            form_step: FormStep::AskName,
            form_fields: FormFields::default(),
            last_user_question: String::new(),
        }
    }
}

impl SessionState {
    /// Starts a fresh form, discarding anything collected before.
    pub fn enter_form(&mut self, kind: FormKind) {
        self.mode = kind.into();
        self.form_step = FormStep::AskName;
        self.form_fields = FormFields::default();
    }

    /// Leaves any form and returns to question answering.
    pub fn reset_form(&mut self) {
        self.mode = Mode::Default;
        self.form_step = FormStep::AskName;
        self.form_fields = FormFields::default();
    }
}

pub type SessionHandle = Arc<tokio::sync::Mutex<SessionState>>;

/// Sender id → session. The outer map lock is held only to fetch a handle;
/// a turn holds the per-sender lock for its whole duration.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionHandle>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self, sender_id: &str) -> SessionHandle {
        self.sessions
            .lock()
            .entry(sender_id.to_string())
            .or_default()
            .clone()
    }

    pub async fn snapshot(&self, sender_id: &str) -> Option<SessionState> {
        let handle = self.sessions.lock().get(sender_id).cloned()?;
        let state = handle.lock().await;
        Some(state.clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}
