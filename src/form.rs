use crate::model::Role;
use once_cell::sync::Lazy;
use regex::Regex;

static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_ ]+$").unwrap());

const PHONE_DIGITS: usize = 10;
const EMAIL_MIN_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Complaint,
    Feedback,
}

impl FormKind {
    pub fn start_role(&self) -> Role {
        match self {
            FormKind::Complaint => Role::ComplaintStart,
            FormKind::Feedback => Role::FeedbackStart,
        }
    }

    /// Key the collected body is stored under.
    pub fn body_field(&self) -> &'static str {
        match self {
            FormKind::Complaint => "complaint",
            FormKind::Feedback => "feedback",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormStep {
    #[default]
    AskName,
    AskPhone,
    AskEmail,
    AskBody,
    Confirm,
}

impl FormStep {
    /// Entry whose answer prompts for this step.
    pub fn prompt_role(&self, kind: FormKind) -> Role {
        match (self, kind) {
            (FormStep::AskName, _) => Role::AskName,
            (FormStep::AskPhone, _) => Role::AskPhone,
            (FormStep::AskEmail, _) => Role::AskEmail,
            (FormStep::AskBody, FormKind::Complaint) => Role::AskComplaint,
            (FormStep::AskBody, FormKind::Feedback) => Role::AskFeedback,
            (FormStep::Confirm, _) => Role::Confirm,
        }
    }

    pub fn index(&self) -> u8 {
        *self as u8
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub body: String,
}

impl FormFields {
    /// Fills `{name}`, `{phone}`, `{email}` and `{body}` in a prompt template.
    pub fn render(&self, template: &str) -> String {
        template
            .replace("{name}", &self.name)
            .replace("{phone}", &self.phone)
            .replace("{email}", &self.email)
            .replace("{body}", &self.body)
    }
}

/// Result of feeding one input to the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormOutcome {
    /// Input accepted; prompt for the returned step.
    Advanced(FormStep),
    /// Input rejected; prompt for the same step again.
    Rejected(FormStep),
    Commit,
    Abort,
}

pub fn is_valid_name(input: &str) -> bool {
    NAME_PATTERN.is_match(input)
}

pub fn is_valid_phone(input: &str) -> bool {
    input.len() == PHONE_DIGITS && input.chars().all(|c| c.is_ascii_digit())
}

/// Needs `@` and `.`, a non-empty local part, and at least six characters overall.
pub fn is_valid_email(input: &str) -> bool {
    match input.split_once('@') {
        Some((local, _)) => {
            !local.is_empty() && input.contains('.') && input.chars().count() >= EMAIL_MIN_LEN
        }
        None => false,
    }
}

/// Any `y` in the reply confirms.
pub fn is_confirmation(input: &str) -> bool {
    input.to_lowercase().contains('y')
}

/// Applies one input at `step`, storing accepted values into `fields`.
pub fn advance(step: FormStep, fields: &mut FormFields, input: &str) -> FormOutcome {
    let input = input.trim();
    match step {
        FormStep::AskName if is_valid_name(input) => {
            fields.name = input.to_string();
            FormOutcome::Advanced(FormStep::AskPhone)
        }
        FormStep::AskPhone if is_valid_phone(input) => {
            fields.phone = input.to_string();
            FormOutcome::Advanced(FormStep::AskEmail)
        }
        FormStep::AskEmail if is_valid_email(input) => {
            fields.email = input.to_string();
            FormOutcome::Advanced(FormStep::AskBody)
        }
        FormStep::AskBody if !input.is_empty() => {
            fields.body = input.to_string();
            FormOutcome::Advanced(FormStep::Confirm)
        }
        FormStep::Confirm if is_confirmation(input) => FormOutcome::Commit,
        FormStep::Confirm => FormOutcome::Abort,
        _ => FormOutcome::Rejected(step),
    }
}
