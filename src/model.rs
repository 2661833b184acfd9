use crate::error::KnowledgeBaseError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// One scripted exchange: the canonical question key, the follow-ups offered
/// as quick replies, and the answer text.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DialogueEntry {
    pub id: u32,
    pub question: String,
    #[serde(default)]
    pub replies: Vec<String>,
    pub answer: String,
}

/// A representative phrase used only by the fuzzy resolver. Its position in
/// the phrase table is the resolver's index space.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PhraseEntry {
    pub entry_id: u32,
    pub text: String,
}

/// Well-known entries the dialogue flow renders by role rather than by lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Greeting,
    Clarification,
    Attachment,
    ComplaintStart,
    FeedbackStart,
    AskName,
    AskPhone,
    AskEmail,
    AskComplaint,
    AskFeedback,
    Confirm,
    InvalidInput,
    Committed,
    Aborted,
}

impl Role {
    pub const ALL: [Role; 14] = [
        Role::Greeting,
        Role::Clarification,
        Role::Attachment,
        Role::ComplaintStart,
        Role::FeedbackStart,
        Role::AskName,
        Role::AskPhone,
        Role::AskEmail,
        Role::AskComplaint,
        Role::AskFeedback,
        Role::Confirm,
        Role::InvalidInput,
        Role::Committed,
        Role::Aborted,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Role::Greeting => "greeting",
            Role::Clarification => "clarification",
            Role::Attachment => "attachment",
            Role::ComplaintStart => "complaint_start",
            Role::FeedbackStart => "feedback_start",
            Role::AskName => "ask_name",
            Role::AskPhone => "ask_phone",
            Role::AskEmail => "ask_email",
            Role::AskComplaint => "ask_complaint",
            Role::AskFeedback => "ask_feedback",
            Role::Confirm => "confirm",
            Role::InvalidInput => "invalid_input",
            Role::Committed => "committed",
            Role::Aborted => "aborted",
        }
    }
}

/// Role → entry id table as it appears in the knowledge base file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ReservedEntries {
    pub greeting: u32,
    pub clarification: u32,
    pub attachment: u32,
    pub complaint_start: u32,
    pub feedback_start: u32,
    pub ask_name: u32,
    pub ask_phone: u32,
    pub ask_email: u32,
    pub ask_complaint: u32,
    pub ask_feedback: u32,
    pub confirm: u32,
    pub invalid_input: u32,
    pub committed: u32,
    pub aborted: u32,
}

impl Default for ReservedEntries {
    fn default() -> Self {
        Self {
            greeting: 1,
            clarification: 2,
            attachment: 3,
            complaint_start: 4,
            feedback_start: 5,
            ask_name: 6,
            ask_phone: 7,
            ask_email: 8,
            ask_complaint: 9,
            ask_feedback: 10,
            confirm: 11,
            invalid_input: 12,
            committed: 13,
            aborted: 14,
        }
    }
}

impl ReservedEntries {
    pub fn id(&self, role: Role) -> u32 {
        match role {
            Role::Greeting => self.greeting,
            Role::Clarification => self.clarification,
            Role::Attachment => self.attachment,
            Role::ComplaintStart => self.complaint_start,
            Role::FeedbackStart => self.feedback_start,
            Role::AskName => self.ask_name,
            Role::AskPhone => self.ask_phone,
            Role::AskEmail => self.ask_email,
            Role::AskComplaint => self.ask_complaint,
            Role::AskFeedback => self.ask_feedback,
            Role::Confirm => self.confirm,
            Role::InvalidInput => self.invalid_input,
            Role::Committed => self.committed,
            Role::Aborted => self.aborted,
        }
    }
}

#[derive(Deserialize, Debug)]
struct KnowledgeBaseFile {
    entries: Vec<DialogueEntry>,
    #[serde(default)]
    phrases: Vec<PhraseEntry>,
    #[serde(default)]
    reserved: ReservedEntries,
}

/// Case- and surrounding-whitespace-insensitive form of a question key.
pub fn question_key(text: &str) -> String {
    text.trim().to_lowercase()
}

/// The static dialogue table. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    entries: Vec<DialogueEntry>,
    phrases: Vec<PhraseEntry>,
    by_key: HashMap<String, usize>,
    by_id: HashMap<u32, usize>,
    reserved: Vec<usize>,
    dangling: Vec<(u32, String)>,
}

impl KnowledgeBase {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, KnowledgeBaseError> {
        let path_ref = path.as_ref();
        let content =
            std::fs::read_to_string(path_ref).map_err(|source| KnowledgeBaseError::Read {
                path: path_ref.display().to_string(),
                source,
            })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, KnowledgeBaseError> {
        let file: KnowledgeBaseFile = serde_json::from_str(content)?;
        Self::new(file.entries, file.phrases, &file.reserved)
    }

    /// Builds the table, quarantining duplicate keys and orphan phrases and
    /// recording dangling replies. Fails only when reserved entries are missing.
    pub fn new(
        entries: Vec<DialogueEntry>,
        phrases: Vec<PhraseEntry>,
        reserved: &ReservedEntries,
    ) -> Result<Self, KnowledgeBaseError> {
        if entries.is_empty() {
            return Err(KnowledgeBaseError::Empty);
        }

        let mut kept = Vec::with_capacity(entries.len());
        let mut by_key = HashMap::new();
        let mut by_id = HashMap::new();
        for entry in entries {
            let key = question_key(&entry.question);
            if by_key.contains_key(&key) {
                log::warn!(
                    "Quarantining entry {}: question '{}' duplicates an earlier entry",
                    entry.id,
                    entry.question
                );
                continue;
            }
            if by_id.contains_key(&entry.id) {
                log::warn!("Quarantining entry {}: id already in use", entry.id);
                continue;
            }
            by_key.insert(key, kept.len());
            by_id.insert(entry.id, kept.len());
            kept.push(entry);
        }

        let phrases: Vec<PhraseEntry> = phrases
            .into_iter()
            .filter(|phrase| {
                let known = by_id.contains_key(&phrase.entry_id);
                if !known {
                    log::warn!(
                        "Quarantining phrase '{}': entry {} does not exist",
                        phrase.text,
                        phrase.entry_id
                    );
                }
                known
            })
            .collect();

        let mut resolved = Vec::with_capacity(Role::ALL.len());
        for role in Role::ALL {
            let id = reserved.id(role);
            let idx = by_id
                .get(&id)
                .copied()
                .ok_or(KnowledgeBaseError::MissingReserved { role: role.name(), id })?;
            resolved.push(idx);
        }

        let mut dangling = Vec::new();
        for entry in &kept {
            for reply in &entry.replies {
                if !by_key.contains_key(&question_key(reply)) {
                    log::warn!(
                        "Entry {} offers reply '{}' which matches no question",
                        entry.id,
                        reply
                    );
                    dangling.push((entry.id, reply.clone()));
                }
            }
        }

        Ok(Self {
            entries: kept,
            phrases,
            by_key,
            by_id,
            reserved: resolved,
            dangling,
        })
    }

    pub fn entries(&self) -> &[DialogueEntry] {
        &self.entries
    }

    pub fn phrases(&self) -> &[PhraseEntry] {
        &self.phrases
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, id: u32) -> Option<&DialogueEntry> {
        self.by_id.get(&id).map(|&idx| &self.entries[idx])
    }

    /// Lookup by an already-normalized question key.
    pub fn by_question_key(&self, key: &str) -> Option<&DialogueEntry> {
        self.by_key.get(key).map(|&idx| &self.entries[idx])
    }

    pub fn reserved(&self, role: Role) -> &DialogueEntry {
        &self.entries[self.reserved[role as usize]]
    }

    /// `(entry id, reply)` pairs whose reply matches no question key.
    pub fn dangling_replies(&self) -> &[(u32, String)] {
        &self.dangling
    }

    /// All text in the table; feeds the lemmatizer lexicon.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .flat_map(|e| [e.question.as_str(), e.answer.as_str()])
            .chain(self.phrases.iter().map(|p| p.text.as_str()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn entry(id: u32, question: &str, replies: &[&str], answer: &str) -> DialogueEntry {
        DialogueEntry {
            id,
            question: question.to_string(),
            replies: replies.iter().map(|r| r.to_string()).collect(),
            answer: answer.to_string(),
        }
    }

    pub(crate) fn reserved_entries() -> Vec<DialogueEntry> {
        Role::ALL
            .iter()
            .enumerate()
            .map(|(i, role)| entry(i as u32 + 1, role.name(), &[], role.name()))
            .collect()
    }

    #[test]
    fn loads_and_indexes_by_key() {
        let mut entries = reserved_entries();
        entries.push(entry(20, "  Office Timings ", &[], "9 to 5"));
        let kb = KnowledgeBase::new(entries, vec![], &ReservedEntries::default()).unwrap();
        assert_eq!(kb.by_question_key("office timings").unwrap().id, 20);
        assert_eq!(kb.reserved(Role::Confirm).question, "confirm");
    }

    #[test]
    fn missing_reserved_entry_fails() {
        let mut entries = reserved_entries();
        entries.retain(|e| e.question != "clarification");
        let err = KnowledgeBase::new(entries, vec![], &ReservedEntries::default()).unwrap_err();
        assert!(matches!(
            err,
            KnowledgeBaseError::MissingReserved { role: "clarification", id: 2 }
        ));
    }

    #[test]
    fn quarantines_duplicates_and_orphan_phrases() {
        let mut entries = reserved_entries();
        entries.push(entry(20, "Fees", &[], "first"));
        entries.push(entry(21, "fees ", &[], "second"));
        let phrases = vec![
            PhraseEntry { entry_id: 20, text: "fee structure".into() },
            PhraseEntry { entry_id: 99, text: "nowhere".into() },
        ];
        let kb = KnowledgeBase::new(entries, phrases, &ReservedEntries::default()).unwrap();
        assert_eq!(kb.by_question_key("fees").unwrap().answer, "first");
        assert!(kb.entry(21).is_none());
        assert_eq!(kb.phrases().len(), 1);
        assert!(kb.phrases().iter().all(|p| kb.entry(p.entry_id).is_some()));
    }

    #[test]
    fn dangling_replies_are_reported_not_fatal() {
        let mut entries = reserved_entries();
        entries.push(entry(20, "fees", &["Hostel", "greeting"], "..."));
        let kb = KnowledgeBase::new(entries, vec![], &ReservedEntries::default()).unwrap();
        assert_eq!(kb.dangling_replies(), &[(20, "Hostel".to_string())]);
    }
}
