use crate::model::{question_key, DialogueEntry, KnowledgeBase, Role};
use std::collections::HashSet;

/// Characters at the start of a click text that never count as an ellipsis.
const ELLIPSIS_MIN_POSITION: usize = 3;
/// Length of the ellipsis marker stripped before prefix comparison.
const ELLIPSIS_LEN: usize = 3;

pub fn match_exact<'a>(kb: &'a KnowledgeBase, text: &str) -> Option<&'a DialogueEntry> {
    kb.by_question_key(&question_key(text))
}

pub fn looks_truncated(text: &str) -> bool {
    text.chars().skip(ELLIPSIS_MIN_POSITION).any(|c| c == '.')
}

/// First offered reply whose prefix equals the click text minus its ellipsis.
pub fn recover_truncated(text: &str, offered: &[String]) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    let keep = chars.len().saturating_sub(ELLIPSIS_LEN);
    let wanted = question_key(&chars[..keep].iter().collect::<String>());

    offered
        .iter()
        .find(|reply| question_key(&reply.chars().take(keep).collect::<String>()) == wanted)
        .cloned()
}

/// Restores the full reply behind a truncated click, using the replies of
/// the entry shown last. Falls back to the text as received.
pub fn recover_click(kb: &KnowledgeBase, text: &str, last_offered: Option<u32>) -> String {
    if !looks_truncated(text) {
        return text.to_string();
    }
    let offered = last_offered
        .and_then(|id| kb.entry(id))
        .map(|entry| entry.replies.as_slice())
        .unwrap_or(&[]);

    match recover_truncated(text, offered) {
        Some(full) => {
            log::debug!("Recovered truncated reply '{}' as '{}'", text, full);
            full
        }
        None => text.to_string(),
    }
}

/// Redirect answers that never go to the conversation log.
#[derive(Debug, Clone, Default)]
pub struct LogExemptions {
    keys: HashSet<String>,
}

impl LogExemptions {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keys: answers.into_iter().map(|a| question_key(a.as_ref())).collect(),
        }
    }

    /// Reserved redirect answers plus any configured extras.
    pub fn for_knowledge_base(kb: &KnowledgeBase, extra: &[String]) -> Self {
        let redirects = [
            Role::ComplaintStart,
            Role::FeedbackStart,
            Role::Confirm,
            Role::InvalidInput,
        ];
        Self::new(
            redirects
                .iter()
                .map(|role| kb.reserved(*role).answer.as_str())
                .chain(extra.iter().map(String::as_str)),
        )
    }

    pub fn is_exempt(&self, question: &str, answer: &str) -> bool {
        self.keys.contains(&question_key(question)) || self.keys.contains(&question_key(answer))
    }
}
