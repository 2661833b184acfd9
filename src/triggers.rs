use crate::form::FormKind;
use crate::model::{DialogueEntry, KnowledgeBase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Text contains the keyword.
    Keyword(&'static str),
    /// Text contains every listed fragment, in any order.
    AllOf(&'static [&'static str]),
}

impl Trigger {
    fn fires(&self, lowered: &str) -> bool {
        match self {
            Trigger::Keyword(word) => lowered.contains(word),
            Trigger::AllOf(parts) => parts.iter().all(|part| lowered.contains(part)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerRule {
    pub trigger: Trigger,
    pub target: FormKind,
}

/// Evaluated in order; the first rule that fires decides.
pub const DEFAULT_RULES: &[TriggerRule] = &[
    TriggerRule { trigger: Trigger::Keyword("feedback"), target: FormKind::Feedback },
    TriggerRule { trigger: Trigger::AllOf(&["feed", "back"]), target: FormKind::Feedback },
    TriggerRule { trigger: Trigger::Keyword("complaint"), target: FormKind::Complaint },
    TriggerRule { trigger: Trigger::Keyword("query"), target: FormKind::Complaint },
    TriggerRule { trigger: Trigger::Keyword("issue"), target: FormKind::Complaint },
];

pub fn detect(rules: &[TriggerRule], text: &str) -> Option<FormKind> {
    let lowered = text.trim().to_lowercase();
    rules
        .iter()
        .find(|rule| rule.trigger.fires(&lowered))
        .map(|rule| rule.target)
}

/// The form a clicked entry starts, if it is one of the start entries.
pub fn start_kind(kb: &KnowledgeBase, entry: &DialogueEntry) -> Option<FormKind> {
    [FormKind::Complaint, FormKind::Feedback]
        .into_iter()
        .find(|kind| kb.reserved(kind.start_role()).id == entry.id)
}
