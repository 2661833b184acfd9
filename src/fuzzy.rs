use crate::model::KnowledgeBase;
use crate::preprocess::{Lemmatizer, Normalizer};

pub struct FuzzyResolver {
    normalizer: Normalizer,
    phrases: Vec<String>,
}

impl FuzzyResolver {
    /// Lowercases the phrase table once and seeds the lemmatizer lexicon
    /// from every text in the knowledge base.
    pub fn new(kb: &KnowledgeBase) -> Self {
        Self {
            normalizer: Normalizer::new(Lemmatizer::new(kb.texts())),
            phrases: kb.phrases().iter().map(|p| p.text.to_lowercase()).collect(),
        }
    }

    /// Index into the phrase table of the best-voted phrase, if any token hit.
    pub fn resolve(&self, text: &str) -> Option<usize> {
        let tokens = self.normalizer.normalize(text);
        let votes = collect_votes(&tokens, &self.phrases);
        log::debug!("Fuzzy votes for {:?}: {:?}", tokens, votes);
        select_by_vote(votes)
    }
}

/// One vote per (token, phrase) pair where the phrase contains the token.
/// `phrases` must already be lowercase.
pub fn collect_votes(tokens: &[String], phrases: &[String]) -> Vec<usize> {
    let mut votes = Vec::new();
    for token in tokens {
        for (idx, phrase) in phrases.iter().enumerate() {
            if phrase.contains(token.as_str()) {
                votes.push(idx);
            }
        }
    }
    votes
}

/// Most-voted index. Votes are sorted ascending, then scanned left to right
/// keeping a running count per index; the first index whose running count
/// reaches the overall maximum wins.
// NOTE: legacy tie-break kept for answer compatibility; pending product review.
pub fn select_by_vote(mut votes: Vec<usize>) -> Option<usize> {
    votes.sort();

    let mut max = 0;
    let mut run = 0;
    let mut prev = None;
    for &idx in &votes {
        run = if prev == Some(idx) { run + 1 } else { 1 };
        prev = Some(idx);
        max = max.max(run);
    }

    let mut run = 0;
    let mut prev = None;
    for &idx in &votes {
        run = if prev == Some(idx) { run + 1 } else { 1 };
        prev = Some(idx);
        if run == max {
            return Some(idx);
        }
    }
    None
}
