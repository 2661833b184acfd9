use std::collections::{HashMap, HashSet};

/// Common English stop words. Apostrophes are already gone by the time the
/// list is consulted, so contractions appear in their squashed form. Forms
/// that collide with real words ("ill", "well", "shed") are left out.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and",
    "any", "are", "arent", "as", "at", "be", "because", "been", "before", "being",
    "below", "between", "both", "but", "by", "can", "cant", "cannot", "could",
    "couldnt", "did", "didnt", "do", "does", "doesnt", "doing", "dont", "down",
    "during", "each", "few", "for", "from", "further", "had", "hadnt", "has",
    "hasnt", "have", "havent", "having", "he", "hes", "her",
    "here", "heres", "hers", "herself", "him", "himself", "his", "how", "hows",
    "i", "im", "ive", "if", "in", "into", "is", "isnt", "it",
    "its", "itself", "lets", "me", "more", "most", "mustnt", "my",
    "myself", "no", "nor", "not", "of", "off", "on", "once", "only", "or",
    "other", "ought", "our", "ours", "ourselves", "out", "over", "own", "same",
    "shant", "she", "shes", "should", "shouldnt", "so",
    "some", "such", "than", "that", "thats", "the", "their", "theirs", "them",
    "themselves", "then", "there", "theres", "these", "they", "theyd", "theyll",
    "theyre", "theyve", "this", "those", "through", "to", "too", "under",
    "until", "up", "very", "was", "wasnt", "we", "were",
    "weve", "werent", "what", "whats", "when", "whens", "where",
    "wheres", "which", "while", "who", "whos", "whom", "why", "whys", "with",
    "wont", "would", "wouldnt", "you", "youd", "youll", "youre", "youve",
    "your", "yours", "yourself", "yourselves", "will", "just", "s", "t", "d",
    "ll", "m", "o", "re", "ve", "y", "don", "shan",
];

/// Irregular forms accepted without a lexicon check.
const IRREGULAR: &[(&str, &str)] = &[
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("people", "person"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("mice", "mouse"),
    ("went", "go"),
    ("gone", "go"),
    ("paid", "pay"),
    ("bought", "buy"),
    ("taught", "teach"),
    ("given", "give"),
    ("gave", "give"),
    ("written", "write"),
    ("wrote", "write"),
    ("got", "get"),
    ("gotten", "get"),
    ("made", "make"),
    ("took", "take"),
    ("taken", "take"),
    ("sent", "send"),
    ("left", "leave"),
];

/// Suffix detachment rules, noun forms first then verb forms.
const SUFFIX_RULES: &[(&str, &str)] = &[
    ("s", ""),
    ("ses", "s"),
    ("xes", "x"),
    ("zes", "z"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("men", "man"),
    ("ies", "y"),
    ("es", "e"),
    ("es", ""),
    ("ed", "e"),
    ("ed", ""),
    ("ing", "e"),
    ("ing", ""),
];

/// Lowercases, then keeps only `a-z` and the space character. Anything else
/// is dropped rather than replaced, so `"hello,world"` becomes `"helloworld"`.
pub fn filter_chars(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || *c == ' ')
        .collect()
}

// --- Lemmatization ---

/// Reduces tokens to a base form when that form is a known word.
#[derive(Debug, Clone)]
pub struct Lemmatizer {
    lexicon: HashSet<String>,
    irregular: HashMap<&'static str, &'static str>,
}

impl Lemmatizer {
    pub fn new<'a, I>(texts: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut lexicon = HashSet::new();
        for text in texts {
            lexicon.extend(filter_chars(text).split_whitespace().map(str::to_string));
        }
        Self {
            lexicon,
            irregular: IRREGULAR.iter().copied().collect(),
        }
    }

    /// Shortest lexicon-backed base form, or the token itself when none exists.
    pub fn lemmatize(&self, token: &str) -> String {
        if let Some(base) = self.irregular.get(token) {
            return base.to_string();
        }
        SUFFIX_RULES
            .iter()
            .filter_map(|(suffix, replacement)| {
                let stem = token.strip_suffix(suffix)?;
                let candidate = format!("{stem}{replacement}");
                (candidate.len() >= 2 && candidate != token && self.lexicon.contains(&candidate))
                    .then_some(candidate)
            })
            .min_by_key(|candidate| candidate.len())
            .unwrap_or_else(|| token.to_string())
    }
}

/// Turns raw user text into the token sequence the fuzzy resolver scores.
#[derive(Debug, Clone)]
pub struct Normalizer {
    stop_words: HashSet<String>,
    lemmatizer: Lemmatizer,
}

impl Normalizer {
    pub fn new(lemmatizer: Lemmatizer) -> Self {
        Self {
            stop_words: STOP_WORDS.iter().map(|w| w.to_string()).collect(),
            lemmatizer,
        }
    }

    pub fn normalize(&self, raw: &str) -> Vec<String> {
        filter_chars(raw)
            .split_whitespace()
            .filter(|word| !self.stop_words.contains(*word))
            .map(|word| self.lemmatizer.lemmatize(word))
            .collect()
    }
}
