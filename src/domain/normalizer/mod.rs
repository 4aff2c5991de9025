//! Term normalization: canonical tokens and synonym expansion

mod synonyms;
mod topic;

pub use synonyms::{SynonymEntry, SynonymTable};
pub use topic::Topic;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));

/// Words carrying no search signal, stripped during normalization
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "at", "be", "but", "by", "for", "from", "i", "in", "is", "it", "me",
    "my", "of", "on", "or", "the", "to", "with", "about", "after", "before", "during", "tell",
];

/// Question words stripped so phrasings hash alike
const QUESTION_WORDS: &[&str] = &[
    "what", "when", "where", "why", "how", "which", "who", "whats", "was", "were", "do", "does",
    "did", "can", "could", "should", "would", "will", "much", "many",
];

/// Result of normalizing a raw question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedQuery {
    /// The raw question as asked
    pub raw: String,
    /// Canonical text: synonym-substituted tokens, sorted and joined.
    /// Two questions with the same token set normalize identically.
    pub text: String,
    /// Sorted canonical tokens
    pub tokens: Vec<String>,
    /// Synonym-expanded terms in original order, used for searching
    pub terms: Vec<String>,
    /// Detected topic bucket
    pub topic: Topic,
}

impl NormalizedQuery {
    /// Number of normalized tokens, the fuzzy-matching eligibility gate
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }
}

/// Maps raw query text to a canonical token set.
///
/// Pure over the synonym table snapshot; never fails. Vocabulary the
/// table does not cover passes through as literal terms.
#[derive(Debug, Clone)]
pub struct TermNormalizer {
    table: SynonymTable,
}

impl TermNormalizer {
    pub fn new(table: SynonymTable) -> Self {
        Self { table }
    }

    /// Normalizer with the built-in fitness vocabulary
    pub fn with_defaults() -> Self {
        Self::new(SynonymTable::fitness_defaults())
    }

    pub fn table(&self) -> &SynonymTable {
        &self.table
    }

    /// Normalize a raw question into canonical tokens and search terms
    pub fn normalize(&self, raw: &str) -> NormalizedQuery {
        // Synonym substitution runs before tokenization so multi-word
        // phrases are still intact when matched.
        let substituted = self.table.apply(raw);
        let stripped = NON_WORD.replace_all(&substituted, "");

        let terms: Vec<String> = stripped
            .split_whitespace()
            .filter(|w| !STOP_WORDS.contains(w) && !QUESTION_WORDS.contains(w))
            .map(|w| w.to_string())
            .collect();

        let mut tokens = terms.clone();
        tokens.sort();
        tokens.dedup();

        let topic = Topic::categorize(&tokens);
        let text = tokens.join(" ");

        NormalizedQuery {
            raw: raw.to_string(),
            text,
            tokens,
            terms,
            topic,
        }
    }
}
