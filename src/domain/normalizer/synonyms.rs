//! Synonym reference data for query normalization

use serde::{Deserialize, Serialize};

/// A single synonym mapping: original term -> normalized term
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynonymEntry {
    /// The colloquial term as users type it
    pub original: String,
    /// The canonical replacement
    pub normalized: String,
    /// Similarity weight of the substitution (1.0 = exact equivalence)
    pub weight: f32,
}

impl SynonymEntry {
    pub fn new(original: impl Into<String>, normalized: impl Into<String>, weight: f32) -> Self {
        Self {
            original: original.into().to_lowercase(),
            normalized: normalized.into().to_lowercase(),
            weight,
        }
    }
}

/// Static synonym table consulted by the term normalizer.
///
/// Loaded once at startup and treated as an immutable snapshot during
/// request handling. Entries are kept sorted by original-term length
/// descending so multi-word phrases always match before their parts.
#[derive(Debug, Clone)]
pub struct SynonymTable {
    entries: Vec<SynonymEntry>,
}

impl SynonymTable {
    /// Build a table from entries, enforcing longest-match-first ordering
    pub fn new(mut entries: Vec<SynonymEntry>) -> Self {
        entries.sort_by(|a, b| b.original.len().cmp(&a.original.len()));
        Self { entries }
    }

    /// Built-in fitness domain vocabulary
    pub fn fitness_defaults() -> Self {
        Self::new(vec![
            SynonymEntry::new("high intensity interval training", "interval training", 1.0),
            SynonymEntry::new("branched chain amino acids", "bcaa", 1.0),
            SynonymEntry::new("creatine monohydrate", "creatine", 1.0),
            SynonymEntry::new("delayed onset muscle soreness", "muscle soreness", 1.0),
            SynonymEntry::new("strength training", "resistance training", 0.9),
            SynonymEntry::new("weight training", "resistance training", 0.9),
            SynonymEntry::new("muscle building", "hypertrophy", 0.9),
            SynonymEntry::new("muscle growth", "hypertrophy", 0.9),
            SynonymEntry::new("fat loss", "weight loss", 0.9),
            SynonymEntry::new("hiit", "interval training", 1.0),
            SynonymEntry::new("whey", "protein", 0.8),
            SynonymEntry::new("weights", "resistance training", 0.8),
            SynonymEntry::new("cardio", "cardiovascular exercise", 1.0),
            SynonymEntry::new("supplements", "supplementation", 1.0),
        ])
    }

    /// Build an empty table (every token passes through literally)
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Extend the built-in table with additional entries
    pub fn with_entries(mut self, extra: Vec<SynonymEntry>) -> Self {
        self.entries.extend(extra);
        self.entries
            .sort_by(|a, b| b.original.len().cmp(&a.original.len()));
        self
    }

    /// Apply all substitutions to lowercased text, longest match first.
    ///
    /// A single left-to-right pass; substituted output is never
    /// re-scanned, so entries cannot cascade into each other.
    /// Unmatched vocabulary degrades gracefully to literal terms.
    pub fn apply(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let mut result = String::with_capacity(lowered.len());
        let mut position = 0;

        while position < lowered.len() {
            let rest = &lowered[position..];

            // Entries are sorted longest first, so the first hit is the
            // longest match at this position
            let matched = self
                .entries
                .iter()
                .find(|e| !e.original.is_empty() && rest.starts_with(&e.original));

            match matched {
                Some(entry) => {
                    result.push_str(&entry.normalized);
                    position += entry.original.len();
                }
                None => {
                    if let Some(ch) = rest.chars().next() {
                        result.push(ch);
                        position += ch.len_utf8();
                    } else {
                        break;
                    }
                }
            }
        }

        result
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SynonymEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_match_wins() {
        let table = SynonymTable::new(vec![
            SynonymEntry::new("creatine", "creatine supplement", 1.0),
            SynonymEntry::new("creatine monohydrate", "creatine", 1.0),
        ]);

        // The multi-word phrase must be substituted before the bare term
        assert_eq!(
            table.apply("is creatine monohydrate safe"),
            "is creatine safe"
        );
    }

    #[test]
    fn test_substitutions_do_not_cascade() {
        let table = SynonymTable::new(vec![
            SynonymEntry::new("creatine", "creatine supplement", 1.0),
            SynonymEntry::new("creatine monohydrate", "creatine", 1.0),
        ]);

        // One entry's output must never feed another entry, even when an
        // operator-supplied table chains like this
        assert_eq!(
            table.apply("creatine monohydrate versus creatine"),
            "creatine versus creatine supplement"
        );
    }

    #[test]
    fn test_defaults_substitute_colloquialisms() {
        let table = SynonymTable::fitness_defaults();

        assert_eq!(table.apply("is whey worth it"), "is protein worth it");
        assert_eq!(
            table.apply("HIIT for beginners"),
            "interval training for beginners"
        );
    }

    #[test]
    fn test_unmatched_text_passes_through() {
        let table = SynonymTable::fitness_defaults();
        assert_eq!(table.apply("quantum chromodynamics"), "quantum chromodynamics");
    }

    #[test]
    fn test_empty_table_is_identity_modulo_case() {
        let table = SynonymTable::empty();
        assert_eq!(table.apply("Whey AND HIIT"), "whey and hiit");
    }
}
