//! Retrieval outcome types

use serde::{Deserialize, Serialize};

use crate::domain::evidence::EvidenceItem;

/// Where the winning result set came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalSource {
    /// Fresh results from the external corpus
    Live,
    /// Locally retained evidence, used when the corpus was unreachable
    LocalFallback,
}

/// Diagnostic record of one attempted strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyAttempt {
    pub strategy: String,
    pub source: RetrievalSource,
    pub results: usize,
    /// Error text when the corpus call failed before falling back
    pub corpus_error: Option<String>,
}

/// Result of running the strategy chain for one query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalOutcome {
    /// Candidate evidence, ordered as returned by the winning strategy
    pub items: Vec<EvidenceItem>,
    /// Label of the strategy that satisfied the minimum, if any
    pub winning_strategy: Option<String>,
    pub source: RetrievalSource,
    /// True when every strategy and fallback stayed below the minimum;
    /// generation proceeds with whatever was found, marked low-confidence
    pub exhausted: bool,
    /// Per-strategy diagnostics for operator analysis
    pub attempts: Vec<StrategyAttempt>,
}

impl RetrievalOutcome {
    /// Outcome satisfied by `strategy` with `items`
    pub fn satisfied(
        items: Vec<EvidenceItem>,
        strategy: impl Into<String>,
        source: RetrievalSource,
        attempts: Vec<StrategyAttempt>,
    ) -> Self {
        Self {
            items,
            winning_strategy: Some(strategy.into()),
            source,
            exhausted: false,
            attempts,
        }
    }

    /// Exhausted outcome, carrying whatever partial evidence surfaced
    pub fn exhausted(
        items: Vec<EvidenceItem>,
        source: RetrievalSource,
        attempts: Vec<StrategyAttempt>,
    ) -> Self {
        Self {
            items,
            winning_strategy: None,
            source,
            exhausted: true,
            attempts,
        }
    }

    /// Degraded-answer signal: the caller annotates low confidence
    pub fn is_degraded(&self) -> bool {
        self.exhausted
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_satisfied_outcome() {
        let outcome = RetrievalOutcome::satisfied(
            Vec::new(),
            "academic_translation",
            RetrievalSource::Live,
            Vec::new(),
        );

        assert!(!outcome.is_degraded());
        assert_eq!(
            outcome.winning_strategy.as_deref(),
            Some("academic_translation")
        );
    }

    #[test]
    fn test_exhausted_outcome_is_degraded() {
        let outcome =
            RetrievalOutcome::exhausted(Vec::new(), RetrievalSource::LocalFallback, Vec::new());

        assert!(outcome.is_degraded());
        assert!(outcome.is_empty());
        assert!(outcome.winning_strategy.is_none());
    }
}
