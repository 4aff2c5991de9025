//! Evidence store and corpus client traits

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::entity::{EvidenceId, EvidenceItem, EvidenceRecord};
use crate::domain::DomainError;

/// Filters attached to a corpus search
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Restrict to records published on or after this date
    pub published_after: Option<NaiveDate>,
    /// Bias results toward systematic reviews and meta-analyses
    pub review_bias: bool,
    /// Maximum records to return
    pub max_results: usize,
}

impl SearchFilters {
    pub fn new(max_results: usize) -> Self {
        Self {
            max_results,
            ..Default::default()
        }
    }

    pub fn with_published_after(mut self, date: NaiveDate) -> Self {
        self.published_after = Some(date);
        self
    }

    pub fn with_review_bias(mut self) -> Self {
        self.review_bias = true;
        self
    }
}

/// External research-corpus collaborator.
///
/// Paginated search-and-fetch service subject to rate limits; returns
/// a structured error on quota exhaustion. The engine never issues raw
/// requests outside this contract.
#[async_trait]
pub trait CorpusClient: Send + Sync + Debug {
    /// Search the corpus with a term expression and filters
    async fn search(
        &self,
        expression: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<EvidenceRecord>, DomainError>;
}

/// Locally retained evidence, grown organically from corpus results.
///
/// Stands in for the persistent-store collaborator's evidence side:
/// typed operations only, no raw queries.
#[async_trait]
pub trait EvidenceStore: Send + Sync + Debug {
    /// Insert a record, or bump usage and refresh last-accessed when the
    /// external id already exists. Returns the stored item.
    async fn upsert(&self, record: &EvidenceRecord) -> Result<EvidenceItem, DomainError>;

    /// Term search over titles and snippets of retained items
    async fn search_terms(
        &self,
        terms: &[String],
        limit: usize,
    ) -> Result<Vec<EvidenceItem>, DomainError>;

    async fn get(&self, id: &EvidenceId) -> Result<Option<EvidenceItem>, DomainError>;

    /// Citation-time touch: usage += 1, last-accessed refreshed
    async fn increment_usage(&self, id: &EvidenceId) -> Result<(), DomainError>;

    /// Pin every unpinned item whose usage crossed `threshold`;
    /// returns how many were promoted.
    async fn promote_frequent(&self, threshold: u64) -> Result<usize, DomainError>;

    /// Remove unpinned items not accessed within the retention window
    /// and used fewer than `min_usage` times; returns removals.
    async fn evict_stale(
        &self,
        retention_days: i64,
        min_usage: u64,
    ) -> Result<usize, DomainError>;

    async fn size(&self) -> Result<usize, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_builder() {
        let date = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let filters = SearchFilters::new(10)
            .with_published_after(date)
            .with_review_bias();

        assert_eq!(filters.max_results, 10);
        assert_eq!(filters.published_after, Some(date));
        assert!(filters.review_bias);
    }
}
