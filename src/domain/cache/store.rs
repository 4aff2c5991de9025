//! Cache store trait and supporting types

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::entity::{AnswerId, CachedAnswer};
use crate::domain::query::{Fingerprint, Query};
use crate::domain::DomainError;

/// Result of a fuzzy cache lookup
#[derive(Debug, Clone)]
pub struct FuzzyMatch {
    /// The reused answer
    pub answer: CachedAnswer,
    /// Similarity against the incoming normalized text, >= the threshold
    pub similarity: f32,
}

impl FuzzyMatch {
    pub fn new(answer: CachedAnswer, similarity: f32) -> Self {
        Self { answer, similarity }
    }
}

/// Eviction parameters applied by the maintenance pass
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvictionPolicy {
    /// Answers unserved for longer than this are candidates
    pub retention_days: i64,
    /// Answers served at least this often are retained indefinitely
    pub promotion_threshold: u64,
    /// Upper bound on removals per pass, so eviction never holds the
    /// store long enough to stall live queries
    pub batch_size: usize,
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self {
            retention_days: 60,
            promotion_threshold: 20,
            batch_size: 100,
        }
    }
}

/// Outcome of one eviction pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvictionReport {
    /// Entries inspected
    pub examined: usize,
    /// Entries removed
    pub evicted: usize,
    /// Stale entries kept because their served count crossed the
    /// promotion threshold
    pub promoted: usize,
}

/// Counters for cache observability
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub exact_hits: u64,
    pub fuzzy_hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hits(&self) -> u64 {
        self.exact_hits + self.fuzzy_hits
    }

    pub fn hit_rate(&self) -> f32 {
        let total = self.hits() + self.misses;

        if total == 0 {
            return 0.0;
        }

        self.hits() as f32 / total as f32
    }
}

/// Answer cache keyed by query fingerprint.
///
/// All mutations are internally synchronized; exact and fuzzy lookups
/// are safe to run concurrently with inserts. A lookup racing an insert
/// for the same fingerprint may miss, in which case the caller
/// regenerates and the second insert surfaces a `Conflict` that is
/// silently absorbed.
#[async_trait]
pub trait CacheStore: Send + Sync + Debug {
    /// O(1) exact lookup by fingerprint. Does not touch serve counters.
    async fn lookup_exact(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<CachedAnswer>, DomainError>;

    /// Scan the recent/high-value working set for the best candidate
    /// strictly above `threshold`; ties break by most recently served.
    /// `token_count` is the incoming query's normalized token count;
    /// both sides of a match must meet the store's configured minimum,
    /// so the gate is one tunable.
    async fn lookup_fuzzy(
        &self,
        normalized_text: &str,
        token_count: usize,
        threshold: f32,
    ) -> Result<Option<FuzzyMatch>, DomainError>;

    /// Atomic compare-and-set on fingerprint. `Conflict` if an answer
    /// already exists for the same fingerprint; callers then `touch`.
    async fn insert(&self, query: &Query, answer: CachedAnswer) -> Result<(), DomainError>;

    /// Increment times-served and refresh last-served. Called on every
    /// hit, exact or fuzzy.
    async fn touch(&self, id: &AnswerId) -> Result<(), DomainError>;

    /// Remove stale unprotected entries in bounded batches
    async fn evict(&self, policy: &EvictionPolicy) -> Result<EvictionReport, DomainError>;

    /// Count a miss for hit-rate accounting
    async fn record_miss(&self) -> Result<(), DomainError>;

    async fn stats(&self) -> Result<CacheStats, DomainError>;

    async fn size(&self) -> Result<usize, DomainError>;
}
