//! Cached answer entity and citations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::evidence::EvidenceId;
use crate::domain::query::Fingerprint;

/// Unique identifier of a cached answer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerId(String);

impl AnswerId {
    pub fn generate() -> Self {
        Self(format!("ans-{}", Uuid::new_v4()))
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AnswerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference from a cached answer to a supporting evidence item.
///
/// Citations reference evidence, they never own it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    /// External identifier of the cited evidence item
    pub evidence_id: EvidenceId,
    /// 1-based relevance rank in the answer's reference list
    pub rank: usize,
    /// Short excerpt shown alongside the reference
    pub snippet: String,
}

impl Citation {
    pub fn new(evidence_id: EvidenceId, rank: usize, snippet: impl Into<String>) -> Self {
        Self {
            evidence_id,
            rank,
            snippet: snippet.into(),
        }
    }
}

/// A previously generated answer, keyed by query fingerprint.
///
/// Created on a cache miss after successful generation, which counts as
/// the first serve; `times_served` and `last_served` move on every
/// subsequent hit; removed only by eviction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedAnswer {
    pub id: AnswerId,
    /// Fingerprint of the originating query (exactly one per answer)
    pub fingerprint: Fingerprint,
    /// Normalized text of the originating query, used for fuzzy matching
    pub query_text: String,
    /// Token count of the originating query (fuzzy eligibility gate)
    pub query_token_count: usize,
    /// The generated answer, references appended
    pub answer_text: String,
    /// Confidence in [0, 1]; discounted for degraded retrieval
    pub confidence: f32,
    /// Tokens spent generating this answer
    pub token_cost: u32,
    /// Ordered citations backing the answer
    pub citations: Vec<Citation>,
    /// How many times this answer has been served
    pub times_served: u64,
    pub last_served: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// Pinned answers are exempt from eviction
    pub pinned: bool,
}

impl CachedAnswer {
    pub fn new(
        fingerprint: Fingerprint,
        query_text: impl Into<String>,
        query_token_count: usize,
        answer_text: impl Into<String>,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: AnswerId::generate(),
            fingerprint,
            query_text: query_text.into(),
            query_token_count,
            answer_text: answer_text.into(),
            confidence: 1.0,
            token_cost: 0,
            citations: Vec::new(),
            times_served: 1,
            last_served: now,
            created_at: now,
            pinned: false,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_token_cost(mut self, token_cost: u32) -> Self {
        self.token_cost = token_cost;
        self
    }

    pub fn with_citations(mut self, citations: Vec<Citation>) -> Self {
        self.citations = citations;
        self
    }

    /// Record a serve: bump the counter, refresh the timestamp
    pub fn touch(&mut self) {
        self.times_served += 1;
        self.last_served = Utc::now();
    }

    /// Age since the answer was last served
    pub fn last_served_age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.last_served
    }

    /// Whether eviction must retain this answer regardless of age
    pub fn is_protected(&self, promotion_threshold: u64) -> bool {
        self.pinned || self.times_served >= promotion_threshold
    }
}
