//! Query entity and fingerprinting

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::normalizer::{NormalizedQuery, Topic};

/// Stable hash of normalized query text, the exact-match cache key.
///
/// Identical normalized text always produces an identical fingerprint;
/// no cryptographic strength is required, only stability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint a normalized text representation
    pub fn of(normalized_text: &str) -> Self {
        let digest = Sha256::digest(normalized_text.as_bytes());
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for log lines
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A recorded incoming question. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// The question as the user asked it
    pub raw_text: String,
    /// Canonical normalized text
    pub normalized_text: String,
    /// Number of normalized tokens (fuzzy eligibility gate)
    pub token_count: usize,
    /// Stable hash of the normalized text
    pub fingerprint: Fingerprint,
    /// Detected topic bucket
    pub topic: Topic,
    /// When the question arrived
    pub timestamp: DateTime<Utc>,
    /// Measured end-to-end latency
    pub latency_ms: u64,
    /// Whether the answer came from cache
    pub cache_hit: bool,
}

impl Query {
    /// Record a query from its normalized form
    pub fn from_normalized(normalized: &NormalizedQuery) -> Self {
        Self {
            raw_text: normalized.raw.clone(),
            normalized_text: normalized.text.clone(),
            token_count: normalized.token_count(),
            fingerprint: Fingerprint::of(&normalized.text),
            topic: normalized.topic,
            timestamp: Utc::now(),
            latency_ms: 0,
            cache_hit: false,
        }
    }

    /// Finalize measurement fields once the request completes
    pub fn with_outcome(mut self, cache_hit: bool, latency_ms: u64) -> Self {
        self.cache_hit = cache_hit;
        self.latency_ms = latency_ms;
        self
    }
}
