//! Deterministic evidence ranking

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::domain::evidence::EvidenceItem;

/// Horizon beyond which recency contributes nothing (10 years)
const RECENCY_HORIZON_DAYS: f32 = 3650.0;

/// Neutral recency for undated records
const UNDATED_RECENCY: f32 = 0.3;

/// Weights for the scoring combination; normalized at use
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingWeights {
    pub recency: f32,
    pub quality: f32,
    pub overlap: f32,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            recency: 0.3,
            quality: 0.4,
            overlap: 0.3,
        }
    }
}

/// A candidate with its deterministic score
#[derive(Debug, Clone)]
pub struct RankedItem {
    pub item: EvidenceItem,
    pub score: f32,
}

/// Scores candidates by recency, quality, and term overlap, and selects
/// the distinct top-K.
#[derive(Debug, Clone)]
pub struct Ranker {
    weights: RankingWeights,
    top_k: usize,
}

impl Ranker {
    pub fn new(weights: RankingWeights, top_k: usize) -> Self {
        Self { weights, top_k }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Rank candidates against the query terms.
    ///
    /// Duplicates (same external id) are removed keeping the first
    /// occurrence. Ties break on quality score, then on more recent
    /// publication date.
    pub fn rank(&self, candidates: Vec<EvidenceItem>, query_terms: &[String]) -> Vec<RankedItem> {
        let mut seen = std::collections::HashSet::new();
        let today = Utc::now().date_naive();

        let mut ranked: Vec<RankedItem> = candidates
            .into_iter()
            .filter(|item| seen.insert(item.id.clone()))
            .map(|item| {
                let score = self.score(&item, query_terms, today);
                RankedItem { item, score }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    b.item
                        .quality_score
                        .partial_cmp(&a.item.quality_score)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| b.item.publication_date.cmp(&a.item.publication_date))
        });

        ranked.truncate(self.top_k);
        ranked
    }

    fn score(&self, item: &EvidenceItem, query_terms: &[String], today: chrono::NaiveDate) -> f32 {
        let recency = item
            .age_days(today)
            .map(|age| (1.0 - age as f32 / RECENCY_HORIZON_DAYS).max(0.0))
            .unwrap_or(UNDATED_RECENCY);

        let overlap = term_overlap(item, query_terms);

        let total = self.weights.recency + self.weights.quality + self.weights.overlap;

        (self.weights.recency * recency
            + self.weights.quality * item.quality_score
            + self.weights.overlap * overlap)
            / total.max(f32::EPSILON)
    }
}

/// Fraction of query terms appearing in the item's title or snippet
fn term_overlap(item: &EvidenceItem, query_terms: &[String]) -> f32 {
    if query_terms.is_empty() {
        return 0.0;
    }

    let haystack = format!("{} {}", item.title, item.snippet).to_lowercase();

    let matched = query_terms
        .iter()
        .filter(|t| haystack.contains(t.as_str()))
        .count();

    matched as f32 / query_terms.len() as f32
}
