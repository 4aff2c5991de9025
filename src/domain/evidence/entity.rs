//! Evidence entities: research records and locally retained items

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// External identifier of a research record (PMID-style)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvidenceId(String);

impl EvidenceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EvidenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Study-type classification, ordered by evidence strength
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudyType {
    MetaAnalysis,
    SystematicReview,
    RandomizedControlledTrial,
    ObservationalStudy,
    ResearchArticle,
}

impl StudyType {
    /// Classify from free-text record metadata
    pub fn classify(raw: &str) -> Self {
        let lower = raw.to_lowercase();

        if lower.contains("meta-analysis") || lower.contains("meta analysis") {
            Self::MetaAnalysis
        } else if lower.contains("systematic review") {
            Self::SystematicReview
        } else if lower.contains("randomized") || lower.contains("randomised") {
            Self::RandomizedControlledTrial
        } else if lower.contains("cohort") || lower.contains("observational") {
            Self::ObservationalStudy
        } else {
            Self::ResearchArticle
        }
    }

    /// Base quality weight in [0, 1] by evidence hierarchy
    pub fn quality_weight(&self) -> f32 {
        match self {
            Self::MetaAnalysis => 0.95,
            Self::SystematicReview => 0.90,
            Self::RandomizedControlledTrial => 0.80,
            Self::ObservationalStudy => 0.60,
            Self::ResearchArticle => 0.50,
        }
    }
}

/// Raw record as returned by the external corpus client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub external_id: String,
    pub title: String,
    pub abstract_text: String,
    pub journal: Option<String>,
    pub publication_date: Option<NaiveDate>,
    /// Free-text publication type from the source
    pub publication_type: String,
}

/// A retrieved unit of supporting material, retained locally.
///
/// Owned by the evidence store; cited answers reference items by id,
/// never own them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub id: EvidenceId,
    pub title: String,
    /// Abstract or snippet used for context assembly
    pub snippet: String,
    pub journal: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub study_type: StudyType,
    /// Quality score in [0, 1], derived from the evidence hierarchy
    pub quality_score: f32,
    /// Incremented on every citation and retrieval-time touch;
    /// never decremented
    pub usage_count: u64,
    pub last_accessed: DateTime<Utc>,
    /// Pinned items are exempt from evidence eviction
    pub pinned: bool,
}

impl EvidenceItem {
    /// Build a local item from a corpus record, scoring quality
    /// deterministically from study type and abstract coverage.
    pub fn from_record(record: &EvidenceRecord) -> Self {
        let study_type = StudyType::classify(&record.publication_type);

        // Records without a usable abstract are weaker citations
        let abstract_factor = if record.abstract_text.len() >= 200 {
            1.0
        } else if record.abstract_text.is_empty() {
            0.6
        } else {
            0.85
        };

        Self {
            id: EvidenceId::new(&record.external_id),
            title: record.title.clone(),
            snippet: record.abstract_text.clone(),
            journal: record.journal.clone(),
            publication_date: record.publication_date,
            study_type,
            quality_score: (study_type.quality_weight() * abstract_factor).clamp(0.0, 1.0),
            usage_count: 0,
            last_accessed: Utc::now(),
            pinned: false,
        }
    }

    /// Record a retrieval-time touch
    pub fn touch(&mut self) {
        self.usage_count += 1;
        self.last_accessed = Utc::now();
    }

    /// Publication age in days relative to `now`; None when undated
    pub fn age_days(&self, now: NaiveDate) -> Option<i64> {
        self.publication_date
            .map(|d| (now - d).num_days().max(0))
    }
}
