//! Search strategies for corpus retrieval.
//!
//! The fallback chain is a first-class ordered list: each strategy turns
//! the same normalized terms into a concrete search plan, and the
//! retriever walks the list until one yields enough evidence.

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::evidence::SearchFilters;

/// Colloquial-to-academic term translations applied before searching
const ACADEMIC_TERMS: &[(&str, &str)] = &[
    ("workout", "exercise training"),
    ("cardio", "aerobic exercise"),
    ("weights", "resistance training"),
    ("lifting", "resistance training"),
    ("bulk", "muscle hypertrophy"),
    ("cut", "caloric deficit"),
    ("carbs", "carbohydrate"),
    ("best", "optimal"),
    ("ideal", "optimal"),
];

/// Controlled-vocabulary (MeSH-style) headings appended when the raw
/// terms touch a recognized subject
const SUBJECT_HEADINGS: &[(&str, &str)] = &[
    ("exercise", "Exercise[MeSH]"),
    ("nutrition", "Nutritional Sciences[MeSH]"),
    ("muscle", "Muscle, Skeletal[MeSH]"),
    ("protein", "Dietary Proteins[MeSH]"),
    ("training", "Resistance Training[MeSH]"),
    ("supplementation", "Dietary Supplements[MeSH]"),
    ("diet", "Diet[MeSH]"),
];

/// A concrete, executable search: expression plus filters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPlan {
    /// Label of the strategy that produced this plan
    pub strategy: String,
    /// Term expression handed to the corpus client
    pub expression: String,
    pub filters: SearchFilters,
}

/// The six retrieval strategies, in fallback order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Rewrite colloquial terms to technical equivalents
    AcademicTranslation,
    /// Append domain ontology headings for recognized subjects
    ControlledVocabulary,
    /// Favor meta-analyses and systematic reviews
    ReviewBias,
    /// Restrict to a rolling publication-date window
    RecencyWindow,
    /// Combine top terms with AND/OR logic
    BooleanConstruction,
    /// Unstructured term search, the guaranteed last resort
    KeywordFallback,
}

impl SearchStrategy {
    /// All strategies in the order they are attempted
    pub fn ordered() -> Vec<SearchStrategy> {
        vec![
            Self::AcademicTranslation,
            Self::ControlledVocabulary,
            Self::ReviewBias,
            Self::RecencyWindow,
            Self::BooleanConstruction,
            Self::KeywordFallback,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::AcademicTranslation => "academic_translation",
            Self::ControlledVocabulary => "controlled_vocabulary",
            Self::ReviewBias => "review_bias",
            Self::RecencyWindow => "recency_window",
            Self::BooleanConstruction => "boolean_construction",
            Self::KeywordFallback => "keyword_fallback",
        }
    }

    /// Build the executable plan for this strategy over the expanded
    /// terms. Uniform contract across the whole chain.
    pub fn plan(&self, terms: &[String], max_results: usize, recency_years: u32) -> SearchPlan {
        let filters = SearchFilters::new(max_results);

        let (expression, filters) = match self {
            Self::AcademicTranslation => (translate_academic(terms), filters),
            Self::ControlledVocabulary => (add_subject_headings(&translate_academic(terms)), filters),
            Self::ReviewBias => (translate_academic(terms), filters.with_review_bias()),
            Self::RecencyWindow => (
                translate_academic(terms),
                filters.with_published_after(recency_cutoff(Utc::now().date_naive(), recency_years)),
            ),
            Self::BooleanConstruction => (build_boolean(terms), filters),
            Self::KeywordFallback => (terms.join(" "), filters),
        };

        SearchPlan {
            strategy: self.label().to_string(),
            expression,
            filters,
        }
    }
}

impl std::fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

fn translate_academic(terms: &[String]) -> String {
    let translated: Vec<String> = terms
        .iter()
        .map(|t| {
            ACADEMIC_TERMS
                .iter()
                .find(|(colloquial, _)| colloquial == t)
                .map(|(_, academic)| academic.to_string())
                .unwrap_or_else(|| t.clone())
        })
        .collect();

    translated.join(" ")
}

fn add_subject_headings(expression: &str) -> String {
    let mut enhanced = expression.to_string();

    for (term, heading) in SUBJECT_HEADINGS {
        if expression.contains(term) {
            enhanced.push_str(" OR ");
            enhanced.push_str(heading);
        }
    }

    enhanced
}

fn build_boolean(terms: &[String]) -> String {
    let mut concepts = Vec::new();

    let has = |group: &[&str]| terms.iter().any(|t| group.contains(&t.as_str()));

    if has(&["protein", "carbohydrate", "carbs", "fat", "diet", "nutrition", "calories"]) {
        concepts.push("(nutrition OR diet OR macronutrient)");
    }

    if has(&["exercise", "training", "workout", "cardio", "resistance", "interval"]) {
        concepts.push("(exercise OR training OR physical activity)");
    }

    if has(&["loss", "gain", "build", "hypertrophy", "composition", "weight"]) {
        concepts.push("(body composition OR weight change)");
    }

    if concepts.is_empty() {
        terms.join(" ")
    } else {
        concepts.join(" AND ")
    }
}

fn recency_cutoff(today: NaiveDate, years: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(today.year() - years as i32, today.month(), 1)
        .unwrap_or(today)
}
