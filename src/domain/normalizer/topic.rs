//! Query topic categorization

use serde::{Deserialize, Serialize};

/// Coarse topic buckets for a fitness query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Supplementation,
    Nutrition,
    StrengthTraining,
    Cardio,
    Recovery,
    WeightManagement,
    GeneralFitness,
}

impl Topic {
    /// Categorize normalized tokens into the best-matching topic.
    ///
    /// Each bucket scores one point per matching token; ties resolve to
    /// the first bucket in declaration order. No match at all falls back
    /// to `GeneralFitness`.
    pub fn categorize(tokens: &[String]) -> Topic {
        let buckets: [(Topic, &[&str]); 6] = [
            (
                Topic::Supplementation,
                &["supplement", "supplementation", "creatine", "protein", "bcaa", "vitamin", "caffeine"],
            ),
            (
                Topic::Nutrition,
                &["diet", "nutrition", "calories", "macros", "carbs", "fat", "meal", "fasting"],
            ),
            (
                Topic::StrengthTraining,
                &["strength", "resistance", "lifting", "hypertrophy", "muscle", "reps", "sets"],
            ),
            (
                Topic::Cardio,
                &["cardio", "cardiovascular", "interval", "running", "cycling", "endurance", "aerobic"],
            ),
            (
                Topic::Recovery,
                &["recovery", "rest", "sleep", "injury", "soreness", "stretching"],
            ),
            (
                Topic::WeightManagement,
                &["weight", "loss", "gain", "cutting", "bulking", "lean", "bmi"],
            ),
        ];

        let mut best = Topic::GeneralFitness;
        let mut best_score = 0usize;

        for (topic, terms) in buckets {
            let score = tokens
                .iter()
                .filter(|t| terms.contains(&t.as_str()))
                .count();

            if score > best_score {
                best = topic;
                best_score = score;
            }
        }

        best
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Topic::Supplementation => "supplementation",
            Topic::Nutrition => "nutrition",
            Topic::StrengthTraining => "strength_training",
            Topic::Cardio => "cardio",
            Topic::Recovery => "recovery",
            Topic::WeightManagement => "weight_management",
            Topic::GeneralFitness => "general_fitness",
        };
        write!(f, "{}", name)
    }
}
