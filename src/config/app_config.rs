use serde::{Deserialize, Serialize};

use crate::domain::normalizer::SynonymEntry;
use crate::infrastructure::generation::OrchestratorConfig;
use crate::infrastructure::maintenance::MaintenanceConfig;
use crate::infrastructure::retrieval::RetrieverConfig;
use crate::infrastructure::services::EngineConfig;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub fuzzy: FuzzyConfig,
    pub engine: EngineConfig,
    pub retrieval: RetrieverConfig,
    pub ranking: RankingConfig,
    pub context: ContextConfig,
    pub generation: GenerationConfig,
    pub corpus: CorpusConfig,
    pub maintenance: MaintenanceConfig,
    pub logging: LoggingConfig,
    /// Extra synonym mappings merged into the built-in vocabulary
    pub synonyms: Vec<SynonymEntry>,
}

/// Fuzzy-matching store parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzyConfig {
    /// Most-recently-served entries eligible for fuzzy scan
    pub working_set_size: usize,
    /// Originating queries below this token count are ineligible
    pub min_token_count: usize,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        Self {
            working_set_size: 256,
            min_token_count: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub top_k: usize,
    pub weight_recency: f32,
    pub weight_quality: f32,
    pub weight_overlap: f32,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            weight_recency: 0.3,
            weight_quality: 0.4,
            weight_overlap: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Character budget for the assembled evidence block; sized under
    /// the generation input limit with prompt headroom
    pub budget_chars: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self { budget_chars: 8_000 }
    }
}

/// Generation collaborator endpoint and orchestration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub max_input_chars: usize,
    pub orchestrator: OrchestratorConfig,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8091".to_string(),
            timeout_ms: 30_000,
            max_input_chars: 12_000,
            orchestrator: OrchestratorConfig::default(),
        }
    }
}

/// Corpus collaborator endpoint and rate budget
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    /// Minimum spacing between corpus calls
    pub min_interval_ms: u64,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8090".to_string(),
            timeout_ms: 10_000,
            min_interval_ms: 340,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("FITFACT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_mirror_engine_constants() {
        let config = AppConfig::default();

        assert_eq!(config.engine.fuzzy_threshold, 0.70);
        assert_eq!(config.fuzzy.min_token_count, 8);
        assert_eq!(config.retrieval.min_results, 3);
        assert_eq!(config.ranking.top_k, 5);
        assert_eq!(config.maintenance.eviction.retention_days, 60);
        assert_eq!(config.maintenance.eviction.promotion_threshold, 20);
    }

    #[test]
    fn test_empty_sources_deserialize_to_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();

        assert_eq!(config.corpus.min_interval_ms, 340);
        assert_eq!(config.generation.orchestrator.max_tokens, 500);
    }

    #[test]
    fn test_partial_section_overrides() {
        let config: AppConfig =
            serde_json::from_str(r#"{"ranking": {"top_k": 3}, "logging": {"format": "json"}}"#)
                .unwrap();

        assert_eq!(config.ranking.top_k, 3);
        assert!(matches!(config.logging.format, LogFormat::Json));
        // Untouched fields keep their defaults
        assert_eq!(config.ranking.weight_quality, 0.4);
    }
}
