//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, ContextConfig, CorpusConfig, FuzzyConfig, GenerationConfig, LogFormat,
    LoggingConfig, RankingConfig,
};
