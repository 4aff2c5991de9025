//! FitFact - hybrid retrieval and adaptive cache engine
//!
//! Evidence-grounded fitness Q&A with:
//! - Order-insensitive query normalization and fingerprinting
//! - Exact and fuzzy answer caching with usage-based retention
//! - Multi-strategy corpus retrieval with local fallback
//! - Deterministic evidence ranking and budget-bounded context assembly
//! - Retry-guarded generation with verifiable citations

pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use domain::DomainError;
use domain::normalizer::{SynonymTable, TermNormalizer};
use domain::ranking::{ContextAssembler, Ranker, RankingWeights};
use infrastructure::cache::InMemoryCacheStore;
use infrastructure::corpus::HttpCorpusClient;
use infrastructure::evidence::InMemoryEvidenceStore;
use infrastructure::generation::{
    GenerationOrchestrator, HttpGenerationService, PROMPT_HEADROOM_CHARS,
};
use infrastructure::maintenance::MaintenanceScheduler;
use infrastructure::retrieval::EvidenceRetriever;
use infrastructure::services::QueryEngine;

/// Wire the full pipeline from configuration.
///
/// Stores are in-memory and shared between the engine and the
/// maintenance scheduler; both handles stay valid for the process
/// lifetime.
pub fn build_engine(
    config: &AppConfig,
) -> Result<(Arc<QueryEngine>, Arc<MaintenanceScheduler>), DomainError> {
    let cache = Arc::new(InMemoryCacheStore::new(
        config.fuzzy.working_set_size,
        config.fuzzy.min_token_count,
    ));
    let evidence = Arc::new(InMemoryEvidenceStore::new());

    let corpus = Arc::new(HttpCorpusClient::new(
        &config.corpus.base_url,
        Duration::from_millis(config.corpus.min_interval_ms),
        Duration::from_millis(config.corpus.timeout_ms),
    )?);

    let generation = Arc::new(HttpGenerationService::new(
        &config.generation.base_url,
        Duration::from_millis(config.generation.timeout_ms),
        config.generation.max_input_chars,
    )?);

    let retriever = EvidenceRetriever::new(corpus, evidence.clone(), config.retrieval.clone());

    let ranker = Ranker::new(
        RankingWeights {
            recency: config.ranking.weight_recency,
            quality: config.ranking.weight_quality,
            overlap: config.ranking.weight_overlap,
        },
        config.ranking.top_k,
    );

    let assembler = ContextAssembler::new(context_budget(config));

    let orchestrator =
        GenerationOrchestrator::new(generation, config.generation.orchestrator.clone());

    let normalizer = TermNormalizer::new(
        SynonymTable::fitness_defaults().with_entries(config.synonyms.clone()),
    );

    let engine = Arc::new(QueryEngine::new(
        normalizer,
        cache.clone(),
        evidence.clone(),
        retriever,
        ranker,
        assembler,
        orchestrator,
        config.engine.clone(),
    ));

    let scheduler = Arc::new(MaintenanceScheduler::new(
        cache,
        evidence,
        config.maintenance.clone(),
    ));

    Ok((engine, scheduler))
}

/// Context budget under the generation input limit, with room left for
/// prompt instructions and the question
fn context_budget(config: &AppConfig) -> usize {
    config.context.budget_chars.min(
        config
            .generation
            .max_input_chars
            .saturating_sub(PROMPT_HEADROOM_CHARS),
    )
}
