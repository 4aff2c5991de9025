//! Multi-strategy evidence retrieval with local fallback

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::evidence::{CorpusClient, EvidenceItem, EvidenceStore};
use crate::domain::normalizer::NormalizedQuery;
use crate::domain::retrieval::{
    RetrievalOutcome, RetrievalSource, SearchPlan, SearchStrategy, StrategyAttempt,
};
use crate::domain::retry::RetryConfig;
use crate::domain::DomainError;

/// Tunables for the retrieval chain
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrieverConfig {
    /// A strategy satisfies the chain once it yields at least this many
    pub min_results: usize,
    /// Records requested per corpus call
    pub max_results: usize,
    /// Rolling publication window for the recency strategy
    pub recency_years: u32,
    /// Retry policy for corpus calls: one retry, 340ms backoff
    pub retry: RetryConfig,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            min_results: 3,
            max_results: 10,
            recency_years: 5,
            retry: RetryConfig::new(1).with_initial_delay(340),
        }
    }
}

/// Walks the ordered strategy chain against the corpus, falling back to
/// locally retained evidence per strategy when the corpus is unreachable.
///
/// Corpus failures are logged and absorbed; only storage faults
/// propagate to the caller.
#[derive(Debug)]
pub struct EvidenceRetriever {
    corpus: Arc<dyn CorpusClient>,
    store: Arc<dyn EvidenceStore>,
    config: RetrieverConfig,
}

impl EvidenceRetriever {
    pub fn new(
        corpus: Arc<dyn CorpusClient>,
        store: Arc<dyn EvidenceStore>,
        config: RetrieverConfig,
    ) -> Self {
        Self {
            corpus,
            store,
            config,
        }
    }

    /// Run the strategy chain for a normalized query.
    ///
    /// Stops at the first strategy that yields `min_results` candidates;
    /// otherwise returns an exhausted outcome carrying the best partial
    /// result set seen across the whole chain.
    pub async fn retrieve(
        &self,
        normalized: &NormalizedQuery,
    ) -> Result<RetrievalOutcome, DomainError> {
        let mut attempts = Vec::new();
        let mut best: Vec<EvidenceItem> = Vec::new();
        let mut best_source = RetrievalSource::LocalFallback;

        for strategy in SearchStrategy::ordered() {
            let plan = strategy.plan(
                &normalized.terms,
                self.config.max_results,
                self.config.recency_years,
            );

            let (items, source, corpus_error) = self.attempt(&plan, normalized).await?;

            debug!(
                strategy = %plan.strategy,
                results = items.len(),
                ?source,
                "strategy attempted"
            );

            attempts.push(StrategyAttempt {
                strategy: plan.strategy.clone(),
                source,
                results: items.len(),
                corpus_error,
            });

            if items.len() >= self.config.min_results {
                info!(
                    strategy = %plan.strategy,
                    results = items.len(),
                    "retrieval satisfied"
                );
                return Ok(RetrievalOutcome::satisfied(
                    items,
                    plan.strategy,
                    source,
                    attempts,
                ));
            }

            if items.len() > best.len() {
                best = items;
                best_source = source;
            }
        }

        warn!(
            best = best.len(),
            min = self.config.min_results,
            "retrieval exhausted below minimum"
        );

        Ok(RetrievalOutcome::exhausted(best, best_source, attempts))
    }

    /// One strategy: corpus first (with retry), local store on failure
    async fn attempt(
        &self,
        plan: &SearchPlan,
        normalized: &NormalizedQuery,
    ) -> Result<(Vec<EvidenceItem>, RetrievalSource, Option<String>), DomainError> {
        let corpus_result = self
            .config
            .retry
            .run("corpus", || self.corpus.search(&plan.expression, &plan.filters))
            .await;

        match corpus_result {
            Ok(records) => {
                // Live results grow the local store as an organic cache
                let mut items = Vec::with_capacity(records.len());

                for record in &records {
                    items.push(self.store.upsert(record).await?);
                }

                Ok((items, RetrievalSource::Live, None))
            }
            Err(e) => {
                let failure = DomainError::retrieval(plan.strategy.clone(), e.to_string());

                warn!(
                    strategy = %plan.strategy,
                    error = %failure,
                    "corpus unavailable, falling back to retained evidence"
                );

                let items = self
                    .store
                    .search_terms(&normalized.terms, self.config.max_results)
                    .await?;

                Ok((
                    items,
                    RetrievalSource::LocalFallback,
                    Some(failure.to_string()),
                ))
            }
        }
    }
}
