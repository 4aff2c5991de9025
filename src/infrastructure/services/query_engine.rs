//! Query pipeline: normalize, cache, retrieve, rank, generate, store

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::cache::{CacheStats, CacheStore, CachedAnswer};
use crate::domain::evidence::EvidenceStore;
use crate::domain::normalizer::{NormalizedQuery, TermNormalizer};
use crate::domain::query::Query;
use crate::domain::ranking::{ContextAssembler, Ranker};
use crate::domain::DomainError;
use crate::infrastructure::generation::GenerationOrchestrator;
use crate::infrastructure::retrieval::EvidenceRetriever;

/// Pipeline tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum similarity for fuzzy answer reuse
    pub fuzzy_threshold: f32,
    /// Default per-query deadline covering the whole pipeline
    pub deadline_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 0.70,
            deadline_ms: 10_000,
        }
    }
}

/// How a response was produced
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerSource {
    /// Fingerprint matched a cached answer verbatim
    ExactCache,
    /// A sufficiently similar cached answer was reused
    FuzzyCache { similarity: f32 },
    /// Freshly generated from retrieved evidence
    Generated {
        strategy: Option<String>,
        degraded: bool,
    },
}

/// Resolved answer plus its provenance
#[derive(Debug, Clone)]
pub struct EngineResponse {
    pub answer: CachedAnswer,
    pub source: AnswerSource,
    /// Query record with latency and hit flag filled in
    pub query: Query,
}

/// End-to-end query pipeline.
///
/// Resolution order: exact cache, fuzzy cache, retrieval plus
/// generation. The whole pipeline runs under one deadline; a deadline
/// that fires mid-flight cancels the work before any cache write.
#[derive(Debug)]
pub struct QueryEngine {
    normalizer: TermNormalizer,
    cache: Arc<dyn CacheStore>,
    evidence: Arc<dyn EvidenceStore>,
    retriever: EvidenceRetriever,
    ranker: Ranker,
    assembler: ContextAssembler,
    orchestrator: GenerationOrchestrator,
    config: EngineConfig,
}

impl QueryEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        normalizer: TermNormalizer,
        cache: Arc<dyn CacheStore>,
        evidence: Arc<dyn EvidenceStore>,
        retriever: EvidenceRetriever,
        ranker: Ranker,
        assembler: ContextAssembler,
        orchestrator: GenerationOrchestrator,
        config: EngineConfig,
    ) -> Self {
        Self {
            normalizer,
            cache,
            evidence,
            retriever,
            ranker,
            assembler,
            orchestrator,
            config,
        }
    }

    /// Resolve a question to an answer within the configured default
    /// deadline.
    ///
    /// Returns `NotFound` when no supporting evidence exists anywhere,
    /// `Timeout` when the deadline fires, and never caches a partial
    /// result in either case.
    pub async fn answer(&self, question: &str) -> Result<EngineResponse, DomainError> {
        self.answer_with_deadline(question, Duration::from_millis(self.config.deadline_ms))
            .await
    }

    /// Resolve a question under a caller-supplied deadline, bounding
    /// this request independently of the configured default.
    pub async fn answer_with_deadline(
        &self,
        question: &str,
        deadline: Duration,
    ) -> Result<EngineResponse, DomainError> {
        let started = Instant::now();
        let normalized = self.normalizer.normalize(question);

        if normalized.tokens.is_empty() {
            return Err(DomainError::validation(
                "question contains no searchable terms",
            ));
        }

        let query = Query::from_normalized(&normalized);

        let resolved =
            tokio::time::timeout(deadline, self.resolve(question, &normalized, &query)).await;

        match resolved {
            Ok(Ok((answer, source))) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                let cache_hit = !matches!(source, AnswerSource::Generated { .. });
                let query = query.with_outcome(cache_hit, latency_ms);

                info!(
                    fingerprint = query.fingerprint.short(),
                    topic = %query.topic,
                    cache_hit,
                    latency_ms,
                    "query resolved"
                );

                Ok(EngineResponse {
                    answer,
                    source,
                    query,
                })
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(DomainError::timeout(format!(
                "query did not resolve within {}ms",
                deadline.as_millis()
            ))),
        }
    }

    /// Cache statistics for operator reporting
    pub async fn stats(&self) -> Result<CacheStats, DomainError> {
        self.cache.stats().await
    }

    async fn resolve(
        &self,
        question: &str,
        normalized: &NormalizedQuery,
        query: &Query,
    ) -> Result<(CachedAnswer, AnswerSource), DomainError> {
        if let Some(mut answer) = self.cache.lookup_exact(&query.fingerprint).await? {
            self.cache.touch(&answer.id).await?;
            answer.touch();

            debug!(fingerprint = query.fingerprint.short(), "exact cache hit");
            return Ok((answer, AnswerSource::ExactCache));
        }

        if let Some(matched) = self
            .cache
            .lookup_fuzzy(
                &normalized.text,
                normalized.token_count(),
                self.config.fuzzy_threshold,
            )
            .await?
        {
            self.cache.touch(&matched.answer.id).await?;
            let mut answer = matched.answer;
            answer.touch();

            debug!(
                fingerprint = query.fingerprint.short(),
                similarity = matched.similarity,
                "fuzzy cache hit"
            );
            return Ok((
                answer,
                AnswerSource::FuzzyCache {
                    similarity: matched.similarity,
                },
            ));
        }

        self.cache.record_miss().await?;

        let outcome = self.retriever.retrieve(normalized).await?;

        if outcome.is_empty() {
            return Err(DomainError::not_found(
                "no supporting evidence found for question",
            ));
        }

        let ranked = self.ranker.rank(outcome.items.clone(), &normalized.terms);
        let context = self.assembler.assemble(&ranked);

        let generated = self
            .orchestrator
            .generate(question, &context, &ranked, outcome.is_degraded())
            .await?;

        for citation in &generated.citations {
            self.evidence.increment_usage(&citation.evidence_id).await?;
        }

        let answer = CachedAnswer::new(
            query.fingerprint.clone(),
            &normalized.text,
            normalized.token_count(),
            generated.text,
        )
        .with_confidence(generated.confidence)
        .with_token_cost(generated.token_cost)
        .with_citations(generated.citations);

        // A racing insert for the same fingerprint is fine; the other
        // writer's answer is already serving.
        match self.cache.insert(query, answer.clone()).await {
            Ok(()) => {}
            Err(e) if e.is_conflict() => {
                debug!(fingerprint = query.fingerprint.short(), "insert raced, absorbed");
            }
            Err(e) => return Err(e),
        }

        Ok((
            answer,
            AnswerSource::Generated {
                strategy: outcome.winning_strategy.clone(),
                degraded: outcome.is_degraded(),
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::evidence::{CorpusClient, EvidenceRecord, SearchFilters};
    use crate::domain::generation::{Completion, GenerationRequest, GenerationService};
    use crate::domain::ranking::RankingWeights;
    use crate::domain::retry::RetryConfig;
    use crate::infrastructure::cache::InMemoryCacheStore;
    use crate::infrastructure::evidence::InMemoryEvidenceStore;
    use crate::infrastructure::generation::OrchestratorConfig;
    use crate::infrastructure::retrieval::RetrieverConfig;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const QUESTION: &str =
        "best daily protein intake grams per kilogram for natural muscle hypertrophy adults";
    const PARAPHRASE: &str =
        "best daily protein intake grams per kilogram for natural muscle hypertrophy males";

    #[derive(Debug)]
    struct StubCorpus {
        available: bool,
        per_call: usize,
        calls: AtomicUsize,
    }

    impl StubCorpus {
        fn up(per_call: usize) -> Self {
            Self {
                available: true,
                per_call,
                calls: AtomicUsize::new(0),
            }
        }

        fn down() -> Self {
            Self {
                available: false,
                per_call: 0,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CorpusClient for StubCorpus {
        async fn search(
            &self,
            _expression: &str,
            _filters: &SearchFilters,
        ) -> Result<Vec<EvidenceRecord>, DomainError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);

            if !self.available {
                return Err(DomainError::external_transient("corpus", "unreachable"));
            }

            Ok((0..self.per_call)
                .map(|i| EvidenceRecord {
                    external_id: format!("pm-{call}-{i}"),
                    title: "Protein intake and muscle hypertrophy".to_string(),
                    abstract_text: "Higher protein intakes support hypertrophy in adults."
                        .repeat(6),
                    journal: Some("Sports Medicine".to_string()),
                    publication_date: NaiveDate::from_ymd_opt(2022, 3, 1),
                    publication_type: "systematic review".to_string(),
                })
                .collect())
        }
    }

    #[derive(Debug)]
    struct StubGeneration {
        delay: Duration,
        calls: AtomicUsize,
    }

    impl StubGeneration {
        fn instant() -> Self {
            Self {
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerationService for StubGeneration {
        async fn complete(&self, _request: &GenerationRequest) -> Result<Completion, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            Ok(Completion::new(
                "Around 1.6 g/kg/day supports hypertrophy [1].",
                120,
            ))
        }

        fn max_input_chars(&self) -> usize {
            12_000
        }
    }

    struct Fixture {
        engine: QueryEngine,
        cache: Arc<InMemoryCacheStore>,
        evidence: Arc<InMemoryEvidenceStore>,
        corpus: Arc<StubCorpus>,
        generation: Arc<StubGeneration>,
    }

    fn fixture(corpus: StubCorpus, generation: StubGeneration, deadline_ms: u64) -> Fixture {
        let cache = Arc::new(InMemoryCacheStore::new(200, 8));
        let evidence = Arc::new(InMemoryEvidenceStore::new());
        let corpus = Arc::new(corpus);
        let generation = Arc::new(generation);

        let retriever = EvidenceRetriever::new(
            corpus.clone(),
            evidence.clone(),
            RetrieverConfig {
                retry: RetryConfig::new(1).with_initial_delay(1),
                ..RetrieverConfig::default()
            },
        );

        let orchestrator = GenerationOrchestrator::new(
            generation.clone(),
            OrchestratorConfig {
                retry: RetryConfig::new(2).with_initial_delay(1),
                ..OrchestratorConfig::default()
            },
        );

        let engine = QueryEngine::new(
            TermNormalizer::with_defaults(),
            cache.clone(),
            evidence.clone(),
            retriever,
            Ranker::new(RankingWeights::default(), 5),
            ContextAssembler::new(8_000),
            orchestrator,
            EngineConfig {
                deadline_ms,
                ..EngineConfig::default()
            },
        );

        Fixture {
            engine,
            cache,
            evidence,
            corpus,
            generation,
        }
    }

    #[tokio::test]
    async fn test_novel_query_generates_and_caches() {
        let f = fixture(StubCorpus::up(5), StubGeneration::instant(), 10_000);

        let response = f.engine.answer(QUESTION).await.unwrap();

        assert!(matches!(
            response.source,
            AnswerSource::Generated {
                degraded: false,
                ..
            }
        ));
        assert!(response.answer.answer_text.contains("References:"));
        assert!(!response.answer.citations.is_empty());
        assert!(!response.query.cache_hit);
        assert_eq!(f.cache.size().await.unwrap(), 1);
        // Live records were retained locally
        assert!(f.evidence.size().await.unwrap() >= 5);
    }

    #[tokio::test]
    async fn test_repeat_query_served_from_exact_cache() {
        let f = fixture(StubCorpus::up(5), StubGeneration::instant(), 10_000);

        f.engine.answer(QUESTION).await.unwrap();
        let corpus_calls = f.corpus.calls();
        let generation_calls = f.generation.calls();

        let response = f.engine.answer(QUESTION).await.unwrap();

        assert_eq!(response.source, AnswerSource::ExactCache);
        assert!(response.query.cache_hit);
        // Generation was the first serve, the repeat is the second
        assert_eq!(response.answer.times_served, 2);
        // No collaborator was consulted for the repeat
        assert_eq!(f.corpus.calls(), corpus_calls);
        assert_eq!(f.generation.calls(), generation_calls);

        let stats = f.engine.stats().await.unwrap();
        assert_eq!(stats.exact_hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_paraphrase_served_from_fuzzy_cache() {
        let f = fixture(StubCorpus::up(5), StubGeneration::instant(), 10_000);

        f.engine.answer(QUESTION).await.unwrap();
        let generation_calls = f.generation.calls();

        let response = f.engine.answer(PARAPHRASE).await.unwrap();

        match response.source {
            AnswerSource::FuzzyCache { similarity } => assert!(similarity >= 0.70),
            other => panic!("expected fuzzy hit, got {other:?}"),
        }
        assert_eq!(f.generation.calls(), generation_calls);
        // The reused answer carries the original query's normalized text
        let normalizer = TermNormalizer::with_defaults();
        assert_eq!(
            response.answer.query_text,
            normalizer.normalize(QUESTION).text
        );
    }

    #[tokio::test]
    async fn test_no_evidence_anywhere_skips_generation() {
        let f = fixture(StubCorpus::down(), StubGeneration::instant(), 10_000);

        let err = f.engine.answer(QUESTION).await.unwrap_err();

        assert!(matches!(err, DomainError::NotFound { .. }));
        assert_eq!(f.generation.calls(), 0);
        assert_eq!(f.cache.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_corpus_down_falls_back_to_retained_evidence() {
        let warm = fixture(StubCorpus::up(5), StubGeneration::instant(), 10_000);
        warm.engine.answer(QUESTION).await.unwrap();

        // Same evidence store, corpus now unreachable, different question
        let engine = engine_with_dead_corpus(warm.evidence.clone());

        let response = engine
            .answer("ideal protein intake timing around resistance training sessions for hypertrophy")
            .await
            .unwrap();

        match response.source {
            AnswerSource::Generated { .. } => {}
            other => panic!("expected generated answer, got {other:?}"),
        }
    }

    fn engine_with_dead_corpus(evidence: Arc<InMemoryEvidenceStore>) -> QueryEngine {
        let retriever = EvidenceRetriever::new(
            Arc::new(StubCorpus::down()),
            evidence.clone(),
            RetrieverConfig {
                retry: RetryConfig::new(1).with_initial_delay(1),
                ..RetrieverConfig::default()
            },
        );

        QueryEngine::new(
            TermNormalizer::with_defaults(),
            Arc::new(InMemoryCacheStore::new(200, 8)),
            evidence,
            retriever,
            Ranker::new(RankingWeights::default(), 5),
            ContextAssembler::new(8_000),
            GenerationOrchestrator::new(
                Arc::new(StubGeneration::instant()),
                OrchestratorConfig {
                    retry: RetryConfig::new(2).with_initial_delay(1),
                    ..OrchestratorConfig::default()
                },
            ),
            EngineConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_deadline_cancels_without_partial_write() {
        let f = fixture(
            StubCorpus::up(5),
            StubGeneration::slow(Duration::from_millis(200)),
            50,
        );

        let err = f.engine.answer(QUESTION).await.unwrap_err();

        assert!(matches!(err, DomainError::Timeout { .. }));
        assert_eq!(f.cache.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_caller_deadline_bounds_single_request() {
        // Configured default is generous; the caller's own deadline is not
        let f = fixture(
            StubCorpus::up(5),
            StubGeneration::slow(Duration::from_millis(200)),
            10_000,
        );

        let err = f
            .engine
            .answer_with_deadline(QUESTION, Duration::from_millis(50))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Timeout { .. }));
        assert_eq!(f.cache.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_question_rejected() {
        let f = fixture(StubCorpus::up(5), StubGeneration::instant(), 10_000);

        let err = f.engine.answer("???").await.unwrap_err();

        assert!(matches!(err, DomainError::Validation { .. }));
        assert_eq!(f.corpus.calls(), 0);
    }

    #[tokio::test]
    async fn test_citation_usage_recorded_in_evidence_store() {
        let f = fixture(StubCorpus::up(5), StubGeneration::instant(), 10_000);

        let response = f.engine.answer(QUESTION).await.unwrap();

        for citation in &response.answer.citations {
            let item = f
                .evidence
                .get(&citation.evidence_id)
                .await
                .unwrap()
                .unwrap();
            assert!(item.usage_count >= 1);
        }
    }
}
