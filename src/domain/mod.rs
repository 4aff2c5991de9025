//! Domain layer - core entities, traits, and pure logic

pub mod cache;
pub mod error;
pub mod evidence;
pub mod generation;
pub mod normalizer;
pub mod query;
pub mod ranking;
pub mod retrieval;
pub mod retry;

pub use cache::{
    AnswerId, CachedAnswer, CacheStats, CacheStore, Citation, EvictionPolicy, EvictionReport,
    FuzzyMatch,
};
pub use error::DomainError;
pub use evidence::{
    CorpusClient, EvidenceId, EvidenceItem, EvidenceRecord, EvidenceStore, SearchFilters,
    StudyType,
};
pub use generation::{Completion, GenerationRequest, GenerationService};
pub use normalizer::{NormalizedQuery, SynonymEntry, SynonymTable, TermNormalizer, Topic};
pub use query::{Fingerprint, Query};
pub use ranking::{ContextAssembler, ContextBlock, ContextEntry, RankedItem, Ranker, RankingWeights};
pub use retrieval::{RetrievalOutcome, RetrievalSource, SearchPlan, SearchStrategy, StrategyAttempt};
pub use retry::RetryConfig;
