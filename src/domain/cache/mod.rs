//! Answer cache: entities, store trait, and fuzzy similarity

mod entity;
mod similarity;
mod store;

pub use entity::{AnswerId, CachedAnswer, Citation};
pub use similarity::trigram_similarity;
pub use store::{CacheStats, CacheStore, EvictionPolicy, EvictionReport, FuzzyMatch};
