//! Evidence ranking and bounded context assembly

mod context;
mod ranker;

pub use context::{ContextAssembler, ContextBlock, ContextEntry};
pub use ranker::{RankedItem, Ranker, RankingWeights};
