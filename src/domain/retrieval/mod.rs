//! Multi-strategy evidence retrieval types

mod outcome;
mod strategy;

pub use outcome::{RetrievalOutcome, RetrievalSource, StrategyAttempt};
pub use strategy::{SearchPlan, SearchStrategy};
