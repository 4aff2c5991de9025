pub mod query_engine;

pub use query_engine::{AnswerSource, EngineConfig, EngineResponse, QueryEngine};
