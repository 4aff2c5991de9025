pub mod retriever;

pub use retriever::{EvidenceRetriever, RetrieverConfig};
