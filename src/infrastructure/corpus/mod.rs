//! Corpus client implementations

mod http;

pub use http::HttpCorpusClient;
