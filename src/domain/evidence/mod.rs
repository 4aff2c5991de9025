//! Evidence: research records, local retention, corpus access

mod entity;
mod store;

pub use entity::{EvidenceId, EvidenceItem, EvidenceRecord, StudyType};
pub use store::{CorpusClient, EvidenceStore, SearchFilters};
