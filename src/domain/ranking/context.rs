//! Bounded context assembly for generation

use serde::{Deserialize, Serialize};

use super::ranker::RankedItem;
use crate::domain::evidence::EvidenceId;

/// Snippet length carried into citations
const CITATION_SNIPPET_CHARS: usize = 200;

/// One evidence item serialized into the context block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextEntry {
    pub evidence_id: EvidenceId,
    /// 1-based position in the block, which is also citation order
    pub rank: usize,
    /// Short excerpt reused by the citation list
    pub snippet: String,
}

/// The serialized evidence block handed to generation.
///
/// Total size never exceeds the budget it was assembled under, and no
/// evidence item appears twice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextBlock {
    pub text: String,
    pub entries: Vec<ContextEntry>,
    /// Budget the block was assembled under
    pub budget_chars: usize,
}

impl ContextBlock {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len_chars(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether an evidence item was actually serialized into this block.
    /// Guards against orphan citations.
    pub fn contains(&self, id: &EvidenceId) -> bool {
        self.entries.iter().any(|e| &e.evidence_id == id)
    }
}

/// Serializes ranked evidence into a budget-bounded context block
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    budget_chars: usize,
}

impl ContextAssembler {
    pub fn new(budget_chars: usize) -> Self {
        Self { budget_chars }
    }

    pub fn budget_chars(&self) -> usize {
        self.budget_chars
    }

    /// Assemble ranked items into a block under the budget.
    ///
    /// Items that would overflow are dropped from the tail; an item is
    /// never truncated mid-serialization.
    pub fn assemble(&self, ranked: &[RankedItem]) -> ContextBlock {
        self.assemble_within(ranked, self.budget_chars)
    }

    /// Assemble under an explicit caller-supplied budget
    pub fn assemble_within(&self, ranked: &[RankedItem], budget_chars: usize) -> ContextBlock {
        let mut text = String::new();
        let mut entries = Vec::new();

        for (index, ranked_item) in ranked.iter().enumerate() {
            let rank = entries.len() + 1;
            let serialized = serialize_item(ranked_item, rank);

            if text.chars().count() + serialized.chars().count() > budget_chars {
                tracing::debug!(
                    dropped = ranked.len() - index,
                    budget_chars,
                    "context budget reached, dropping tail items"
                );
                break;
            }

            text.push_str(&serialized);

            let item = &ranked_item.item;
            entries.push(ContextEntry {
                evidence_id: item.id.clone(),
                rank,
                snippet: truncate_chars(&item.snippet, CITATION_SNIPPET_CHARS),
            });
        }

        ContextBlock {
            text,
            entries,
            budget_chars,
        }
    }
}

fn serialize_item(ranked: &RankedItem, rank: usize) -> String {
    let item = &ranked.item;

    let date = item
        .publication_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "undated".to_string());

    let journal = item.journal.as_deref().unwrap_or("Unknown journal");

    format!(
        "[{rank}] {title}\nJournal: {journal}\nDate: {date}\nID: {id}\nAbstract: {snippet}\n\n",
        title = item.title,
        id = item.id,
        snippet = truncate_chars(&item.snippet, 500),
    )
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max).collect();
        format!("{truncated}...")
    }
}
