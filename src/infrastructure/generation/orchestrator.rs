//! Prompt construction and generation retry orchestration

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::cache::Citation;
use crate::domain::generation::{GenerationRequest, GenerationService};
use crate::domain::ranking::{ContextBlock, RankedItem};
use crate::domain::retry::RetryConfig;
use crate::domain::DomainError;

/// Characters the rendered prompt adds on top of the context block:
/// instructions, section markers, and the question itself. Context
/// budgets must leave at least this much room under the service's
/// input limit.
pub const PROMPT_HEADROOM_CHARS: usize = 1_000;

/// Tunables for the generation step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Token budget per completion
    pub max_tokens: u32,
    /// Confidence recorded when retrieval met its minimum
    pub base_confidence: f32,
    /// Confidence recorded when retrieval was exhausted below minimum
    pub degraded_confidence: f32,
    /// Retry policy: up to two retries with 340ms backoff
    pub retry: RetryConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_tokens: 500,
            base_confidence: 0.85,
            degraded_confidence: 0.55,
            retry: RetryConfig::default(),
        }
    }
}

/// Answer produced from evidence, ready to cache
#[derive(Debug, Clone)]
pub struct GeneratedAnswer {
    /// Completion text with a reference list appended
    pub text: String,
    pub confidence: f32,
    pub token_cost: u32,
    /// One citation per evidence item that made it into the context
    pub citations: Vec<Citation>,
}

/// Drives the generation service: renders the evidence-grounded prompt,
/// retries transient failures, and appends the reference list so every
/// citation resolves to evidence that was actually in the context.
#[derive(Debug)]
pub struct GenerationOrchestrator {
    service: Arc<dyn GenerationService>,
    config: OrchestratorConfig,
}

impl GenerationOrchestrator {
    pub fn new(service: Arc<dyn GenerationService>, config: OrchestratorConfig) -> Self {
        Self { service, config }
    }

    /// Generate an answer grounded in the assembled context.
    ///
    /// `ranked` is the same list the context was assembled from; it
    /// supplies titles for the reference list. `degraded` discounts the
    /// recorded confidence when retrieval stayed below its minimum.
    pub async fn generate(
        &self,
        question: &str,
        context: &ContextBlock,
        ranked: &[RankedItem],
        degraded: bool,
    ) -> Result<GeneratedAnswer, DomainError> {
        if context.is_empty() {
            return Err(DomainError::validation(
                "cannot generate without evidence context",
            ));
        }

        let prompt = self.build_prompt(question, context);

        debug!(
            prompt_chars = prompt.chars().count(),
            entries = context.entries.len(),
            "generating answer"
        );

        let request = GenerationRequest::new(prompt, self.config.max_tokens);

        let completion = self
            .config
            .retry
            .run("generation", || self.service.complete(&request))
            .await?;

        let citations: Vec<Citation> = context
            .entries
            .iter()
            .map(|entry| Citation::new(entry.evidence_id.clone(), entry.rank, entry.snippet.clone()))
            .collect();

        let confidence = if degraded {
            self.config.degraded_confidence
        } else {
            self.config.base_confidence
        };

        let text = append_references(completion.text.trim(), context, ranked);

        info!(
            tokens = completion.tokens_used,
            citations = citations.len(),
            degraded,
            "answer generated"
        );

        Ok(GeneratedAnswer {
            text,
            confidence,
            token_cost: completion.tokens_used,
            citations,
        })
    }

    fn build_prompt(&self, question: &str, context: &ContextBlock) -> String {
        format!(
            "You are a fitness research assistant. Answer the question using \
             only the numbered evidence below, citing each claim by its \
             bracketed number. If the evidence is insufficient, say so \
             rather than speculating.\n\n\
             Evidence:\n{context}\n\
             Question: {question}\n\n\
             Answer:",
            context = context.text,
        )
    }
}

/// Append a reference list covering exactly the context entries
fn append_references(answer: &str, context: &ContextBlock, ranked: &[RankedItem]) -> String {
    if context.entries.is_empty() {
        return answer.to_string();
    }

    let mut text = String::from(answer);
    text.push_str("\n\nReferences:\n");

    for entry in &context.entries {
        let title = ranked
            .iter()
            .find(|r| r.item.id == entry.evidence_id)
            .map(|r| r.item.title.as_str())
            .unwrap_or("Untitled");

        text.push_str(&format!(
            "[{rank}] {title} ({id})\n",
            rank = entry.rank,
            id = entry.evidence_id,
        ));
    }

    text
}
