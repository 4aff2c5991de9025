//! Generation service seam and answer types

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Request to the external text-completion collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Fully rendered prompt, context already embedded
    pub prompt: String,
    /// Token budget for the completion
    pub max_tokens: u32,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens,
        }
    }
}

/// Raw completion returned by the generation service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    /// Input plus output tokens billed for this call
    pub tokens_used: u32,
}

impl Completion {
    pub fn new(text: impl Into<String>, tokens_used: u32) -> Self {
        Self {
            text: text.into(),
            tokens_used,
        }
    }
}

/// Black-box text completion collaborator with a maximum input size.
///
/// Transient failures (timeout, 5xx, rate limit) surface as retryable
/// `ExternalService` errors and are retried by the orchestrator's
/// policy; persistent failures propagate as structured errors, never as
/// partial answers.
#[async_trait]
pub trait GenerationService: Send + Sync + Debug {
    async fn complete(&self, request: &GenerationRequest) -> Result<Completion, DomainError>;

    /// Maximum prompt size in characters the service accepts; the
    /// context assembler must stay under this with headroom.
    fn max_input_chars(&self) -> usize;
}
