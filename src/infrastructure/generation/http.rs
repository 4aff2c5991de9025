//! HTTP text-completion service

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::generation::{Completion, GenerationRequest, GenerationService};
use crate::domain::DomainError;

const SERVICE: &str = "generation";

/// Wire request accepted by the completion endpoint
#[derive(Debug, Serialize)]
struct CompleteRequestBody<'a> {
    prompt: &'a str,
    max_tokens: u32,
}

/// Wire response returned by the completion endpoint
#[derive(Debug, Deserialize)]
struct CompleteResponseBody {
    text: String,
    #[serde(default)]
    tokens_used: u32,
}

/// Text-completion client over HTTP.
///
/// Error classification mirrors the corpus client: timeouts, 429 and
/// 5xx are retryable, other rejections permanent.
#[derive(Debug)]
pub struct HttpGenerationService {
    client: reqwest::Client,
    base_url: String,
    max_input_chars: usize,
}

impl HttpGenerationService {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        max_input_chars: usize,
    ) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                DomainError::internal(format!("Failed to build generation client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_input_chars,
        })
    }

    fn complete_url(&self) -> String {
        format!("{}/complete", self.base_url)
    }
}

#[async_trait]
impl GenerationService for HttpGenerationService {
    async fn complete(&self, request: &GenerationRequest) -> Result<Completion, DomainError> {
        if request.prompt.chars().count() > self.max_input_chars {
            return Err(DomainError::validation(format!(
                "prompt exceeds input limit of {} characters",
                self.max_input_chars
            )));
        }

        let body = CompleteRequestBody {
            prompt: &request.prompt,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(self.complete_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DomainError::external_transient(SERVICE, format!("timeout: {e}"))
                } else {
                    DomainError::external_transient(SERVICE, format!("request failed: {e}"))
                }
            })?;

        let status = response.status();

        if status.as_u16() == 429 {
            return Err(DomainError::external_transient(
                SERVICE,
                "rate limit quota exhausted",
            ));
        }

        if status.is_server_error() {
            return Err(DomainError::external_transient(
                SERVICE,
                format!("upstream error: {status}"),
            ));
        }

        if !status.is_success() {
            return Err(DomainError::external_permanent(
                SERVICE,
                format!("rejected: {status}"),
            ));
        }

        let parsed: CompleteResponseBody = response.json().await.map_err(|e| {
            DomainError::external_permanent(SERVICE, format!("malformed response: {e}"))
        })?;

        if parsed.text.trim().is_empty() {
            return Err(DomainError::external_transient(SERVICE, "empty completion"));
        }

        Ok(Completion::new(parsed.text, parsed.tokens_used))
    }

    fn max_input_chars(&self) -> usize {
        self.max_input_chars
    }
}
