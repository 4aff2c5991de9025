//! HTTP corpus client with rate limiting

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::domain::evidence::{CorpusClient, EvidenceRecord, SearchFilters};
use crate::domain::DomainError;

const SERVICE: &str = "corpus";

/// Wire request accepted by the corpus search endpoint
#[derive(Debug, Serialize)]
struct SearchRequestBody<'a> {
    query: &'a str,
    max_results: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    published_after: Option<NaiveDate>,
    review_bias: bool,
}

/// Wire record returned by the corpus search endpoint
#[derive(Debug, Deserialize)]
struct SearchResponseRecord {
    id: String,
    title: String,
    #[serde(default)]
    r#abstract: String,
    #[serde(default)]
    journal: Option<String>,
    #[serde(default)]
    published: Option<NaiveDate>,
    #[serde(default)]
    publication_type: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponseBody {
    records: Vec<SearchResponseRecord>,
}

/// Spaces out calls so the configured calls/second budget is respected
#[derive(Debug)]
struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    async fn acquire(&self) {
        let mut last = self.last_call.lock().await;

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();

            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(?wait, "rate limiting corpus call");
                tokio::time::sleep(wait).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// Research-corpus client over HTTP.
///
/// Transient failures (timeout, 429, 5xx) map to retryable errors;
/// other upstream rejections are permanent.
#[derive(Debug)]
pub struct HttpCorpusClient {
    client: reqwest::Client,
    base_url: String,
    rate_limiter: RateLimiter,
}

impl HttpCorpusClient {
    pub fn new(
        base_url: impl Into<String>,
        min_interval: Duration,
        timeout: Duration,
    ) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::internal(format!("Failed to build corpus client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            rate_limiter: RateLimiter::new(min_interval),
        })
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.base_url)
    }
}

#[async_trait]
impl CorpusClient for HttpCorpusClient {
    async fn search(
        &self,
        expression: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<EvidenceRecord>, DomainError> {
        self.rate_limiter.acquire().await;

        let body = SearchRequestBody {
            query: expression,
            max_results: filters.max_results,
            published_after: filters.published_after,
            review_bias: filters.review_bias,
        };

        let response = self
            .client
            .post(self.search_url())
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

        let parsed: SearchResponseBody = response.json().await.map_err(|e| {
            DomainError::external_permanent(SERVICE, format!("malformed response: {e}"))
        })?;

        Ok(parsed
            .records
            .into_iter()
            .map(|r| EvidenceRecord {
                external_id: r.id,
                title: r.title,
                abstract_text: r.r#abstract,
                journal: r.journal,
                publication_date: r.published,
                publication_type: r.publication_type,
            })
            .collect())
    }
}
