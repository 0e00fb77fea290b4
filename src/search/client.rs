use reqwest::Client;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::types::SearchResponse;
use crate::config::{RequestConfig, SearchConfig};
use crate::error::{SearchApiResult, SearchError};
use crate::retry::{RetryFailure, RetryPolicy};

#[derive(Debug, Serialize)]
struct SearchBody<'a> {
    keywords: &'a [String],
    max_results: u32,
    include_answer: bool,
}

/// Client for the web search provider
#[derive(Clone)]
pub struct SearchClient {
    client: Client,
    base_url: String,
    api_key: String,
    max_results: u32,
    timeout_ms: u64,
    retry: RetryPolicy,
}

impl SearchClient {
    /// Create a new search client
    pub fn new(config: &SearchConfig, request_config: RequestConfig) -> SearchApiResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(SearchError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(SearchError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            max_results: config.max_results,
            timeout_ms: request_config.timeout_ms,
            retry: RetryPolicy::from_config(&request_config),
        })
    }

    /// Search all keywords in one request, retrying transient failures.
    ///
    /// An empty keyword list returns an empty response without calling the provider.
    pub async fn search(
        &self,
        keywords: &[String],
        max_results: Option<u32>,
    ) -> SearchApiResult<SearchResponse> {
        if keywords.is_empty() {
            return Ok(SearchResponse::default());
        }

        let body = SearchBody {
            keywords,
            max_results: max_results.unwrap_or(self.max_results),
            include_answer: true,
        };

        let start = Instant::now();
        let result = self
            .retry
            .run("search", || self.execute_request(&body))
            .await;

        match result {
            Ok(response) => {
                info!(
                    keywords = keywords.len(),
                    results = response.total_results(),
                    provider_errors = response.errors.len(),
                    latency_ms = start.elapsed().as_millis() as u64,
                    "Search call succeeded"
                );
                Ok(response)
            }
            Err(RetryFailure::Permanent(e)) => Err(e),
            Err(RetryFailure::Exhausted { last, attempts }) => Err(SearchError::Unavailable {
                message: last.to_string(),
                attempts,
            }),
        }
    }

    async fn execute_request(&self, body: &SearchBody<'_>) -> SearchApiResult<SearchResponse> {
        let url = format!("{}/search", self.base_url);

        debug!(keywords = body.keywords.len(), "Calling search provider");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout {
                        timeout_ms: self.timeout_ms,
                    }
                } else {
                    SearchError::Http(e)
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse {
                message: format!("Failed to parse response: {}", e),
            })
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
