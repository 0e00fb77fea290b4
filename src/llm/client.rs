use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::types::{ChatCompletionBody, ChatCompletionResponse, ChatRequest, ChatResponse, Message};
use crate::config::{LlmConfig, RequestConfig};
use crate::error::{LlmError, LlmResult};
use crate::retry::{RetryFailure, RetryPolicy};

/// Client for an OpenAI-compatible chat-completions endpoint
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    timeout_ms: u64,
    retry: RetryPolicy,
}

impl LlmClient {
    /// Create a new LLM client
    pub fn new(config: &LlmConfig, request_config: RequestConfig) -> LlmResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(LlmError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout_ms: request_config.timeout_ms,
            retry: RetryPolicy::from_config(&request_config),
        })
    }

    /// Run a chat completion, retrying transient failures
    pub async fn chat(&self, request: ChatRequest) -> LlmResult<ChatResponse> {
        let start = Instant::now();
        let result = self
            .retry
            .run("llm.chat", || self.execute_request(&request))
            .await;

        match result {
            Ok(response) => {
                info!(
                    model = response.model.as_deref().unwrap_or(&self.model),
                    prompt_tokens = response.usage.prompt_tokens,
                    completion_tokens = response.usage.completion_tokens,
                    latency_ms = start.elapsed().as_millis() as u64,
                    "LLM call succeeded"
                );
                Ok(response)
            }
            Err(RetryFailure::Permanent(e)) => Err(e),
            Err(RetryFailure::Exhausted { last, attempts }) => Err(LlmError::Unavailable {
                message: last.to_string(),
                attempts,
            }),
        }
    }

    /// Send a system + user prompt pair asking for a JSON object and return the raw text
    pub async fn complete_json(&self, system: &str, user: String) -> LlmResult<ChatResponse> {
        let request =
            ChatRequest::new(vec![Message::system(system), Message::user(user)]).json_output();
        self.chat(request).await
    }

    /// Execute a single request (internal)
    async fn execute_request(&self, request: &ChatRequest) -> LlmResult<ChatResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionBody {
            model: request.model.as_deref().unwrap_or(&self.model),
            messages: &request.messages,
            temperature: request.temperature.unwrap_or(self.temperature),
            max_tokens: request.max_tokens.unwrap_or(self.max_tokens),
            response_format: request.response_format,
        };

        debug!(
            model = body.model,
            messages = request.messages.len(),
            "Calling chat completion"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout {
                        timeout_ms: self.timeout_ms,
                    }
                } else {
                    LlmError::Http(e)
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        let completion: ChatCompletionResponse =
            response
                .json()
                .await
                .map_err(|e| LlmError::InvalidResponse {
                    message: format!("Failed to parse response: {}", e),
                })?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::InvalidResponse {
                message: "Response contained no message content".to_string(),
            })?;

        Ok(ChatResponse {
            content,
            usage: completion.usage.unwrap_or_default(),
            model: completion.model,
        })
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: &str) -> LlmConfig {
        LlmConfig {
            api_key: api_key.to_string(),
            base_url: "https://api.openai.com/v1/".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 4000,
        }
    }

    #[test]
    fn test_client_creation() {
        let client = LlmClient::new(&config("test_key"), RequestConfig::default());
        assert!(client.is_ok());
        assert_eq!(client.unwrap().base_url(), "https://api.openai.com/v1");
    }

    #[test]
    fn test_client_rejects_blank_key() {
        let result = LlmClient::new(&config("  "), RequestConfig::default());
        assert!(matches!(result, Err(LlmError::MissingApiKey)));
    }
}
