use std::time::Duration;

use async_trait::async_trait;
use log::error;
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;
use crate::providers::Provider;

/// Anthropic client for interacting with the Anthropic API
#[derive(Debug)]
pub struct Anthropic {
    /// Shared HTTP client
    client: Client,
    /// Account API key, sent as the x-api-key header
    api_key: String,
    /// Endpoint override, empty means the public API
    endpoint: String,
    /// Retry budget for transient failures
    max_retries: u32,
    /// Base backoff time in milliseconds, doubled per retry
    backoff_base_ms: u64,
    /// Requests per minute the client paces itself to
    rate_limit: Option<u32>,
}

/// Request body for the messages endpoint
#[derive(Debug, Serialize)]
pub struct AnthropicRequest {
    /// Model identifier
    model: String,

    /// Conversation turns, oldest first
    messages: Vec<AnthropicMessage>,

    /// System prompt steering the reply
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,

    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Upper bound on generated tokens
    max_tokens: u32,
}

/// One turn in the conversation
#[derive(Debug, Serialize, Deserialize)]
pub struct AnthropicMessage {
    /// "user" or "assistant"
    pub role: String,

    /// Text of the turn
    pub content: String,
}

/// Token counts returned with a completion
#[derive(Debug, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the prompt
    pub input_tokens: u32,
    /// Tokens in the completion
    pub output_tokens: u32,
}

/// Completion returned by the messages endpoint
#[derive(Debug, Deserialize)]
pub struct AnthropicResponse {
    /// Content blocks of the reply
    pub content: Vec<AnthropicContent>,
    /// Token counts for the request
    pub usage: TokenUsage,
}

/// One content block of a completion
#[derive(Debug, Deserialize)]
pub struct AnthropicContent {
    /// Block kind, "text" carries the reply
    #[serde(rename = "type")]
    pub content_type: String,

    /// Text payload of the block
    pub text: String,
}

impl Default for AnthropicRequest {
    fn default() -> Self {
        Self {
            model: String::new(),
            messages: Vec::new(),
            system: None,
            temperature: Some(0.7),
            max_tokens: 4096,
        }
    }
}

impl AnthropicRequest {
    /// Request for the given model, other fields at their defaults
    pub fn new(model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            max_tokens,
            ..Default::default()
        }
    }

    /// Append a conversation turn
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(AnthropicMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Attach a system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the sampling temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

impl Anthropic {
    /// Client with conservative default limits
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            max_retries: 3,
            backoff_base_ms: 1000,
            rate_limit: Some(45),
        }
    }

    /// Client with explicit timeout, retry and rate limit settings
    pub fn new_with_config(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
        rate_limit: Option<u32>,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            max_retries,
            backoff_base_ms,
            rate_limit,
        }
    }

    /// Send a messages request, retrying transient failures
    pub async fn complete(&self, request: AnthropicRequest) -> Result<AnthropicResponse, ProviderError> {
        let api_url = if self.endpoint.is_empty() {
            "https://api.anthropic.com/v1/messages".to_string()
        } else {
            format!("{}/v1/messages", self.endpoint.trim_end_matches('/'))
        };

        let mut attempt = 0;
        let mut last_error: Option<ProviderError> = None;

        while attempt <= self.max_retries {
            if let Some(rate_limit) = self.rate_limit {
                let delay_ms = 60_000 / u64::from(rate_limit.max(1));
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }

            let response_result = self.client.post(&api_url)
                .header("Content-Type", "application/json")
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", "2023-06-01")
                .json(&request)
                .send()
                .await;

            match response_result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json::<AnthropicResponse>().await.map_err(|e| {
                            ProviderError::ParseError(format!("Failed to parse Anthropic API response: {}", e))
                        });
                    }

                    let error_text = response.text().await
                        .unwrap_or_else(|_| "Could not read error response body".to_string());
                    match status.as_u16() {
                        401 | 403 => {
                            // Bad credentials, retrying cannot help
                            error!("Anthropic API authentication error: {}", error_text);
                            return Err(ProviderError::AuthenticationError(error_text));
                        }
                        429 => {
                            error!("Anthropic API rate limited - attempt {}/{}", attempt + 1, self.max_retries + 1);
                            last_error = Some(ProviderError::RateLimitExceeded(error_text));
                        }
                        code if status.is_server_error() => {
                            error!("Anthropic API error ({}): {} - attempt {}/{}",
                                   code, error_text, attempt + 1, self.max_retries + 1);
                            last_error = Some(ProviderError::ApiError { status_code: code, message: error_text });
                        }
                        code => {
                            // Remaining client errors are the request's fault
                            error!("Anthropic API error ({}): {}", code, error_text);
                            return Err(ProviderError::ApiError { status_code: code, message: error_text });
                        }
                    }
                }
                Err(e) => {
                    error!("Anthropic API network error: {} - attempt {}/{}", e, attempt + 1, self.max_retries + 1);
                    last_error = Some(ProviderError::ConnectionError(e.to_string()));
                }
            }

            attempt += 1;

            if attempt <= self.max_retries {
                let jitter_ms = rand::rng().random_range(0..250);
                let backoff_ms = self.backoff_base_ms * (1u64 << (attempt - 1)) + jitter_ms;
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ProviderError::RequestFailed(format!(
                "Anthropic API request failed after {} attempts",
                self.max_retries + 1
            ))
        }))
    }

    /// Concatenated text blocks of a completion
    pub fn extract_text_from_response(response: &AnthropicResponse) -> String {
        response.content.iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text.clone())
            .collect()
    }
}

#[async_trait]
impl Provider for Anthropic {
    type Request = AnthropicRequest;
    type Response = AnthropicResponse;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        Anthropic::complete(self, request).await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let request = AnthropicRequest::new("claude-3-haiku-20240307", 10)
            .add_message("user", "Hello");

        Anthropic::complete(self, request).await?;
        Ok(())
    }

    fn extract_text(response: &Self::Response) -> String {
        Self::extract_text_from_response(response)
    }
}
