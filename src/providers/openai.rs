use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use log::error;
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;
use crate::providers::Provider;

/// OpenAI client for interacting with the chat completions API.
///
/// Also serves any OpenAI-compatible server such as LM Studio; only the
/// endpoint and API key differ.
#[derive(Debug)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication, may be empty for local servers
    api_key: String,
    /// API endpoint URL including the version path ("https://api.openai.com/v1")
    endpoint: String,
    /// Retry budget for transient failures
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
    /// Optional rate limit in requests per minute
    rate_limit: Option<u32>,
}

/// Chat completion request
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<ChatCompletionMessage>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,

    /// Response format constraint
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

/// Chat message format
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatCompletionMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

/// Response format constraint for the request
#[derive(Debug, Serialize)]
pub struct ResponseFormat {
    /// Constraint kind, e.g. "json_object"
    #[serde(rename = "type")]
    format_type: String,
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct ChatCompletionUsage {
    /// Number of prompt tokens
    pub prompt_tokens: u32,
    /// Number of completion tokens
    pub completion_tokens: u32,
}

/// One generated choice in a chat completion response
#[derive(Debug, Deserialize)]
pub struct ChatCompletionChoice {
    /// The generated message
    pub message: ChatCompletionMessage,
    /// Why generation stopped, e.g. "stop" or "length"
    pub finish_reason: Option<String>,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    /// Model that produced the response
    #[serde(default)]
    pub model: String,
    /// Generated choices, usually exactly one
    pub choices: Vec<ChatCompletionChoice>,
    /// Token usage information
    pub usage: Option<ChatCompletionUsage>,
}

/// Builder methods for ChatCompletionRequest - API surface for library consumers
#[allow(dead_code)]
impl ChatCompletionRequest {
    /// Create a new chat completion request
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
            max_tokens: None,
            response_format: None,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(ChatCompletionMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Cap the number of generated tokens
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Ask the server to return a single JSON object
    pub fn json_response(mut self) -> Self {
        self.response_format = Some(ResponseFormat {
            format_type: "json_object".to_string(),
        });
        self
    }
}

impl OpenAI {
    /// Create a new OpenAI client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            max_retries: 3,
            backoff_base_ms: 1000,
            rate_limit: Some(60),
        }
    }

    /// Create a new OpenAI client with configuration
    pub fn new_with_config(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
        rate_limit: Option<u32>,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .pool_idle_timeout(Duration::from_secs(90))
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            max_retries,
            backoff_base_ms,
            rate_limit,
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), path)
    }

    /// Complete a chat request with retry logic
    pub async fn complete_chat(&self, request: ChatCompletionRequest) -> Result<ChatCompletionResponse, ProviderError> {
        let url = self.api_url("chat/completions");

        let mut attempt = 0;
        let mut last_error: Option<ProviderError> = None;

        while attempt <= self.max_retries {
            if let Some(rate_limit) = self.rate_limit {
                let delay_ms = 60_000 / u64::from(rate_limit.max(1));
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }

            let mut builder = self.client.post(&url).json(&request);
            if !self.api_key.is_empty() {
                builder = builder.bearer_auth(&self.api_key);
            }

            match builder.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json::<ChatCompletionResponse>().await.map_err(|e| {
                            ProviderError::ParseError(format!("Failed to parse OpenAI API response: {}", e))
                        });
                    }

                    // Error bodies are not always JSON, read them raw
                    let body: Bytes = response.bytes().await.unwrap_or_else(|_| Bytes::new());
                    let error_text = String::from_utf8_lossy(&body).to_string();
                    match status.as_u16() {
                        401 | 403 => {
                            error!("OpenAI API authentication error: {}", error_text);
                            return Err(ProviderError::AuthenticationError(error_text));
                        }
                        429 => {
                            error!("OpenAI API rate limited - attempt {}/{}", attempt + 1, self.max_retries + 1);
                            last_error = Some(ProviderError::RateLimitExceeded(error_text));
                        }
                        code if status.is_server_error() => {
                            error!("OpenAI API error ({}): {} - attempt {}/{}",
                                   code, error_text, attempt + 1, self.max_retries + 1);
                            last_error = Some(ProviderError::ApiError { status_code: code, message: error_text });
                        }
                        code => {
                            error!("OpenAI API error ({}): {}", code, error_text);
                            return Err(ProviderError::ApiError { status_code: code, message: error_text });
                        }
                    }
                }
                Err(e) => {
                    error!("OpenAI API network error: {} - attempt {}/{}", e, attempt + 1, self.max_retries + 1);
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
                "OpenAI API request failed after {} attempts",
                self.max_retries + 1
            ))
        }))
    }
}

#[async_trait]
impl Provider for OpenAI {
    type Request = ChatCompletionRequest;
    type Response = ChatCompletionResponse;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        self.complete_chat(request).await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let url = self.api_url("models");

        let mut builder = self.client.get(&url);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder.send().await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to connect to OpenAI API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body: Bytes = response.bytes().await.unwrap_or_else(|_| Bytes::new());
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: String::from_utf8_lossy(&body).to_string(),
            });
        }

        Ok(())
    }

    fn extract_text(response: &Self::Response) -> String {
        response.choices.first()
            .map(|choice| choice.message.content.clone())
            .unwrap_or_default()
    }
}
