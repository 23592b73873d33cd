use async_trait::async_trait;
use log::error;
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::Provider;

/// Ollama client for interacting with the Ollama API
#[derive(Debug)]
pub struct Ollama {
    /// Server base URL including scheme and port
    base_url: String,
    /// Shared HTTP client
    client: Client,
    /// Retry budget for transient failures
    max_retries: u32,
    /// Base backoff time in milliseconds, doubled per retry
    backoff_base_ms: u64,
    /// Requests per minute the client paces itself to
    rate_limit: Option<u32>,
}

/// Request body for the generate endpoint
#[derive(Debug, Serialize)]
pub struct GenerationRequest {
    /// Model identifier
    model: String,
    /// Prompt text
    prompt: String,
    /// System prompt steering the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Sampling parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Response format constraint, "json" forces valid JSON output
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    /// Whether the server may stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

/// Sampling parameters for a generation
#[derive(Debug, Serialize)]
pub struct GenerationOptions {
    /// Sampling temperature, the server default is 0.8
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Upper bound on generated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Completion returned by the generate endpoint
#[derive(Debug, Deserialize)]
pub struct GenerationResponse {
    /// Model that served the request
    #[serde(default)]
    pub model: String,
    /// Server-side creation timestamp
    #[serde(default)]
    pub created_at: String,
    /// Generated text
    pub response: String,
    /// Whether generation ran to completion
    pub done: bool,
    /// Tokens in the prompt
    pub prompt_eval_count: Option<u64>,
    /// Tokens in the completion
    pub eval_count: Option<u64>,
}

/// Builder-style setters, consumed and returned by value
#[allow(dead_code)]
impl GenerationRequest {
    /// Non-streaming request for the given model and prompt
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            options: None,
            format: None,
            stream: Some(false),
        }
    }

    /// Attach a system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        match &mut self.options {
            Some(options) => options.temperature = Some(temperature),
            None => {
                self.options = Some(GenerationOptions {
                    temperature: Some(temperature),
                    num_predict: None,
                });
            }
        }
        self
    }

    /// Cap the number of generated tokens
    pub fn num_predict(mut self, num_predict: u32) -> Self {
        match &mut self.options {
            Some(options) => options.num_predict = Some(num_predict),
            None => {
                self.options = Some(GenerationOptions {
                    temperature: None,
                    num_predict: Some(num_predict),
                });
            }
        }
        self
    }

    /// Set the format
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

impl Ollama {
    /// Client with default limits for the given host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();

        Self {
            base_url: build_base_url(host.into(), port),
            client,
            max_retries: 3,
            backoff_base_ms: 1000,
            rate_limit: None,
        }
    }

    /// Client with explicit timeout, retry and rate limit settings.
    ///
    /// Connections are pooled and kept alive so concurrent requests reuse
    /// them. Ollama speaks HTTP/1.1 only.
    pub fn new_with_config(
        host: impl Into<String>,
        port: u16,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
        rate_limit: Option<u32>
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .http1_only()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(20)
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .unwrap_or_default();

        Self {
            base_url: build_base_url(host.into(), port),
            client,
            max_retries,
            backoff_base_ms,
            rate_limit,
        }
    }

    /// Send a generate request, retrying transient failures
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);

        let mut attempt = 0;
        let mut last_error: Option<ProviderError> = None;

        while attempt <= self.max_retries {
            // Pace requests when a client-side rate limit is configured
            if let Some(rate_limit) = self.rate_limit {
                let delay_ms = 60_000 / u64::from(rate_limit.max(1));
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }

            match self.client.post(&url).json(&request).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let response_text = response.text().await.map_err(|e| {
                            ProviderError::ParseError(format!("Failed to get response text from Ollama API: {}", e))
                        })?;
                        return parse_generation_response(&response_text);
                    } else if status.is_server_error() || status.as_u16() == 429 {
                        // Server trouble or throttling, worth another attempt
                        let error_text = response.text().await
                            .unwrap_or_else(|_| "Could not read error response body".to_string());
                        error!("Ollama API error ({}): {} - attempt {}/{}",
                               status, error_text, attempt + 1, self.max_retries + 1);
                        last_error = Some(ProviderError::ApiError {
                            status_code: status.as_u16(),
                            message: error_text,
                        });
                    } else {
                        // The request itself is at fault, retrying cannot help
                        let error_text = response.text().await
                            .unwrap_or_else(|_| "Could not read error response body".to_string());
                        error!("Ollama API error ({}): {}", status, error_text);
                        return Err(ProviderError::ApiError {
                            status_code: status.as_u16(),
                            message: error_text,
                        });
                    }
                }
                Err(e) => {
                    error!("Ollama API network error: {} - attempt {}/{}", e, attempt + 1, self.max_retries + 1);
                    last_error = Some(ProviderError::ConnectionError(e.to_string()));
                }
            }

            attempt += 1;

            // Exponential backoff with jitter before the next attempt
            if attempt <= self.max_retries {
                let jitter_ms = rand::rng().random_range(0..250);
                let backoff_ms = self.backoff_base_ms * (1u64 << (attempt - 1)) + jitter_ms;
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ProviderError::RequestFailed(format!(
                "Ollama API request failed after {} attempts",
                self.max_retries + 1
            ))
        }))
    }

    /// Server version string, doubles as the connectivity probe
    pub async fn version(&self) -> Result<String, ProviderError> {
        let url = format!("{}/api/version", self.base_url);
        let response: serde_json::Value = self.client.get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to connect to Ollama: {}", e)))?
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Ollama version response: {}", e)))?;

        response["version"].as_str()
            .map(ToString::to_string)
            .ok_or_else(|| ProviderError::ParseError("Invalid version format in response".to_string()))
    }
}

#[async_trait]
impl Provider for Ollama {
    type Request = GenerationRequest;
    type Response = GenerationResponse;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        self.generate(request).await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.version().await.map(|_| ())
    }

    fn extract_text(response: &Self::Response) -> String {
        response.response.clone()
    }
}

/// Construct a proper base URL with scheme and port from a host specification
fn build_base_url(host: String, port: u16) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        let url_parts: Vec<&str> = host.split("://").collect();
        if url_parts.len() == 2 {
            let scheme = url_parts[0];
            let host_part = url_parts[1];

            if host_part.contains(':') {
                // Already has a port, use as is
                host
            } else {
                format!("{}://{}:{}", scheme, host_part, port)
            }
        } else {
            // Malformed URL, fallback to safe default
            format!("http://localhost:{}", port)
        }
    } else {
        // No scheme, add http:// and port
        format!("http://{}:{}", host, port)
    }
}

/// Parse an Ollama generate response, tolerating streamed JSONL bodies.
///
/// When the server ignores `stream: false` the body arrives as one JSON
/// object per line; the text pieces are stitched back together and the
/// last line supplies the metadata.
fn parse_generation_response(response_text: &str) -> Result<GenerationResponse, ProviderError> {
    match serde_json::from_str::<GenerationResponse>(response_text) {
        Ok(parsed) => Ok(parsed),
        Err(parse_error) => {
            let mut full_response = String::new();
            let mut last_value: Option<serde_json::Value> = None;

            for line in response_text.lines().filter(|l| !l.trim().is_empty()) {
                if let Ok(value) = serde_json::from_str::<serde_json::Value>(line) {
                    if let Some(part) = value.get("response").and_then(|v| v.as_str()) {
                        full_response.push_str(part);
                    }
                    last_value = Some(value);
                }
            }

            let Some(last) = last_value else {
                return Err(ProviderError::ParseError(format!(
                    "Failed to parse Ollama API response: {}",
                    parse_error
                )));
            };

            Ok(GenerationResponse {
                model: last.get("model").and_then(|v| v.as_str()).unwrap_or("unknown").to_string(),
                created_at: last.get("created_at").and_then(|v| v.as_str()).unwrap_or("").to_string(),
                response: full_response,
                done: last.get("done").and_then(|v| v.as_bool()).unwrap_or(true),
                prompt_eval_count: last.get("prompt_eval_count").and_then(|v| v.as_u64()),
                eval_count: last.get("eval_count").and_then(|v| v.as_u64()),
            })
        }
    }
}
