/*!
 * Core translation service implementation.
 *
 * This module contains the main TranslationService struct and its implementation,
 * which is responsible for translating whole JSON documents using various AI providers.
 */

use anyhow::{Result, anyhow};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use url::Url;

use crate::app_config::{TranslationConfig, TranslationProvider as ConfigTranslationProvider};
use crate::errors::{ProviderError, TranslationError};
use crate::language_utils;
use crate::providers::Provider;
use crate::providers::anthropic::{Anthropic, AnthropicRequest};
use crate::providers::ollama::{GenerationRequest, Ollama};
use crate::providers::openai::{ChatCompletionRequest, OpenAI};
use crate::sync::document::flatten;
use crate::sync::Document;

/// Models sometimes wrap their JSON output in Markdown code fences
static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[a-zA-Z]*[ \t]*\r?\n?(.*?)\r?\n?```$").unwrap()
});

/// Token usage statistics for tracking API consumption
#[derive(Clone)]
pub struct TokenUsageStats {
    /// Number of prompt tokens
    pub prompt_tokens: u64,

    /// Number of completion tokens
    pub completion_tokens: u64,

    /// Total number of tokens
    pub total_tokens: u64,

    /// Start time of token tracking
    pub start_time: Instant,

    /// Total time spent on API requests
    pub api_duration: Duration,

    /// Provider name
    pub provider: String,

    /// Model name
    pub model: String,
}

impl Default for TokenUsageStats {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenUsageStats {
    /// Create a new empty token usage stats instance
    pub fn new() -> Self {
        Self {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
            start_time: Instant::now(),
            api_duration: Duration::from_secs(0),
            provider: String::new(),
            model: String::new(),
        }
    }

    /// Create new token usage stats with provider info
    pub fn with_provider_info(provider: String, model: String) -> Self {
        Self {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
            start_time: Instant::now(),
            api_duration: Duration::from_secs(0),
            provider,
            model,
        }
    }

    /// Add token usage numbers from a completed request
    pub fn add_token_usage(&mut self, prompt_tokens: Option<u64>, completion_tokens: Option<u64>) {
        if let Some(pt) = prompt_tokens {
            self.prompt_tokens += pt;
            self.total_tokens += pt;
        }

        if let Some(ct) = completion_tokens {
            self.completion_tokens += ct;
            self.total_tokens += ct;
        }
    }

    /// Calculate tokens per minute rate
    pub fn tokens_per_minute(&self) -> f64 {
        // Rate over time actually spent in requests, else over wall clock
        let duration_minutes = if self.api_duration.as_secs_f64() > 0.0 {
            self.api_duration.as_secs_f64() / 60.0
        } else {
            self.start_time.elapsed().as_secs_f64() / 60.0
        };

        if duration_minutes > 0.0 {
            self.total_tokens as f64 / duration_minutes
        } else {
            0.0
        }
    }

    /// Generate a summary of token usage
    pub fn summary(&self) -> String {
        let elapsed = self.start_time.elapsed();
        let elapsed_minutes = elapsed.as_secs_f64() / 60.0;
        let api_minutes = self.api_duration.as_secs_f64() / 60.0;

        format!(
            "Token Usage Summary:\n\
             Provider: {}\n\
             Model: {}\n\
             Prompt tokens: {}\n\
             Completion tokens: {}\n\
             Total tokens: {}\n\
             Elapsed time: {:.2} minutes\n\
             API request time: {:.2} minutes\n\
             Tokens per minute: {:.2}",
            self.provider,
            self.model,
            self.prompt_tokens,
            self.completion_tokens,
            self.total_tokens,
            elapsed_minutes,
            api_minutes,
            self.tokens_per_minute()
        )
    }
}

/// Parse an endpoint string into host and port
fn parse_endpoint(endpoint: &str) -> Result<(String, u16)> {
    if endpoint.is_empty() {
        return Err(anyhow!("Endpoint cannot be empty"));
    }

    let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Url::parse(endpoint)?
    } else {
        Url::parse(&format!("http://{}", endpoint))?
    };

    let host = url.host_str()
        .ok_or_else(|| anyhow!("Invalid host in endpoint: {}", endpoint))?
        .to_string();

    let port = url.port().unwrap_or(if url.scheme() == "https" { 443 } else { 80 });

    Ok((host, port))
}

/// Remove Markdown code fences a model may have wrapped around its JSON output
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    match CODE_FENCE.captures(trimmed) {
        Some(captures) => captures.get(1).map(|m| m.as_str()).unwrap_or(trimmed),
        None => trimmed,
    }
}

/// Parse and validate a translated document returned by a provider.
///
/// The translated document must be a JSON object whose flattened key set is
/// exactly that of the source document. Dropped, invented or restructured keys
/// are rejected so a drifting model response never reaches the merge step.
fn parse_translated_document(
    name: &str,
    source: &Document,
    text: &str,
) -> Result<Document, TranslationError> {
    let cleaned = strip_code_fences(text);

    let value: Value = serde_json::from_str(cleaned).map_err(|e| TranslationError::InvalidDocument {
        document: name.to_string(),
        reason: format!("response is not valid JSON: {}", e),
    })?;

    let translated = match value {
        Value::Object(map) => map,
        other => {
            return Err(TranslationError::InvalidDocument {
                document: name.to_string(),
                reason: format!("expected a JSON object, got {}", json_kind(&other)),
            });
        }
    };

    let expected: BTreeSet<String> = flatten(source).into_keys().collect();
    let actual: BTreeSet<String> = flatten(&translated).into_keys().collect();

    if expected != actual {
        let missing: Vec<String> = expected.difference(&actual).cloned().collect();
        let unexpected: Vec<String> = actual.difference(&expected).cloned().collect();
        return Err(TranslationError::InvalidDocument {
            document: name.to_string(),
            reason: format!(
                "key structure drifted (missing: [{}], unexpected: [{}])",
                missing.join(", "),
                unexpected.join(", ")
            ),
        });
    }

    Ok(translated)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Translation provider implementation variants
enum TranslationProviderImpl {
    /// Ollama LLM service
    Ollama {
        /// Client instance
        client: Ollama,
    },

    /// OpenAI API service
    OpenAI {
        /// Client instance
        client: OpenAI,
    },

    /// LM Studio local server (OpenAI-compatible)
    LMStudio {
        /// Client instance (OpenAI-compatible)
        client: OpenAI,
    },

    /// Anthropic API service
    Anthropic {
        /// Client instance
        client: Anthropic,
    },
}

/// Main translation service for locale documents
pub struct TranslationService {
    /// Provider implementation
    provider: TranslationProviderImpl,

    /// Configuration for the translation service
    pub config: TranslationConfig,
}

impl TranslationService {
    /// Create a new translation service with the given configuration
    pub fn new(config: TranslationConfig) -> Result<Self> {
        let timeout_secs = config.get_timeout_secs();
        let retry_count = config.common.retry_count;
        let retry_backoff_ms = config.common.retry_backoff_ms;
        let rate_limit = config.get_rate_limit();

        let provider = match config.provider {
            ConfigTranslationProvider::Ollama => {
                let (host, port) = parse_endpoint(&config.get_endpoint())?;

                TranslationProviderImpl::Ollama {
                    client: Ollama::new_with_config(&host, port, timeout_secs, retry_count, retry_backoff_ms, rate_limit),
                }
            },
            ConfigTranslationProvider::OpenAI => {
                TranslationProviderImpl::OpenAI {
                    client: OpenAI::new_with_config(
                        config.get_api_key(),
                        config.get_endpoint(),
                        timeout_secs,
                        retry_count,
                        retry_backoff_ms,
                        rate_limit,
                    ),
                }
            },
            ConfigTranslationProvider::LMStudio => {
                // LM Studio often doesn't require an API key; use a default if empty
                let api_key = {
                    let k = config.get_api_key();
                    if k.is_empty() { "lm-studio".to_string() } else { k }
                };

                TranslationProviderImpl::LMStudio {
                    client: OpenAI::new_with_config(
                        api_key,
                        config.get_endpoint(),
                        timeout_secs,
                        retry_count,
                        retry_backoff_ms,
                        rate_limit,
                    ),
                }
            },
            ConfigTranslationProvider::Anthropic => {
                TranslationProviderImpl::Anthropic {
                    client: Anthropic::new_with_config(
                        config.get_api_key(),
                        config.get_endpoint(),
                        timeout_secs,
                        retry_count,
                        retry_backoff_ms,
                        rate_limit,
                    ),
                }
            },
        };

        Ok(Self { provider, config })
    }

    /// Test the connection to the translation provider
    pub async fn test_connection(&self) -> Result<()> {
        match &self.provider {
            TranslationProviderImpl::Ollama { client } => {
                let version = client.version().await
                    .map_err(|e| anyhow!("Failed to connect to Ollama: {}", e))?;
                debug!("Connected to Ollama {}", version);
                Ok(())
            },
            TranslationProviderImpl::OpenAI { client } => {
                client.test_connection().await
                    .map_err(|e| anyhow!("Failed to connect to OpenAI API: {}", e))
            },
            TranslationProviderImpl::LMStudio { client } => {
                client.test_connection().await
                    .map_err(|e| anyhow!("Failed to connect to LM Studio: {}", e))
            },
            TranslationProviderImpl::Anthropic { client } => {
                client.test_connection().await
                    .map_err(|e| anyhow!("Failed to connect to Anthropic API: {}", e))
            },
        }
    }

    /// Translate a single JSON document into the target language
    pub async fn translate_document(
        &self,
        name: &str,
        document: &Document,
        source_language: &str,
        target_language: &str,
    ) -> Result<Document, TranslationError> {
        let (translated, _) = self
            .translate_document_with_usage(name, document, source_language, target_language)
            .await?;
        Ok(translated)
    }

    /// Translate a document with token usage tracking.
    ///
    /// A structurally invalid response (drifted keys, unparseable JSON) is
    /// retried once with a fresh request before giving up. Provider errors are
    /// not retried here, the clients already retry transient failures.
    pub async fn translate_document_with_usage(
        &self,
        name: &str,
        document: &Document,
        source_language: &str,
        target_language: &str,
    ) -> Result<(Document, Option<(Option<u64>, Option<u64>, Option<Duration>)>), TranslationError> {
        let payload = serde_json::to_string_pretty(document).map_err(|e| {
            TranslationError::InvalidDocument {
                document: name.to_string(),
                reason: format!("could not serialize source document: {}", e),
            }
        })?;

        let system_prompt = self.render_system_prompt(source_language, target_language);

        let mut last_failure: Option<TranslationError> = None;

        for attempt in 0..2 {
            let start_time = Instant::now();
            let (text, prompt_tokens, completion_tokens) =
                self.request_completion(&payload, &system_prompt).await?;
            let duration = start_time.elapsed();

            match parse_translated_document(name, document, &text) {
                Ok(translated) => {
                    debug!("Translated '{}' to {} in {:?}", name, target_language, duration);
                    return Ok((translated, Some((prompt_tokens, completion_tokens, Some(duration)))));
                },
                Err(e) => {
                    if attempt == 0 {
                        warn!("Rejected translation of '{}' to {}, requesting a fresh one: {}", name, target_language, e);
                    }
                    last_failure = Some(e);
                }
            }
        }

        Err(last_failure.unwrap_or_else(|| TranslationError::InvalidDocument {
            document: name.to_string(),
            reason: "translation produced no usable response".to_string(),
        }))
    }

    /// Send one completion request through the configured provider
    async fn request_completion(
        &self,
        payload: &str,
        system_prompt: &str,
    ) -> Result<(String, Option<u64>, Option<u64>), ProviderError> {
        let model = self.config.get_model();
        let temperature = self.config.common.temperature;

        match &self.provider {
            TranslationProviderImpl::Ollama { client } => {
                let request = GenerationRequest::new(&model, payload)
                    .system(system_prompt)
                    .temperature(temperature)
                    .format("json");

                let response = client.generate(request).await?;
                Ok((response.response.clone(), response.prompt_eval_count, response.eval_count))
            },
            TranslationProviderImpl::OpenAI { client } | TranslationProviderImpl::LMStudio { client } => {
                let request = ChatCompletionRequest::new(&model)
                    .add_message("system", system_prompt)
                    .add_message("user", payload)
                    .temperature(temperature)
                    .max_tokens(self.max_tokens_for_model(&model))
                    .json_response();

                let response = client.complete(request).await?;

                let text = response.choices.first()
                    .map(|choice| choice.message.content.clone())
                    .ok_or_else(|| ProviderError::ParseError("Provider returned no choices".to_string()))?;

                let (prompt_tokens, completion_tokens) = match response.usage.as_ref() {
                    Some(usage) => (Some(u64::from(usage.prompt_tokens)), Some(u64::from(usage.completion_tokens))),
                    None => (None, None),
                };

                Ok((text, prompt_tokens, completion_tokens))
            },
            TranslationProviderImpl::Anthropic { client } => {
                let request = AnthropicRequest::new(&model, self.max_tokens_for_model(&model))
                    .system(system_prompt)
                    .add_message("user", payload)
                    .temperature(temperature);

                let response = client.complete(request).await?;

                let text = Anthropic::extract_text(&response);
                let prompt_tokens = Some(u64::from(response.usage.input_tokens));
                let completion_tokens = Some(u64::from(response.usage.output_tokens));

                Ok((text, prompt_tokens, completion_tokens))
            },
        }
    }

    /// Render the configured system prompt for a language pair
    fn render_system_prompt(&self, source_language: &str, target_language: &str) -> String {
        let source_name = language_utils::get_language_name(source_language)
            .unwrap_or_else(|_| source_language.to_string());
        let target_name = language_utils::get_language_name(target_language)
            .unwrap_or_else(|_| target_language.to_string());

        self.config.common.system_prompt
            .replace("{source_language}", &source_name)
            .replace("{target_language}", &target_name)
    }

    /// Get the maximum number of tokens for a given model
    fn max_tokens_for_model(&self, model: &str) -> u32 {
        match model {
            // OpenAI models
            "gpt-4o" | "gpt-4o-mini" => 16384,
            "gpt-4-turbo" | "gpt-4-turbo-preview" | "gpt-4-0125-preview" => 4096,
            "gpt-4" | "gpt-4-0613" => 8192,
            "gpt-3.5-turbo" | "gpt-3.5-turbo-0613" => 4096,

            // Anthropic models
            "claude-3-opus-20240229" => 4096,
            "claude-3-sonnet-20240229" => 4096,
            "claude-3-haiku-20240307" => 4096,
            "claude-3-5-sonnet-20241022" => 8192,
            "claude-3-5-haiku-20241022" => 8192,

            // Default for unknown models
            _ => 4096,
        }
    }
}

impl Clone for TranslationService {
    fn clone(&self) -> Self {
        // Create a new instance with the same config
        // This should not fail if the original instance was created successfully
        TranslationService::new(self.config.clone())
            .expect("Failed to clone TranslationService - this indicates a serious configuration issue")
    }
}
