/*!
 * Configurable test double for the [`Provider`] trait.
 *
 * Each [`MockBehavior`] reproduces one shape of real backend output, from
 * clean JSON through fenced or key-dropping responses to hard failures, so
 * validation and retry paths can be exercised without a live model.
 */

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::ProviderError;
use crate::providers::Provider;

/// Input handed to the mock, mirroring what a real client sends
#[derive(Debug, Clone)]
pub struct MockRequest {
    /// Serialized JSON document to translate
    pub document: String,
    /// Language the document is written in
    pub source_language: String,
    /// Language to translate into
    pub target_language: String,
}

/// Output the mock hands back
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// Text a real model would have produced
    pub text: String,
    /// Invented prompt token count
    pub prompt_tokens: Option<u64>,
    /// Invented completion token count
    pub completion_tokens: Option<u64>,
}

impl MockResponse {
    fn of(text: String, prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            text,
            prompt_tokens: Some(prompt_tokens),
            completion_tokens: Some(completion_tokens),
        }
    }
}

/// What the mock does when a request arrives
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Translate every request cleanly
    Working,
    /// Translate, then wrap the result in Markdown code fences
    Fenced,
    /// Translate, then drop the first top-level key
    DroppedKeys,
    /// Answer with text no JSON parser accepts
    MalformedJson,
    /// Fail every `fail_every`th request, succeed otherwise
    Intermittent { fail_every: usize },
    /// Refuse every request
    Failing,
    /// Answer with an empty string
    Empty,
    /// Sleep before answering
    Slow { delay_ms: u64 },
}

/// In-memory stand-in for a model backend.
///
/// Clones share one request counter, so a mock handed to concurrent workers
/// schedules intermittent failures across all of them.
#[derive(Debug, Clone)]
pub struct MockProvider {
    behavior: MockBehavior,
    /// Requests served so far, shared across clones
    request_count: Arc<AtomicUsize>,
    /// Overrides the built-in translation when set
    custom_response: Option<fn(&MockRequest) -> String>,
}

impl MockProvider {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            custom_response: None,
        }
    }

    /// Mock that answers every request with a clean translation
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Mock whose answers arrive wrapped in code fences
    pub fn fenced() -> Self {
        Self::new(MockBehavior::Fenced)
    }

    /// Mock whose answers lose their first top-level key
    pub fn dropped_keys() -> Self {
        Self::new(MockBehavior::DroppedKeys)
    }

    /// Mock whose answers are not valid JSON
    pub fn malformed_json() -> Self {
        Self::new(MockBehavior::MalformedJson)
    }

    /// Mock that fails every `fail_every`th request
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Mock that refuses every request and every connection probe
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Mock that answers with empty text
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Replace the built-in translation with a fixed generator
    pub fn with_custom_response(mut self, generator: fn(&MockRequest) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Requests served so far, across all clones
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Deterministic stand-in translation of a serialized JSON document.
    ///
    /// Every string value gains a target language prefix while keys and
    /// non-string values pass through untouched, so assertions can tell
    /// output apart from input.
    pub fn translate_document(document: &str, target_language: &str) -> String {
        match serde_json::from_str::<Value>(document) {
            Ok(mut value) => {
                Self::prefix_strings(&mut value, target_language);
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| document.to_string())
            }
            Err(_) => format!("[{}] {}", target_language, document),
        }
    }

    fn prefix_strings(value: &mut Value, target_language: &str) {
        match value {
            Value::String(text) => *text = format!("[{}] {}", target_language, text),
            Value::Object(map) => {
                for child in map.values_mut() {
                    Self::prefix_strings(child, target_language);
                }
            }
            Value::Array(items) => {
                for child in items.iter_mut() {
                    Self::prefix_strings(child, target_language);
                }
            }
            _ => {}
        }
    }

    fn drop_first_key(document: &str) -> String {
        match serde_json::from_str::<Value>(document) {
            Ok(Value::Object(mut map)) => {
                let first = map.keys().next().cloned();
                if let Some(key) = first {
                    map.shift_remove(&key);
                }
                serde_json::to_string_pretty(&Value::Object(map)).unwrap_or_default()
            }
            _ => document.to_string(),
        }
    }

    fn translate(&self, request: &MockRequest) -> String {
        Self::translate_document(&request.document, &request.target_language)
    }
}

#[async_trait]
impl Provider for MockProvider {
    type Request = MockRequest;
    type Response = MockResponse;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        let served = self.request_count.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Working => {
                // Only the clean path consults the custom generator
                let text = match self.custom_response {
                    Some(generator) => generator(&request),
                    None => self.translate(&request),
                };
                let length = request.document.len() as u64;
                Ok(MockResponse::of(text, length, length / 2))
            }

            MockBehavior::Fenced => {
                let body = self.translate(&request);
                Ok(MockResponse::of(format!("```json\n{}\n```", body), 10, 10))
            }

            MockBehavior::DroppedKeys => {
                let body = self.translate(&request);
                Ok(MockResponse::of(Self::drop_first_key(&body), 10, 10))
            }

            MockBehavior::MalformedJson => {
                Ok(MockResponse::of("{ \"greeting\": unquoted".to_string(), 10, 5))
            }

            MockBehavior::Intermittent { fail_every } => {
                if (served + 1) % fail_every == 0 {
                    Err(ProviderError::ApiError {
                        message: format!("mock backend down (request {})", served + 1),
                        status_code: 503,
                    })
                } else {
                    Ok(MockResponse::of(self.translate(&request), 10, 10))
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "mock backend refuses all requests".to_string(),
                status_code: 500,
            }),

            MockBehavior::Empty => Ok(MockResponse::of(String::new(), 0, 0)),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
                Ok(MockResponse::of(self.translate(&request), 10, 10))
            }
        }
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        if self.behavior == MockBehavior::Failing {
            return Err(ProviderError::ConnectionError(
                "mock backend refuses connections".to_string(),
            ));
        }
        Ok(())
    }

    fn extract_text(response: &Self::Response) -> String {
        response.text.clone()
    }
}
