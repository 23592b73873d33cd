/*!
 * Clients for the LLM backends the translation service can talk to.
 *
 * Each submodule wraps one wire API: `ollama` for a local Ollama server,
 * `openai` for the OpenAI API and compatible servers such as LM Studio,
 * `anthropic` for the Anthropic API. The `mock` provider drives tests.
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Interface shared by every backend client.
///
/// Requests and responses stay provider-shaped; callers go through
/// `extract_text` to reach the generated text without knowing which
/// backend produced it.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Wire request type of this backend
    type Request: Send + Sync;

    /// Wire response type of this backend
    type Response: Send + Sync;

    /// Send one completion request
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Cheap connectivity probe, run once at startup
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Generated text carried in a response
    fn extract_text(response: &Self::Response) -> String;
}

pub mod anthropic;
pub mod mock;
pub mod ollama;
pub mod openai;
