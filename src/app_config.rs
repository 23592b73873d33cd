use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::PathBuf;

/// Configuration for the sync CLI
/// Everything the CLI reads from locsync.json lives here: the locale tree
/// layout, the snapshot location, run history settings and the provider
/// catalogue the translation service picks from.
/// Top-level configuration loaded from the config file
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// ISO code of the language the source tree is written in
    pub source_language: String,

    /// Target language codes (ISO)
    pub target_languages: Vec<String>,

    /// Root directory holding one subdirectory per language
    #[serde(default = "default_locales_dir")]
    pub locales_dir: String,

    /// Source tree directory, defaults to locales_dir/source_language
    #[serde(default = "String::new")]
    pub source_dir: String,

    /// Path of the snapshot file recording the last synced source tree
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,

    /// Run history settings
    #[serde(default)]
    pub history: HistoryConfig,

    /// Translation config
    pub translation: TranslationConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Config {
    /// Validate language codes and provider requirements
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::get_language_name(&self.source_language)?;

        if self.target_languages.is_empty() {
            return Err(anyhow!("At least one target language is required"));
        }
        for target in &self.target_languages {
            crate::language_utils::get_language_name(target)?;
            if crate::language_utils::language_codes_match(target, &self.source_language) {
                return Err(anyhow!(
                    "Target language '{}' is the source language; its tree would be overwritten",
                    target
                ));
            }
        }

        // Hosted providers refuse anonymous requests
        let needs_api_key = matches!(
            self.translation.provider,
            TranslationProvider::OpenAI | TranslationProvider::Anthropic
        );
        if needs_api_key && self.translation.get_api_key().is_empty() {
            return Err(anyhow!(
                "An API key is required for the {} provider",
                self.translation.provider.display_name()
            ));
        }

        Ok(())
    }

    /// Directory holding the source-language documents
    pub fn source_dir(&self) -> PathBuf {
        if self.source_dir.is_empty() {
            PathBuf::from(&self.locales_dir).join(&self.source_language)
        } else {
            PathBuf::from(&self.source_dir)
        }
    }

    /// Directory holding one target language's documents
    pub fn language_dir(&self, language: &str) -> PathBuf {
        PathBuf::from(&self.locales_dir).join(language)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: "en".to_string(),
            target_languages: vec!["fr".to_string()],
            locales_dir: default_locales_dir(),
            source_dir: String::new(),
            snapshot_path: default_snapshot_path(),
            history: HistoryConfig::default(),
            translation: TranslationConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

/// Supported translation backends
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    #[default]
    Ollama,
    OpenAI,
    Anthropic,
    // OpenAI-compatible local server
    LMStudio,
}

impl TranslationProvider {
    // @returns: Human-facing provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Ollama => "Ollama",
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::LMStudio => "LM Studio",
        }
    }

    // @returns: Identifier used in config files and catalogue lookups
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Ollama => "ollama".to_string(),
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
            Self::LMStudio => "lmstudio".to_string(),
        }
    }

    fn all() -> [TranslationProvider; 4] {
        [
            Self::Ollama,
            Self::OpenAI,
            Self::Anthropic,
            Self::LMStudio,
        ]
    }
}

impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "lmstudio" => Ok(Self::LMStudio),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// One entry in the provider catalogue
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider identifier, matches TranslationProvider lowercase
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name, empty falls back to the built-in default
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key, unused by local providers
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Parallel request cap
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    // @field: Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Requests per minute, None means unlimited
    #[serde(default)]
    pub rate_limit: Option<u32>,
}

impl ProviderConfig {
    /// Catalogue entry with the built-in defaults for one provider
    pub fn new(provider: TranslationProvider) -> Self {
        Self {
            provider_type: provider.to_lowercase_string(),
            model: default_model_for(&provider),
            api_key: String::new(),
            endpoint: default_endpoint_for(&provider),
            concurrent_requests: default_concurrent_requests(),
            timeout_secs: default_timeout_for(&provider),
            rate_limit: default_rate_limit_for(&provider),
        }
    }
}

/// Run history configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HistoryConfig {
    /// Whether runs are recorded at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Database file path, defaults to the platform data directory
    #[serde(default)]
    pub database_path: Option<String>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            database_path: None,
        }
    }
}

/// Settings consumed by the translation service
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Backend active for this run
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Catalogue of per-backend settings
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Settings shared across backends
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

impl TranslationConfig {
    /// Catalogue entry for the active provider
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Catalogue entry for the given provider
    pub fn get_provider_config(&self, provider: &TranslationProvider) -> Option<&ProviderConfig> {
        let wanted = provider.to_lowercase_string();
        self.available_providers
            .iter()
            .find(|p| p.provider_type == wanted)
    }

    /// Concurrency the active provider is configured for
    pub fn optimal_concurrent_requests(&self) -> usize {
        self.get_active_provider_config()
            .map(|p| p.concurrent_requests)
            .unwrap_or_else(default_concurrent_requests)
    }

    /// Model for the active provider
    pub fn get_model(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.model.clone())
            .filter(|model| !model.is_empty())
            .unwrap_or_else(|| default_model_for(&self.provider))
    }

    /// API key for the active provider, empty when none is configured
    pub fn get_api_key(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.api_key.clone())
            .unwrap_or_default()
    }

    /// Endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.endpoint.clone())
            .filter(|endpoint| !endpoint.is_empty())
            .unwrap_or_else(|| default_endpoint_for(&self.provider))
    }

    /// Request timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        self.get_active_provider_config()
            .map(|p| p.timeout_secs)
            .filter(|secs| *secs > 0)
            .unwrap_or_else(|| default_timeout_for(&self.provider))
    }

    /// Rate limit for the active provider
    pub fn get_rate_limit(&self) -> Option<u32> {
        match self.get_active_provider_config() {
            Some(provider) => provider.rate_limit,
            None => default_rate_limit_for(&self.provider),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            available_providers: TranslationProvider::all()
                .into_iter()
                .map(ProviderConfig::new)
                .collect(),
            common: TranslationCommonConfig::default(),
        }
    }
}

/// Knobs that apply no matter which provider is active
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// Prompt template sent as the system message.
    /// {source_language} and {target_language} are substituted per request
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Pause between consecutive requests, in milliseconds
    #[serde(default = "default_rate_limit_delay_ms")]
    pub rate_limit_delay_ms: u64,

    /// Attempts per request before giving up
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base retry backoff, in milliseconds
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Sampling temperature between 0.0 and 1.0.
    /// Kept low so translations stay literal
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            rate_limit_delay_ms: default_rate_limit_delay_ms(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: default_temperature(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_model_for(provider: &TranslationProvider) -> String {
    match provider {
        TranslationProvider::Ollama => "llama3.2:3b",
        TranslationProvider::OpenAI => "gpt-4o-mini",
        TranslationProvider::Anthropic => "claude-3-haiku-20240307",
        // Stands in for whatever model LM Studio has loaded
        TranslationProvider::LMStudio => "local-model",
    }
    .to_string()
}

fn default_endpoint_for(provider: &TranslationProvider) -> String {
    match provider {
        TranslationProvider::Ollama => "http://localhost:11434",
        TranslationProvider::OpenAI => "https://api.openai.com/v1",
        TranslationProvider::Anthropic => "https://api.anthropic.com",
        // LM Studio serves its OpenAI-compatible API on port 1234 under /v1
        TranslationProvider::LMStudio => "http://localhost:1234/v1",
    }
    .to_string()
}

fn default_timeout_for(provider: &TranslationProvider) -> u64 {
    match provider {
        // Anthropic responses arrive noticeably slower under load
        TranslationProvider::Anthropic => 60,
        _ => default_timeout_secs(),
    }
}

fn default_rate_limit_for(provider: &TranslationProvider) -> Option<u32> {
    match provider {
        // Local servers answer as fast as the hardware allows
        TranslationProvider::Ollama | TranslationProvider::LMStudio => None,
        TranslationProvider::OpenAI => Some(60),
        // Anthropic allows 50 requests per minute, stay a little under it
        TranslationProvider::Anthropic => Some(45),
    }
}

fn default_concurrent_requests() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_rate_limit_delay_ms() -> u64 {
    500
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    // Base backoff, doubled on each retry
    1000
}

fn default_temperature() -> f32 {
    0.3
}

fn default_true() -> bool {
    true
}

fn default_locales_dir() -> String {
    "locales".to_string()
}

fn default_snapshot_path() -> String {
    ".locsync/snapshot.json".to_string()
}

fn default_system_prompt() -> String {
    "You are a professional software localization translator. Translate the string values of the given JSON document from {source_language} to {target_language}. Keep every key and the nesting structure exactly as in the input, translate only the values, and leave placeholders such as {name} or %s untouched. Respond with the translated JSON document and nothing else.".to_string()
}
