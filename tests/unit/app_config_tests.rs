/*!
 * Tests for configuration defaults, validation and provider lookups
 */

use locsync::app_config::{
    Config, LogLevel, ProviderConfig, TranslationCommonConfig, TranslationProvider,
};
use std::path::PathBuf;

/// Rewrite the OpenAI catalogue entry in place
fn edit_openai_entry(config: &mut Config, apply: impl FnOnce(&mut ProviderConfig)) {
    let entry = config
        .translation
        .available_providers
        .iter_mut()
        .find(|p| p.provider_type == "openai")
        .expect("OpenAI catalogue entry should exist");
    apply(entry);
}

#[test]
fn test_defaultConfig_shouldProvideWorkingBaseline() {
    let config = Config::default();

    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_languages, vec!["fr".to_string()]);
    assert_eq!(config.locales_dir, "locales");
    assert_eq!(config.snapshot_path, ".locsync/snapshot.json");
    assert_eq!(config.log_level, LogLevel::Info);

    // History stays on until someone turns it off
    assert!(config.history.enabled);
    assert_eq!(config.history.database_path, None);

    // The default provider is the local one, with its catalogue entry filled in
    assert_eq!(config.translation.provider, TranslationProvider::Ollama);
    let entry = config
        .translation
        .get_provider_config(&TranslationProvider::Ollama)
        .expect("Ollama catalogue entry should exist");
    assert_eq!(entry.model, "llama3.2:3b");
    assert_eq!(entry.concurrent_requests, 4);
    assert_eq!(entry.timeout_secs, 30);
}

#[test]
fn test_validate_withDefaults_shouldPass() {
    assert!(Config::default().validate().is_ok());
}

#[test]
fn test_validate_withBadLanguageCodes_shouldFail() {
    let mut config = Config::default();
    config.source_language = "xyz".to_string();
    assert!(config.validate().is_err());

    config.source_language = "en".to_string();
    config.target_languages = Vec::new();
    assert!(config.validate().is_err());

    config.target_languages = vec!["zzz".to_string()];
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_withSourceAmongTargets_shouldFail() {
    let mut config = Config::default();

    // Translating en into en would overwrite the source tree
    config.target_languages = vec!["en".to_string()];
    assert!(config.validate().is_err());

    // A regional variant is a distinct locale and passes
    config.target_languages = vec!["en-GB".to_string()];
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_withHostedProvider_shouldRequireApiKey() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::OpenAI;

    edit_openai_entry(&mut config, |entry| entry.api_key = String::new());
    assert!(config.validate().is_err());

    edit_openai_entry(&mut config, |entry| entry.api_key = "sk-1234567890".to_string());
    assert!(config.validate().is_ok());

    // The local provider validates without any key
    config.translation.provider = TranslationProvider::Ollama;
    assert!(config.validate().is_ok());
}

#[test]
fn test_commonDefaults_shouldCoverRetriesAndPromptPlaceholders() {
    let common = TranslationCommonConfig::default();

    assert_eq!(common.retry_count, 3);
    assert_eq!(common.retry_backoff_ms, 1000);
    assert!(common.rate_limit_delay_ms > 0);
    assert!((0.0..=1.0).contains(&common.temperature));

    // The prompt template must keep both substitution points
    assert!(common.system_prompt.contains("{source_language}"));
    assert!(common.system_prompt.contains("{target_language}"));
}

#[test]
fn test_catalogueEntries_shouldRateLimitHostedBackendsOnly() {
    let expectations = [
        (TranslationProvider::Ollama, None),
        (TranslationProvider::OpenAI, Some(60)),
        (TranslationProvider::Anthropic, Some(45)),
        (TranslationProvider::LMStudio, None),
    ];

    for (provider, expected) in expectations {
        let entry = ProviderConfig::new(provider.clone());
        assert_eq!(entry.rate_limit, expected, "rate limit for {}", provider);
    }
}

#[test]
fn test_sourceDir_shouldFollowLocalesDirUnlessOverridden() {
    let mut config = Config::default();
    config.locales_dir = "i18n".to_string();
    config.source_language = "en".to_string();
    assert_eq!(config.source_dir(), PathBuf::from("i18n").join("en"));

    config.source_dir = "custom/source".to_string();
    assert_eq!(config.source_dir(), PathBuf::from("custom/source"));
}

#[test]
fn test_languageDir_shouldJoinLocalesDirAndLanguage() {
    let mut config = Config::default();
    config.locales_dir = "locales".to_string();

    assert_eq!(config.language_dir("fr"), PathBuf::from("locales").join("fr"));
    assert_eq!(config.language_dir("pt-BR"), PathBuf::from("locales").join("pt-BR"));
}

#[test]
fn test_providerNames_shouldParseCaseInsensitiveAndFormat() {
    assert_eq!("ollama".parse::<TranslationProvider>().unwrap(), TranslationProvider::Ollama);
    assert_eq!("OpenAI".parse::<TranslationProvider>().unwrap(), TranslationProvider::OpenAI);
    assert_eq!("ANTHROPIC".parse::<TranslationProvider>().unwrap(), TranslationProvider::Anthropic);
    assert_eq!("LmStudio".parse::<TranslationProvider>().unwrap(), TranslationProvider::LMStudio);
    assert!("aws".parse::<TranslationProvider>().is_err());

    assert_eq!(TranslationProvider::LMStudio.to_string(), "lmstudio");
    assert_eq!(TranslationProvider::OpenAI.display_name(), "OpenAI");
}

#[test]
fn test_getModel_withEmptyCatalogueModel_shouldFallBackToDefault() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::OpenAI;

    edit_openai_entry(&mut config, |entry| entry.model = String::new());
    assert_eq!(config.translation.get_model(), "gpt-4o-mini");

    edit_openai_entry(&mut config, |entry| entry.model = "gpt-4o".to_string());
    assert_eq!(config.translation.get_model(), "gpt-4o");
}

#[test]
fn test_providerLookups_withClearedCatalogue_shouldFallBackToDefaults() {
    let mut config = Config::default();
    config.translation.available_providers.clear();

    config.translation.provider = TranslationProvider::Ollama;
    assert_eq!(config.translation.get_endpoint(), "http://localhost:11434");
    assert_eq!(config.translation.get_timeout_secs(), 30);

    config.translation.provider = TranslationProvider::Anthropic;
    assert_eq!(config.translation.get_endpoint(), "https://api.anthropic.com");
    assert_eq!(config.translation.get_timeout_secs(), 60);
    assert_eq!(config.translation.get_rate_limit(), Some(45));

    config.translation.provider = TranslationProvider::LMStudio;
    assert_eq!(config.translation.get_endpoint(), "http://localhost:1234/v1");
}
