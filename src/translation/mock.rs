/*!
 * Mock translator for exercising the sync pipeline without a provider.
 *
 * The mock records every call it receives so tests can assert on the delta
 * that reached it, and supports a few failure modes:
 * - `MockTranslator::working()` - Translates by prefixing string values
 * - `MockTranslator::failing()` - Always fails with a provider error
 * - `MockTranslator::missing_language(lang)` - Omits one requested language
 * - `MockTranslator::scripted(set)` - Returns a fixed translation set
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

use crate::errors::{ProviderError, SyncError};
use crate::sync::{Document, DocumentSet, TranslationSet};

use super::Translator;

/// One call recorded by the mock translator
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// The delta the pipeline handed over
    pub delta: DocumentSet,
    /// Source language of the delta
    pub source_language: String,
    /// Languages the pipeline asked for
    pub target_languages: Vec<String>,
}

/// Behavior mode for the mock translator
enum MockTranslatorMode {
    /// Translate every string value by prefixing it with the language code
    Working,
    /// Always fail with a provider error
    Failing,
    /// Translate normally but omit one requested language from the result
    MissingLanguage(String),
    /// Return a fixed translation set regardless of input
    Scripted(TranslationSet),
}

/// Mock implementation of the Translator trait
pub struct MockTranslator {
    mode: MockTranslatorMode,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockTranslator {
    fn with_mode(mode: MockTranslatorMode) -> Self {
        Self {
            mode,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock that translates by prefixing string values
    pub fn working() -> Self {
        Self::with_mode(MockTranslatorMode::Working)
    }

    /// Create a mock that always fails
    pub fn failing() -> Self {
        Self::with_mode(MockTranslatorMode::Failing)
    }

    /// Create a mock that omits the given language from its results
    pub fn missing_language(language: impl Into<String>) -> Self {
        Self::with_mode(MockTranslatorMode::MissingLanguage(language.into()))
    }

    /// Create a mock that returns a fixed translation set
    pub fn scripted(translations: TranslationSet) -> Self {
        Self::with_mode(MockTranslatorMode::Scripted(translations))
    }

    /// Number of times translate was called
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// All recorded calls, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// The delta from the most recent call, if any
    pub fn last_delta(&self) -> Option<DocumentSet> {
        self.calls.lock().last().map(|call| call.delta.clone())
    }

    /// Translate a document the way the working mock does.
    ///
    /// Exposed so tests can compute the values they expect to find in merged
    /// output.
    pub fn translate_document(document: &Document, language: &str) -> Document {
        document
            .iter()
            .map(|(key, value)| (key.clone(), Self::translate_value(value, language)))
            .collect()
    }

    fn translate_value(value: &Value, language: &str) -> Value {
        match value {
            Value::String(text) => Value::String(format!("[{}] {}", language, text)),
            Value::Object(map) => {
                let mut translated = Document::new();
                for (key, child) in map {
                    translated.insert(key.clone(), Self::translate_value(child, language));
                }
                Value::Object(translated)
            }
            Value::Array(items) => {
                Value::Array(items.iter().map(|item| Self::translate_value(item, language)).collect())
            }
            other => other.clone(),
        }
    }

    fn translate_all(delta: &DocumentSet, languages: &[String], skip: Option<&str>) -> TranslationSet {
        let mut translations = TranslationSet::new();
        for language in languages {
            if skip == Some(language.as_str()) {
                continue;
            }
            let documents: DocumentSet = delta
                .iter()
                .map(|(name, document)| (name.clone(), Self::translate_document(document, language)))
                .collect();
            translations.insert(language.clone(), documents);
        }
        translations
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(
        &self,
        delta: &DocumentSet,
        source_language: &str,
        target_languages: &[String],
    ) -> Result<TranslationSet, SyncError> {
        self.calls.lock().push(RecordedCall {
            delta: delta.clone(),
            source_language: source_language.to_string(),
            target_languages: target_languages.to_vec(),
        });

        match &self.mode {
            MockTranslatorMode::Working => Ok(Self::translate_all(delta, target_languages, None)),
            MockTranslatorMode::Failing => Err(SyncError::Provider(ProviderError::ApiError {
                status_code: 500,
                message: "Simulated provider failure".to_string(),
            })),
            MockTranslatorMode::MissingLanguage(missing) => {
                Ok(Self::translate_all(delta, target_languages, Some(missing.as_str())))
            }
            MockTranslatorMode::Scripted(translations) => Ok(translations.clone()),
        }
    }
}
