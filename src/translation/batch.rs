/*!
 * Batch translation processing.
 *
 * This module contains functionality for translating a delta of documents into
 * every target language, with support for concurrency, progress tracking, and
 * error handling.
 */

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use futures_util::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use log::error;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;

use crate::errors::{SyncError, TranslationError};
use crate::sync::{DocumentSet, TranslationSet};

use super::Translator;
use super::core::{TokenUsageStats, TranslationService};

/// Batch translator that fans a document delta out across target languages
pub struct BatchTranslator {
    /// The translation service to use
    service: TranslationService,

    /// Maximum number of concurrent requests
    max_concurrent_requests: usize,

    /// Token usage accumulated over the most recent run
    usage: Arc<Mutex<TokenUsageStats>>,
}

impl BatchTranslator {
    /// Create a new batch translator
    pub fn new(service: TranslationService) -> Self {
        Self {
            max_concurrent_requests: service.config.optimal_concurrent_requests().max(1),
            usage: Arc::new(Mutex::new(TokenUsageStats::new())),
            service,
        }
    }

    /// Snapshot of the token usage gathered during the most recent run
    pub fn usage(&self) -> TokenUsageStats {
        self.usage.lock().clone()
    }

    fn progress_bar(total_requests: u64) -> ProgressBar {
        let progress_bar = ProgressBar::new(total_requests);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} requests ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar.set_message("Translating");
        progress_bar
    }
}

#[async_trait]
impl Translator for BatchTranslator {
    async fn translate(
        &self,
        delta: &DocumentSet,
        source_language: &str,
        target_languages: &[String],
    ) -> Result<TranslationSet, SyncError> {
        if delta.is_empty() || target_languages.is_empty() {
            return Ok(TranslationSet::new());
        }

        // Reset usage tracking for this run
        {
            let mut usage = self.usage.lock();
            *usage = TokenUsageStats::with_provider_info(
                self.service.config.provider.to_string(),
                self.service.config.get_model(),
            );
        }

        // One permit pool bounds in-flight requests across all languages
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_requests));

        let total_requests = (delta.len() * target_languages.len()) as u64;
        let progress_bar = Self::progress_bar(total_requests);
        let completed = Arc::new(AtomicUsize::new(0));

        let rate_limit_delay_ms = self.service.config.common.rate_limit_delay_ms;

        // Process languages concurrently, and within each language fan out
        // over the documents of the delta
        let results = stream::iter(target_languages.iter().cloned())
            .map(|language| {
                let service = self.service.clone();
                let semaphore = Arc::clone(&semaphore);
                let usage = Arc::clone(&self.usage);
                let progress_bar = progress_bar.clone();
                let completed = Arc::clone(&completed);
                let source_language = source_language.to_string();

                async move {
                    let tasks = delta.iter().enumerate().map(|(index, (name, document))| {
                        let service = &service;
                        let semaphore = Arc::clone(&semaphore);
                        let usage = Arc::clone(&usage);
                        let progress_bar = progress_bar.clone();
                        let completed = Arc::clone(&completed);
                        let source_language = source_language.as_str();
                        let language = language.as_str();

                        async move {
                            // Acquire a permit from the semaphore
                            let _permit = semaphore.acquire().await.expect("Semaphore should not be closed");

                            // Sleep for rate limit delay to avoid overwhelming the API
                            if index > 0 && rate_limit_delay_ms > 0 {
                                tokio::time::sleep(std::time::Duration::from_millis(rate_limit_delay_ms)).await;
                            }

                            let result = service
                                .translate_document_with_usage(name, document, source_language, language)
                                .await;

                            let current = completed.fetch_add(1, Ordering::SeqCst) + 1;
                            progress_bar.set_position(current as u64);

                            match result {
                                Ok((translated, usage_info)) => {
                                    if let Some((prompt_tokens, completion_tokens, duration)) = usage_info {
                                        let mut stats = usage.lock();
                                        stats.add_token_usage(prompt_tokens, completion_tokens);
                                        if let Some(duration) = duration {
                                            stats.api_duration += duration;
                                        }
                                    }
                                    (name.clone(), Ok(translated))
                                },
                                Err(e) => (name.clone(), Err(e)),
                            }
                        }
                    });

                    let document_results = join_all(tasks).await;

                    let mut documents = DocumentSet::new();
                    let mut failures: Vec<String> = Vec::new();
                    let mut first_error: Option<TranslationError> = None;

                    for (name, result) in document_results {
                        match result {
                            Ok(translated) => {
                                documents.insert(name, translated);
                            },
                            Err(e) => {
                                failures.push(format!("'{}': {}", name, e));
                                if first_error.is_none() {
                                    first_error = Some(e);
                                }
                            }
                        }
                    }

                    match first_error {
                        Some(e) => {
                            error!("Translation to {} failed for {} document(s): {}",
                                   language, failures.len(), failures.join("; "));
                            (language, Err(SyncError::from(e)))
                        },
                        None => (language, Ok(documents)),
                    }
                }
            })
            .buffer_unordered(self.max_concurrent_requests)
            .collect::<Vec<_>>()
            .await;

        progress_bar.finish_and_clear();

        let mut translations = TranslationSet::new();
        let mut first_error: Option<SyncError> = None;

        for (language, result) in results {
            match result {
                Ok(documents) => {
                    translations.insert(language, documents);
                },
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        if let Some(error) = first_error {
            return Err(error);
        }

        Ok(translations)
    }
}
