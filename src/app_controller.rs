use anyhow::Result;
use chrono::Utc;
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::time::Instant;

use crate::app_config::Config;
use crate::errors::SyncError;
use crate::file_utils::FileManager;
use crate::history::{HistoryStore, RunRecord, RunStatus};
use crate::sync::snapshot::tree_digest;
use crate::sync::{DocumentSet, SnapshotStore, SyncPlan, TranslationSet, delta, detect, merge};
use crate::translation::{BatchTranslator, TranslationService, Translator};

// @module: Application controller for the locale sync workflow

/// Summary of a completed sync run
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Number of source documents scanned
    pub source_documents: usize,
    /// Keys added since the previous run
    pub new_keys: usize,
    /// Keys whose values changed since the previous run
    pub modified_keys: usize,
    /// Keys removed since the previous run
    pub deleted_keys: usize,
    /// Documents absent from the previous snapshot
    pub new_documents: usize,
    /// Target languages the run covered
    pub languages: Vec<String>,
    /// Translation files written
    pub files_written: usize,
    /// Translation files removed
    pub files_removed: usize,
    /// True when nothing had changed and nothing was written
    pub up_to_date: bool,
    /// Digest of the source tree at the end of the run
    pub tree_digest: String,
}

/// Main application controller for locale synchronization
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self { config })
    }

    /// Check if the controller is properly initialized with configuration
    pub fn is_initialized(&self) -> bool {
        !self.config.source_language.is_empty() && !self.config.target_languages.is_empty()
    }

    /// Run the sync workflow with the configured provider
    pub async fn run(&self, force_full: bool) -> Result<()> {
        info!("🚀 locsync: {} - {}",
            self.config.translation.provider.display_name(),
            self.config.translation.get_model());

        // Warm the provider connection in the background, real failures will
        // surface on the translation requests themselves
        let config_clone = self.config.translation.clone();
        tokio::spawn(async move {
            if let Ok(service) = TranslationService::new(config_clone) {
                if let Err(e) = service.test_connection().await {
                    warn!("Provider connection check failed: {}", e);
                }
            }
        });

        let service = TranslationService::new(self.config.translation.clone())?;
        let translator = BatchTranslator::new(service);

        let report = self.run_with_translator(&translator, force_full).await?;

        if !report.up_to_date {
            let usage = translator.usage();
            if usage.total_tokens > 0 {
                info!("🔢 {}", usage.summary());
            }
        }

        Ok(())
    }

    /// Run the sync workflow with a caller-supplied translator.
    ///
    /// This is the seam integration tests use to drive the full pipeline with
    /// a mock translator.
    pub async fn run_with_translator(
        &self,
        translator: &dyn Translator,
        force_full: bool,
    ) -> Result<SyncReport, SyncError> {
        let started_at = Utc::now();
        let result = self.sync_once(translator, force_full).await;
        self.record_history(started_at.to_rfc3339(), &result).await;
        result
    }

    /// Compute the change plan without translating or writing anything
    pub fn status(&self) -> Result<SyncPlan, SyncError> {
        let source_dir = self.config.source_dir();
        let current = FileManager::load_documents(&source_dir)
            .map_err(|e| SyncError::SourceUnreadable(e.to_string()))?;

        let snapshot_store = SnapshotStore::new(&self.config.snapshot_path);
        let previous = snapshot_store.load_or_empty();

        Ok(detect::detect_all(&previous, &current))
    }

    /// List the most recent recorded runs, newest first
    pub async fn recent_history(&self, limit: usize) -> Result<Vec<RunRecord>> {
        let store = self.open_history_store()?;
        store.recent_runs(limit).await
    }

    /// One pass of the sync pipeline. The write phase comes last, a failure
    /// anywhere before it leaves the translation tree untouched.
    async fn sync_once(
        &self,
        translator: &dyn Translator,
        force_full: bool,
    ) -> Result<SyncReport, SyncError> {
        let start_time = Instant::now();
        let source_dir = self.config.source_dir();

        // Source documents are the authority, refuse to continue without them
        let current = FileManager::load_documents(&source_dir)
            .map_err(|e| SyncError::SourceUnreadable(e.to_string()))?;

        info!("Loaded {} source document(s) from {:?}", current.len(), source_dir);

        let snapshot_store = SnapshotStore::new(&self.config.snapshot_path);
        let previous = if force_full {
            info!("Full sync forced, ignoring previous snapshot");
            DocumentSet::new()
        } else {
            snapshot_store.load_or_empty()
        };

        let plan = detect::detect_all(&previous, &current);
        let digest = tree_digest(&current);
        let target_languages = self.config.target_languages.clone();

        if !plan.has_changes() {
            info!("Already up to date, nothing to sync");
            return Ok(SyncReport {
                source_documents: current.len(),
                new_keys: 0,
                modified_keys: 0,
                deleted_keys: 0,
                new_documents: 0,
                languages: target_languages,
                files_written: 0,
                files_removed: 0,
                up_to_date: true,
                tree_digest: digest,
            });
        }

        info!(
            "Detected {} new, {} modified, {} deleted key(s) across {} document(s)",
            plan.total_new(),
            plan.total_modified(),
            plan.total_deleted(),
            plan.changes.len()
        );

        let delta = delta::build_delta(&plan);

        // A deletion-only run needs no provider round trip
        let newly_translated = if delta.is_empty() {
            debug!("Delta holds no keys, skipping translation");
            TranslationSet::new()
        } else {
            info!(
                "Translating {} document(s) into {} language(s)",
                delta.len(),
                target_languages.len()
            );

            let translations = translator
                .translate(&delta, &self.config.source_language, &target_languages)
                .await?;

            // Every requested language must be present before anything is written
            for language in &target_languages {
                if !translations.contains_key(language) {
                    return Err(SyncError::MissingLanguage(language.clone()));
                }
            }

            translations
        };

        let mut existing = TranslationSet::new();
        for language in &target_languages {
            let language_dir = self.config.language_dir(language);
            let mut documents = FileManager::load_documents_lenient(&language_dir);
            // An empty document on disk is a placeholder, not a translation
            documents.retain(|_, document| !document.is_empty());
            existing.insert(language.clone(), documents);
        }

        let merged = merge::merge_translations(&existing, &newly_translated, &plan);

        // Only documents named by the plan can differ from what is on disk
        let affected: BTreeSet<&str> = plan
            .changes
            .keys()
            .map(String::as_str)
            .chain(plan.new_documents.iter().map(String::as_str))
            .collect();

        let mut files_written = 0usize;
        let mut files_removed = 0usize;

        for (language, documents) in &merged {
            let language_dir = self.config.language_dir(language);

            for (name, document) in documents {
                if !affected.contains(name.as_str()) {
                    continue;
                }

                let path = FileManager::document_path(&language_dir, name);

                if document.is_empty() {
                    let removed = FileManager::remove_file_if_exists(&path)
                        .map_err(|e| SyncError::File(e.to_string()))?;
                    if removed {
                        debug!("Removed emptied document {:?}", path);
                        files_removed += 1;
                    }
                } else {
                    FileManager::write_document(&path, document)
                        .map_err(|e| SyncError::File(e.to_string()))?;
                    files_written += 1;
                }
            }
        }

        // New baseline; losing it costs a re-translation, not data
        if let Err(e) = snapshot_store.save(&current) {
            warn!("Failed to save snapshot, next run will re-detect everything: {}", e);
        }

        info!(
            "Sync complete in {}: {} file(s) written, {} removed across {} language(s)",
            Self::format_duration(start_time.elapsed()),
            files_written,
            files_removed,
            target_languages.len()
        );

        Ok(SyncReport {
            source_documents: current.len(),
            new_keys: plan.total_new(),
            modified_keys: plan.total_modified(),
            deleted_keys: plan.total_deleted(),
            new_documents: plan.new_documents.len(),
            languages: target_languages,
            files_written,
            files_removed,
            up_to_date: false,
            tree_digest: digest,
        })
    }

    /// Record the outcome of a run in the history ledger, best effort
    async fn record_history(&self, started_at: String, result: &Result<SyncReport, SyncError>) {
        if !self.config.history.enabled {
            return;
        }

        let store = match self.open_history_store() {
            Ok(store) => store,
            Err(e) => {
                warn!("History unavailable for this run: {}", e);
                return;
            }
        };

        let record = match result {
            Ok(report) => RunRecord {
                id: RunRecord::new_id(),
                started_at,
                finished_at: Utc::now().to_rfc3339(),
                status: if report.up_to_date { RunStatus::UpToDate } else { RunStatus::Synced },
                source_documents: report.source_documents as i64,
                new_keys: report.new_keys as i64,
                modified_keys: report.modified_keys as i64,
                deleted_keys: report.deleted_keys as i64,
                languages: report.languages.join(","),
                provider: self.config.translation.provider.to_string(),
                model: self.config.translation.get_model(),
                tree_digest: report.tree_digest.clone(),
            },
            Err(_) => RunRecord {
                id: RunRecord::new_id(),
                started_at,
                finished_at: Utc::now().to_rfc3339(),
                status: RunStatus::Failed,
                source_documents: 0,
                new_keys: 0,
                modified_keys: 0,
                deleted_keys: 0,
                languages: self.config.target_languages.join(","),
                provider: self.config.translation.provider.to_string(),
                model: self.config.translation.get_model(),
                tree_digest: String::new(),
            },
        };

        if let Err(e) = store.record_run(record).await {
            warn!("Failed to record run in history: {}", e);
        }
    }

    fn open_history_store(&self) -> Result<HistoryStore> {
        match &self.config.history.database_path {
            Some(path) => HistoryStore::new(path),
            None => HistoryStore::new_default(),
        }
    }

    // Format duration in a human-readable format (HH:MM:SS)
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
