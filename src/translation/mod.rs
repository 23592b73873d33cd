/*!
 * Translation service for locale documents using AI providers.
 *
 * This module contains the core functionality for translating JSON locale
 * documents using various AI providers. It is split into several submodules:
 *
 * - `core`: Core translation functionality and service definition
 * - `batch`: Batch processing of translations across target languages
 * - `mock`: Mock translator for exercising the sync pipeline in tests
 */

use async_trait::async_trait;

use crate::errors::SyncError;
use crate::sync::{DocumentSet, TranslationSet};

// Re-export main types for easier usage
pub use self::batch::BatchTranslator;
pub use self::core::{TokenUsageStats, TranslationService};
pub use self::mock::MockTranslator;

// Submodules
pub mod batch;
pub mod core;
pub mod mock;

/// Produces translated document trees for a set of target languages
///
/// This trait is the seam between the sync pipeline and the AI providers,
/// allowing the pipeline to be driven by a mock in tests.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate every document in the delta into every target language
    ///
    /// # Arguments
    /// * `delta` - Documents holding only the keys that need translation
    /// * `source_language` - Language code of the delta documents
    /// * `target_languages` - Language codes to translate into
    ///
    /// # Returns
    /// * `Result<TranslationSet, SyncError>` - One document set per language, or an error
    async fn translate(
        &self,
        delta: &DocumentSet,
        source_language: &str,
        target_languages: &[String],
    ) -> Result<TranslationSet, SyncError>;
}
