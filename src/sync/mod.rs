/*!
 * Incremental synchronization engine for locale bundles.
 *
 * This module contains the core diff/merge machinery that keeps translated
 * locale trees in step with the base-language tree. It is split into several
 * submodules:
 *
 * - `document`: Document model, flattening and path manipulation
 * - `detect`: Change detection between a snapshot and the current tree
 * - `delta`: Assembly of the minimal set of entries needing translation
 * - `merge`: Deep merge of translated content into existing trees
 * - `snapshot`: Persistence of the previous source tree state
 */

// Re-export main types for easier usage
pub use self::detect::{ChangeSet, ModifiedKey, SyncPlan};
pub use self::document::{Document, DocumentSet, FlatMap, TranslationSet};
pub use self::snapshot::SnapshotStore;

// Submodules
pub mod delta;
pub mod detect;
pub mod document;
pub mod merge;
pub mod snapshot;
