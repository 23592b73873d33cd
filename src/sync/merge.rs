/*!
 * Merging translated content into the existing per-language trees.
 *
 * The merge never mutates its inputs: it starts from a full copy of the
 * existing translations, folds the newly translated sparse documents in,
 * and finally mirrors the source-side deletions into every language. Writes
 * happen elsewhere, only after the complete merged result exists.
 */

use crate::sync::detect::SyncPlan;
use crate::sync::document::{remove_path, Document, TranslationSet};
use serde_json::Value;

// @module: Deep merge of translated deltas into existing trees

/// Merge newly translated documents into the existing translation trees and
/// apply the plan's deletions across every language.
///
/// Untouched paths keep their existing values byte for byte. Where the new
/// content overlaps existing content, the new value wins unless both sides
/// are mappings, which merge recursively. Deleted paths end up absent from
/// every language; deleting a path a language never had is a no-op.
pub fn merge_translations(
    existing: &TranslationSet,
    newly_translated: &TranslationSet,
    plan: &SyncPlan,
) -> TranslationSet {
    let mut merged = existing.clone();

    for (language, documents) in newly_translated {
        let target = merged.entry(language.clone()).or_default();
        for (name, translated) in documents {
            match target.get_mut(name) {
                Some(base) => deep_merge_document(base, translated),
                None => {
                    target.insert(name.clone(), translated.clone());
                }
            }
        }
    }

    for (name, changes) in &plan.changes {
        for path in &changes.deleted_keys {
            for documents in merged.values_mut() {
                if let Some(document) = documents.get_mut(name) {
                    remove_path(document, path);
                }
            }
        }
    }

    merged
}

/// Fold an incoming document into a base document key by key.
///
/// Two mappings merge recursively; any other pairing is resolved by the
/// incoming value overwriting the base value.
pub fn deep_merge_document(base: &mut Document, incoming: &Document) {
    for (key, incoming_value) in incoming {
        match (base.get_mut(key), incoming_value) {
            (Some(Value::Object(base_children)), Value::Object(incoming_children)) => {
                deep_merge_document(base_children, incoming_children);
            }
            _ => {
                base.insert(key.clone(), incoming_value.clone());
            }
        }
    }
}
