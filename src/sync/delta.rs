/*!
 * Delta assembly: the minimal sparse documents that need translating.
 *
 * The delta contains only new and modified leaf paths, rebuilt into nested
 * form so a provider sees a regular document. Deletions never travel to the
 * provider; the merger mirrors them locally.
 */

use crate::sync::detect::SyncPlan;
use crate::sync::document::{unflatten, DocumentSet, FlatMap};

// @module: Sparse delta document assembly

/// Build the sparse per-document delta for a run plan.
///
/// Every document with at least one new or modified leaf contributes a
/// sparse document holding exactly those leaves with their current values.
/// Documents whose change set is deletions-only are left out, so an empty
/// document is never sent for translation. A wholly new document comes out
/// complete, since every one of its leaves is new.
pub fn build_delta(plan: &SyncPlan) -> DocumentSet {
    let mut delta = DocumentSet::new();

    for (name, changes) in &plan.changes {
        if !changes.needs_translation() {
            continue;
        }

        let mut flat = FlatMap::new();
        for (path, value) in &changes.new_keys {
            flat.insert(path.clone(), value.clone());
        }
        for modified in &changes.modified_keys {
            flat.insert(modified.path.clone(), modified.current.clone());
        }

        delta.insert(name.clone(), unflatten(&flat));
    }

    delta
}
