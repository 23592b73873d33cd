/*!
 * Change detection between the previous snapshot and the current source tree.
 *
 * Both sides of the comparison are flattened first, so detection is set
 * algebra over dotted leaf paths: paths only in the current tree are new,
 * paths only in the snapshot are deleted, and shared paths whose values
 * differ under strict equality are modified. A value changing type counts
 * as a modification like any other.
 */

use std::collections::BTreeMap;

use log::debug;
use serde_json::Value;

use crate::sync::document::{flatten, Document, DocumentSet};

// @module: Snapshot vs current tree change detection

/// One leaf path whose value changed between two revisions of a document
#[derive(Debug, Clone, PartialEq)]
pub struct ModifiedKey {
    /// Dotted path of the changed leaf
    pub path: String,

    /// Value recorded in the snapshot
    pub previous: Value,

    /// Value in the current source tree
    pub current: Value,
}

/// Classification of one document's leaf paths relative to the snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    /// Paths present only in the current tree, with their values
    pub new_keys: Vec<(String, Value)>,

    /// Paths present on both sides with differing values
    pub modified_keys: Vec<ModifiedKey>,

    /// Paths present only in the snapshot
    pub deleted_keys: Vec<String>,
}

impl ChangeSet {
    /// Whether this change set carries no work at all
    pub fn is_empty(&self) -> bool {
        self.new_keys.is_empty() && self.modified_keys.is_empty() && self.deleted_keys.is_empty()
    }

    /// Whether any path needs translating (deletions alone do not)
    pub fn needs_translation(&self) -> bool {
        !self.new_keys.is_empty() || !self.modified_keys.is_empty()
    }
}

/// Plan for one synchronization run across the whole document tree
#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    /// Non-empty change sets, keyed by document name
    pub changes: BTreeMap<String, ChangeSet>,

    /// Documents absent from the snapshot entirely, including empty ones
    pub new_documents: Vec<String>,
}

impl SyncPlan {
    /// Whether the run has anything to do.
    ///
    /// A wholly new document with no keys yet still counts: the snapshot
    /// must learn about it even though nothing gets translated.
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty() || !self.new_documents.is_empty()
    }

    /// Total count of new leaf paths across all documents
    pub fn total_new(&self) -> usize {
        self.changes.values().map(|c| c.new_keys.len()).sum()
    }

    /// Total count of modified leaf paths across all documents
    pub fn total_modified(&self) -> usize {
        self.changes.values().map(|c| c.modified_keys.len()).sum()
    }

    /// Total count of deleted leaf paths across all documents
    pub fn total_deleted(&self) -> usize {
        self.changes.values().map(|c| c.deleted_keys.len()).sum()
    }
}

/// Classify every leaf path of one document against its snapshot revision.
///
/// With no previous revision every leaf of the current document is new.
/// Comparing a document against an identical revision yields an empty
/// change set. A mapping collapsing to a scalar (or the reverse) falls out
/// of the path algebra on its own: the old sub-leaves are deleted and the
/// new leaf is new, because the two flat path sets are disjoint.
pub fn detect(previous: Option<&Document>, current: &Document) -> ChangeSet {
    let current_flat = flatten(current);

    let Some(previous) = previous else {
        return ChangeSet {
            new_keys: current_flat.into_iter().collect(),
            modified_keys: Vec::new(),
            deleted_keys: Vec::new(),
        };
    };
    let previous_flat = flatten(previous);

    let mut changes = ChangeSet::default();
    for (path, value) in &current_flat {
        match previous_flat.get(path) {
            None => changes.new_keys.push((path.clone(), value.clone())),
            Some(previous_value) if previous_value != value => {
                changes.modified_keys.push(ModifiedKey {
                    path: path.clone(),
                    previous: previous_value.clone(),
                    current: value.clone(),
                });
            }
            Some(_) => {}
        }
    }
    for path in previous_flat.keys() {
        if !current_flat.contains_key(path) {
            changes.deleted_keys.push(path.clone());
        }
    }

    changes
}

/// Build the run plan by detecting changes across every document name on
/// either side of the comparison.
///
/// A document present only in the snapshot yields a deletions-only change
/// set covering all of its former leaves.
pub fn detect_all(snapshot: &DocumentSet, current: &DocumentSet) -> SyncPlan {
    let mut plan = SyncPlan::default();

    for (name, document) in current {
        let previous = snapshot.get(name);
        if previous.is_none() {
            plan.new_documents.push(name.clone());
        }
        let changes = detect(previous, document);
        if !changes.is_empty() {
            plan.changes.insert(name.clone(), changes);
        }
    }

    let empty = Document::new();
    for (name, previous) in snapshot {
        if !current.contains_key(name) {
            let changes = detect(Some(previous), &empty);
            if !changes.is_empty() {
                plan.changes.insert(name.clone(), changes);
            }
        }
    }

    debug!("Detected {} new, {} modified, {} deleted keys across {} changed documents",
           plan.total_new(), plan.total_modified(), plan.total_deleted(), plan.changes.len());

    plan
}
