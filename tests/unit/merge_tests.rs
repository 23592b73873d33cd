/*!
 * Tests for merging translated deltas and mirroring deletions
 */

use serde_json::json;
use locsync::sync::detect::{ChangeSet, SyncPlan};
use locsync::sync::merge::{deep_merge_document, merge_translations};
use locsync::sync::{DocumentSet, TranslationSet};
use crate::common;

fn document_set(entries: &[(&str, serde_json::Value)]) -> DocumentSet {
    entries
        .iter()
        .map(|(name, value)| (name.to_string(), common::as_document(value.clone())))
        .collect()
}

fn language_tree(language: &str, entries: &[(&str, serde_json::Value)]) -> TranslationSet {
    let mut set = TranslationSet::new();
    set.insert(language.to_string(), document_set(entries));
    set
}

fn deletion_plan(document: &str, paths: &[&str]) -> SyncPlan {
    let mut plan = SyncPlan::default();
    plan.changes.insert(
        document.to_string(),
        ChangeSet {
            deleted_keys: paths.iter().map(|p| p.to_string()).collect(),
            ..ChangeSet::default()
        },
    );
    plan
}

/// Test that merging nothing returns the existing trees unchanged
#[test]
fn test_merge_withEmptyDelta_shouldReturnExistingUnchanged() {
    let existing = language_tree("fr", &[("common.json", json!({ "greeting": "Bonjour" }))]);

    let merged = merge_translations(&existing, &TranslationSet::new(), &SyncPlan::default());

    assert_eq!(merged, existing);
}

/// Test that fresh translations overlay existing content without touching
/// unrelated keys
#[test]
fn test_merge_withNewTranslations_shouldPreserveUntouchedKeys() {
    let existing = language_tree(
        "fr",
        &[("common.json", json!({ "greeting": "Bonjour", "farewell": "Au revoir" }))],
    );
    let incoming = language_tree(
        "fr",
        &[("common.json", json!({ "greeting": "Salut" }))],
    );

    let merged = merge_translations(&existing, &incoming, &SyncPlan::default());

    let document = &merged["fr"]["common.json"];
    assert_eq!(document["greeting"], json!("Salut"));
    assert_eq!(document["farewell"], json!("Au revoir"));
}

/// Test that overlapping mappings merge recursively
#[test]
fn test_merge_withOverlappingMappings_shouldMergeRecursively() {
    let existing = language_tree(
        "fr",
        &[("menu.json", json!({ "file": { "open": "Ouvrir", "close": "Fermer" } }))],
    );
    let incoming = language_tree(
        "fr",
        &[("menu.json", json!({ "file": { "open": "Ouvrir un fichier" } }))],
    );

    let merged = merge_translations(&existing, &incoming, &SyncPlan::default());

    let file = &merged["fr"]["menu.json"]["file"];
    assert_eq!(file["open"], json!("Ouvrir un fichier"));
    assert_eq!(file["close"], json!("Fermer"));
}

/// Test that deletions are mirrored into every language
#[test]
fn test_merge_withDeletions_shouldRemoveFromEveryLanguage() {
    let mut existing = language_tree(
        "fr",
        &[("common.json", json!({ "greeting": "Bonjour", "old": "Ancien" }))],
    );
    existing.insert(
        "de".to_string(),
        document_set(&[("common.json", json!({ "greeting": "Hallo", "old": "Alt" }))]),
    );

    let plan = deletion_plan("common.json", &["old"]);
    let merged = merge_translations(&existing, &TranslationSet::new(), &plan);

    assert!(!merged["fr"]["common.json"].contains_key("old"));
    assert!(!merged["de"]["common.json"].contains_key("old"));
    assert_eq!(merged["fr"]["common.json"]["greeting"], json!("Bonjour"));
}

/// Test that deleting a path a language never had is a no-op
#[test]
fn test_merge_withDeletionOfAbsentPath_shouldBeNoOp() {
    let existing = language_tree("fr", &[("common.json", json!({ "greeting": "Bonjour" }))]);

    let plan = deletion_plan("common.json", &["never.there"]);
    let merged = merge_translations(&existing, &TranslationSet::new(), &plan);

    assert_eq!(merged, existing);
}

/// Test that deleting every leaf leaves an empty document behind
#[test]
fn test_merge_withAllLeavesDeleted_shouldLeaveEmptyDocument() {
    let existing = language_tree("fr", &[("extra.json", json!({ "a": "1", "b": "2" }))]);

    let plan = deletion_plan("extra.json", &["a", "b"]);
    let merged = merge_translations(&existing, &TranslationSet::new(), &plan);

    assert!(merged["fr"]["extra.json"].is_empty());
}

/// Test that a document new to a language is inserted whole
#[test]
fn test_merge_withNewDocument_shouldInsertItWhole() {
    let existing = language_tree("fr", &[("common.json", json!({ "greeting": "Bonjour" }))]);
    let incoming = language_tree("fr", &[("menu.json", json!({ "open": "Ouvrir" }))]);

    let merged = merge_translations(&existing, &incoming, &SyncPlan::default());

    assert_eq!(merged["fr"].len(), 2);
    assert_eq!(merged["fr"]["menu.json"]["open"], json!("Ouvrir"));
}

/// Test that merging never mutates its inputs
#[test]
fn test_merge_shouldNotMutateInputs() {
    let existing = language_tree("fr", &[("common.json", json!({ "greeting": "Bonjour", "old": "x" }))]);
    let incoming = language_tree("fr", &[("common.json", json!({ "greeting": "Salut" }))]);
    let existing_before = existing.clone();
    let incoming_before = incoming.clone();

    let plan = deletion_plan("common.json", &["old"]);
    let _ = merge_translations(&existing, &incoming, &plan);

    assert_eq!(existing, existing_before);
    assert_eq!(incoming, incoming_before);
}

/// Test deep merge conflict resolution outside the full pipeline
#[test]
fn test_deep_merge_document_withScalarConflict_shouldPreferIncoming() {
    let mut base = common::as_document(json!({
        "title": "Old",
        "menu": { "open": "Open" }
    }));
    let incoming = common::as_document(json!({
        "title": "New",
        "menu": "collapsed"
    }));

    deep_merge_document(&mut base, &incoming);

    assert_eq!(base["title"], json!("New"));
    assert_eq!(base["menu"], json!("collapsed"));
}
