/*!
 * Tests for sparse delta assembly
 */

use serde_json::json;
use locsync::sync::delta::build_delta;
use locsync::sync::detect::detect_all;
use locsync::sync::DocumentSet;
use crate::common;

fn document_set(entries: &[(&str, serde_json::Value)]) -> DocumentSet {
    entries
        .iter()
        .map(|(name, value)| (name.to_string(), common::as_document(value.clone())))
        .collect()
}

/// Test that new and modified keys both travel in the delta
#[test]
fn test_build_delta_withNewAndModifiedKeys_shouldContainBoth() {
    let snapshot = document_set(&[("common.json", json!({ "greeting": "Hello", "keep": "Same" }))]);
    let current = document_set(&[(
        "common.json",
        json!({ "greeting": "Hello there", "keep": "Same", "farewell": "Bye" }),
    )]);

    let delta = build_delta(&detect_all(&snapshot, &current));

    let document = &delta["common.json"];
    assert_eq!(document.len(), 2);
    assert_eq!(document["greeting"], json!("Hello there"));
    assert_eq!(document["farewell"], json!("Bye"));
    assert!(!document.contains_key("keep"));
}

/// Test that a deletions-only document never enters the delta
#[test]
fn test_build_delta_withDeletionsOnly_shouldOmitDocument() {
    let snapshot = document_set(&[("common.json", json!({ "greeting": "Hello", "old": "x" }))]);
    let current = document_set(&[("common.json", json!({ "greeting": "Hello" }))]);

    let delta = build_delta(&detect_all(&snapshot, &current));

    assert!(delta.is_empty());
}

/// Test that a wholly new document comes out complete
#[test]
fn test_build_delta_withWhollyNewDocument_shouldContainAllItsLeaves() {
    let snapshot = DocumentSet::new();
    let current = document_set(&[(
        "menu.json",
        json!({ "file": { "open": "Open", "close": "Close" } }),
    )]);

    let delta = build_delta(&detect_all(&snapshot, &current));

    assert_eq!(delta["menu.json"], current["menu.json"]);
}

/// Test that changed nested keys come back in nested form
#[test]
fn test_build_delta_withNestedChange_shouldRebuildNestedStructure() {
    let snapshot = document_set(&[(
        "menu.json",
        json!({ "file": { "open": "Open", "close": "Close" } }),
    )]);
    let current = document_set(&[(
        "menu.json",
        json!({ "file": { "open": "Open file", "close": "Close" } }),
    )]);

    let delta = build_delta(&detect_all(&snapshot, &current));

    let document = &delta["menu.json"];
    assert_eq!(document["file"]["open"], json!("Open file"));
    assert!(!document["file"].as_object().unwrap().contains_key("close"));
}

/// Test that an empty new document contributes nothing to the delta
#[test]
fn test_build_delta_withEmptyNewDocument_shouldStayAbsent() {
    let snapshot = DocumentSet::new();
    let current = document_set(&[("empty.json", json!({}))]);

    let plan = detect_all(&snapshot, &current);
    let delta = build_delta(&plan);

    assert!(plan.has_changes());
    assert!(delta.is_empty());
}

/// Test that untouched documents stay out of the delta entirely
#[test]
fn test_build_delta_withUnchangedSiblingDocument_shouldOnlyCarryChangedOne() {
    let snapshot = document_set(&[
        ("a.json", json!({ "x": "1" })),
        ("b.json", json!({ "y": "2" })),
    ]);
    let mut current = snapshot.clone();
    current.insert("b.json".to_string(), common::as_document(json!({ "y": "changed" })));

    let delta = build_delta(&detect_all(&snapshot, &current));

    assert_eq!(delta.len(), 1);
    assert!(delta.contains_key("b.json"));
}
