/*!
 * Tests for document flattening and dotted-path manipulation
 */

use serde_json::json;
use locsync::sync::document::{
    count_leaves, flatten, insert_path, join_path, remove_path, unflatten,
};
use crate::common;

/// Test that nested mappings flatten into dotted leaf paths
#[test]
fn test_flatten_withNestedDocument_shouldProduceDottedPaths() {
    let document = common::as_document(json!({
        "greeting": "Hello",
        "menu": {
            "file": { "open": "Open", "close": "Close" }
        }
    }));

    let flat = flatten(&document);

    assert_eq!(flat.len(), 3);
    assert_eq!(flat["greeting"], json!("Hello"));
    assert_eq!(flat["menu.file.open"], json!("Open"));
    assert_eq!(flat["menu.file.close"], json!("Close"));
}

/// Test that arrays are leaves and never get flattened per index
#[test]
fn test_flatten_withArrayValue_shouldKeepArrayAtomic() {
    let document = common::as_document(json!({
        "weekdays": ["Mon", "Tue", "Wed"]
    }));

    let flat = flatten(&document);

    assert_eq!(flat.len(), 1);
    assert_eq!(flat["weekdays"], json!(["Mon", "Tue", "Wed"]));
}

/// Test that an empty mapping is itself a leaf
#[test]
fn test_flatten_withEmptyMapping_shouldTreatItAsLeaf() {
    let document = common::as_document(json!({
        "placeholder": {},
        "value": 42
    }));

    let flat = flatten(&document);

    assert_eq!(flat.len(), 2);
    assert_eq!(flat["placeholder"], json!({}));
    assert_eq!(flat["value"], json!(42));
}

/// Test that null, numbers and booleans survive flattening untouched
#[test]
fn test_flatten_withScalarVariety_shouldPreserveValues() {
    let document = common::as_document(json!({
        "count": 3,
        "enabled": true,
        "subtitle": null
    }));

    let flat = flatten(&document);

    assert_eq!(flat["count"], json!(3));
    assert_eq!(flat["enabled"], json!(true));
    assert_eq!(flat["subtitle"], json!(null));
}

/// Test that unflatten is the inverse of flatten
#[test]
fn test_unflatten_withFlattenedDocument_shouldRestoreOriginal() {
    let document = common::as_document(json!({
        "a": { "b": { "c": "deep" } },
        "list": [1, 2, 3],
        "top": "level",
        "empty": {}
    }));

    let rebuilt = unflatten(&flatten(&document));

    assert_eq!(rebuilt, document);
}

/// Test that insert_path materializes intermediate mappings
#[test]
fn test_insert_path_withDeepPath_shouldCreateIntermediateMappings() {
    let mut document = common::as_document(json!({}));

    insert_path(&mut document, "menu.file.open", json!("Open"));

    assert_eq!(document["menu"]["file"]["open"], json!("Open"));
}

/// Test that inserting below a scalar replaces the scalar with a mapping
#[test]
fn test_insert_path_withScalarIntermediate_shouldReplaceWithMapping() {
    let mut document = common::as_document(json!({ "menu": "flat" }));

    insert_path(&mut document, "menu.open", json!("Open"));

    assert_eq!(document["menu"]["open"], json!("Open"));
}

/// Test that removing a leaf prunes mappings emptied by the removal
#[test]
fn test_remove_path_withLastLeafOfMapping_shouldPruneEmptyAncestors() {
    let mut document = common::as_document(json!({
        "menu": { "file": { "open": "Open" } },
        "greeting": "Hello"
    }));

    assert!(remove_path(&mut document, "menu.file.open"));

    assert!(!document.contains_key("menu"));
    assert_eq!(document["greeting"], json!("Hello"));
}

/// Test that removing one of several leaves keeps the rest
#[test]
fn test_remove_path_withSiblingLeaves_shouldKeepSiblings() {
    let mut document = common::as_document(json!({
        "menu": { "open": "Open", "close": "Close" }
    }));

    assert!(remove_path(&mut document, "menu.open"));

    assert!(!document["menu"].as_object().unwrap().contains_key("open"));
    assert_eq!(document["menu"]["close"], json!("Close"));
}

/// Test that a path addressing a non-empty mapping is refused
#[test]
fn test_remove_path_withTerminalMapping_shouldBeNoOp() {
    let mut document = common::as_document(json!({
        "menu": { "open": "Open" }
    }));

    assert!(!remove_path(&mut document, "menu"));
    assert_eq!(document["menu"]["open"], json!("Open"));
}

/// Test that removing a missing path reports false and changes nothing
#[test]
fn test_remove_path_withMissingPath_shouldBeNoOp() {
    let mut document = common::as_document(json!({ "greeting": "Hello" }));
    let before = document.clone();

    assert!(!remove_path(&mut document, "menu.open"));
    assert!(!remove_path(&mut document, "greeting.deeper"));

    assert_eq!(document, before);
}

/// Test that an empty mapping can be removed as a leaf
#[test]
fn test_remove_path_withEmptyMappingLeaf_shouldRemoveIt() {
    let mut document = common::as_document(json!({ "placeholder": {} }));

    assert!(remove_path(&mut document, "placeholder"));
    assert!(document.is_empty());
}

/// Test that count_leaves agrees with the size of the flat view
#[test]
fn test_count_leaves_shouldMatchFlattenedSize() {
    let document = common::as_document(json!({
        "a": { "b": "x", "c": { "d": "y" } },
        "list": [1, 2],
        "empty": {}
    }));

    assert_eq!(count_leaves(&document), flatten(&document).len());
    assert_eq!(count_leaves(&document), 4);
}

/// Test path joining with and without a prefix
#[test]
fn test_join_path_withEmptyPrefix_shouldReturnBareKey() {
    assert_eq!(join_path("", "greeting"), "greeting");
    assert_eq!(join_path("menu.file", "open"), "menu.file.open");
}
