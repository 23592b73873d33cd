/*!
 * Tests for snapshot persistence and corruption recovery
 */

use std::fs;
use anyhow::Result;
use serde_json::json;
use locsync::errors::SnapshotError;
use locsync::sync::snapshot::{tree_digest, SnapshotStore};
use locsync::sync::DocumentSet;
use crate::common;

fn sample_tree() -> DocumentSet {
    let mut documents = DocumentSet::new();
    documents.insert(
        "common.json".to_string(),
        common::as_document(json!({ "greeting": "Hello", "menu": { "open": "Open" } })),
    );
    documents
}

/// Test that loading a missing snapshot reports a clean first run
#[test]
fn test_load_withNoFile_shouldReturnNone() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let store = SnapshotStore::new(temp_dir.path().join("snapshot.json"));

    assert!(store.load()?.is_none());

    Ok(())
}

/// Test that a saved tree loads back identically
#[test]
fn test_saveAndLoad_shouldRoundTripDocuments() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let store = SnapshotStore::new(temp_dir.path().join("snapshot.json"));
    let tree = sample_tree();

    store.save(&tree)?;
    let loaded = store.load()?.expect("Snapshot should exist after save");

    assert_eq!(loaded, tree);
    Ok(())
}

/// Test that saving creates missing parent directories
#[test]
fn test_save_withMissingParentDirs_shouldCreateThem() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join(".locsync").join("nested").join("snapshot.json");
    let store = SnapshotStore::new(&path);

    store.save(&sample_tree())?;

    assert!(path.is_file());
    Ok(())
}

/// Test that unparseable snapshot content is reported as corrupt
#[test]
fn test_load_withBrokenJson_shouldReportCorrupt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("snapshot.json");
    fs::write(&path, "{ definitely not json")?;
    let store = SnapshotStore::new(&path);

    let error = store.load().expect_err("Broken snapshot must not load");
    assert!(matches!(error, SnapshotError::Corrupt(_)));

    Ok(())
}

/// Test that a tampered snapshot fails its digest check
#[test]
fn test_load_withTamperedContent_shouldReportCorrupt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("snapshot.json");
    let store = SnapshotStore::new(&path);
    store.save(&sample_tree())?;

    let raw = fs::read_to_string(&path)?;
    fs::write(&path, raw.replace("Hello", "Tampered"))?;

    let error = store.load().expect_err("Tampered snapshot must not load");
    assert!(matches!(error, SnapshotError::Corrupt(_)));

    Ok(())
}

/// Test that load_or_empty recovers from corruption with an empty baseline
#[test]
fn test_load_or_empty_withCorruptFile_shouldRecoverEmpty() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("snapshot.json");
    fs::write(&path, "garbage")?;
    let store = SnapshotStore::new(&path);

    assert!(store.load_or_empty().is_empty());

    Ok(())
}

/// Test that saving twice replaces the snapshot rather than appending
#[test]
fn test_save_calledTwice_shouldReplacePreviousState() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let store = SnapshotStore::new(temp_dir.path().join("snapshot.json"));

    store.save(&sample_tree())?;
    let mut updated = sample_tree();
    updated.insert("extra.json".to_string(), common::as_document(json!({ "a": "1" })));
    store.save(&updated)?;

    let loaded = store.load()?.expect("Snapshot should exist");
    assert_eq!(loaded.len(), 2);
    assert!(loaded.contains_key("extra.json"));

    Ok(())
}

/// Test digest stability and sensitivity
#[test]
fn test_tree_digest_shouldBeStableAndContentSensitive() {
    let tree = sample_tree();

    assert_eq!(tree_digest(&tree), tree_digest(&tree.clone()));

    let mut changed = sample_tree();
    changed.insert("other.json".to_string(), common::as_document(json!({ "b": "2" })));
    assert_ne!(tree_digest(&tree), tree_digest(&changed));

    // 64 hex characters of SHA-256
    assert_eq!(tree_digest(&tree).len(), 64);
}
