/*!
 * Tests for locale tree file utilities
 */

use std::fs;
use std::path::Path;
use anyhow::Result;
use serde_json::json;
use locsync::file_utils::FileManager;
use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "test_file_exists.tmp", "test content")?;

    assert!(FileManager::file_exists(&test_file));

    Ok(())
}

/// Test that file_exists returns false for non-existent files
#[test]
fn test_file_exists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_file.tmp"));
}

/// Test that dir_exists distinguishes directories from files
#[test]
fn test_dir_exists_withFileAndDir_shouldDistinguishThem() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "not_a_dir.tmp", "x")?;

    assert!(FileManager::dir_exists(temp_dir.path()));
    assert!(!FileManager::dir_exists(&test_file));
    assert!(!FileManager::dir_exists("./non_existent_directory_12345"));

    Ok(())
}

/// Test that ensure_dir creates directories as needed
#[test]
fn test_ensure_dir_withNonExistentDir_shouldCreateDirectory() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_subdir = temp_dir.path().join("test_subdir").join("nested");

    FileManager::ensure_dir(&test_subdir)?;

    assert!(test_subdir.exists());
    assert!(test_subdir.is_dir());

    Ok(())
}

/// Test that document discovery finds only JSON files, sorted, skipping
/// hidden directories
#[test]
fn test_find_documents_withMixedTree_shouldReturnSortedJsonOnly() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let root = temp_dir.path();
    common::create_test_file(root, "zebra.json", "{}")?;
    common::create_test_file(root, "app/menu.json", "{}")?;
    common::create_test_file(root, "notes.txt", "not a document")?;
    common::create_test_file(root, ".hidden/secret.json", "{}")?;

    let documents = FileManager::find_documents(root)?;

    let names: Vec<String> = documents
        .iter()
        .filter_map(|p| FileManager::relative_document_name(root, p))
        .collect();
    assert_eq!(names, vec!["app/menu.json".to_string(), "zebra.json".to_string()]);

    Ok(())
}

/// Test document naming relative to the tree root
#[test]
fn test_relative_document_name_shouldUseForwardSlashes() {
    let root = Path::new("/tmp/locales/en");
    let path = root.join("app").join("menu.json");

    let name = FileManager::relative_document_name(root, &path);

    assert_eq!(name, Some("app/menu.json".to_string()));
}

/// Test that document_path inverts relative_document_name
#[test]
fn test_document_path_shouldRebuildNestedPath() {
    let root = Path::new("/tmp/locales/fr");

    let path = FileManager::document_path(root, "app/menu.json");

    assert_eq!(path, root.join("app").join("menu.json"));
}

/// Test reading a valid JSON document
#[test]
fn test_read_document_withValidJson_shouldParse() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "common.json",
        r#"{ "greeting": "Hello", "menu": { "open": "Open" } }"#,
    )?;

    let document = FileManager::read_document(&path)?;

    assert_eq!(document["greeting"], json!("Hello"));
    assert_eq!(document["menu"]["open"], json!("Open"));

    Ok(())
}

/// Test that an unparseable document fails a strict load
#[test]
fn test_load_documents_withBrokenDocument_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "good.json", "{}")?;
    common::create_test_file(temp_dir.path(), "broken.json", "{ not json")?;

    assert!(FileManager::load_documents(temp_dir.path()).is_err());

    Ok(())
}

/// Test that the lenient load skips broken documents and missing dirs
#[test]
fn test_load_documents_lenient_withBrokenDocument_shouldSkipIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "good.json", r#"{ "a": "1" }"#)?;
    common::create_test_file(temp_dir.path(), "broken.json", "{ not json")?;

    let documents = FileManager::load_documents_lenient(temp_dir.path());

    assert_eq!(documents.len(), 1);
    assert!(documents.contains_key("good.json"));

    let absent = FileManager::load_documents_lenient(temp_dir.path().join("missing"));
    assert!(absent.is_empty());

    Ok(())
}

/// Test that documents load keyed by their relative names
#[test]
fn test_load_documents_withNestedTree_shouldKeyByRelativeName() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "common.json", r#"{ "a": "1" }"#)?;
    common::create_test_file(temp_dir.path(), "app/menu.json", r#"{ "b": "2" }"#)?;

    let documents = FileManager::load_documents(temp_dir.path())?;

    assert_eq!(documents.len(), 2);
    assert!(documents.contains_key("common.json"));
    assert!(documents.contains_key("app/menu.json"));

    Ok(())
}

/// Test that written documents are pretty JSON with a trailing newline
#[test]
fn test_write_document_shouldWritePrettyJsonWithTrailingNewline() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("out.json");
    let document = common::as_document(json!({ "menu": { "open": "Open" } }));

    FileManager::write_document(&path, &document)?;

    let content = fs::read_to_string(&path)?;
    assert!(content.ends_with('\n'));
    assert!(content.contains("\n  \"menu\""));
    let reread = FileManager::read_document(&path)?;
    assert_eq!(reread, document);

    Ok(())
}

/// Test that writing a nested document name creates its directories
#[test]
fn test_write_document_withNestedName_shouldCreateParents() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = FileManager::document_path(temp_dir.path(), "app/menu.json");
    let document = common::as_document(json!({ "open": "Open" }));

    FileManager::write_document(&path, &document)?;

    assert!(path.is_file());

    Ok(())
}

/// Test removal reporting for present and absent files
#[test]
fn test_remove_file_if_exists_shouldReportWhetherRemoved() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "doomed.json", "{}")?;

    assert!(FileManager::remove_file_if_exists(&path)?);
    assert!(!path.exists());
    assert!(!FileManager::remove_file_if_exists(&path)?);

    Ok(())
}
