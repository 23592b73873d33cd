/*!
 * Common test utilities for the locsync test suite
 */

use std::fs;
use std::path::{Path, PathBuf};
use anyhow::Result;
use serde_json::Value;
use tempfile::TempDir;

use locsync::app_config::Config;
use locsync::sync::Document;

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Initializes logging for tests that want visible output
#[allow(dead_code)]
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Writes a JSON document into a language tree, creating directories as needed
pub fn write_language_document(
    locales_dir: &Path,
    language: &str,
    name: &str,
    json: &Value,
) -> Result<PathBuf> {
    let path = locales_dir.join(language).join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, serde_json::to_string_pretty(json)?)?;
    Ok(path)
}

/// Reads a JSON document back from a language tree
pub fn read_language_document(locales_dir: &Path, language: &str, name: &str) -> Result<Value> {
    let path = locales_dir.join(language).join(name);
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Whether a document exists in a language tree
pub fn language_document_exists(locales_dir: &Path, language: &str, name: &str) -> bool {
    locales_dir.join(language).join(name).is_file()
}

/// Converts a JSON value into a Document for direct engine calls
pub fn as_document(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("Expected a JSON object, got {}", other),
    }
}

/// Builds a config rooted in a temp directory, with history recording off so
/// tests never touch the user's data directory
pub fn test_config(locales_root: &Path, targets: &[&str]) -> Config {
    let mut config = Config::default();
    config.source_language = "en".to_string();
    config.target_languages = targets.iter().map(|t| t.to_string()).collect();
    config.locales_dir = locales_root.to_string_lossy().into_owned();
    config.snapshot_path = locales_root
        .join(".locsync")
        .join("snapshot.json")
        .to_string_lossy()
        .into_owned();
    config.history.enabled = false;
    config
}
