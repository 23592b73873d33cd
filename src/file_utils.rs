use anyhow::{Result, Context, anyhow};
use log::warn;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::{DirEntry, WalkDir};

use crate::sync::document::{Document, DocumentSet};

// @module: Locale tree file utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    /// Find all JSON documents under a directory.
    ///
    /// Hidden directories are skipped so editor and tool droppings next to
    /// the locale tree never get picked up as documents. Results come back
    /// sorted for deterministic processing order.
    pub fn find_documents<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        let walker = WalkDir::new(dir.as_ref()).follow_links(true).into_iter();
        for entry in walker.filter_entry(|e| !Self::is_hidden(e)) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("json"))
            {
                result.push(path.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }

    fn is_hidden(entry: &DirEntry) -> bool {
        entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
    }

    /// Document name for a path relative to its tree root.
    ///
    /// Names use forward slashes on every platform, so "app/menu.json"
    /// from one machine lines up with the snapshot written on another.
    pub fn relative_document_name(root: &Path, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(root).ok()?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }

    /// Path of a named document inside a tree root
    pub fn document_path(root: &Path, name: &str) -> PathBuf {
        let relative: PathBuf = name.split('/').collect();
        root.join(relative)
    }

    /// Read and parse one JSON document
    pub fn read_document<P: AsRef<Path>>(path: P) -> Result<Document> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))?;

        let document: Document = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON document: {:?}", path.as_ref()))?;

        Ok(document)
    }

    /// Load every document under a tree root, keyed by relative name.
    ///
    /// Any unreadable or unparseable file fails the load; used for the
    /// source tree where a broken document must abort the run.
    pub fn load_documents<P: AsRef<Path>>(dir: P) -> Result<DocumentSet> {
        let dir = dir.as_ref();
        let mut documents = DocumentSet::new();

        for path in Self::find_documents(dir)? {
            let Some(name) = Self::relative_document_name(dir, &path) else {
                continue;
            };
            let document = Self::read_document(&path)?;
            documents.insert(name, document);
        }

        Ok(documents)
    }

    /// Load a target language tree, tolerating damage.
    ///
    /// An absent directory means the language has no translations yet. A
    /// file that fails to parse is logged and treated as not yet
    /// translated; the merge rebuilds it from the delta.
    pub fn load_documents_lenient<P: AsRef<Path>>(dir: P) -> DocumentSet {
        let dir = dir.as_ref();
        let mut documents = DocumentSet::new();

        if !Self::dir_exists(dir) {
            return documents;
        }

        let paths = match Self::find_documents(dir) {
            Ok(paths) => paths,
            Err(error) => {
                warn!("Failed to scan {}: {}", dir.display(), error);
                return documents;
            }
        };

        for path in paths {
            let Some(name) = Self::relative_document_name(dir, &path) else {
                continue;
            };
            match Self::read_document(&path) {
                Ok(document) => {
                    documents.insert(name, document);
                }
                Err(error) => {
                    warn!("Skipping unreadable translation {}: {}", path.display(), error);
                }
            }
        }

        documents
    }

    /// Write one document as pretty-printed JSON with a trailing newline.
    ///
    /// The write goes through a temporary file in the destination
    /// directory and is renamed into place, so readers never observe a
    /// half-written document.
    pub fn write_document<P: AsRef<Path>>(path: P, document: &Document) -> Result<()> {
        let path = path.as_ref();

        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Self::ensure_dir(parent)?;

        let mut file = NamedTempFile::new_in(parent)
            .with_context(|| format!("Failed to create temporary file in {:?}", parent))?;
        serde_json::to_writer_pretty(&mut file, document)
            .with_context(|| format!("Failed to serialize document for {:?}", path))?;
        file.write_all(b"\n")
            .with_context(|| format!("Failed to write document {:?}", path))?;
        file.persist(path)
            .map_err(|error| anyhow!("Failed to persist {:?}: {}", path, error))?;

        Ok(())
    }

    /// Remove a file if it exists, reporting whether anything was removed
    pub fn remove_file_if_exists<P: AsRef<Path>>(path: P) -> Result<bool> {
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(error) => Err(error)
                .with_context(|| format!("Failed to remove file: {:?}", path.as_ref())),
        }
    }
}
