/*!
 * Persistence of the previous source tree state.
 *
 * The snapshot store owns the on-disk record of the last successfully
 * processed source tree. It is loaded at the start of a run as the
 * comparison baseline and replaced wholesale at the end. A snapshot that
 * cannot be read or fails its digest check is treated as absent, which
 * costs a full retranslation but never a failed run.
 *
 * Two concurrent runs against the same store race and the last writer
 * wins; nothing here takes a lock.
 */

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::errors::SnapshotError;
use crate::sync::document::DocumentSet;

// @module: Source tree snapshot persistence

/// On-disk snapshot layout
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    /// When the snapshot was written, RFC 3339
    saved_at: String,

    /// SHA-256 over the serialized documents, checked on load
    digest: String,

    /// The source tree as of the last successful run
    documents: DocumentSet,
}

/// Store for the previous source tree state
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Create a store backed by the given file path
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        SnapshotStore { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the previous source tree.
    ///
    /// Returns `Ok(None)` when no snapshot exists yet (first run). A file
    /// that cannot be parsed or whose digest does not match its contents
    /// is reported as corrupt; truncation and tampering look identical
    /// from here, so both take the same path.
    pub fn load(&self) -> Result<Option<DocumentSet>, SnapshotError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(SnapshotError::Unreadable(error.to_string())),
        };

        let snapshot: SnapshotFile = serde_json::from_str(&raw)
            .map_err(|error| SnapshotError::Corrupt(error.to_string()))?;

        let computed = tree_digest(&snapshot.documents);
        if computed != snapshot.digest {
            return Err(SnapshotError::Corrupt(format!(
                "digest mismatch: recorded {}, computed {}",
                snapshot.digest, computed
            )));
        }

        debug!("Loaded snapshot of {} documents saved at {}",
               snapshot.documents.len(), snapshot.saved_at);
        Ok(Some(snapshot.documents))
    }

    /// Load the previous source tree, recovering from any failure.
    ///
    /// An absent snapshot is a normal first run. A broken one is logged
    /// and treated as absent, forcing a full retranslation.
    pub fn load_or_empty(&self) -> DocumentSet {
        match self.load() {
            Ok(Some(documents)) => documents,
            Ok(None) => {
                debug!("No snapshot at {}, starting from an empty baseline",
                       self.path.display());
                DocumentSet::new()
            }
            Err(error) => {
                warn!("{}. Starting from an empty baseline, all keys will be retranslated", error);
                DocumentSet::new()
            }
        }
    }

    /// Replace the stored snapshot with the given source tree.
    ///
    /// The write goes through a temporary file in the same directory and
    /// is renamed into place, so a crash mid-write leaves the old snapshot
    /// intact rather than a truncated one.
    pub fn save(&self, documents: &DocumentSet) -> Result<(), SnapshotError> {
        let parent = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            fs::create_dir_all(parent)
                .map_err(|error| SnapshotError::WriteFailed(error.to_string()))?;
        }

        let snapshot = SnapshotFile {
            saved_at: Utc::now().to_rfc3339(),
            digest: tree_digest(documents),
            documents: documents.clone(),
        };

        let mut file = NamedTempFile::new_in(parent.unwrap_or_else(|| Path::new(".")))
            .map_err(|error| SnapshotError::WriteFailed(error.to_string()))?;
        serde_json::to_writer_pretty(&mut file, &snapshot)
            .map_err(|error| SnapshotError::WriteFailed(error.to_string()))?;
        file.write_all(b"\n")
            .map_err(|error| SnapshotError::WriteFailed(error.to_string()))?;
        file.persist(&self.path)
            .map_err(|error| SnapshotError::WriteFailed(error.to_string()))?;

        debug!("Saved snapshot of {} documents to {}",
               snapshot.documents.len(), self.path.display());
        Ok(())
    }
}

/// SHA-256 fingerprint of a source tree.
///
/// Document names are sorted and key order inside documents is preserved
/// by the parser, so the same tree always serializes to the same bytes.
pub fn tree_digest(documents: &DocumentSet) -> String {
    let bytes = serde_json::to_vec(documents).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    format!("{:x}", hasher.finalize())
}
