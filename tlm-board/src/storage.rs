//! Persistence port
//!
//! The controller saves through [`Storage`] after every mutation and never
//! learns where the blob ends up. Two implementations ship here: an
//! in-memory store (optionally with a byte quota) and a file store.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::StorageError;
use crate::snapshot::STORAGE_KEY;

/// Single-slot blob store keyed by [`STORAGE_KEY`]
pub trait Storage {
    /// Saved blob, `None` when nothing was saved yet
    fn load(&self) -> Result<Option<String>, StorageError>;

    /// Replace the saved blob
    fn save(&mut self, blob: &str) -> Result<(), StorageError>;
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn load(&self) -> Result<Option<String>, StorageError> {
        (**self).load()
    }

    fn save(&mut self, blob: &str) -> Result<(), StorageError> {
        (**self).save(blob)
    }
}

/// In-memory store, mostly for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    blob: Option<String>,
    quota: Option<usize>,
    saves: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that already holds `blob`
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Some(blob.into()),
            ..Self::default()
        }
    }

    /// Store refusing blobs larger than `quota` bytes
    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::default()
        }
    }

    pub fn blob(&self) -> Option<&str> {
        self.blob.as_deref()
    }

    /// Number of successful saves
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.blob.clone())
    }

    fn save(&mut self, blob: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            if blob.len() > quota {
                return Err(StorageError::QuotaExceeded {
                    needed: blob.len(),
                    quota,
                });
            }
        }
        self.blob = Some(blob.to_string());
        self.saves += 1;
        Ok(())
    }
}

/// File-backed store: `<dir>/tierMakerData.json`
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", STORAGE_KEY)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Storage for FileStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write to a temp file and rename over the target, so a crash mid-write
    /// never leaves a truncated save behind
    fn save(&mut self, blob: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, blob)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), bytes = blob.len(), "Board saved");
        Ok(())
    }
}
