use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::{PullError, Result};

/// The per-day log file a run accumulates into.
///
/// The file is reopened in append mode for every batch and closed again once
/// the batch is written, so an interrupted run leaves whole batches behind.
#[derive(Debug, Clone)]
pub struct OutputTarget {
    path: PathBuf,
}

impl OutputTarget {
    /// Create the parent directory if needed and truncate (or create) the file.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| PullError::fs("create output folder", parent, e))?;
            }
        }
        File::create(&path).map_err(|e| PullError::fs("create output file", &path, e))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current_len(&self) -> Result<u64> {
        fs::metadata(&self.path)
            .map(|m| m.len())
            .map_err(|e| PullError::fs("stat output file", &self.path, e))
    }

    pub fn open_append(&self) -> Result<File> {
        OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| PullError::fs("open output file", &self.path, e))
    }

    /// Drop everything past `len`, undoing a partially written batch.
    pub fn truncate(&self, len: u64) -> Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .open(&self.path)
            .map_err(|e| PullError::fs("open output file", &self.path, e))?;
        file.set_len(len)
            .map_err(|e| PullError::fs("truncate output file", &self.path, e))
    }
}
