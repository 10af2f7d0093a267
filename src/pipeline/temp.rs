//! Label-scoped scratch files.
//!
//! Every file the pipeline creates for itself lives in one scratch directory
//! and is recorded under a *label*: `pdf` for intermediates (inline HTML,
//! the rendered PDF) and `pdf_result` for a final artifact that no caller
//! asked to keep. Releasing a label deletes everything recorded under it.
//!
//! A [`TempStore`] is created per conversion call, so labels are private to
//! that call. Names come from [`tempfile`], which picks a random suffix and
//! creates the file with `O_EXCL`, so concurrent calls sharing the scratch
//! directory never collide.
//!
//! Files are *not* removed when the store is dropped: the `pdf_result` file
//! of a path-returning conversion must outlive the call. Scope removal
//! explicitly with [`TempStore::guard`].

use crate::error::{Html2PdfError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// Label for intermediate files, released at the end of every conversion.
pub const LABEL_INTERMEDIATE: &str = "pdf";
/// Label for an allocated final artifact, released only by the bytes-returning entry point.
pub const LABEL_RESULT: &str = "pdf_result";

/// Registry of scratch files grouped by label.
#[derive(Debug)]
pub struct TempStore {
    dir: PathBuf,
    files: Mutex<HashMap<String, Vec<PathBuf>>>,
}

impl TempStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files: Mutex::new(HashMap::new()),
        }
    }

    /// The scratch directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create a new empty file named `<label>_<random><suffix>` and record it
    /// under `label`.
    pub fn allocate(&self, suffix: &str, label: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir).map_err(|e| Html2PdfError::io(&self.dir, e))?;

        let prefix = format!("{label}_");
        let path = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(suffix)
            .tempfile_in(&self.dir)
            .map_err(|e| Html2PdfError::io(&self.dir, e))?
            .into_temp_path()
            .keep()
            .map_err(|e| Html2PdfError::io(&self.dir, e.error))?;

        debug!("Allocated scratch file {} [{}]", path.display(), label);
        self.lock()
            .entry(label.to_string())
            .or_default()
            .push(path.clone());
        Ok(path)
    }

    /// Delete every file recorded under `label` and forget them.
    ///
    /// Idempotent and infallible: files that are already gone are skipped and
    /// other removal failures are logged. Returns the number of files removed.
    pub fn release_all(&self, label: &str) -> usize {
        let paths = self.lock().remove(label).unwrap_or_default();
        let mut removed = 0;
        for path in paths {
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove scratch file {}: {}", path.display(), e),
            }
        }
        if removed > 0 {
            debug!("Released {} scratch file(s) [{}]", removed, label);
        }
        removed
    }

    /// Files currently recorded under `label`.
    pub fn files(&self, label: &str) -> Vec<PathBuf> {
        self.lock().get(label).cloned().unwrap_or_default()
    }

    /// Release `label` when the returned guard is dropped, on every exit path.
    pub fn guard<'a>(&'a self, label: &'a str) -> ReleaseGuard<'a> {
        ReleaseGuard { store: self, label }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<PathBuf>>> {
        // The map holds plain paths; a panic elsewhere cannot leave it inconsistent.
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Releases one label of a [`TempStore`] on drop.
#[must_use = "the label is released as soon as the guard is dropped"]
pub struct ReleaseGuard<'a> {
    store: &'a TempStore,
    label: &'a str,
}

impl Drop for ReleaseGuard<'_> {
    fn drop(&mut self) {
        self.store.release_all(self.label);
    }
}
