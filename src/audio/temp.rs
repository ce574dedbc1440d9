//! Ownership of intermediate audio files
//!
//! Every file the renderer or a synthesizer writes is recorded here and
//! removed by an explicit [`TempFiles::cleanup`]. Handles are cheap clones
//! of one shared ledger.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

/// Shared ledger of temporary files
#[derive(Debug, Clone, Default)]
pub struct TempFiles {
    paths: Arc<Mutex<Vec<PathBuf>>>,
}

impl TempFiles {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PathBuf>> {
        // A panic while holding the lock leaves the list itself intact
        self.paths.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Create an empty temp file and record it
    pub fn create(&self, prefix: &str, suffix: &str) -> io::Result<PathBuf> {
        let file = tempfile::Builder::new()
            .prefix(&format!("spoken-countdown-{prefix}"))
            .suffix(suffix)
            .tempfile()?;
        let (_, path) = file.keep().map_err(|e| e.error)?;
        self.register(path.clone());
        Ok(path)
    }

    /// Record a file created elsewhere
    pub fn register(&self, path: PathBuf) {
        self.lock().push(path);
    }

    /// Delete one file now and forget it
    pub fn release(&self, path: &Path) {
        remove_quietly(path);
        self.lock().retain(|p| p != path);
    }

    /// Paths currently recorded
    pub fn snapshot(&self) -> Vec<PathBuf> {
        self.lock().clone()
    }

    /// Delete and forget every file recorded since `snapshot` was taken
    ///
    /// Returns the number of files actually removed.
    pub fn release_since(&self, snapshot: &[PathBuf]) -> usize {
        let fresh: Vec<PathBuf> = {
            let mut paths = self.lock();
            let (fresh, kept): (Vec<PathBuf>, Vec<PathBuf>) = std::mem::take(&mut *paths)
                .into_iter()
                .partition(|p| !snapshot.contains(p));
            *paths = kept;
            fresh
        };
        fresh.iter().filter(|p| remove_quietly(p)).count()
    }

    /// Delete every recorded file; safe to call repeatedly
    ///
    /// Returns the number of files actually removed.
    pub fn cleanup(&self) -> usize {
        let paths: Vec<PathBuf> = std::mem::take(&mut *self.lock());
        let removed = paths.iter().filter(|p| remove_quietly(p)).count();
        if !paths.is_empty() {
            debug!(tracked = paths.len(), removed, "Cleaned up temporary audio files");
        }
        removed
    }

    /// Number of files currently recorded
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no files are recorded
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

fn remove_quietly(path: &Path) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => true,
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to remove temporary file");
            false
        }
    }
}
