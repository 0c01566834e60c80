//! Upload fixture files
//!
//! Scenarios write small text files before uploading them and remove them
//! afterwards. `cleanup` is called explicitly on both the success and the
//! failure path; `Drop` only catches what an early `?` return left behind.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

#[derive(Debug)]
pub struct FixtureSet {
    dir: PathBuf,
    created: Vec<PathBuf>,
}

impl FixtureSet {
    /// Fixtures will be written under `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            created: Vec::new(),
        }
    }

    /// Write `contents` to `dir/name` and track it for cleanup
    pub async fn create(&mut self, name: &str, contents: &str) -> io::Result<PathBuf> {
        let path = self.dir.join(name);
        // track before writing so a partial write is still removed
        self.created.push(path.clone());
        tokio::fs::write(&path, contents).await?;
        debug!(path = %path.display(), bytes = contents.len(), "Created fixture");
        Ok(path)
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.created
    }

    /// Remove every tracked fixture; returns the paths actually deleted
    pub fn cleanup(&mut self) -> Vec<PathBuf> {
        let mut removed = Vec::new();
        for path in self.created.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    debug!(path = %path.display(), "Removed fixture");
                    removed.push(path);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove fixture"),
            }
        }
        removed
    }
}

impl Drop for FixtureSet {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// File name component for upload, falling back to the full path text
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
