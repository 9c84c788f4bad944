//! Temporary-file lifecycle and artifact naming for one job

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Files created during one job, deleted when the guard is dropped.
///
/// Paths are deleted in creation order, best-effort: a file that is already
/// gone or cannot be removed is logged and skipped. Paths handed to
/// [`TempArtifacts::release`] survive.
#[derive(Debug, Default)]
pub struct TempArtifacts {
    paths: Vec<PathBuf>,
}

impl TempArtifacts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `path` for deletion and hand it back
    pub fn track(&mut self, path: impl Into<PathBuf>) -> PathBuf {
        let path = path.into();
        self.paths.push(path.clone());
        path
    }

    /// Stop tracking `path` so it outlives the guard
    pub fn release(&mut self, path: &Path) {
        self.paths.retain(|p| p != path);
    }

    #[must_use]
    pub fn tracked(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Delete every tracked path now
    pub fn cleanup(&mut self) {
        for path in self.paths.drain(..) {
            let result = if path.is_dir() {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };
            match result {
                Ok(()) => debug!(path = %path.display(), "Removed temporary file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Could not remove temporary file"),
            }
        }
    }
}

impl Drop for TempArtifacts {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn short_hex(len: usize) -> String {
    Uuid::new_v4().simple().to_string()[..len].to_string()
}

/// Base name for a generated video: `short_<UTC timestamp>_<8 hex>`
#[must_use]
pub fn generated_job_name() -> String {
    format!("short_{}_{}", Utc::now().format("%Y%m%d_%H%M%S"), short_hex(8))
}

/// Base name for a captioned upload: `subtitled_<10 hex>_<stem>`
#[must_use]
pub fn caption_job_name(filename: &str) -> String {
    format!("subtitled_{}_{}", short_hex(10), sanitize_stem(filename))
}

/// File stem reduced to `[A-Za-z0-9_-]`, at most 40 characters
#[must_use]
pub fn sanitize_stem(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let clean: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(40)
        .collect();
    let clean = clean.trim_matches('_').to_string();
    if clean.is_empty() {
        "video".to_string()
    } else {
        clean
    }
}
