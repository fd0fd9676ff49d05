// src/build/cache.rs

//! Filesystem cache of compiled recipe documents
//!
//! Layout under the cache root:
//! - `pdf/<id>.pdf`: the current artifact of each recipe
//! - `debug/<id>.tex`, `debug/<id>.log`: last failed build (debug mode only)
//! - `build/`: per-request scratch directories

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, warn};

/// Why an artifact must be rebuilt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    /// No artifact on disk
    Missing,
    /// The recipe was modified at or after the artifact was written
    RecipeChanged,
    /// The template was modified at or after the artifact was written
    TemplateChanged,
    /// The stored modification time could not be read
    BadTimestamp,
}

impl StaleReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaleReason::Missing => "missing",
            StaleReason::RecipeChanged => "recipe changed",
            StaleReason::TemplateChanged => "template changed",
            StaleReason::BadTimestamp => "unparseable timestamp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    Fresh,
    Stale(StaleReason),
}

impl Staleness {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Staleness::Fresh)
    }
}

/// Parse a database timestamp (`YYYY-MM-DD HH:MM:SS`, UTC)
pub fn parse_db_timestamp(value: &str) -> Option<SystemTime> {
    let value = value.trim();
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .ok();

    let utc = match naive {
        Some(naive) => naive.and_utc(),
        None => DateTime::parse_from_rfc3339(value).ok()?.with_timezone(&Utc),
    };
    Some(utc.into())
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Decide whether `artifact` is still valid
///
/// Stale when the artifact is missing, when `updated_at` (or the template
/// mtime) is at or after the artifact mtime, or when `updated_at` cannot be
/// parsed. An unreadable template is ignored here; rendering reports it.
pub fn check_staleness(artifact: &Path, updated_at: Option<&str>, template: &Path) -> Staleness {
    let Some(artifact_mtime) = modified(artifact) else {
        return Staleness::Stale(StaleReason::Missing);
    };

    let Some(recipe_mtime) = updated_at.and_then(parse_db_timestamp) else {
        return Staleness::Stale(StaleReason::BadTimestamp);
    };
    if recipe_mtime >= artifact_mtime {
        return Staleness::Stale(StaleReason::RecipeChanged);
    }

    if modified(template).is_some_and(|t| t >= artifact_mtime) {
        return Staleness::Stale(StaleReason::TemplateChanged);
    }

    Staleness::Fresh
}

/// Paths and file operations of the artifact cache
#[derive(Debug, Clone)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn pdf_dir(&self) -> PathBuf {
        self.root.join("pdf")
    }

    pub fn debug_dir(&self) -> PathBuf {
        self.root.join("debug")
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root.join("build")
    }

    /// Cached artifact of recipe `id`
    pub fn artifact_path(&self, id: i64) -> PathBuf {
        self.pdf_dir().join(format!("{}.pdf", id))
    }

    /// Create the cache directories if needed
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [self.pdf_dir(), self.debug_dir(), self.build_dir()] {
            fs::create_dir_all(&dir).map_err(|e| Error::fs(&dir, e))?;
        }
        Ok(())
    }

    /// New isolated scratch directory, removed when dropped
    pub fn scratch_dir(&self, id: i64) -> Result<TempDir> {
        let build_dir = self.build_dir();
        tempfile::Builder::new()
            .prefix(&format!("recipe-{}-", id))
            .tempdir_in(&build_dir)
            .map_err(|e| Error::fs(&build_dir, e))
    }

    /// Move a freshly built file into place as the artifact of `id`
    ///
    /// Readers see either the previous artifact or the complete new one.
    pub fn persist_artifact(&self, id: i64, built: &Path) -> Result<PathBuf> {
        let target = self.artifact_path(id);

        if fs::rename(built, &target).is_ok() {
            debug!("Moved {} to {}", built.display(), target.display());
            return Ok(target);
        }

        // Different filesystem: copy next to the target, then rename
        let pdf_dir = self.pdf_dir();
        let mut staged = NamedTempFile::new_in(&pdf_dir).map_err(|e| Error::fs(&pdf_dir, e))?;
        let mut source = fs::File::open(built).map_err(|e| Error::fs(built, e))?;
        std::io::copy(&mut source, staged.as_file_mut()).map_err(|e| Error::fs(staged.path(), e))?;
        staged
            .persist(&target)
            .map_err(|e| Error::fs(&target, e.error))?;

        Ok(target)
    }

    /// Keep the rendered source and the compiler log of a failed build
    ///
    /// Best effort: failures are logged and otherwise ignored.
    pub fn write_debug(&self, id: i64, source: &str, log: Option<&Path>) {
        let debug_dir = self.debug_dir();
        let tex_path = debug_dir.join(format!("{}.tex", id));
        if let Err(e) = fs::write(&tex_path, source) {
            warn!("Failed to write debug source {}: {}", tex_path.display(), e);
        }

        if let Some(log) = log {
            let log_path = debug_dir.join(format!("{}.log", id));
            if let Err(e) = fs::copy(log, &log_path) {
                warn!("Failed to write debug log {}: {}", log_path.display(), e);
            }
        }
    }
}
