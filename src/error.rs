// src/error.rs

//! Error types for rezept
//!
//! Parsing-level conditions (unknown quantity grammar, unknown units) never
//! surface here: they are recovered locally with a fallback value. Only
//! lookups, builds and filesystem operations produce errors.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using rezept's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while assembling or building recipe documents
#[derive(Error, Debug)]
pub enum Error {
    /// The requested recipe has no backing record
    #[error("Recipe not found: {0}")]
    RecipeNotFound(i64),

    /// The compiler did not produce the expected artifact
    ///
    /// Carries no compiler output; diagnostics go to the log and
    /// to the debug directory.
    #[error("PDF build failed for recipe {0}")]
    BuildFailed(i64),

    /// Directory creation, artifact copy or similar failed
    #[error("Filesystem error at {}: {source}", path.display())]
    FilesystemError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Template could not be parsed or rendered
    #[error("Template error: {0}")]
    TemplateError(String),

    /// The compiler process could not be started
    #[error("Compiler error: {0}")]
    CompilerError(String),

    /// Database access failed
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// Database initialization failed
    #[error("Database initialization failed: {0}")]
    InitError(String),

    /// Generic IO failure
    #[error("IO error: {0}")]
    IoError(String),

    /// Configuration value was invalid
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A background build task panicked or was cancelled
    #[error("Build task error: {0}")]
    TaskError(String),
}

impl Error {
    /// Wrap an IO error together with the path it occurred on
    pub fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FilesystemError {
            path: path.into(),
            source,
        }
    }

    /// Whether this error should be shown to clients as "not found"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RecipeNotFound(_))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

impl From<minijinja::Error> for Error {
    fn from(err: minijinja::Error) -> Self {
        Self::TemplateError(err.to_string())
    }
}
