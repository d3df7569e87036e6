//! Error types for the openpoc crate.
//!
//! This module provides a comprehensive error type [`PocError`] that covers
//! all failure modes in the library, enabling proper error handling.

use std::io;
use std::path::PathBuf;

/// The main error type for all operations in this crate.
#[derive(Debug, thiserror::Error)]
pub enum PocError {
    /// Failed to fetch data from an upstream source.
    #[error("Source '{source_name}' fetch failed: {message}")]
    SourceFetch {
        /// Name of the source that failed (e.g., "exploitdb", "trickest").
        source_name: String,
        /// Description of what went wrong.
        message: String,
    },

    /// Failed to parse a harvested file.
    #[error("Parse error in {path}: {message}")]
    Parse {
        /// File that could not be parsed.
        path: PathBuf,
        /// Why parsing failed.
        message: String,
    },

    /// Directory traversal failed while harvesting.
    #[error("Walk error under {root}: {message}")]
    Walk {
        /// Root directory of the harvest.
        root: PathBuf,
        /// Why traversal failed.
        message: String,
    },

    /// An external command (git) failed.
    #[error("Command '{command}' failed: {message}")]
    Command {
        /// The command that was run.
        command: String,
        /// Exit status or spawn failure description.
        message: String,
    },

    /// Configuration error (missing or invalid values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV decoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Input-side I/O error (reading checked-out source data).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Output filesystem error while persisting per-CVE results.
    #[error("Store error at {path}: {source}")]
    Store {
        /// Output file or directory that could not be written.
        path: PathBuf,
        source: io::Error,
    },

    /// Task join error (from spawned tasks).
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// A specialized Result type for openpoc operations.
pub type Result<T> = std::result::Result<T, PocError>;

impl PocError {
    /// Create a new source fetch error.
    pub fn source_fetch(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceFetch {
            source_name: source.into(),
            message: message.into(),
        }
    }

    /// Create a new parse error.
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a new command error.
    pub fn command(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Command {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Create a new store error.
    pub fn store(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Store {
            path: path.into(),
            source,
        }
    }

    /// Check if this error should abort the run.
    ///
    /// Only output filesystem and configuration errors are fatal; source
    /// acquisition, read and parse failures degrade to "provider not
    /// refreshed this run" and the reconciler keeps the prior data.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Store { .. } | Self::Config(_))
    }
}
