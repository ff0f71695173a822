//! Unified error types for the gobox workspace.
//!
//! The cgroup core wraps these variants in its own step-tagged error so the
//! caller learns which stage of initialization failed.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum GoboxError {
    /// A controller directory could not be created or accessed.
    #[error("failed to create cgroup directory {path}: {source}")]
    DirectoryCreation {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A control file rejected a write.
    #[error("failed to write [{value}] to {path}: {source}")]
    Write {
        /// Control file that was written.
        path: PathBuf,
        /// Value that was being written.
        value: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An I/O operation outside the control hierarchy failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, GoboxError>;
