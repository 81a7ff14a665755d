//! Error types for the command-line tool.
//!
//! All errors use thiserror for consistent error handling across the codebase.

use img_archive::ArchiveError;
use std::path::PathBuf;
use thiserror::Error;

/// Tool result type
pub type ToolResult<T> = Result<T, ToolError>;

/// Errors raised while running a command.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Failed to read an input file
    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        /// File that could not be read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to write an output file
    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        /// File that could not be written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to walk an input directory
    #[error("Failed to walk {path}: {source}")]
    WalkFailed {
        /// Directory being walked
        path: PathBuf,
        /// Underlying traversal error
        #[source]
        source: walkdir::Error,
    },

    /// Input file has no name usable as an entry name
    #[error("Cannot derive an entry name from {0}")]
    UnnamedInput(PathBuf),

    /// Archive operation failed
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Failed to encode a JSON listing
    #[error("Failed to encode listing: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to write command output
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Archive file does not exist
    #[error("Archive not found: {0}")]
    ArchiveNotFound(PathBuf),

    /// Explicit index file does not exist
    #[error("Index file not found: {0}")]
    IndexNotFound(PathBuf),

    /// Refusing to overwrite an existing archive
    #[error("Archive already exists: {0} (use --force to overwrite)")]
    ArchiveExists(PathBuf),

    /// Mutating command combined with --read-only
    #[error("Command '{0}' modifies the archive but --read-only was given")]
    ReadOnlyCommand(&'static str),
}
