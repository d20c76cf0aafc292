//! Error types for the project-mcp crate.

use std::path::PathBuf;

/// Server-specific error types.
///
/// The two domain kinds are [`OutOfBounds`](ServerError::OutOfBounds)
/// (attempted escape from a governing root — always rejected, never
/// retried) and [`NotFound`](ServerError::NotFound) (nothing at the
/// resolved location). Both are surfaced verbatim to the caller.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Path would escape its governing root after canonicalization.
    #[error("path must be under root {root}: {path}")]
    OutOfBounds { root: PathBuf, path: String },

    /// No file or directory at the resolved location.
    #[error("not found: {0}")]
    NotFound(String),

    /// MCP protocol error (malformed URI, bad params).
    #[error("MCP protocol error: {0}")]
    Protocol(String),

    /// Subprocess execution failed.
    #[error("subprocess failed: {command}: {reason}")]
    Subprocess { command: String, reason: String },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error with path context.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience result type for project-mcp operations.
pub type ServerResult<T> = Result<T, ServerError>;
