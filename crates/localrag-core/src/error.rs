use std::time::Duration;

use thiserror::Error;

/// Failure talking to an embedding or completion backend.
///
/// These are recoverable at the answer boundary: the assembler turns them
/// into an unsuccessful `QueryResult` instead of propagating them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    #[error("backend timed out after {0:?}")]
    Timeout(Duration),

    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed backend response: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error("Index build failed: {0}")]
    Build(String),

    #[error("Index was built with embedding model '{found}' but '{expected}' is configured; rebuild the index")]
    IndexMismatch { expected: String, found: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl Error {
    /// Wrap any displayable storage-layer failure (LanceDB, Arrow, manifest JSON).
    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
