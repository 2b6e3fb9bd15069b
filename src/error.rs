//! The crate's error taxonomy, one variant per kind the filesystem API can surface.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced at the [`crate::driver::StorageDriver`] boundary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The path failed validation, or is the wrong kind (file vs directory) for the operation.
    #[error("invalid path {path:?}")]
    InvalidPath {
        /// The offending path.
        path: String,
    },

    /// A metadata lookup returned not-found, or the parent lacks the child in its list.
    #[error("path not found: {path:?}")]
    PathNotFound {
        /// The path that could not be resolved.
        path: String,
    },

    /// `reader` was called with a negative offset.
    #[error("invalid offset {offset} for {path:?}")]
    InvalidOffset {
        /// The path the reader was opened against.
        path: String,
        /// The rejected offset.
        offset: i64,
    },

    /// The splitter/joiner failed, or returned the zero address where that is forbidden.
    #[error("chunk I/O error: {cause}")]
    ChunkIo {
        /// Description of the underlying failure.
        cause: String,
    },

    /// A publish or lookup against the pointer service failed.
    #[error("pointer service error: {cause}")]
    Pointer {
        /// Description of the underlying failure.
        cause: String,
    },

    /// Driver construction parameters were missing or of the wrong type.
    #[error("configuration error: {detail}")]
    Config {
        /// Human-readable description of what was wrong.
        detail: String,
    },

    /// A buffered writer transition was attempted from a terminal state.
    #[error("writer state error: {reason}")]
    WriterState {
        /// Why the transition was rejected.
        reason: String,
    },

    /// The operation's [`crate::context::Context`] was cancelled or its deadline elapsed.
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    pub(crate) fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath { path: path.into() }
    }

    pub(crate) fn path_not_found(path: impl Into<String>) -> Self {
        Self::PathNotFound { path: path.into() }
    }

    pub(crate) fn chunk_io(cause: impl std::fmt::Display) -> Self {
        Self::ChunkIo {
            cause: cause.to_string(),
        }
    }

    pub(crate) fn pointer(cause: impl std::fmt::Display) -> Self {
        Self::Pointer {
            cause: cause.to_string(),
        }
    }

    pub(crate) fn writer_state(reason: impl Into<String>) -> Self {
        Self::WriterState {
            reason: reason.into(),
        }
    }
}
