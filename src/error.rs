//! Errors surfaced by the compress and decompress operations.

use std::fmt;

/// Boxed cause carried by archive failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("operation was cancelled")]
    Cancelled,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("exactly {expected} item is supported for decompression, got {actual}")]
    Cardinality { expected: usize, actual: usize },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("payload must contain a valid ZIP archive")]
    InvalidArchive(#[source] BoxError),

    #[error("cannot build ZIP archive")]
    ArchiveBuild(#[source] BoxError),

    #[error("plugin is not initialized")]
    NotInitialized,

    #[error("access denied: {0}")]
    AccessDenied(String),
}

/// Coarse classification of [`Error`], stable across message changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Cancelled,
    InvalidArgument,
    UnsupportedOperation,
    Cardinality,
    DataValidity,
    InvalidState,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Cancelled => ErrorKind::Cancelled,
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::UnsupportedOperation(_) => ErrorKind::UnsupportedOperation,
            Error::Cardinality { .. } => ErrorKind::Cardinality,
            Error::InvalidData(_) | Error::InvalidArchive(_) | Error::ArchiveBuild(_) => {
                ErrorKind::DataValidity
            }
            Error::NotInitialized | Error::AccessDenied(_) => ErrorKind::InvalidState,
        }
    }

    pub(crate) fn invalid_archive(err: anyhow::Error) -> Self {
        Error::InvalidArchive(err.into())
    }

    pub(crate) fn archive_build(err: anyhow::Error) -> Self {
        Error::ArchiveBuild(err.into())
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::UnsupportedOperation => "unsupported operation",
            ErrorKind::Cardinality => "cardinality violation",
            ErrorKind::DataValidity => "data validity",
            ErrorKind::InvalidState => "invalid state",
        };
        f.write_str(name)
    }
}
