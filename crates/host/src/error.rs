//! Host Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// A host error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for host operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The named collection does not exist.
    #[display("collection not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// A backing file could not be read or written.
    #[display("I/O error on {}: {_1}", _0.display())]
    Io(PathBuf, #[error(source)] IoError),
    /// Data from the host could not be understood.
    #[display("invalid host data in {}", _0.display())]
    InvalidData(#[error(not(source))] PathBuf),
    /// The host refused the operation (e.g. item unknown to the host).
    #[display("rejected by host: {_0}")]
    Rejected(#[error(not(source))] String),
    /// The host could not be reached or timed out.
    #[display("host unavailable: {_0}")]
    Unavailable(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(..) | Self::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_retryable() {
        assert!(ErrorKind::Unavailable("timeout".into()).is_retryable());
        assert!(!ErrorKind::Rejected("unknown item".into()).is_retryable());
        assert!(!ErrorKind::NotFound("Marvel".into()).is_retryable());
    }

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::NotFound("Marvel".into()).to_string(), "collection not found: Marvel");
        assert_eq!(ErrorKind::InvalidData(PathBuf::from("catalog.json")).to_string(), "invalid host data in catalog.json");
    }
}
