//! Error types for sync passes.
//!
//! Uses [`exn`] for automatic location tracking and error tree construction.
//! Only [`ErrorKind::Catalog`] ends a pass; the other kinds are recorded
//! against a single collection (or a single item) and the pass carries on.

use derive_more::{Display, Error};

/// A sync error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a sync failure.
///
/// ### Fatal Errors
/// - [`ErrorKind::Catalog`]
///
/// ### Recoverable Errors
/// - [`ErrorKind::Membership`] - the named collection is skipped.
/// - [`ErrorKind::Mutation`] - the item is skipped.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The catalog snapshot could not be fetched, so no desired membership
    /// can be computed. Nothing has been mutated when this is raised.
    #[display("failed to fetch the media catalog")]
    Catalog,
    /// Current members of the named collection could not be looked up.
    #[display("failed to look up members of collection '{_0}'")]
    Membership(#[error(not(source))] String),
    /// A single create, add, remove or delete was rejected by the store.
    #[display("failed to {_0}")]
    Mutation(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if this failure ends the whole sync pass.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Catalog)
    }
}
