//! Collection reconciliation.
//!
//! A sync pass takes one catalog snapshot, works out which items every
//! rule-backed collection *should* contain, and converges each collection on
//! that set with the smallest number of store mutations:
//!
//! 1. [`reconcile`] diffs desired against current membership into a [`Plan`].
//! 2. [`apply`] issues the plan's mutations one at a time, recording (not
//!    propagating) per-item failures in a [`CollectionReport`].
//! 3. [`sync`] drives both for every collection as a stream of
//!    [`SyncEvent`]s; [`sync_all`] drains that stream into the
//!    per-collection reports and a [`Summary`].

pub mod error;
mod apply;
mod reconcile;
mod stream;
mod summary;

pub use crate::apply::{CollectionReport, Failure, Operation, apply};
pub use crate::reconcile::{Plan, desired_members, reconcile};
pub use crate::stream::{SyncEvent, sync, sync_all};
pub use crate::summary::Summary;

/// Maximum number of collections reconciled at once, unless configured.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// How a sync pass behaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Plan and report, but never call a mutating store method.
    pub dry_run: bool,
    /// Delete a pre-existing collection once the pass leaves it without
    /// members. Collections are never deleted otherwise.
    pub remove_empty: bool,
    /// Maximum number of collections reconciled at the same time. Mutations
    /// within a single collection are always sequential.
    pub concurrency: usize,
}
impl Default for SyncOptions {
    fn default() -> Self {
        Self { dry_run: false, remove_empty: false, concurrency: DEFAULT_CONCURRENCY }
    }
}
