//! Host traits and implementations.
//!
//! [`Catalog`] and [`CollectionStore`] are the only two ways curate reaches
//! the media host. Implementations provided here:
//!
//! - [`JsonCatalog`] / [`JsonStore`] — plain JSON files on disk, for running
//!   curate against an exported library.
//! - [`MockCatalog`] / [`MockStore`] — in-memory, with failure injection
//!   (behind the `mock` feature).

mod json;
#[cfg(feature = "mock")]
mod mock;

pub use self::json::{JsonCatalog, JsonStore};
#[cfg(feature = "mock")]
pub use self::mock::{MockCatalog, MockStore, Mutation};
use crate::error::Result;
use async_trait::async_trait;
use curate_media::{ItemId, MediaItem};
use std::collections::BTreeSet;

/// Read access to the host's media catalog.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Name of the configured catalog (used for logging only).
    fn name(&self) -> &str;

    /// Fetch a snapshot of every item in the catalog.
    ///
    /// Callers take one snapshot per sync pass and evaluate every rule
    /// against it, so the result must be a consistent point-in-time view.
    async fn fetch(&self) -> Result<Vec<MediaItem>>;
}

/// Lookup and mutation of the host's named collections.
///
/// Mutations on a single collection are issued sequentially by callers;
/// implementations don't need to guard against two concurrent streams of
/// changes to the same collection, but must cope with changes to different
/// collections arriving concurrently.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Name of the configured store (used for logging only).
    fn name(&self) -> &str;

    /// Current members of `collection`, or `None` if it does not exist.
    async fn members(&self, collection: &str) -> Result<Option<BTreeSet<ItemId>>>;

    /// Create `collection` with `initial` as its first members.
    async fn create(&self, collection: &str, initial: &[ItemId]) -> Result<()>;

    /// Add a single item. Adding an existing member is not an error.
    async fn add_member(&self, collection: &str, item: &ItemId) -> Result<()>;

    /// Remove a single item. Removing a non-member is not an error.
    async fn remove_member(&self, collection: &str, item: &ItemId) -> Result<()>;

    /// Delete `collection` entirely.
    async fn delete(&self, collection: &str) -> Result<()>;

    /// Add several items, one at a time, in the given order.
    ///
    /// A failure for one item does not stop the others; the outcome of every
    /// item is returned in order.
    async fn add_members(&self, collection: &str, items: &[ItemId]) -> Vec<(ItemId, Result<()>)> {
        let mut results = Vec::with_capacity(items.len());
        for item in items {
            results.push((item.clone(), self.add_member(collection, item).await));
        }
        results
    }

    /// Remove several items, one at a time, in the given order.
    ///
    /// See [`add_members`](Self::add_members) for failure handling.
    async fn remove_members(&self, collection: &str, items: &[ItemId]) -> Vec<(ItemId, Result<()>)> {
        let mut results = Vec::with_capacity(items.len());
        for item in items {
            results.push((item.clone(), self.remove_member(collection, item).await));
        }
        results
    }
}
