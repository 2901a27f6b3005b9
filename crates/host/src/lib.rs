//! Boundary between curate and the media host.
//!
//! The host owns both the media catalog and the collections. curate only ever
//! talks to it through two traits:
//!
//! - [`Catalog`] — a point-in-time snapshot of every [`MediaItem`](curate_media::MediaItem).
//! - [`CollectionStore`] — lookup and mutation of named collections.
//!
//! Every call is fallible. Failures are reported per call (and therefore per
//! item for membership changes) so that callers can decide what to skip.

pub mod backend;
pub mod error;

pub use crate::backend::{Catalog, CollectionStore};
use std::sync::Arc;

pub type CatalogHandle = Arc<dyn Catalog + Send + Sync>;
pub type StoreHandle = Arc<dyn CollectionStore + Send + Sync>;
