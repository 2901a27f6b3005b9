//! JSON file host backends.
//!
//! The catalog file is a JSON array of media items; the collection file is a
//! JSON object mapping each collection name to an array of item ids. Both are
//! read with `tokio::fs` and the collection file is rewritten (via a sibling
//! temporary file and a rename) after every successful mutation.

use crate::backend::{Catalog, CollectionStore};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use curate_media::{ItemId, MediaItem};
use exn::ResultExt;
use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;

type Collections = BTreeMap<String, BTreeSet<ItemId>>;

/// Catalog read from a JSON export.
///
/// # Examples
///
/// ```no_run
/// use curate_host::backend::{Catalog, JsonCatalog};
///
/// # async fn example() -> curate_host::error::Result<()> {
/// let catalog = JsonCatalog::new("export", "/srv/media/catalog.json");
/// let items = catalog.fetch().await?;
/// println!("{} items", items.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct JsonCatalog {
    name: String,
    path: PathBuf,
}
impl JsonCatalog {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self { name: name.into(), path: path.into() }
    }
}

#[async_trait]
impl Catalog for JsonCatalog {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<MediaItem>> {
        let bytes = fs::read(&self.path).await.map_err(|e| ErrorKind::Io(self.path.clone(), e))?;
        let items: Vec<MediaItem> =
            serde_json::from_slice(&bytes).or_raise(|| ErrorKind::InvalidData(self.path.clone()))?;
        tracing::debug!(catalog = %self.name, path = %self.path.display(), items = items.len(), "Loaded catalog");
        Ok(items)
    }
}

/// Collection store persisted to a single JSON file.
///
/// The whole file is held in memory behind a [`RwLock`]. A mutation is applied
/// to a copy, written to disk, and only then made visible, so a failed write
/// leaves both the file and the in-memory view unchanged.
pub struct JsonStore {
    name: String,
    path: PathBuf,
    collections: RwLock<Collections>,
}
impl JsonStore {
    /// Open (or start) a collection file. A missing file is an empty store.
    pub async fn open(name: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let collections = match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).or_raise(|| ErrorKind::InvalidData(path.clone()))?,
            Err(e) if e.kind() == IoErrorKind::NotFound => Collections::new(),
            Err(e) => exn::bail!(ErrorKind::Io(path, e)),
        };
        Ok(Self { name: name.into(), path, collections: RwLock::new(collections) })
    }

    async fn persist(path: &Path, collections: &Collections) -> Result<()> {
        let json = serde_json::to_vec_pretty(collections).or_raise(|| ErrorKind::InvalidData(path.to_path_buf()))?;
        let temporary = path.with_extension("json.tmp");
        fs::write(&temporary, json).await.map_err(|e| ErrorKind::Io(temporary.clone(), e))?;
        fs::rename(&temporary, path).await.map_err(|e| ErrorKind::Io(path.to_path_buf(), e))?;
        Ok(())
    }

    /// Apply `change` to a copy of the collections, persist it, then commit.
    async fn mutate(&self, change: impl FnOnce(&mut Collections) -> Result<()> + Send) -> Result<()> {
        let mut guard = self.collections.write().await;
        let mut updated = guard.clone();
        change(&mut updated)?;
        Self::persist(&self.path, &updated).await?;
        *guard = updated;
        Ok(())
    }
}

#[async_trait]
impl CollectionStore for JsonStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn members(&self, collection: &str) -> Result<Option<BTreeSet<ItemId>>> {
        Ok(self.collections.read().await.get(collection).cloned())
    }

    async fn create(&self, collection: &str, initial: &[ItemId]) -> Result<()> {
        self.mutate(|collections| {
            if collections.contains_key(collection) {
                exn::bail!(ErrorKind::Rejected(format!("collection '{collection}' already exists")));
            }
            collections.insert(collection.to_string(), initial.iter().cloned().collect());
            Ok(())
        })
        .await
    }

    async fn add_member(&self, collection: &str, item: &ItemId) -> Result<()> {
        self.mutate(|collections| {
            let members = collections.get_mut(collection).ok_or_else(|| ErrorKind::NotFound(collection.to_string()))?;
            members.insert(item.clone());
            Ok(())
        })
        .await
    }

    async fn remove_member(&self, collection: &str, item: &ItemId) -> Result<()> {
        self.mutate(|collections| {
            let members = collections.get_mut(collection).ok_or_else(|| ErrorKind::NotFound(collection.to_string()))?;
            members.remove(item);
            Ok(())
        })
        .await
    }

    async fn delete(&self, collection: &str) -> Result<()> {
        self.mutate(|collections| match collections.remove(collection) {
            Some(_) => Ok(()),
            None => exn::bail!(ErrorKind::NotFound(collection.to_string())),
        })
        .await
    }
}
