//! In-memory host backends for testing.

use crate::backend::{Catalog, CollectionStore};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use curate_media::{ItemId, MediaItem};
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;

/// Catalog that returns a fixed list of items (or always fails).
///
/// # Examples
///
/// ```
/// use curate_host::backend::{Catalog, MockCatalog};
/// use curate_media::MediaItem;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let catalog = MockCatalog::with_items([MediaItem::new("1", "Alien")]);
/// assert_eq!(catalog.fetch().await.unwrap().len(), 1);
/// assert!(MockCatalog::default().failing().fetch().await.is_err());
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockCatalog {
    items: Vec<MediaItem>,
    fail: bool,
}
impl MockCatalog {
    pub fn with_items(items: impl IntoIterator<Item = MediaItem>) -> Self {
        Self { items: items.into_iter().collect(), fail: false }
    }

    /// Make every fetch fail as if the host were unreachable.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}
impl Default for MockCatalog {
    fn default() -> Self {
        Self::with_items([])
    }
}

#[async_trait]
impl Catalog for MockCatalog {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self) -> Result<Vec<MediaItem>> {
        match self.fail {
            true => exn::bail!(ErrorKind::Unavailable("mock catalog configured to fail".to_string())),
            false => Ok(self.items.clone()),
        }
    }
}

/// A successful mutation, as recorded by [`MockStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Create(String, Vec<ItemId>),
    Add(String, ItemId),
    Remove(String, ItemId),
    Delete(String),
}

/// In-memory collection store.
///
/// Every successful mutation is appended to a journal so tests can assert on
/// exactly what was issued, in order. Failures can be injected per collection
/// (affecting lookup, creation and deletion) or per item (affecting adds and
/// removes of that item).
#[derive(Default)]
pub struct MockStore {
    collections: RwLock<BTreeMap<String, BTreeSet<ItemId>>>,
    failures: RwLock<BTreeSet<(String, Option<ItemId>)>>,
    journal: RwLock<Vec<Mutation>>,
}
impl MockStore {
    /// Pre-populate a collection.
    pub fn with_collection<I: Into<ItemId>>(mut self, name: impl Into<String>, items: impl IntoIterator<Item = I>) -> Self {
        self.collections.get_mut().insert(name.into(), items.into_iter().map(Into::into).collect());
        self
    }

    /// Fail operations on `collection` (when `item` is `None`) or adds and
    /// removes of `item` in `collection`.
    pub fn with_failure(mut self, collection: impl Into<String>, item: Option<&str>) -> Self {
        self.failures.get_mut().insert((collection.into(), item.map(ItemId::from)));
        self
    }

    /// Current members of a collection, bypassing failure injection.
    pub async fn collection(&self, name: &str) -> Option<BTreeSet<ItemId>> {
        self.collections.read().await.get(name).cloned()
    }

    /// Every successful mutation so far, in order.
    pub async fn journal(&self) -> Vec<Mutation> {
        self.journal.read().await.clone()
    }

    async fn check(&self, collection: &str, item: Option<&ItemId>) -> Result<()> {
        let key = (collection.to_string(), item.cloned());
        match self.failures.read().await.contains(&key) {
            true => exn::bail!(ErrorKind::Rejected(format!("mock failure for {collection}/{item:?}"))),
            false => Ok(()),
        }
    }

    async fn record(&self, mutation: Mutation) {
        self.journal.write().await.push(mutation);
    }
}

#[async_trait]
impl CollectionStore for MockStore {
    fn name(&self) -> &str {
        "mock"
    }

    async fn members(&self, collection: &str) -> Result<Option<BTreeSet<ItemId>>> {
        self.check(collection, None).await?;
        Ok(self.collection(collection).await)
    }

    async fn create(&self, collection: &str, initial: &[ItemId]) -> Result<()> {
        self.check(collection, None).await?;
        let mut guard = self.collections.write().await;
        if guard.contains_key(collection) {
            exn::bail!(ErrorKind::Rejected(format!("collection '{collection}' already exists")));
        }
        guard.insert(collection.to_string(), initial.iter().cloned().collect());
        drop(guard);
        self.record(Mutation::Create(collection.to_string(), initial.to_vec())).await;
        Ok(())
    }

    async fn add_member(&self, collection: &str, item: &ItemId) -> Result<()> {
        self.check(collection, Some(item)).await?;
        let mut guard = self.collections.write().await;
        let members = guard.get_mut(collection).ok_or_else(|| ErrorKind::NotFound(collection.to_string()))?;
        members.insert(item.clone());
        drop(guard);
        self.record(Mutation::Add(collection.to_string(), item.clone())).await;
        Ok(())
    }

    async fn remove_member(&self, collection: &str, item: &ItemId) -> Result<()> {
        self.check(collection, Some(item)).await?;
        let mut guard = self.collections.write().await;
        let members = guard.get_mut(collection).ok_or_else(|| ErrorKind::NotFound(collection.to_string()))?;
        members.remove(item);
        drop(guard);
        self.record(Mutation::Remove(collection.to_string(), item.clone())).await;
        Ok(())
    }

    async fn delete(&self, collection: &str) -> Result<()> {
        self.check(collection, None).await?;
        if self.collections.write().await.remove(collection).is_none() {
            exn::bail!(ErrorKind::NotFound(collection.to_string()));
        }
        self.record(Mutation::Delete(collection.to_string())).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_journal_records_successes_only() {
        let store = MockStore::default().with_collection("A", ["1"]).with_failure("A", Some("2"));
        store.add_member("A", &ItemId::from("3")).await.unwrap();
        assert!(store.add_member("A", &ItemId::from("2")).await.is_err());
        store.remove_member("A", &ItemId::from("1")).await.unwrap();
        assert_eq!(
            store.journal().await,
            vec![Mutation::Add("A".into(), ItemId::from("3")), Mutation::Remove("A".into(), ItemId::from("1"))]
        );
        assert_eq!(store.collection("A").await.unwrap().into_iter().collect::<Vec<_>>(), vec![ItemId::from("3")]);
    }

    #[tokio::test]
    async fn test_collection_level_failure() {
        let store = MockStore::default().with_collection("A", ["1"]).with_failure("A", None);
        assert!(store.members("A").await.is_err());
        assert!(store.delete("A").await.is_err());
        assert!(store.collection("A").await.is_some());
    }
}
