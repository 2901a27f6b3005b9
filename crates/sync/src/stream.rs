use crate::SyncOptions;
use crate::apply::{CollectionReport, apply};
use crate::error::{ErrorKind, Result};
use crate::reconcile::reconcile;
use crate::summary::Summary;
use async_stream::stream;
use curate_host::{CatalogHandle, CollectionStore, StoreHandle};
use curate_media::MediaItem;
use curate_rules::{CompiledRule, CompiledRules};
use exn::ResultExt;
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt};
use std::collections::VecDeque;
use tracing::instrument;

/// Progress events emitted by [`sync`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started) — exactly once.
/// 2. [`CatalogLoaded`](Self::CatalogLoaded) — exactly once, with the number
///    of items in the catalog snapshot.
/// 3. [`Reconciled`](Self::Reconciled) — once per collection named by a rule,
///    in completion order.
/// 4. [`Complete`](Self::Complete) — exactly once, with the pass totals.
///
/// A catalog failure terminates the stream after `Started`, in which case
/// nothing has been mutated and [`Complete`](Self::Complete) is never emitted.
#[derive(Debug)]
pub enum SyncEvent {
    Started,
    CatalogLoaded(u64),
    Reconciled(CollectionReport),
    Complete(Summary),
}

/// Streams [`SyncEvent`]s for one sync pass.
///
/// The catalog is fetched once and every collection is reconciled against
/// that same snapshot. Collections are processed concurrently up to
/// [`concurrency`](SyncOptions::concurrency) at a time, each one issuing its
/// own mutations sequentially. A collection whose members cannot be looked up
/// is surfaced as an `Err` item without terminating the stream; only a
/// catalog failure is fatal.
pub fn sync<'a>(
    catalog: &'a CatalogHandle,
    store: &'a StoreHandle,
    rules: &'a CompiledRules,
    options: &'a SyncOptions,
) -> impl Stream<Item = Result<SyncEvent>> + 'a {
    // Parenthesized so rustfmt still formats the body.
    stream!({
        yield Ok(SyncEvent::Started);

        let items = match catalog.fetch().await.or_raise(|| ErrorKind::Catalog) {
            Ok(items) => items,
            Err(e) => {
                tracing::error!(catalog = catalog.name(), error = ?e, "Sync pass aborted");
                yield Err(e);
                return;
            },
        };
        // Infallible: a usize (either 32- or 64-bit) will always fit in a u64.
        yield Ok(SyncEvent::CatalogLoaded(u64::try_from(items.len()).unwrap_or(0)));

        let mut summary = Summary::new(options.dry_run, rules.diagnostics.len());
        let mut pending: VecDeque<_> = rules
            .by_collection()
            .into_iter()
            .map(|(collection, group)| sync_collection(&**store, collection, group, &items, options))
            .collect();
        let mut processing = FuturesUnordered::new();
        processing.extend(pending.drain(..options.concurrency.max(1).min(pending.len())));
        while let Some(result) = processing.next().await {
            match &result {
                Ok(report) => summary.record(report),
                Err(e) => {
                    if let ErrorKind::Membership(collection) = &**e {
                        summary.record_failure(collection);
                    }
                },
            }
            yield result.map(SyncEvent::Reconciled);
            // Pop-n-push, FIFO.
            if let Some(next) = pending.pop_front() {
                processing.push(next);
            }
        }

        tracing::info!(%summary, "Sync pass complete");
        yield Ok(SyncEvent::Complete(summary));
    })
}

async fn sync_collection(
    store: &dyn CollectionStore,
    collection: &str,
    rules: Vec<&CompiledRule>,
    catalog: &[MediaItem],
    options: &SyncOptions,
) -> Result<CollectionReport> {
    let current = match store.members(collection).await.or_raise(|| ErrorKind::Membership(collection.to_string())) {
        Ok(current) => current,
        Err(e) => {
            tracing::warn!(collection, error = ?e, "Skipping collection");
            return Err(e);
        },
    };
    let plan = reconcile(collection, &rules, catalog, current.as_ref());
    let report = apply(store, plan, options).await;
    tracing::info!(
        collection,
        created = report.created,
        added = report.added.len(),
        removed = report.removed.len(),
        deleted = report.deleted,
        failures = report.failures.len(),
        dry_run = report.dry_run,
        "Reconciled collection"
    );
    Ok(report)
}

/// Runs a whole sync pass and returns the report of every collection that
/// could be reconciled, plus the pass [`Summary`].
///
/// Per-collection failures are already counted in the summary; the only
/// error returned is a fatal one.
#[instrument(skip_all, fields(catalog = catalog.name(), store = store.name(), dry_run = options.dry_run))]
pub async fn sync_all(
    catalog: &CatalogHandle,
    store: &StoreHandle,
    rules: &CompiledRules,
    options: &SyncOptions,
) -> Result<(Vec<CollectionReport>, Summary)> {
    let mut events = Box::pin(sync(catalog, store, rules, options));
    let mut reports = Vec::new();
    let mut fatal = None;
    while let Some(event) = events.next().await {
        match event {
            Ok(SyncEvent::Reconciled(report)) => reports.push(report),
            Ok(SyncEvent::Complete(summary)) => return Ok((reports, summary)),
            Ok(_) => (),
            Err(e) if e.is_fatal() => fatal = Some(e),
            Err(_) => (),
        }
    }
    match fatal {
        Some(e) => Err(e),
        None => exn::bail!(ErrorKind::Catalog),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curate_host::backend::{MockCatalog, MockStore, Mutation};
    use curate_media::ItemId;
    use curate_rules::{ExpressionRule, RuleSet, TitleRule, compile_all};
    use rstest::rstest;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn ids<const N: usize>(values: [&str; N]) -> BTreeSet<ItemId> {
        values.into_iter().map(ItemId::from).collect()
    }

    fn catalog() -> CatalogHandle {
        Arc::new(MockCatalog::with_items([
            MediaItem::new("A", "Alien").with_genres(["Horror", "Science Fiction"]),
            MediaItem::new("B", "The Thing").with_genres(["Horror"]),
            MediaItem::new("C", "Iron Man").with_studio("Marvel Studios").with_genres(["Action"]),
            MediaItem::new("D", "Avengers: Endgame").with_studio("Marvel Studios").with_genres(["Action"]),
        ]))
    }

    fn rules() -> CompiledRules {
        compile_all(&RuleSet {
            title_rules: vec![TitleRule {
                match_value: "Avengers".into(),
                collection: "Marvel Universe".into(),
                case_sensitive: false,
            }],
            expression_rules: vec![
                ExpressionRule {
                    collection: "Marvel Universe".into(),
                    expression: r#"STUDIO "Marvel""#.into(),
                    case_sensitive: false,
                },
                ExpressionRule {
                    collection: "Horror".into(),
                    expression: r#"GENRE "Horror""#.into(),
                    case_sensitive: false,
                },
                ExpressionRule {
                    collection: "Broken".into(),
                    expression: r#"GENRE "Horror" AND"#.into(),
                    case_sensitive: false,
                },
            ],
        })
    }

    #[tokio::test]
    async fn test_event_order() {
        let store: StoreHandle = Arc::new(MockStore::default());
        let (catalog, rules, options) = (catalog(), rules(), SyncOptions::default());
        let events: Vec<_> = sync(&catalog, &store, &rules, &options).collect().await;

        assert_eq!(events.len(), 2 + 3 + 1);
        assert!(matches!(events[0], Ok(SyncEvent::Started)));
        assert!(matches!(events[1], Ok(SyncEvent::CatalogLoaded(4))));
        assert!(events[2..5].iter().all(|event| matches!(event, Ok(SyncEvent::Reconciled(_)))));
        assert!(matches!(events[5], Ok(SyncEvent::Complete(_))));
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(16)]
    #[tokio::test]
    async fn test_sync_all(#[case] concurrency: usize) {
        let mock = Arc::new(MockStore::default().with_collection("Horror", ["B", "C"]));
        let store: StoreHandle = mock.clone();
        let options = SyncOptions { concurrency, ..Default::default() };
        let (reports, summary) = sync_all(&catalog(), &store, &rules(), &options).await.unwrap();

        assert_eq!(reports.len(), 3);
        let horror = reports.iter().find(|report| report.collection() == "Horror").unwrap();
        assert_eq!(horror.plan.to_add, ids(["A"]));
        assert_eq!(horror.plan.to_remove, ids(["C"]));
        assert_eq!(mock.collection("Marvel Universe").await, Some(ids(["C", "D"])));
        assert_eq!(mock.collection("Horror").await, Some(ids(["A", "B"])));
        // Only broken rules: nothing desired, so nothing is created.
        assert_eq!(mock.collection("Broken").await, None);

        assert_eq!(summary.collections_updated, 2);
        assert_eq!(summary.collections_unchanged, 1);
        assert_eq!(summary.items_added, 3);
        assert_eq!(summary.items_removed, 1);
        assert_eq!(summary.rules_with_errors, 1);
        assert!(summary.collections_failed.is_empty());
        assert!(!summary.is_clean());
    }

    #[tokio::test]
    async fn test_second_pass_is_a_noop() {
        let mock = Arc::new(MockStore::default().with_collection("Horror", ["C"]));
        let store: StoreHandle = mock.clone();
        let (catalog, rules, options) = (catalog(), rules(), SyncOptions::default());

        sync_all(&catalog, &store, &rules, &options).await.unwrap();
        let before = mock.journal().await.len();
        let (_, summary) = sync_all(&catalog, &store, &rules, &options).await.unwrap();

        assert_eq!(mock.journal().await.len(), before);
        assert_eq!(summary.collections_updated, 0);
        assert_eq!(summary.collections_unchanged, 3);
    }

    #[tokio::test]
    async fn test_catalog_failure_is_fatal_and_mutates_nothing() {
        let mock = Arc::new(MockStore::default().with_collection("Horror", ["C"]));
        let store: StoreHandle = mock.clone();
        let catalog: CatalogHandle = Arc::new(MockCatalog::default().failing());

        let err = sync_all(&catalog, &store, &rules(), &SyncOptions::default()).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Catalog));
        assert!(err.is_fatal());
        assert!(mock.journal().await.is_empty());

        let options = SyncOptions::default();
        let rules = rules();
        let events: Vec<_> = sync(&catalog, &store, &rules, &options).collect().await;
        assert_eq!(events.len(), 2);
        assert!(events[1].is_err());
    }

    #[tokio::test]
    async fn test_partial_failure_completes_the_pass() {
        let mock = Arc::new(
            MockStore::default()
                .with_collection("Horror", ["A", "B", "C", "D"])
                .with_failure("Horror", Some("C"))
                .with_failure("Marvel Universe", None),
        );
        let store: StoreHandle = mock.clone();
        let (reports, summary) = sync_all(&catalog(), &store, &rules(), &SyncOptions::default()).await.unwrap();

        // Marvel Universe could not be looked up, so only two collections report.
        assert_eq!(reports.len(), 2);
        // C could not be removed, D was.
        assert_eq!(mock.collection("Horror").await, Some(ids(["A", "B", "C"])));
        assert_eq!(mock.journal().await, vec![Mutation::Remove("Horror".into(), "D".into())]);
        assert_eq!(summary.items_removed, 1);
        assert_eq!(summary.mutation_failures, 1);
        let failed: BTreeSet<_> = summary.collections_failed.iter().map(String::as_str).collect();
        assert_eq!(failed, BTreeSet::from(["Horror", "Marvel Universe"]));
    }

    #[tokio::test]
    async fn test_dry_run() {
        let mock = Arc::new(MockStore::default().with_collection("Horror", ["C"]));
        let store: StoreHandle = mock.clone();
        let options = SyncOptions { dry_run: true, ..Default::default() };
        let (_, summary) = sync_all(&catalog(), &store, &rules(), &options).await.unwrap();

        assert!(summary.dry_run);
        assert_eq!(summary.items_added, 4);
        assert_eq!(summary.items_removed, 1);
        assert!(mock.journal().await.is_empty());
        assert_eq!(mock.collection("Marvel Universe").await, None);
    }
}
