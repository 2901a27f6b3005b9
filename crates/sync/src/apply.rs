use crate::SyncOptions;
use crate::error::{Error, ErrorKind};
use crate::reconcile::Plan;
use curate_host::CollectionStore;
use curate_media::ItemId;
use derive_more::Display;
use exn::ResultExt;
use tracing::instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Operation {
    #[display("create")]
    Create,
    #[display("add")]
    Add,
    #[display("remove")]
    Remove,
    #[display("delete")]
    Delete,
}

/// One mutation the store refused. `item` is `None` for collection-level
/// operations.
#[derive(Debug)]
pub struct Failure {
    pub operation: Operation,
    pub item: Option<ItemId>,
    pub error: Error,
}

/// What happened to one collection during a pass.
///
/// In a dry run, the fields describe what *would* have happened.
#[derive(Debug)]
pub struct CollectionReport {
    pub plan: Plan,
    pub dry_run: bool,
    pub created: bool,
    pub deleted: bool,
    pub added: Vec<ItemId>,
    pub removed: Vec<ItemId>,
    pub failures: Vec<Failure>,
}
impl CollectionReport {
    fn new(plan: Plan, dry_run: bool) -> Self {
        Self { plan, dry_run, created: false, deleted: false, added: vec![], removed: vec![], failures: vec![] }
    }

    pub fn collection(&self) -> &str {
        &self.plan.collection
    }

    pub fn is_changed(&self) -> bool {
        self.created || self.deleted || !self.added.is_empty() || !self.removed.is_empty()
    }

    pub fn is_failed(&self) -> bool {
        !self.failures.is_empty()
    }

    /// A collection that existed before the pass and has no members after it.
    fn is_emptied(&self) -> bool {
        self.plan.exists && self.plan.desired == 0 && self.failures.is_empty()
    }

    fn fail(&mut self, operation: Operation, item: Option<ItemId>, error: Error) {
        tracing::warn!(collection = %self.plan.collection, %operation, item = ?item, error = ?error, "Mutation failed");
        self.failures.push(Failure { operation, item, error });
    }
}

/// Executes `plan` against `store`, one mutation at a time.
///
/// A missing collection is created with every item to add as its initial
/// members. Otherwise items are added and then removed, in id order. A failed
/// mutation is recorded in the report and the remaining ones still go ahead;
/// nothing already applied is rolled back. With
/// [`remove_empty`](SyncOptions::remove_empty), a collection the plan empties
/// completely is deleted afterwards.
#[instrument(skip_all, fields(collection = %plan.collection, dry_run = options.dry_run))]
pub async fn apply(store: &dyn CollectionStore, plan: Plan, options: &SyncOptions) -> CollectionReport {
    let mut report = CollectionReport::new(plan, options.dry_run);
    let collection = report.plan.collection.clone();
    let to_add: Vec<ItemId> = report.plan.to_add.iter().cloned().collect();
    let to_remove: Vec<ItemId> = report.plan.to_remove.iter().cloned().collect();

    if options.dry_run {
        report.created = report.plan.create;
        report.added = to_add;
        report.removed = to_remove;
        report.deleted = options.remove_empty && report.is_emptied();
        return report;
    }

    if report.plan.create {
        match store.create(&collection, &to_add).await.or_raise(|| ErrorKind::Mutation(format!("create '{collection}'"))) {
            Ok(()) => {
                report.created = true;
                report.added = to_add;
            },
            Err(error) => report.fail(Operation::Create, None, error),
        }
        // A new collection has nothing to remove.
        return report;
    }

    for (item, result) in store.add_members(&collection, &to_add).await {
        match result.or_raise(|| ErrorKind::Mutation(format!("add '{item}' to '{collection}'"))) {
            Ok(()) => report.added.push(item),
            Err(error) => report.fail(Operation::Add, Some(item), error),
        }
    }
    for (item, result) in store.remove_members(&collection, &to_remove).await {
        match result.or_raise(|| ErrorKind::Mutation(format!("remove '{item}' from '{collection}'"))) {
            Ok(()) => report.removed.push(item),
            Err(error) => report.fail(Operation::Remove, Some(item), error),
        }
    }

    if options.remove_empty && report.is_emptied() {
        match store.delete(&collection).await.or_raise(|| ErrorKind::Mutation(format!("delete '{collection}'"))) {
            Ok(()) => report.deleted = true,
            Err(error) => report.fail(Operation::Delete, None, error),
        }
    }
    report
}
