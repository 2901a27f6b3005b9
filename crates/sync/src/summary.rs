use crate::apply::CollectionReport;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Totals for a whole sync pass, for whoever triggered it.
///
/// A collection with some failed mutations counts as both updated (if anything
/// else went through) and failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub dry_run: bool,
    pub collections_updated: usize,
    pub collections_unchanged: usize,
    /// Collections that could not be looked up or had a mutation refused.
    pub collections_failed: Vec<String>,
    pub items_added: usize,
    pub items_removed: usize,
    pub mutation_failures: usize,
    pub rules_with_errors: usize,
}
impl Summary {
    pub(crate) fn new(dry_run: bool, rules_with_errors: usize) -> Self {
        Self { dry_run, rules_with_errors, ..Default::default() }
    }

    pub(crate) fn record(&mut self, report: &CollectionReport) {
        match report.is_changed() {
            true => self.collections_updated += 1,
            false => self.collections_unchanged += 1,
        }
        if report.is_failed() {
            self.collections_failed.push(report.collection().to_string());
        }
        self.items_added += report.added.len();
        self.items_removed += report.removed.len();
        self.mutation_failures += report.failures.len();
    }

    pub(crate) fn record_failure(&mut self, collection: &str) {
        self.collections_failed.push(collection.to_string());
    }

    /// No failures of any kind, and every rule compiled.
    pub fn is_clean(&self) -> bool {
        self.collections_failed.is_empty() && self.mutation_failures == 0 && self.rules_with_errors == 0
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.dry_run {
            write!(f, "[dry run] ")?;
        }
        write!(
            f,
            "{} collections updated ({} unchanged, {} failed), {} items added, {} removed, {} rules with errors",
            self.collections_updated,
            self.collections_unchanged,
            self.collections_failed.len(),
            self.items_added,
            self.items_removed,
            self.rules_with_errors,
        )
    }
}
