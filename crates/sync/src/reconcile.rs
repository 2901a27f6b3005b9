use curate_media::{ItemId, MediaItem};
use curate_rules::CompiledRule;
use std::collections::BTreeSet;
use tracing::instrument;

/// The changes needed to bring one collection in line with its rules.
///
/// Item sets are ordered by [`ItemId`], so executing a plan issues mutations
/// in the same order every time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub collection: String,
    /// The collection existed when the plan was made.
    pub exists: bool,
    /// The collection has to be created (with `to_add` as its first members)
    /// before anything else can happen.
    pub create: bool,
    /// Number of catalog items matched by at least one rule.
    pub desired: usize,
    pub to_add: BTreeSet<ItemId>,
    pub to_remove: BTreeSet<ItemId>,
}
impl Plan {
    /// Nothing to create, add or remove.
    pub fn is_noop(&self) -> bool {
        !self.create && self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Ids of every item in `catalog` that at least one of `rules` matches.
///
/// Rules naming the same collection are a union: an inert rule contributes
/// nothing but does not veto the others.
pub fn desired_members(rules: &[&CompiledRule], catalog: &[MediaItem]) -> BTreeSet<ItemId> {
    catalog.iter().filter(|item| rules.iter().any(|rule| rule.matches(item))).map(|item| item.id.clone()).collect()
}

/// Diffs desired membership against `current`.
///
/// `current` is `None` when the collection does not exist yet. A missing
/// collection is only scheduled for creation when at least one item is
/// desired; an existing collection that ends up empty is left for the caller
/// to deal with.
#[instrument(level = "debug", skip(rules, catalog, current), fields(rules = rules.len(), items = catalog.len()))]
pub fn reconcile(
    collection: &str,
    rules: &[&CompiledRule],
    catalog: &[MediaItem],
    current: Option<&BTreeSet<ItemId>>,
) -> Plan {
    let desired = desired_members(rules, catalog);
    let none = BTreeSet::new();
    let members = current.unwrap_or(&none);
    let to_add: BTreeSet<ItemId> = desired.difference(members).cloned().collect();
    let to_remove: BTreeSet<ItemId> = members.difference(&desired).cloned().collect();
    tracing::debug!(desired = desired.len(), add = to_add.len(), remove = to_remove.len(), "Computed plan");
    Plan {
        collection: collection.to_string(),
        exists: current.is_some(),
        create: current.is_none() && !desired.is_empty(),
        desired: desired.len(),
        to_add,
        to_remove,
    }
}
