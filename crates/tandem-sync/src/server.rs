#![forbid(unsafe_code)]

//! Server-side change tracker.
//!
//! [`ServerUpdateManager`] turns the stream of tree mutations of one cycle
//! into a minimal set of [`ServerComponentUpdate`] records.
//!
//! # Rules
//!
//! - Additions are recorded against the parent in the order they happen.
//!   A component that is attached again after a removal is taken back out of
//!   every `removed_descendants` set.
//! - A removal records the child, snapshots its descendants, and drops every
//!   record keyed by a component of the removed subtree. The removals those
//!   records held are folded into the surviving parent.
//! - Property writes keep the pre-cycle value as `old`; a write back to it
//!   cancels the entry.
//! - Updates inside a subtree already queued as added are not recorded,
//!   since the client renders that subtree from scratch.
//! - Detached and (unless configured otherwise) hidden components are not
//!   tracked.
//!
//! # State machine
//!
//! `Normal -> FullRefresh` when the root window's content is replaced or on
//! an explicit [`ServerUpdateManager::process_full_refresh`]. While in full
//! refresh only removals are tracked, so that stale client state can still
//! be disposed. `purge` returns to `Normal`.

use indexmap::IndexMap;
use tandem_core::{ComponentId, ComponentTree, PropertyName, PropertyValue};
use tracing::{debug, trace};

use crate::config::SyncConfig;
use crate::update::ServerComponentUpdate;

/// Records server-side mutations for one cycle.
#[derive(Debug, Clone, Default)]
pub struct ServerUpdateManager {
    config: SyncConfig,
    records: IndexMap<ComponentId, ServerComponentUpdate>,
    /// Present while a full refresh is pending; keyed by the root.
    full_refresh: Option<ServerComponentUpdate>,
}

impl ServerUpdateManager {
    #[must_use]
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            records: IndexMap::new(),
            full_refresh: None,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// `child` was attached to `parent`.
    pub fn process_component_add(
        &mut self,
        tree: &ComponentTree,
        parent: ComponentId,
        child: ComponentId,
    ) {
        self.reconcile_reattached(tree, child);
        if self.full_refresh.is_some() || !self.is_tracked(tree, child) {
            return;
        }
        if self.config.coalesce_added_subtrees && self.is_ancestor_being_added(tree, parent) {
            trace!(%parent, %child, "add inside added subtree");
            return;
        }
        self.record(parent).add_child(child);
    }

    /// `child` was detached from `parent`.
    pub fn process_component_remove(
        &mut self,
        tree: &ComponentTree,
        parent: ComponentId,
        child: ComponentId,
    ) {
        if !self.config.track_hidden_components && !tree.is_visible(child) {
            // Never rendered, or already reported gone when it was hidden.
            self.drop_subtree_records(tree, parent, child);
            return;
        }
        self.record_removal(tree, parent, child);
    }

    /// A property of `component` changed from `old` to `new`.
    ///
    /// `old` must be the value the client last saw, which differs from the
    /// tree's previous value when client input was applied this cycle.
    pub fn process_property_update(
        &mut self,
        tree: &ComponentTree,
        component: ComponentId,
        name: PropertyName,
        old: PropertyValue,
        new: PropertyValue,
    ) {
        if self.full_refresh.is_some() || !self.is_tracked(tree, component) {
            trace!(%component, %name, "untracked property update");
            return;
        }
        if self.config.coalesce_added_subtrees && self.is_ancestor_being_added(tree, component) {
            return;
        }
        self.record(component).update_property(name, old, new);
    }

    /// The layout data of `child` changed.
    pub fn process_layout_data_update(
        &mut self,
        tree: &ComponentTree,
        parent: ComponentId,
        child: ComponentId,
    ) {
        if self.full_refresh.is_some() || !self.is_tracked(tree, child) {
            return;
        }
        if self.config.coalesce_added_subtrees && self.is_ancestor_being_added(tree, child) {
            return;
        }
        self.record(parent).update_layout_data(child);
    }

    /// The `Visible` flag of `component` flipped.
    ///
    /// Without hidden tracking, hiding is a removal and showing an addition.
    pub fn process_visibility_update(&mut self, tree: &ComponentTree, component: ComponentId) {
        if self.config.track_hidden_components {
            return;
        }
        let Some(parent) = tree.parent(component) else {
            return;
        };
        if tree.is_visible(component) {
            self.process_component_add(tree, parent, component);
        } else {
            self.record_removal(tree, parent, component);
        }
    }

    /// Drop a pending property entry, typically because client input made it
    /// moot.
    pub fn cancel_property_update(&mut self, component: ComponentId, name: &PropertyName) {
        if let Some(record) = self.records.get_mut(&component)
            && record.cancel_property(name).is_some()
        {
            trace!(%component, %name, "property update cancelled");
        }
    }

    /// The pre-cycle value of a property with a pending entry.
    #[must_use]
    pub fn original_value(
        &self,
        component: ComponentId,
        name: &PropertyName,
    ) -> Option<&PropertyValue> {
        self.records
            .get(&component)?
            .updated_property(name)
            .map(|update| &update.old)
    }

    /// Non-empty records, parents before children.
    ///
    /// Ties keep discovery order. While a full refresh is pending this is
    /// the single root record carrying the removals.
    #[must_use]
    pub fn server_component_updates(&self, tree: &ComponentTree) -> Vec<&ServerComponentUpdate> {
        if let Some(refresh) = &self.full_refresh {
            return if refresh.is_empty() {
                Vec::new()
            } else {
                vec![refresh]
            };
        }
        let mut updates: Vec<_> = self
            .records
            .values()
            .filter(|record| !record.is_empty() && tree.is_attached(record.parent()))
            .collect();
        updates.sort_by_key(|record| tree.depth(record.parent()).unwrap_or(usize::MAX));
        updates
    }

    /// The record for `component`, if any.
    #[must_use]
    pub fn update_for(&self, component: ComponentId) -> Option<&ServerComponentUpdate> {
        self.records.get(&component)
    }

    #[must_use]
    pub const fn is_full_refresh_required(&self) -> bool {
        self.full_refresh.is_some()
    }

    /// Switch to full refresh, keeping the removals recorded so far.
    pub fn process_full_refresh(&mut self, tree: &ComponentTree) {
        if self.full_refresh.is_some() {
            return;
        }
        let mut refresh = ServerComponentUpdate::new(tree.root());
        for record in self.records.values() {
            refresh.append_removed_descendants(record);
        }
        refresh.retain_removed_descendants(|id| !tree.is_attached(*id));
        debug!(
            discarded = self.records.len(),
            removed = refresh.removed_descendants().len(),
            "full refresh required"
        );
        self.records.clear();
        self.full_refresh = Some(refresh);
    }

    /// Discard everything recorded and return to normal mode.
    pub fn purge(&mut self) {
        if !self.records.is_empty() || self.full_refresh.is_some() {
            debug!(
                records = self.records.len(),
                full_refresh = self.full_refresh.is_some(),
                "purged server updates"
            );
        }
        self.records.clear();
        self.full_refresh = None;
    }

    fn record(&mut self, component: ComponentId) -> &mut ServerComponentUpdate {
        self.records
            .entry(component)
            .or_insert_with(|| ServerComponentUpdate::new(component))
    }

    fn is_tracked(&self, tree: &ComponentTree, component: ComponentId) -> bool {
        if self.config.track_hidden_components {
            tree.is_attached(component)
        } else {
            tree.is_render_visible(component)
        }
    }

    /// Whether `component` itself, or one of its ancestors, is queued as an
    /// added child this cycle.
    fn is_ancestor_being_added(&self, tree: &ComponentTree, component: ComponentId) -> bool {
        let mut child = component;
        while let Some(parent) = tree.parent(child) {
            if self
                .records
                .get(&parent)
                .is_some_and(|record| record.has_added_child(child))
            {
                return true;
            }
            child = parent;
        }
        false
    }

    fn record_removal(&mut self, tree: &ComponentTree, parent: ComponentId, child: ComponentId) {
        if !self.is_tracked(tree, parent) {
            self.drop_subtree_records(tree, parent, child);
            return;
        }
        if self.full_refresh.is_none()
            && self.config.full_refresh_on_root_replace
            && parent == tree.root()
        {
            self.process_full_refresh(tree);
        }

        let descendants = tree.descendants(child);
        if let Some(refresh) = self.full_refresh.as_mut() {
            refresh.extend_removed_descendants(std::iter::once(child));
            refresh.extend_removed_descendants(descendants.iter().copied());
            return;
        }

        let doomed = self.take_records(child, &descendants);
        if self.config.coalesce_added_subtrees && self.is_ancestor_being_added(tree, parent) {
            trace!(%parent, %child, "removal inside added subtree");
            return;
        }
        let record = self.record(parent);
        record.remove_child(child);
        record.extend_removed_descendants(descendants);
        for doomed in &doomed {
            record.append_removed_descendants(doomed);
        }
    }

    /// Drop records of a subtree the client never saw, keeping their
    /// removals on the parent's record if it has one.
    fn drop_subtree_records(&mut self, tree: &ComponentTree, parent: ComponentId, child: ComponentId) {
        let descendants = tree.descendants(child);
        let doomed = self.take_records(child, &descendants);
        if let Some(record) = self.records.get_mut(&parent) {
            for doomed in &doomed {
                record.append_removed_descendants(doomed);
            }
        }
    }

    fn take_records(
        &mut self,
        child: ComponentId,
        descendants: &[ComponentId],
    ) -> Vec<ServerComponentUpdate> {
        let doomed: Vec<_> = std::iter::once(&child)
            .chain(descendants)
            .filter_map(|id| self.records.shift_remove(id))
            .collect();
        if !doomed.is_empty() {
            trace!(%child, dropped = doomed.len(), "dropped records of removed subtree");
        }
        doomed
    }

    fn reconcile_reattached(&mut self, tree: &ComponentTree, child: ComponentId) {
        let mut ids = tree.descendants(child);
        ids.push(child);
        for record in self.records.values_mut() {
            record.reconcile_reattached(&ids);
        }
        if let Some(refresh) = self.full_refresh.as_mut() {
            refresh.reconcile_reattached(&ids);
        }
    }
}
