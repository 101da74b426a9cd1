#![forbid(unsafe_code)]

//! Per-component update records.
//!
//! A [`ServerComponentUpdate`] collects everything that happened to one
//! component during a cycle: children added and removed, the subtrees torn
//! down by those removals, property changes, and children whose layout data
//! changed. Records are created on the first mutation touching their
//! component and destroyed at purge.
//!
//! All sets are insertion ordered so renderers see mutations in the order
//! they happened.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tandem_core::{ComponentId, PropertyName, PropertyValue};

/// Net change of one property within a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyUpdate {
    /// Value at the start of the cycle.
    pub old: PropertyValue,
    /// Most recent value.
    pub new: PropertyValue,
}

/// Accumulated changes to one component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerComponentUpdate {
    parent: ComponentId,
    added_children: IndexSet<ComponentId>,
    removed_children: IndexSet<ComponentId>,
    removed_descendants: IndexSet<ComponentId>,
    updated_properties: IndexMap<PropertyName, PropertyUpdate>,
    updated_layout_data_children: IndexSet<ComponentId>,
}

impl ServerComponentUpdate {
    #[must_use]
    pub fn new(parent: ComponentId) -> Self {
        Self {
            parent,
            added_children: IndexSet::new(),
            removed_children: IndexSet::new(),
            removed_descendants: IndexSet::new(),
            updated_properties: IndexMap::new(),
            updated_layout_data_children: IndexSet::new(),
        }
    }

    /// The component this record describes.
    #[must_use]
    pub const fn parent(&self) -> ComponentId {
        self.parent
    }

    /// Children added this cycle, in the order they were added.
    #[must_use]
    pub fn added_children(&self) -> &IndexSet<ComponentId> {
        &self.added_children
    }

    #[must_use]
    pub fn has_added_children(&self) -> bool {
        !self.added_children.is_empty()
    }

    #[must_use]
    pub fn has_added_child(&self, child: ComponentId) -> bool {
        self.added_children.contains(&child)
    }

    #[must_use]
    pub fn removed_children(&self) -> &IndexSet<ComponentId> {
        &self.removed_children
    }

    #[must_use]
    pub fn has_removed_children(&self) -> bool {
        !self.removed_children.is_empty()
    }

    /// Every component torn down below the removed children.
    #[must_use]
    pub fn removed_descendants(&self) -> &IndexSet<ComponentId> {
        &self.removed_descendants
    }

    #[must_use]
    pub fn has_removed_descendants(&self) -> bool {
        !self.removed_descendants.is_empty()
    }

    #[must_use]
    pub fn updated_properties(&self) -> &IndexMap<PropertyName, PropertyUpdate> {
        &self.updated_properties
    }

    /// Names of the changed properties, in first-write order.
    pub fn updated_property_names(&self) -> impl Iterator<Item = &PropertyName> + '_ {
        self.updated_properties.keys()
    }

    #[must_use]
    pub fn updated_property(&self, name: &PropertyName) -> Option<&PropertyUpdate> {
        self.updated_properties.get(name)
    }

    #[must_use]
    pub fn has_updated_properties(&self) -> bool {
        !self.updated_properties.is_empty()
    }

    #[must_use]
    pub fn updated_layout_data_children(&self) -> &IndexSet<ComponentId> {
        &self.updated_layout_data_children
    }

    #[must_use]
    pub fn has_updated_layout_data_children(&self) -> bool {
        !self.updated_layout_data_children.is_empty()
    }

    /// No recorded change of any kind.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added_children.is_empty()
            && self.removed_children.is_empty()
            && self.removed_descendants.is_empty()
            && self.updated_properties.is_empty()
            && self.updated_layout_data_children.is_empty()
    }

    pub(crate) fn add_child(&mut self, child: ComponentId) {
        let _ = self.added_children.insert(child);
    }

    /// A child added and removed in the same cycle is still reported as
    /// removed, which is harmless for the client.
    pub(crate) fn remove_child(&mut self, child: ComponentId) {
        let _ = self.added_children.shift_remove(&child);
        let _ = self.updated_layout_data_children.shift_remove(&child);
        let _ = self.removed_children.insert(child);
    }

    pub(crate) fn extend_removed_descendants<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = ComponentId>,
    {
        self.removed_descendants.extend(ids);
    }

    /// Absorb the removals recorded by a record that is being dropped.
    pub(crate) fn append_removed_descendants(&mut self, doomed: &Self) {
        self.removed_descendants
            .extend(doomed.removed_children.iter().copied());
        self.removed_descendants
            .extend(doomed.removed_descendants.iter().copied());
    }

    /// Forget components that ended up attached again.
    pub(crate) fn reconcile_reattached(&mut self, ids: &[ComponentId]) {
        for id in ids {
            let _ = self.removed_descendants.shift_remove(id);
        }
    }

    pub(crate) fn retain_removed_descendants<F>(&mut self, keep: F)
    where
        F: FnMut(&ComponentId) -> bool,
    {
        self.removed_descendants.retain(keep);
    }

    /// Record a write. `old` is the value the client last saw; the first
    /// write of a cycle fixes it, later writes only move `new`. A write
    /// back to the original value cancels the entry.
    pub(crate) fn update_property(
        &mut self,
        name: PropertyName,
        old: PropertyValue,
        new: PropertyValue,
    ) {
        let Some(update) = self.updated_properties.get_mut(&name) else {
            if old != new {
                let _ = self
                    .updated_properties
                    .insert(name, PropertyUpdate { old, new });
            }
            return;
        };
        if update.old != new {
            update.new = new;
            return;
        }
        let _ = self.updated_properties.shift_remove(&name);
    }

    pub(crate) fn cancel_property(&mut self, name: &PropertyName) -> Option<PropertyUpdate> {
        self.updated_properties.shift_remove(name)
    }

    pub(crate) fn update_layout_data(&mut self, child: ComponentId) {
        let _ = self.updated_layout_data_children.insert(child);
    }
}
