#![forbid(unsafe_code)]

//! Component tree and mutation listener seam.
//!
//! The tree owns every component of one application instance. It is rooted
//! at a [`ComponentKind::Window`] created with the tree. Components are
//! created detached and become live once attached under the root.
//!
//! Every structural or property mutation is validated up front. Nothing is
//! mutated when validation fails. Once a mutation is committed it is
//! reported synchronously to a caller-supplied [`TreeListener`]. The listener
//! receives a shared borrow of the already-mutated tree, so it can walk
//! parent links, compute depths and snapshot subtrees at the point of
//! mutation.
//!
//! # Invariants
//!
//! 1. A component has at most one parent, and `parent.children` contains it
//!    exactly once.
//! 2. The parent graph is acyclic; the root never has a parent.
//! 3. Child order only changes through explicit insert-at-index.
//! 4. IDs are never reused.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use tracing::{debug, trace};

use crate::id::{ComponentId, ComponentIdAllocator};
use crate::kind::ComponentKind;
use crate::layout_data::{InvalidSpan, LayoutData};
use crate::property::{PropertyChange, PropertyName, PropertyValue};

/// Receives committed tree mutations.
///
/// All methods default to no-ops. `()` is the listener that ignores
/// everything.
pub trait TreeListener {
    /// `child` was attached to `parent`.
    fn component_added(&mut self, tree: &ComponentTree, parent: ComponentId, child: ComponentId) {
        let _ = (tree, parent, child);
    }

    /// `child` was detached from `parent`. Its own subtree is still intact.
    fn component_removed(
        &mut self,
        tree: &ComponentTree,
        parent: ComponentId,
        child: ComponentId,
    ) {
        let _ = (tree, parent, child);
    }

    /// A property value changed.
    fn property_changed(&mut self, tree: &ComponentTree, change: &PropertyChange) {
        let _ = (tree, change);
    }

    /// The layout data of `child` changed.
    fn layout_data_changed(
        &mut self,
        tree: &ComponentTree,
        parent: ComponentId,
        child: ComponentId,
    ) {
        let _ = (tree, parent, child);
    }

    /// The `Visible` property of `component` changed. Delivered before the
    /// matching [`TreeListener::property_changed`].
    fn visibility_changed(&mut self, tree: &ComponentTree, component: ComponentId) {
        let _ = (tree, component);
    }
}

impl TreeListener for () {}

#[derive(Debug, Clone)]
struct Node {
    kind: ComponentKind,
    parent: Option<ComponentId>,
    children: Vec<ComponentId>,
    properties: BTreeMap<PropertyName, PropertyValue>,
    layout_data: Option<LayoutData>,
}

impl Node {
    fn new(kind: ComponentKind) -> Self {
        let mut properties = BTreeMap::new();
        if kind.requires_model() {
            let _ = properties.insert(PropertyName::Model, PropertyValue::Model(Vec::new()));
        }
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            properties,
            layout_data: None,
        }
    }
}

/// Mutable component hierarchy of one application instance.
#[derive(Debug, Clone)]
pub struct ComponentTree {
    root: ComponentId,
    ids: ComponentIdAllocator,
    nodes: HashMap<ComponentId, Node>,
    /// Subtree roots created or detached since the last disposal pass.
    detached: BTreeSet<ComponentId>,
}

impl Default for ComponentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentTree {
    /// Create a tree holding only a root window.
    #[must_use]
    pub fn new() -> Self {
        let root = ComponentId::MIN;
        let mut nodes = HashMap::new();
        let _ = nodes.insert(root, Node::new(ComponentKind::Window));
        Self {
            root,
            ids: ComponentIdAllocator::with_next(root.checked_next().unwrap_or(root)),
            nodes,
            detached: BTreeSet::new(),
        }
    }

    /// The root window.
    #[must_use]
    pub const fn root(&self) -> ComponentId {
        self.root
    }

    /// Create a detached component.
    ///
    /// The component is disposed by the next
    /// [`ComponentTree::dispose_detached`] unless it has a parent by then.
    pub fn create(&mut self, kind: ComponentKind) -> Result<ComponentId, TreeError> {
        let id = self.ids.allocate()?;
        let _ = self.nodes.insert(id, Node::new(kind));
        let _ = self.detached.insert(id);
        trace!(component = %id, kind = kind.name(), "component created");
        Ok(id)
    }

    /// Number of components, attached or not.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn contains(&self, id: ComponentId) -> bool {
        self.nodes.contains_key(&id)
    }

    #[must_use]
    pub fn kind(&self, id: ComponentId) -> Option<ComponentKind> {
        self.nodes.get(&id).map(|node| node.kind)
    }

    #[must_use]
    pub fn parent(&self, id: ComponentId) -> Option<ComponentId> {
        self.nodes.get(&id).and_then(|node| node.parent)
    }

    /// Ordered children; empty for unknown components.
    #[must_use]
    pub fn children(&self, id: ComponentId) -> &[ComponentId] {
        self.nodes
            .get(&id)
            .map_or(&[][..], |node| node.children.as_slice())
    }

    #[must_use]
    pub fn index_of(&self, parent: ComponentId, child: ComponentId) -> Option<usize> {
        self.children(parent).iter().position(|&c| c == child)
    }

    /// Distance to the topmost ancestor (0 for the root).
    #[must_use]
    pub fn depth(&self, id: ComponentId) -> Option<usize> {
        let mut node = self.nodes.get(&id)?;
        let mut depth = 0;
        while let Some(parent) = node.parent {
            depth += 1;
            node = self.nodes.get(&parent)?;
        }
        Some(depth)
    }

    /// Whether `id` is connected to the root.
    #[must_use]
    pub fn is_attached(&self, id: ComponentId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Whether `ancestor` is a strict ancestor of `descendant`.
    #[must_use]
    pub fn is_ancestor_of(&self, ancestor: ComponentId, descendant: ComponentId) -> bool {
        let mut current = self.parent(descendant);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// All strict descendants of `id` in pre-order.
    ///
    /// Uses an explicit stack so arbitrarily deep trees cannot overflow.
    #[must_use]
    pub fn descendants(&self, id: ComponentId) -> Vec<ComponentId> {
        let mut out = Vec::new();
        let mut stack: Vec<ComponentId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Own `Visible` flag (unset means visible).
    #[must_use]
    pub fn is_visible(&self, id: ComponentId) -> bool {
        self.property(id, &PropertyName::Visible)
            .and_then(PropertyValue::as_bool)
            .unwrap_or(true)
    }

    /// Attached, and visible along the whole path to the root.
    #[must_use]
    pub fn is_render_visible(&self, id: ComponentId) -> bool {
        let mut current = id;
        loop {
            if !self.is_visible(current) {
                return false;
            }
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Children whose own `Visible` flag is set.
    pub fn visible_children(&self, id: ComponentId) -> impl Iterator<Item = ComponentId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|&child| self.is_visible(child))
    }

    #[must_use]
    pub fn property(&self, id: ComponentId, name: &PropertyName) -> Option<&PropertyValue> {
        self.nodes.get(&id)?.properties.get(name)
    }

    /// All set properties of `id`, ordered by name.
    pub fn properties(
        &self,
        id: ComponentId,
    ) -> impl Iterator<Item = (&PropertyName, &PropertyValue)> + '_ {
        self.nodes
            .get(&id)
            .into_iter()
            .flat_map(|node| node.properties.iter())
    }

    #[must_use]
    pub fn layout_data(&self, id: ComponentId) -> Option<&LayoutData> {
        self.nodes.get(&id)?.layout_data.as_ref()
    }

    /// Append `child` to `parent`'s children.
    pub fn add<L>(
        &mut self,
        parent: ComponentId,
        child: ComponentId,
        listener: &mut L,
    ) -> Result<(), TreeError>
    where
        L: TreeListener + ?Sized,
    {
        let index = self.children(parent).len();
        let index = if self.parent(child) == Some(parent) {
            index.saturating_sub(1)
        } else {
            index
        };
        self.insert(parent, child, index, listener)
    }

    /// Insert `child` at `index` among `parent`'s children.
    ///
    /// A child that already has a parent is detached from it first, which
    /// is reported as a removal before the addition.
    pub fn insert<L>(
        &mut self,
        parent: ComponentId,
        child: ComponentId,
        index: usize,
        listener: &mut L,
    ) -> Result<(), TreeError>
    where
        L: TreeListener + ?Sized,
    {
        let (parent_kind, sibling_count) = {
            let node = self.node(parent)?;
            (node.kind, node.children.len())
        };
        let (child_kind, previous_parent) = {
            let node = self.node(child)?;
            (node.kind, node.parent)
        };
        if child == self.root {
            return Err(TreeError::RootAsChild { root: child });
        }
        if child == parent || self.is_ancestor_of(child, parent) {
            return Err(TreeError::CycleDetected { parent, child });
        }
        if !parent_kind.accepts_child(child_kind) {
            return Err(TreeError::IllegalChild {
                parent,
                parent_kind,
                child,
                child_kind,
            });
        }
        let moving_within = previous_parent == Some(parent);
        let len = sibling_count - usize::from(moving_within);
        if let Some(max) = parent_kind.max_children()
            && len >= max
        {
            return Err(TreeError::CapacityExceeded {
                parent,
                kind: parent_kind,
                max,
            });
        }
        if index > len {
            return Err(TreeError::IndexOutOfBounds { parent, index, len });
        }

        if let Some(previous) = previous_parent {
            self.unlink(previous, child);
            listener.component_removed(self, previous, child);
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.insert(index, child);
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        let _ = self.detached.remove(&child);
        listener.component_added(self, parent, child);
        Ok(())
    }

    /// Detach `child` from `parent`.
    ///
    /// The detached subtree stays in the tree until re-attached or disposed
    /// by [`ComponentTree::dispose_detached`].
    pub fn remove<L>(
        &mut self,
        parent: ComponentId,
        child: ComponentId,
        listener: &mut L,
    ) -> Result<(), TreeError>
    where
        L: TreeListener + ?Sized,
    {
        let _ = self.node(parent)?;
        if self.node(child)?.parent != Some(parent) {
            return Err(TreeError::NotAChild { parent, child });
        }
        self.unlink(parent, child);
        let _ = self.detached.insert(child);
        listener.component_removed(self, parent, child);
        Ok(())
    }

    /// Detach every child of `parent`, first to last.
    pub fn remove_all<L>(&mut self, parent: ComponentId, listener: &mut L) -> Result<(), TreeError>
    where
        L: TreeListener + ?Sized,
    {
        let children = self.node(parent)?.children.clone();
        for child in children {
            self.remove(parent, child, listener)?;
        }
        Ok(())
    }

    /// Write a property, notifying `listener` if the value changed.
    ///
    /// Writing `Null` unsets the property. Returns the committed change, or
    /// `None` when the value was already equal.
    pub fn set_property<L>(
        &mut self,
        id: ComponentId,
        name: PropertyName,
        value: PropertyValue,
        listener: &mut L,
    ) -> Result<Option<PropertyChange>, TreeError>
    where
        L: TreeListener + ?Sized,
    {
        let old = self.write_property(id, &name, value.clone())?;
        if old == value {
            return Ok(None);
        }
        let change = PropertyChange {
            component: id,
            name,
            old,
            new: value,
        };
        if change.name == PropertyName::Visible {
            listener.visibility_changed(self, id);
        }
        listener.property_changed(self, &change);
        Ok(Some(change))
    }

    /// Write a property without notifying any listener.
    ///
    /// Used to apply client-originated input, which the client already
    /// displays. Returns the previous value.
    pub fn apply_input(
        &mut self,
        id: ComponentId,
        name: &PropertyName,
        value: PropertyValue,
    ) -> Result<PropertyValue, TreeError> {
        self.write_property(id, name, value)
    }

    /// Replace the layout data of `id`. Returns whether it changed.
    pub fn set_layout_data<L>(
        &mut self,
        id: ComponentId,
        data: Option<LayoutData>,
        listener: &mut L,
    ) -> Result<bool, TreeError>
    where
        L: TreeListener + ?Sized,
    {
        let node = self.node_mut(id)?;
        if node.layout_data == data {
            return Ok(false);
        }
        node.layout_data = data;
        let parent = node.parent;
        if let Some(parent) = parent {
            listener.layout_data_changed(self, parent, id);
        }
        Ok(true)
    }

    /// Drop every subtree that was created or removed and is still parentless.
    ///
    /// Returns the disposed IDs (subtree roots first, then descendants in
    /// pre-order).
    pub fn dispose_detached(&mut self) -> Vec<ComponentId> {
        let candidates = std::mem::take(&mut self.detached);
        let mut disposed = Vec::new();
        for id in candidates {
            if !self.contains(id) || self.parent(id).is_some() {
                continue;
            }
            disposed.push(id);
            disposed.extend(self.descendants(id));
        }
        for id in &disposed {
            let _ = self.nodes.remove(id);
        }
        if !disposed.is_empty() {
            debug!(count = disposed.len(), "disposed detached components");
        }
        disposed
    }

    fn node(&self, id: ComponentId) -> Result<&Node, TreeError> {
        self.nodes
            .get(&id)
            .ok_or(TreeError::MissingComponent { id })
    }

    fn node_mut(&mut self, id: ComponentId) -> Result<&mut Node, TreeError> {
        self.nodes
            .get_mut(&id)
            .ok_or(TreeError::MissingComponent { id })
    }

    fn write_property(
        &mut self,
        id: ComponentId,
        name: &PropertyName,
        value: PropertyValue,
    ) -> Result<PropertyValue, TreeError> {
        let node = self.node_mut(id)?;
        if *name == PropertyName::Model && value.is_null() && node.kind.requires_model() {
            return Err(TreeError::RequiredProperty {
                id,
                kind: node.kind,
                name: name.clone(),
            });
        }
        let old = if value.is_null() {
            node.properties.remove(name)
        } else {
            node.properties.insert(name.clone(), value)
        };
        Ok(old.unwrap_or_default())
    }

    fn unlink(&mut self, parent: ComponentId, child: ComponentId) {
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.retain(|&c| c != child);
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = None;
        }
    }
}

/// Programming errors raised synchronously by tree mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    ZeroComponentId,
    ComponentIdOverflow {
        current: ComponentId,
    },
    MissingComponent {
        id: ComponentId,
    },
    RootAsChild {
        root: ComponentId,
    },
    CycleDetected {
        parent: ComponentId,
        child: ComponentId,
    },
    IllegalChild {
        parent: ComponentId,
        parent_kind: ComponentKind,
        child: ComponentId,
        child_kind: ComponentKind,
    },
    CapacityExceeded {
        parent: ComponentId,
        kind: ComponentKind,
        max: usize,
    },
    NotAChild {
        parent: ComponentId,
        child: ComponentId,
    },
    IndexOutOfBounds {
        parent: ComponentId,
        index: usize,
        len: usize,
    },
    RequiredProperty {
        id: ComponentId,
        kind: ComponentKind,
        name: PropertyName,
    },
    InvalidSpan(InvalidSpan),
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroComponentId => write!(f, "component id 0 is invalid"),
            Self::ComponentIdOverflow { current } => {
                write!(f, "component id overflow after {}", current.get())
            }
            Self::MissingComponent { id } => write!(f, "component {id} not found"),
            Self::RootAsChild { root } => {
                write!(f, "root component {root} cannot become a child")
            }
            Self::CycleDetected { parent, child } => write!(
                f,
                "adding {child} to {parent} would create a cycle"
            ),
            Self::IllegalChild {
                parent,
                parent_kind,
                child,
                child_kind,
            } => write!(
                f,
                "{} {parent} does not accept {} {child} as a child",
                parent_kind.name(),
                child_kind.name()
            ),
            Self::CapacityExceeded { parent, kind, max } => write!(
                f,
                "{} {parent} already holds its maximum of {max} children",
                kind.name()
            ),
            Self::NotAChild { parent, child } => {
                write!(f, "{child} is not a child of {parent}")
            }
            Self::IndexOutOfBounds { parent, index, len } => write!(
                f,
                "insert index {index} out of bounds for {parent} with {len} children"
            ),
            Self::RequiredProperty { id, kind, name } => write!(
                f,
                "{} {id} requires a non-null {name} property",
                kind.name()
            ),
            Self::InvalidSpan(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for TreeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidSpan(err) => Some(err),
            _ => None,
        }
    }
}

impl From<InvalidSpan> for TreeError {
    fn from(err: InvalidSpan) -> Self {
        Self::InvalidSpan(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Added(ComponentId, ComponentId),
        Removed(ComponentId, ComponentId),
        Property(ComponentId, PropertyName),
        LayoutData(ComponentId, ComponentId),
        Visibility(ComponentId),
    }

    #[derive(Default)]
    struct Recorder(Vec<Event>);

    impl TreeListener for Recorder {
        fn component_added(&mut self, _: &ComponentTree, parent: ComponentId, child: ComponentId) {
            self.0.push(Event::Added(parent, child));
        }

        fn component_removed(
            &mut self,
            tree: &ComponentTree,
            parent: ComponentId,
            child: ComponentId,
        ) {
            assert_eq!(tree.parent(child), None, "link must be cut before notify");
            self.0.push(Event::Removed(parent, child));
        }

        fn property_changed(&mut self, _: &ComponentTree, change: &PropertyChange) {
            self.0.push(Event::Property(change.component, change.name.clone()));
        }

        fn layout_data_changed(
            &mut self,
            _: &ComponentTree,
            parent: ComponentId,
            child: ComponentId,
        ) {
            self.0.push(Event::LayoutData(parent, child));
        }

        fn visibility_changed(&mut self, _: &ComponentTree, component: ComponentId) {
            self.0.push(Event::Visibility(component));
        }
    }

    fn build() -> (ComponentTree, ComponentId, ComponentId, ComponentId) {
        let mut tree = ComponentTree::new();
        let content = tree.create(ComponentKind::ContentPane).expect("create");
        let row = tree.create(ComponentKind::Row).expect("create");
        let label = tree.create(ComponentKind::Label).expect("create");
        tree.add(tree.root(), content, &mut ()).expect("add content");
        tree.add(content, row, &mut ()).expect("add row");
        tree.add(row, label, &mut ()).expect("add label");
        (tree, content, row, label)
    }

    #[test]
    fn depth_and_ancestry_follow_parent_links() {
        let (tree, content, row, label) = build();
        assert_eq!(tree.depth(tree.root()), Some(0));
        assert_eq!(tree.depth(label), Some(3));
        assert!(tree.is_ancestor_of(content, label));
        assert!(!tree.is_ancestor_of(label, label));
        assert!(tree.is_attached(row));
        assert_eq!(tree.index_of(content, row), Some(0));
    }

    #[test]
    fn descendants_are_pre_order() {
        let (mut tree, content, row, label) = build();
        let button = tree.create(ComponentKind::Button).expect("create");
        tree.add(content, button, &mut ()).expect("add");
        assert_eq!(tree.descendants(content), vec![row, label, button]);
    }

    #[test]
    fn insert_respects_index() {
        let (mut tree, _, row, label) = build();
        let first = tree.create(ComponentKind::Button).expect("create");
        tree.insert(row, first, 0, &mut ()).expect("insert");
        assert_eq!(tree.children(row), &[first, label]);
        let extra = tree.create(ComponentKind::Label).expect("create");
        let err = tree
            .insert(row, extra, 5, &mut ())
            .expect_err("index past end");
        assert_eq!(
            err,
            TreeError::IndexOutOfBounds {
                parent: row,
                index: 5,
                len: 2
            }
        );
    }

    #[test]
    fn reparenting_reports_remove_then_add() {
        let (mut tree, content, row, label) = build();
        let mut recorder = Recorder::default();
        tree.add(content, label, &mut recorder).expect("reparent");
        assert_eq!(
            recorder.0,
            vec![Event::Removed(row, label), Event::Added(content, label)]
        );
        assert_eq!(tree.parent(label), Some(content));
        assert!(tree.children(row).is_empty());
    }

    #[test]
    fn moving_within_parent_keeps_single_entry() {
        let (mut tree, _, row, label) = build();
        let other = tree.create(ComponentKind::Label).expect("create");
        tree.add(row, other, &mut ()).expect("add");
        tree.add(row, label, &mut ()).expect("move to end");
        assert_eq!(tree.children(row), &[other, label]);
    }

    #[test]
    fn cycles_are_rejected() {
        let (mut tree, content, row, _) = build();
        assert_eq!(
            tree.add(row, content, &mut ()),
            Err(TreeError::CycleDetected {
                parent: row,
                child: content
            })
        );
        assert_eq!(
            tree.add(row, row, &mut ()),
            Err(TreeError::CycleDetected {
                parent: row,
                child: row
            })
        );
    }

    #[test]
    fn illegal_children_are_rejected() {
        let (mut tree, _, _, label) = build();
        let button = tree.create(ComponentKind::Button).expect("create");
        let err = tree.add(label, button, &mut ()).expect_err("label is a leaf");
        assert!(matches!(err, TreeError::IllegalChild { .. }));
        let root = tree.root();
        let err = tree.add(label, root, &mut ()).expect_err("root is never a child");
        assert_eq!(err, TreeError::RootAsChild { root });
    }

    #[test]
    fn window_capacity_is_enforced() {
        let (mut tree, _, _, _) = build();
        let second = tree.create(ComponentKind::ContentPane).expect("create");
        let err = tree.add(tree.root(), second, &mut ()).expect_err("one content pane");
        assert!(matches!(err, TreeError::CapacityExceeded { max: 1, .. }));
    }

    #[test]
    fn remove_requires_membership() {
        let (mut tree, content, _, label) = build();
        assert_eq!(
            tree.remove(content, label, &mut ()),
            Err(TreeError::NotAChild {
                parent: content,
                child: label
            })
        );
    }

    #[test]
    fn equal_writes_do_not_notify() {
        let (mut tree, _, _, label) = build();
        let mut recorder = Recorder::default();
        let change = tree
            .set_property(label, PropertyName::Text, "a".into(), &mut recorder)
            .expect("set");
        assert_eq!(change.map(|c| c.old), Some(PropertyValue::Null));
        let change = tree
            .set_property(label, PropertyName::Text, "a".into(), &mut recorder)
            .expect("set");
        assert!(change.is_none());
        assert_eq!(recorder.0, vec![Event::Property(label, PropertyName::Text)]);
    }

    #[test]
    fn visibility_is_reported_before_property() {
        let (mut tree, _, row, _) = build();
        let mut recorder = Recorder::default();
        let _ = tree
            .set_property(row, PropertyName::Visible, false.into(), &mut recorder)
            .expect("hide");
        assert_eq!(
            recorder.0,
            vec![
                Event::Visibility(row),
                Event::Property(row, PropertyName::Visible)
            ]
        );
    }

    #[test]
    fn render_visibility_considers_ancestors() {
        let (mut tree, _, row, label) = build();
        assert!(tree.is_render_visible(label));
        let _ = tree
            .set_property(row, PropertyName::Visible, false.into(), &mut ())
            .expect("hide");
        assert!(!tree.is_render_visible(label));
        assert!(tree.is_visible(label));
    }

    #[test]
    fn apply_input_is_silent() {
        let (mut tree, _, _, label) = build();
        let old = tree
            .apply_input(label, &PropertyName::Text, "typed".into())
            .expect("apply");
        assert_eq!(old, PropertyValue::Null);
        assert_eq!(
            tree.property(label, &PropertyName::Text),
            Some(&PropertyValue::from("typed"))
        );
    }

    #[test]
    fn list_hosts_cannot_lose_their_model() {
        let mut tree = ComponentTree::new();
        let list = tree.create(ComponentKind::ListBox).expect("create");
        assert_eq!(
            tree.property(list, &PropertyName::Model),
            Some(&PropertyValue::Model(Vec::new()))
        );
        let err = tree
            .set_property(list, PropertyName::Model, PropertyValue::Null, &mut ())
            .expect_err("model is required");
        assert!(matches!(err, TreeError::RequiredProperty { .. }));
    }

    #[test]
    fn layout_data_notifies_parent() {
        let (mut tree, _, row, label) = build();
        let mut recorder = Recorder::default();
        let data = LayoutData::new().with_row_span(2).expect("valid span");
        assert!(tree
            .set_layout_data(label, Some(data.clone()), &mut recorder)
            .expect("set"));
        assert!(!tree
            .set_layout_data(label, Some(data), &mut recorder)
            .expect("set"));
        assert_eq!(recorder.0, vec![Event::LayoutData(row, label)]);
    }

    #[test]
    fn dispose_drops_only_unreattached_subtrees() {
        let (mut tree, content, row, label) = build();
        let kept = tree.create(ComponentKind::Button).expect("create");
        tree.add(row, kept, &mut ()).expect("add");
        tree.remove(content, row, &mut ()).expect("remove row");
        tree.remove(row, kept, &mut ()).expect("remove button");
        tree.add(content, kept, &mut ()).expect("re-attach button");

        let disposed = tree.dispose_detached();
        assert_eq!(disposed, vec![row, label]);
        assert!(!tree.contains(label));
        assert!(tree.contains(kept));
        assert!(tree.dispose_detached().is_empty());
    }

    #[test]
    fn dispose_drops_components_never_attached() {
        let (mut tree, content, _, _) = build();
        let orphan = tree.create(ComponentKind::Column).expect("create");
        let inner = tree.create(ComponentKind::Label).expect("create");
        tree.add(orphan, inner, &mut ()).expect("add");
        let used = tree.create(ComponentKind::Button).expect("create");
        tree.add(content, used, &mut ()).expect("add");

        let disposed = tree.dispose_detached();
        assert_eq!(disposed, vec![orphan, inner]);
        assert!(!tree.contains(orphan));
        assert!(!tree.contains(inner));
        assert!(tree.contains(used));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add { parent: usize, child: usize },
        Remove { child: usize },
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..12, 0usize..12).prop_map(|(parent, child)| Op::Add { parent, child }),
            (0usize..12).prop_map(|child| Op::Remove { child }),
        ]
    }

    proptest! {
        #[test]
        fn random_mutations_preserve_link_invariants(ops in proptest::collection::vec(op_strategy(), 1..64)) {
            let mut tree = ComponentTree::new();
            let content = tree.create(ComponentKind::ContentPane).expect("create");
            tree.add(tree.root(), content, &mut ()).expect("add");
            let mut pool = vec![content];
            for _ in 0..11 {
                pool.push(tree.create(ComponentKind::Column).expect("create"));
            }

            for op in ops {
                match op {
                    Op::Add { parent, child } => {
                        let _ = tree.add(pool[parent], pool[child], &mut ());
                    }
                    Op::Remove { child } => {
                        if let Some(parent) = tree.parent(pool[child]) {
                            tree.remove(parent, pool[child], &mut ()).expect("member");
                        }
                    }
                }
            }

            for &id in &pool {
                if let Some(parent) = tree.parent(id) {
                    let occurrences = tree.children(parent).iter().filter(|&&c| c == id).count();
                    prop_assert_eq!(occurrences, 1);
                    prop_assert!(!tree.is_ancestor_of(id, parent));
                }
                for &child in tree.children(id) {
                    prop_assert_eq!(tree.parent(child), Some(id));
                }
                prop_assert!(tree.depth(id).is_some());
            }
        }
    }
}
