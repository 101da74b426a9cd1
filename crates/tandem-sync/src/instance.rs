#![forbid(unsafe_code)]

//! Application instance: one session's tree, update manager and observers.
//!
//! Every mutation goes through the instance so the update manager sees it.
//! A request is served by [`ApplicationInstance::synchronize`]:
//!
//! 1. drop stale server records and activate the instance,
//! 2. apply the client's message (input, action, focus),
//! 3. run application code,
//! 4. snapshot the server updates,
//! 5. purge and dispose detached components.

use serde::{Deserialize, Serialize};
use tandem_core::{
    Capabilities, ComponentId, ComponentKind, ComponentTree, LayoutData, PropertyChange,
    PropertyName, PropertyValue, TreeError,
};
use tracing::{debug, info_span, trace};

use crate::client::{ClientAction, ClientInput, ClientMessage};
use crate::config::SyncConfig;
use crate::context::{ActiveInstance, InstanceId};
use crate::manager::UpdateManager;
use crate::observer::{
    ActionEvent, ActionObserver, ChangeOrigin, Observers, PropertyChangeEvent,
    PropertyChangeObserver,
};
use crate::update::ServerComponentUpdate;

/// Result of one synchronization cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub instance: InstanceId,
    /// Re-render from the root; `updates` then only carries removals.
    pub full_refresh: bool,
    /// Records in render order (parents first).
    pub updates: Vec<ServerComponentUpdate>,
    /// Components dropped from the tree at the end of the cycle.
    pub disposed: Vec<ComponentId>,
}

/// One session's component tree and its change tracking.
#[derive(Debug)]
pub struct ApplicationInstance {
    id: InstanceId,
    tree: ComponentTree,
    updates: UpdateManager,
    observers: Observers,
    content_pane: ComponentId,
    focused: Option<ComponentId>,
}

impl ApplicationInstance {
    /// Create an instance whose root window holds an empty content pane.
    pub fn new(config: SyncConfig) -> Result<Self, TreeError> {
        let mut tree = ComponentTree::new();
        let mut updates = UpdateManager::new(config);
        let content_pane = tree.create(ComponentKind::ContentPane)?;
        tree.add(tree.root(), content_pane, &mut updates)?;
        updates.purge();
        let id = InstanceId::next();
        debug!(instance = %id, "application instance created");
        Ok(Self {
            id,
            tree,
            updates,
            observers: Observers::default(),
            content_pane,
            focused: None,
        })
    }

    #[must_use]
    pub const fn id(&self) -> InstanceId {
        self.id
    }

    /// Read-only view of the tree; mutate through the instance.
    #[must_use]
    pub const fn tree(&self) -> &ComponentTree {
        &self.tree
    }

    #[must_use]
    pub const fn config(&self) -> &SyncConfig {
        self.updates.config()
    }

    #[must_use]
    pub const fn updates(&self) -> &UpdateManager {
        &self.updates
    }

    #[must_use]
    pub const fn root(&self) -> ComponentId {
        self.tree.root()
    }

    #[must_use]
    pub const fn content_pane(&self) -> ComponentId {
        self.content_pane
    }

    #[must_use]
    pub const fn focused(&self) -> Option<ComponentId> {
        self.focused
    }

    /// Activate this instance on the current thread until the guard drops.
    pub fn enter(&mut self) -> ActiveInstance<'_> {
        ActiveInstance::new(self)
    }

    pub fn create(&mut self, kind: ComponentKind) -> Result<ComponentId, TreeError> {
        self.tree.create(kind)
    }

    pub fn add(&mut self, parent: ComponentId, child: ComponentId) -> Result<(), TreeError> {
        self.tree.add(parent, child, &mut self.updates)
    }

    pub fn insert(
        &mut self,
        parent: ComponentId,
        child: ComponentId,
        index: usize,
    ) -> Result<(), TreeError> {
        self.tree.insert(parent, child, index, &mut self.updates)
    }

    pub fn remove(&mut self, parent: ComponentId, child: ComponentId) -> Result<(), TreeError> {
        self.tree.remove(parent, child, &mut self.updates)
    }

    pub fn remove_all(&mut self, parent: ComponentId) -> Result<(), TreeError> {
        self.tree.remove_all(parent, &mut self.updates)
    }

    /// Write a property and notify its observers.
    pub fn set_property(
        &mut self,
        component: ComponentId,
        name: PropertyName,
        value: impl Into<PropertyValue>,
    ) -> Result<Option<PropertyChange>, TreeError> {
        let change = self
            .tree
            .set_property(component, name, value.into(), &mut self.updates)?;
        if let Some(change) = &change {
            self.observers.notify_property(&PropertyChangeEvent {
                change: change.clone(),
                origin: ChangeOrigin::Server,
            });
        }
        Ok(change)
    }

    pub fn set_layout_data(
        &mut self,
        component: ComponentId,
        data: Option<LayoutData>,
    ) -> Result<bool, TreeError> {
        self.tree.set_layout_data(component, data, &mut self.updates)
    }

    /// Replace the root window's content pane.
    pub fn set_content_pane(&mut self, pane: ComponentId) -> Result<(), TreeError> {
        if pane == self.content_pane {
            return Ok(());
        }
        let root = self.tree.root();
        self.tree.remove(root, self.content_pane, &mut self.updates)?;
        self.tree.add(root, pane, &mut self.updates)?;
        self.content_pane = pane;
        Ok(())
    }

    pub fn add_property_observer<O>(&mut self, component: ComponentId, observer: O)
    where
        O: PropertyChangeObserver + 'static,
    {
        self.observers.add_property(component, Box::new(observer));
    }

    pub fn add_action_observer<O>(&mut self, component: ComponentId, observer: O)
    where
        O: ActionObserver + 'static,
    {
        self.observers.add_action(component, Box::new(observer));
    }

    /// Queue input the client reported for `component.name`.
    pub fn add_client_property_update(
        &mut self,
        component: ComponentId,
        name: PropertyName,
        value: impl Into<PropertyValue>,
    ) {
        self.updates
            .client_mut()
            .add_client_property_update(component, name, value.into());
    }

    pub fn set_client_action(&mut self, action: ClientAction) {
        self.updates.client_mut().set_action(action);
    }

    pub fn set_client_focus(&mut self, component: ComponentId) {
        self.updates.client_mut().set_focus(component);
    }

    /// Apply queued client input, then fire the queued action and move focus.
    ///
    /// Input for components that no longer exist, are detached, or do not
    /// accept that property is ignored. Applied input is not reported back
    /// to the client.
    pub fn process_client_updates(&mut self) -> Result<(), TreeError> {
        for update in self.updates.client_mut().take_pending() {
            let (component, name, value) = (update.component, update.name, update.value);
            let Some(kind) = self.tree.kind(component) else {
                trace!(%component, %name, "client update for unknown component");
                continue;
            };
            if !self.tree.is_attached(component) || !kind.accepts_input(&name) {
                trace!(%component, %name, kind = kind.name(), "client update ignored");
                continue;
            }

            let current = self
                .tree
                .property(component, &name)
                .cloned()
                .unwrap_or_default();
            let baseline = self
                .updates
                .client()
                .applied(component, &name)
                .map(|input| input.baseline.clone())
                .or_else(|| {
                    self.updates
                        .server()
                        .original_value(component, &name)
                        .cloned()
                })
                .unwrap_or_else(|| current.clone());

            let old = self.tree.apply_input(component, &name, value.clone())?;
            self.updates
                .server_mut()
                .cancel_property_update(component, &name);
            self.updates.client_mut().record_applied(
                component,
                name.clone(),
                ClientInput {
                    value: value.clone(),
                    baseline,
                },
            );
            if old != value {
                self.observers.notify_property(&PropertyChangeEvent {
                    change: PropertyChange {
                        component,
                        name,
                        old,
                        new: value,
                    },
                    origin: ChangeOrigin::Client,
                });
            }
        }

        if let Some(action) = self.updates.client_mut().take_action() {
            self.process_client_action(action)?;
        }
        if let Some(focus) = self.updates.client_mut().take_focus() {
            if self.tree.is_attached(focus) {
                self.focused = Some(focus);
            } else {
                trace!(component = %focus, "focus on detached component ignored");
            }
        }
        Ok(())
    }

    fn process_client_action(&mut self, action: ClientAction) -> Result<(), TreeError> {
        let source = action.component;
        let is_source = self
            .tree
            .kind(source)
            .is_some_and(|kind| kind.capabilities().contains(Capabilities::ACTION_SOURCE));
        if !is_source || !self.tree.is_attached(source) {
            trace!(component = %source, "client action ignored");
            return Ok(());
        }
        let event = ActionEvent {
            source,
            command: action.command,
        };
        let mut observers = self.observers.take_action(source);
        let mut result = Ok(());
        for observer in &mut observers {
            result = observer.action_performed(self, &event);
            if result.is_err() {
                break;
            }
        }
        self.observers.restore_action(source, observers);
        result
    }

    /// Pending server updates, parents first.
    #[must_use]
    pub fn server_component_updates(&self) -> Vec<&ServerComponentUpdate> {
        self.updates.server().server_component_updates(&self.tree)
    }

    #[must_use]
    pub fn is_full_refresh_required(&self) -> bool {
        self.updates.server().is_full_refresh_required()
    }

    pub fn process_full_refresh(&mut self) {
        self.updates.server_mut().process_full_refresh(&self.tree);
    }

    /// Discard all recorded updates and client input.
    pub fn purge(&mut self) {
        self.updates.purge();
    }

    /// Drop detached subtrees and their observers.
    pub fn dispose_detached(&mut self) -> Vec<ComponentId> {
        let disposed = self.tree.dispose_detached();
        for &component in &disposed {
            self.observers.forget(component);
            if self.focused == Some(component) {
                self.focused = None;
            }
        }
        disposed
    }

    /// Run one full request cycle.
    ///
    /// Input queued through [`Self::add_client_property_update`],
    /// [`Self::set_client_action`] or [`Self::set_client_focus`] before the
    /// call is applied together with `message`; the message wins where both
    /// report the same property.
    ///
    /// A successful cycle purges tracked state before returning; an error
    /// from `handler` leaves partial updates that the next cycle discards.
    pub fn synchronize<F, E>(&mut self, message: ClientMessage, handler: F) -> Result<SyncOutcome, E>
    where
        F: FnOnce(&mut ApplicationInstance) -> Result<(), E>,
        E: From<TreeError>,
    {
        let span = info_span!("sync_cycle", instance = %self.id);
        let _span = span.enter();

        self.updates.begin_cycle();
        let mut active = self.enter();
        active.updates.client_mut().add_message(message);
        active.process_client_updates()?;
        handler(&mut *active)?;

        let full_refresh = active.is_full_refresh_required();
        let updates: Vec<ServerComponentUpdate> = active
            .server_component_updates()
            .into_iter()
            .cloned()
            .collect();
        active.purge();
        let disposed = active.dispose_detached();
        debug!(
            full_refresh,
            updates = updates.len(),
            disposed = disposed.len(),
            "sync cycle complete"
        );
        Ok(SyncOutcome {
            instance: active.id(),
            full_refresh,
            updates,
            disposed,
        })
    }
}
