#![forbid(unsafe_code)]

//! Typed observers for property changes and client actions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tandem_core::{ComponentId, PropertyChange, TreeError};

use crate::instance::ApplicationInstance;

/// Where a property change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOrigin {
    /// Application code.
    Server,
    /// Client input applied during `process_client_updates`.
    Client,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyChangeEvent {
    pub change: PropertyChange,
    pub origin: ChangeOrigin,
}

/// An action fired by the client on an action source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionEvent {
    pub source: ComponentId,
    pub command: Option<String>,
}

/// Observes property changes of one component.
pub trait PropertyChangeObserver {
    fn property_changed(&mut self, event: &PropertyChangeEvent);
}

impl<F> PropertyChangeObserver for F
where
    F: FnMut(&PropertyChangeEvent),
{
    fn property_changed(&mut self, event: &PropertyChangeEvent) {
        self(event);
    }
}

/// Reacts to actions fired on one component.
///
/// Observers get the whole instance and may mutate the tree; those
/// mutations are tracked like any other server write.
pub trait ActionObserver {
    fn action_performed(
        &mut self,
        app: &mut ApplicationInstance,
        event: &ActionEvent,
    ) -> Result<(), TreeError>;
}

impl<F> ActionObserver for F
where
    F: FnMut(&mut ApplicationInstance, &ActionEvent) -> Result<(), TreeError>,
{
    fn action_performed(
        &mut self,
        app: &mut ApplicationInstance,
        event: &ActionEvent,
    ) -> Result<(), TreeError> {
        self(app, event)
    }
}

type ActionObservers = Vec<Box<dyn ActionObserver>>;

/// Per-component observer registry.
#[derive(Default)]
pub(crate) struct Observers {
    property: HashMap<ComponentId, Vec<Box<dyn PropertyChangeObserver>>>,
    action: HashMap<ComponentId, ActionObservers>,
}

impl Observers {
    pub(crate) fn add_property(
        &mut self,
        component: ComponentId,
        observer: Box<dyn PropertyChangeObserver>,
    ) {
        self.property.entry(component).or_default().push(observer);
    }

    pub(crate) fn add_action(&mut self, component: ComponentId, observer: Box<dyn ActionObserver>) {
        self.action.entry(component).or_default().push(observer);
    }

    pub(crate) fn notify_property(&mut self, event: &PropertyChangeEvent) {
        if let Some(observers) = self.property.get_mut(&event.change.component) {
            for observer in observers {
                observer.property_changed(event);
            }
        }
    }

    /// Detach the action observers of `source` so they can borrow the
    /// instance mutably.
    pub(crate) fn take_action(&mut self, source: ComponentId) -> ActionObservers {
        self.action.remove(&source).unwrap_or_default()
    }

    /// Put observers back, ahead of any registered during dispatch.
    pub(crate) fn restore_action(&mut self, source: ComponentId, mut observers: ActionObservers) {
        if let Some(added) = self.action.remove(&source) {
            observers.extend(added);
        }
        if !observers.is_empty() {
            let _ = self.action.insert(source, observers);
        }
    }

    pub(crate) fn forget(&mut self, component: ComponentId) {
        let _ = self.property.remove(&component);
        let _ = self.action.remove(&component);
    }

    pub(crate) fn len(&self) -> usize {
        self.property.values().map(Vec::len).sum::<usize>()
            + self.action.values().map(Vec::len).sum::<usize>()
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("registered", &self.len())
            .finish()
    }
}
