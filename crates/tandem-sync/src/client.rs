#![forbid(unsafe_code)]

//! Client-side update intake.
//!
//! The client reports input it has already rendered: typed text, toggled
//! selections, the action it fired, and the focused component. Reported
//! values are applied to the tree silently; the client never needs them
//! echoed back. What the server tracker still needs is the value the client
//! saw *before* typing, so that a later server write in the same cycle is
//! recorded against the right baseline. [`ClientInput`] keeps both.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tandem_core::{ComponentId, PropertyName, PropertyValue};

/// One reported property value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientPropertyUpdate {
    pub component: ComponentId,
    pub name: PropertyName,
    pub value: PropertyValue,
}

/// An action fired on the client (button press, enter in a text field).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientAction {
    pub component: ComponentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl ClientAction {
    #[must_use]
    pub fn new(component: ComponentId) -> Self {
        Self {
            component,
            command: None,
        }
    }

    #[must_use]
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }
}

/// Everything one client request reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMessage {
    #[serde(default)]
    pub properties: Vec<ClientPropertyUpdate>,
    #[serde(default)]
    pub action: Option<ClientAction>,
    #[serde(default)]
    pub focus: Option<ComponentId>,
}

impl ClientMessage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_property(
        mut self,
        component: ComponentId,
        name: PropertyName,
        value: impl Into<PropertyValue>,
    ) -> Self {
        self.properties.push(ClientPropertyUpdate {
            component,
            name,
            value: value.into(),
        });
        self
    }

    #[must_use]
    pub fn with_action(mut self, action: ClientAction) -> Self {
        self.action = Some(action);
        self
    }

    #[must_use]
    pub fn with_focus(mut self, component: ComponentId) -> Self {
        self.focus = Some(component);
        self
    }
}

/// Client input applied to the tree this cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInput {
    /// What the client now displays.
    pub value: PropertyValue,
    /// What the client displayed at the start of the cycle.
    pub baseline: PropertyValue,
}

/// Pending and applied client input for one cycle.
#[derive(Debug, Clone, Default)]
pub struct ClientUpdateManager {
    pending: IndexMap<ComponentId, IndexMap<PropertyName, PropertyValue>>,
    applied: IndexMap<(ComponentId, PropertyName), ClientInput>,
    action: Option<ClientAction>,
    focus: Option<ComponentId>,
}

impl ClientUpdateManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reported value; a later report for the same property wins.
    pub fn add_client_property_update(
        &mut self,
        component: ComponentId,
        name: PropertyName,
        value: PropertyValue,
    ) {
        let _ = self
            .pending
            .entry(component)
            .or_default()
            .insert(name, value);
    }

    pub fn set_action(&mut self, action: ClientAction) {
        self.action = Some(action);
    }

    pub fn set_focus(&mut self, component: ComponentId) {
        self.focus = Some(component);
    }

    /// Queue everything a message carries.
    pub fn add_message(&mut self, message: ClientMessage) {
        for update in message.properties {
            self.add_client_property_update(update.component, update.name, update.value);
        }
        if let Some(action) = message.action {
            self.set_action(action);
        }
        if let Some(focus) = message.focus {
            self.set_focus(focus);
        }
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty() || self.action.is_some() || self.focus.is_some()
    }

    /// Drain queued property reports in arrival order.
    pub fn take_pending(&mut self) -> Vec<ClientPropertyUpdate> {
        std::mem::take(&mut self.pending)
            .into_iter()
            .flat_map(|(component, properties)| {
                properties
                    .into_iter()
                    .map(move |(name, value)| ClientPropertyUpdate {
                        component,
                        name,
                        value,
                    })
            })
            .collect()
    }

    pub fn take_action(&mut self) -> Option<ClientAction> {
        self.action.take()
    }

    pub fn take_focus(&mut self) -> Option<ComponentId> {
        self.focus.take()
    }

    pub(crate) fn record_applied(
        &mut self,
        component: ComponentId,
        name: PropertyName,
        input: ClientInput,
    ) {
        let _ = self.applied.insert((component, name), input);
    }

    /// Input applied to `component.name` this cycle.
    #[must_use]
    pub fn applied(&self, component: ComponentId, name: &PropertyName) -> Option<&ClientInput> {
        self.applied.get(&(component, name.clone()))
    }

    /// Forget input applied in an earlier cycle, keeping queued input.
    pub(crate) fn clear_applied(&mut self) {
        self.applied.clear();
    }

    pub fn purge(&mut self) {
        self.pending.clear();
        self.applied.clear();
        self.action = None;
        self.focus = None;
    }
}
