#![forbid(unsafe_code)]

//! Server and client tracking combined behind the tree listener seam.

use tandem_core::{ComponentId, ComponentTree, PropertyChange, TreeListener};
use tracing::trace;

use crate::client::ClientUpdateManager;
use crate::config::SyncConfig;
use crate::server::ServerUpdateManager;

/// Update manager of one application instance.
///
/// Property writes made after client input was applied to the same
/// property are recorded against the client's pre-input baseline. A write
/// that restores exactly what the client typed cancels the entry.
#[derive(Debug, Clone, Default)]
pub struct UpdateManager {
    server: ServerUpdateManager,
    client: ClientUpdateManager,
}

impl UpdateManager {
    #[must_use]
    pub fn new(config: SyncConfig) -> Self {
        Self {
            server: ServerUpdateManager::new(config),
            client: ClientUpdateManager::new(),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &SyncConfig {
        self.server.config()
    }

    #[must_use]
    pub const fn server(&self) -> &ServerUpdateManager {
        &self.server
    }

    pub fn server_mut(&mut self) -> &mut ServerUpdateManager {
        &mut self.server
    }

    #[must_use]
    pub const fn client(&self) -> &ClientUpdateManager {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut ClientUpdateManager {
        &mut self.client
    }

    /// Start a cycle: drop server records and last cycle's applied input.
    ///
    /// Client input queued since then is kept for this cycle.
    pub fn begin_cycle(&mut self) {
        self.server.purge();
        self.client.clear_applied();
    }

    /// Clear both sides.
    pub fn purge(&mut self) {
        self.server.purge();
        self.client.purge();
    }
}

impl TreeListener for UpdateManager {
    fn component_added(&mut self, tree: &ComponentTree, parent: ComponentId, child: ComponentId) {
        self.server.process_component_add(tree, parent, child);
    }

    fn component_removed(&mut self, tree: &ComponentTree, parent: ComponentId, child: ComponentId) {
        self.server.process_component_remove(tree, parent, child);
    }

    fn property_changed(&mut self, tree: &ComponentTree, change: &PropertyChange) {
        let PropertyChange {
            component,
            name,
            old,
            new,
        } = change;
        let baseline = match self.client.applied(*component, name) {
            Some(input) if input.value == *new => {
                trace!(%component, %name, "server write matches client input");
                self.server.cancel_property_update(*component, name);
                return;
            }
            Some(input) => input.baseline.clone(),
            None => old.clone(),
        };
        self.server
            .process_property_update(tree, *component, name.clone(), baseline, new.clone());
    }

    fn layout_data_changed(&mut self, tree: &ComponentTree, parent: ComponentId, child: ComponentId) {
        self.server.process_layout_data_update(tree, parent, child);
    }

    fn visibility_changed(&mut self, tree: &ComponentTree, component: ComponentId) {
        self.server.process_visibility_update(tree, component);
    }
}
