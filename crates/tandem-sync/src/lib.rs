#![forbid(unsafe_code)]

//! Tandem synchronization.
//!
//! This crate keeps a server-side component tree and a remote client in step.
//!
//! # Key Components
//!
//! - [`ApplicationInstance`] - one session: tree, update manager, observers
//! - [`ServerUpdateManager`] - turns server mutations into minimal
//!   [`ServerComponentUpdate`] records
//! - [`ClientUpdateManager`] - queues client input, actions and focus
//! - [`UpdateManager`] - both sides behind the tree listener seam
//! - [`SyncConfig`] - tracking policy, readable from the environment
//!
//! # Cycle
//! [`ApplicationInstance::synchronize`] applies a [`ClientMessage`], runs the
//! application's handler, and returns a [`SyncOutcome`] with the updates the
//! client must render.

pub mod client;
pub mod config;
pub mod context;
pub mod instance;
pub mod manager;
pub mod observer;
pub mod server;
pub mod update;

pub use client::{
    ClientAction, ClientInput, ClientMessage, ClientPropertyUpdate, ClientUpdateManager,
};
pub use config::SyncConfig;
pub use context::{ActiveInstance, InstanceId, active_instance, is_active, with_active};
pub use instance::{ApplicationInstance, SyncOutcome};
pub use manager::UpdateManager;
pub use observer::{
    ActionEvent, ActionObserver, ChangeOrigin, PropertyChangeEvent, PropertyChangeObserver,
};
pub use server::ServerUpdateManager;
pub use update::{PropertyUpdate, ServerComponentUpdate};
