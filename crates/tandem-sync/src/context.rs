#![forbid(unsafe_code)]

//! Active application instance tracking.
//!
//! While a cycle runs, its instance is *active* on the current thread so that
//! ambient code can ask which session it is serving. Activation is scoped:
//! [`ApplicationInstance::enter`] returns a guard that deactivates on drop,
//! including during unwinding, so one session's identity never leaks into
//! the next request handled by the same thread.
//!
//! Activations nest; the innermost one is reported.

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::instance::ApplicationInstance;

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of an application instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(u64);

impl InstanceId {
    pub(crate) fn next() -> Self {
        Self(NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance-{}", self.0)
    }
}

thread_local! {
    /// Stack of active instances for this thread.
    static ACTIVE: RefCell<Vec<InstanceId>> = const { RefCell::new(Vec::new()) };
}

/// The innermost active instance on this thread.
#[must_use]
pub fn active_instance() -> Option<InstanceId> {
    ACTIVE.with(|stack| stack.borrow().last().copied())
}

/// Whether `id` is active anywhere on this thread's stack.
#[must_use]
pub fn is_active(id: InstanceId) -> bool {
    ACTIVE.with(|stack| stack.borrow().contains(&id))
}

/// RAII guard keeping an instance active.
///
/// Dereferences to the instance, so the whole cycle can run through it.
#[must_use]
pub struct ActiveInstance<'a> {
    instance: &'a mut ApplicationInstance,
    /// Marker to prevent Send/Sync (thread-local data)
    _marker: PhantomData<*const ()>,
}

impl<'a> ActiveInstance<'a> {
    pub(crate) fn new(instance: &'a mut ApplicationInstance) -> Self {
        let id = instance.id();
        ACTIVE.with(|stack| stack.borrow_mut().push(id));
        tracing::trace!(instance = %id, "instance activated");
        Self {
            instance,
            _marker: PhantomData,
        }
    }
}

impl Deref for ActiveInstance<'_> {
    type Target = ApplicationInstance;

    fn deref(&self) -> &Self::Target {
        &*self.instance
    }
}

impl DerefMut for ActiveInstance<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.instance
    }
}

impl Drop for ActiveInstance<'_> {
    fn drop(&mut self) {
        let id = self.instance.id();
        ACTIVE.with(|stack| {
            let mut stack = stack.borrow_mut();
            let popped = stack.pop();
            debug_assert_eq!(popped, Some(id), "ActiveInstance guards dropped out of order");
        });
        tracing::trace!(instance = %id, "instance deactivated");
    }
}

/// Run `f` with `instance` active.
pub fn with_active<F, R>(instance: &mut ApplicationInstance, f: F) -> R
where
    F: FnOnce(&mut ApplicationInstance) -> R,
{
    let mut active = instance.enter();
    f(&mut active)
}
