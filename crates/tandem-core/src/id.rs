#![forbid(unsafe_code)]

//! Stable component identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tree::TreeError;

/// Stable identifier for a component.
///
/// `0` is reserved/invalid so IDs are always non-zero. IDs are allocated
/// monotonically per tree and never reused, even after disposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(u64);

impl ComponentId {
    /// Lowest valid component ID.
    pub const MIN: Self = Self(1);

    /// Create a component ID, rejecting 0.
    pub fn new(raw: u64) -> Result<Self, TreeError> {
        if raw == 0 {
            return Err(TreeError::ZeroComponentId);
        }
        Ok(Self(raw))
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Return the next ID, or an error on overflow.
    pub fn checked_next(self) -> Result<Self, TreeError> {
        let Some(next) = self.0.checked_add(1) else {
            return Err(TreeError::ComponentIdOverflow { current: self });
        };
        Self::new(next)
    }
}

impl Default for ComponentId {
    fn default() -> Self {
        Self::MIN
    }
}

/// Renders as the client-side element id (`c_<n>`).
impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c_{}", self.0)
    }
}

/// Monotonic allocator for component IDs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentIdAllocator {
    next: ComponentId,
}

impl ComponentIdAllocator {
    /// Start allocating from a known ID.
    #[must_use]
    pub const fn with_next(next: ComponentId) -> Self {
        Self { next }
    }

    /// Peek at the next ID without consuming.
    #[must_use]
    pub const fn peek(&self) -> ComponentId {
        self.next
    }

    /// Allocate the next ID and advance.
    pub fn allocate(&mut self) -> Result<ComponentId, TreeError> {
        let current = self.next;
        self.next = self.next.checked_next()?;
        Ok(current)
    }
}

impl Default for ComponentIdAllocator {
    fn default() -> Self {
        Self {
            next: ComponentId::MIN,
        }
    }
}
