#![forbid(unsafe_code)]

//! Tandem public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users. It
//! re-exports common types from internal crates and offers a lightweight
//! prelude for day-to-day usage.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use tandem_core::{
    Alignment, Capabilities, Color, ComponentId, ComponentKind, ComponentTree, Extent,
    ExtentUnit, GridSpan, InvalidSpan, LayoutData, LogFormat, LoggingConfig, LoggingError,
    Orientation, PropertyChange, PropertyName, PropertyValue, TreeError, TreeListener,
};

// --- Layout re-exports -----------------------------------------------------

pub use tandem_layout::{GridCell, GridChild, GridError, GridProcessor, GridSlot, GridSpec};

// --- Sync re-exports -------------------------------------------------------

pub use tandem_sync::{
    ActionEvent, ActionObserver, ApplicationInstance, ChangeOrigin, ClientAction, ClientMessage,
    PropertyChangeEvent, PropertyChangeObserver, PropertyUpdate, ServerComponentUpdate,
    SyncConfig, SyncOutcome, UpdateManager,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for Tandem apps.
#[derive(Debug)]
pub enum Error {
    /// Invalid tree mutation.
    Tree(TreeError),
    /// Grid could not be resolved.
    Grid(GridError),
    /// Invalid span in layout data.
    Span(InvalidSpan),
    /// Logging could not be installed.
    Logging(LoggingError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tree(err) => write!(f, "{err}"),
            Self::Grid(err) => write!(f, "{err}"),
            Self::Span(err) => write!(f, "{err}"),
            Self::Logging(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Tree(err) => Some(err),
            Self::Grid(err) => Some(err),
            Self::Span(err) => Some(err),
            Self::Logging(err) => Some(err),
        }
    }
}

impl From<TreeError> for Error {
    fn from(err: TreeError) -> Self {
        Self::Tree(err)
    }
}

impl From<GridError> for Error {
    fn from(err: GridError) -> Self {
        Self::Grid(err)
    }
}

impl From<InvalidSpan> for Error {
    fn from(err: InvalidSpan) -> Self {
        Self::Span(err)
    }
}

impl From<LoggingError> for Error {
    fn from(err: LoggingError) -> Self {
        Self::Logging(err)
    }
}

/// Standard result type for Tandem APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        ApplicationInstance, ClientAction, ClientMessage, ComponentId, ComponentKind, Error,
        GridProcessor, LayoutData, PropertyName, PropertyValue, Result, ServerComponentUpdate,
        SyncConfig, SyncOutcome,
    };

    pub use crate::{core, layout, sync};
}

pub use tandem_core as core;
pub use tandem_layout as layout;
pub use tandem_sync as sync;
