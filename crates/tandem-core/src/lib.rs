#![forbid(unsafe_code)]

//! Core: component identities, kinds, properties, layout data, and the
//! component tree with its mutation listener seam.

pub mod id;
pub mod kind;
pub mod layout_data;
pub mod logging;
pub mod property;
pub mod tree;

pub use id::{ComponentId, ComponentIdAllocator};
pub use kind::{Capabilities, ComponentKind};
pub use layout_data::{Alignment, GridSpan, InvalidSpan, LayoutData, SpanAxis};
pub use logging::{LogFormat, LoggingConfig, LoggingError};
pub use property::{
    Color, Extent, ExtentUnit, Orientation, PropertyChange, PropertyName, PropertyValue,
};
pub use tree::{ComponentTree, TreeError, TreeListener};
