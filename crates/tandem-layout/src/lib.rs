#![forbid(unsafe_code)]

//! Grid layout resolution.
//!
//! - [`GridProcessor`] - resolves a grid's children and spans into a minimal
//!   cell matrix
//! - [`GridSpec`] - detached grid description, readable from a component tree

pub mod grid;

pub use grid::{GridCell, GridChild, GridError, GridProcessor, GridSlot, GridSpec};
