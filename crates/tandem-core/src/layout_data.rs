#![forbid(unsafe_code)]

//! Layout data: per-child values interpreted by the parent.
//!
//! Changing a child's layout data affects how its *parent* renders it, so
//! the tree reports these changes against the parent rather than as
//! ordinary property updates.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::property::{Color, Extent};

/// Axis a span applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanAxis {
    Column,
    Row,
}

/// Number of grid cells a child occupies along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridSpan {
    /// Exactly this many cells (always >= 1).
    Cells(u16),
    /// The remainder of the current row. Row spans treat this as 1.
    Fill,
}

impl GridSpan {
    /// Single cell.
    pub const ONE: Self = Self::Cells(1);

    /// Validate a raw span; values below 1 are rejected.
    ///
    /// Values above `u16::MAX` saturate; grids clamp oversized spans anyway.
    pub fn new(axis: SpanAxis, raw: i32) -> Result<Self, InvalidSpan> {
        if raw < 1 {
            return Err(InvalidSpan { axis, value: raw });
        }
        Ok(Self::Cells(u16::try_from(raw).unwrap_or(u16::MAX)))
    }
}

impl Default for GridSpan {
    fn default() -> Self {
        Self::ONE
    }
}

/// A span below 1 was supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidSpan {
    pub axis: SpanAxis,
    pub value: i32,
}

impl fmt::Display for InvalidSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid {:?} span {}: spans must be >= 1",
            self.axis, self.value
        )
    }
}

impl std::error::Error for InvalidSpan {}

/// Alignment of a child within its cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Start,
    Center,
    End,
}

/// Layout data attached to a child component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayoutData {
    pub column_span: GridSpan,
    pub row_span: GridSpan,
    pub alignment: Option<Alignment>,
    pub background: Option<Color>,
    pub insets: Option<Extent>,
}

impl LayoutData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the column span from a raw value.
    pub fn with_column_span(mut self, span: i32) -> Result<Self, InvalidSpan> {
        self.column_span = GridSpan::new(SpanAxis::Column, span)?;
        Ok(self)
    }

    /// Set the row span from a raw value.
    pub fn with_row_span(mut self, span: i32) -> Result<Self, InvalidSpan> {
        self.row_span = GridSpan::new(SpanAxis::Row, span)?;
        Ok(self)
    }

    /// Fill the remainder of the row.
    #[must_use]
    pub fn with_column_fill(mut self) -> Self {
        self.column_span = GridSpan::Fill;
        self
    }

    #[must_use]
    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = Some(alignment);
        self
    }

    #[must_use]
    pub fn with_background(mut self, background: Color) -> Self {
        self.background = Some(background);
        self
    }

    #[must_use]
    pub fn with_insets(mut self, insets: Extent) -> Self {
        self.insets = Some(insets);
        self
    }
}
