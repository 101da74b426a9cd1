#![forbid(unsafe_code)]

//! Property keys and values.
//!
//! Properties are keyed by a small closed enum rather than free-form strings.
//! Application-specific state still fits through [`PropertyName::Custom`].
//! Values are a closed variant set so that equality (which drives update
//! cancellation) is structural and cheap.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::ComponentId;

/// Property key.
///
/// Serialized as its display name (`"text"`, `"columnWidth[2]"`) so it can
/// key JSON maps.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum PropertyName {
    Text,
    Enabled,
    Visible,
    Foreground,
    Background,
    Icon,
    Selected,
    /// Selected indices of a list model host.
    Selection,
    /// Item list backing a list model host.
    Model,
    Width,
    Height,
    /// Declared column count of a grid (row count when vertical).
    Size,
    Orientation,
    Title,
    ToolTipText,
    /// Indexed grid column width.
    ColumnWidth(u16),
    /// Indexed grid row height.
    RowHeight(u16),
    /// Application-defined property.
    Custom(String),
}

impl PropertyName {
    /// Build an application-defined property name.
    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    fn parse(raw: &str) -> Self {
        match raw {
            "text" => Self::Text,
            "enabled" => Self::Enabled,
            "visible" => Self::Visible,
            "foreground" => Self::Foreground,
            "background" => Self::Background,
            "icon" => Self::Icon,
            "selected" => Self::Selected,
            "selection" => Self::Selection,
            "model" => Self::Model,
            "width" => Self::Width,
            "height" => Self::Height,
            "size" => Self::Size,
            "orientation" => Self::Orientation,
            "title" => Self::Title,
            "toolTipText" => Self::ToolTipText,
            _ => parse_indexed(raw, "columnWidth")
                .map(Self::ColumnWidth)
                .or_else(|| parse_indexed(raw, "rowHeight").map(Self::RowHeight))
                .unwrap_or_else(|| Self::Custom(raw.to_string())),
        }
    }
}

fn parse_indexed(raw: &str, prefix: &str) -> Option<u16> {
    raw.strip_prefix(prefix)?
        .strip_prefix('[')?
        .strip_suffix(']')?
        .parse()
        .ok()
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Enabled => f.write_str("enabled"),
            Self::Visible => f.write_str("visible"),
            Self::Foreground => f.write_str("foreground"),
            Self::Background => f.write_str("background"),
            Self::Icon => f.write_str("icon"),
            Self::Selected => f.write_str("selected"),
            Self::Selection => f.write_str("selection"),
            Self::Model => f.write_str("model"),
            Self::Width => f.write_str("width"),
            Self::Height => f.write_str("height"),
            Self::Size => f.write_str("size"),
            Self::Orientation => f.write_str("orientation"),
            Self::Title => f.write_str("title"),
            Self::ToolTipText => f.write_str("toolTipText"),
            Self::ColumnWidth(index) => write!(f, "columnWidth[{index}]"),
            Self::RowHeight(index) => write!(f, "rowHeight[{index}]"),
            Self::Custom(name) => f.write_str(name),
        }
    }
}

impl From<PropertyName> for String {
    fn from(name: PropertyName) -> Self {
        name.to_string()
    }
}

impl From<String> for PropertyName {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

/// Unit of an [`Extent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtentUnit {
    Px,
    Percent,
    Em,
}

/// A length with a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent {
    pub value: i32,
    pub unit: ExtentUnit,
}

impl Extent {
    #[must_use]
    pub const fn px(value: i32) -> Self {
        Self {
            value,
            unit: ExtentUnit::Px,
        }
    }

    #[must_use]
    pub const fn percent(value: i32) -> Self {
        Self {
            value,
            unit: ExtentUnit::Percent,
        }
    }

    #[must_use]
    pub const fn em(value: i32) -> Self {
        Self {
            value,
            unit: ExtentUnit::Em,
        }
    }

    /// Sum two extents; `None` when the units differ.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        if self.unit != other.unit {
            return None;
        }
        Some(Self {
            value: self.value.saturating_add(other.value),
            unit: self.unit,
        })
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            ExtentUnit::Px => write!(f, "{}px", self.value),
            ExtentUnit::Percent => write!(f, "{}%", self.value),
            ExtentUnit::Em => write!(f, "{}em", self.value),
        }
    }
}

/// 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Layout direction for flow containers such as grids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Cells fill rows left to right, then wrap.
    #[default]
    Horizontal,
    /// Cells fill columns top to bottom, then wrap.
    Vertical,
}

/// Property value.
///
/// `Null` stands for "unset"; writing `Null` removes the property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    Color(Color),
    Extent(Extent),
    Orientation(Orientation),
    Selection(Vec<u32>),
    Model(Vec<String>),
}

impl PropertyValue {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_extent(&self) -> Option<Extent> {
        match self {
            Self::Extent(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_orientation(&self) -> Option<Orientation> {
        match self {
            Self::Orientation(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Color> for PropertyValue {
    fn from(value: Color) -> Self {
        Self::Color(value)
    }
}

impl From<Extent> for PropertyValue {
    fn from(value: Extent) -> Self {
        Self::Extent(value)
    }
}

impl From<Orientation> for PropertyValue {
    fn from(value: Orientation) -> Self {
        Self::Orientation(value)
    }
}

/// A committed property change on one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyChange {
    pub component: ComponentId,
    pub name: PropertyName,
    pub old: PropertyValue,
    pub new: PropertyValue,
}
