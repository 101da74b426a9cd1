#![forbid(unsafe_code)]

//! Closed set of component kinds and their capabilities.
//!
//! Widgets are plain property containers; what distinguishes them to the
//! framework is which children they accept, which client inputs they
//! process, and which properties they cannot live without. Those rules are
//! expressed here instead of through a class hierarchy.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::property::PropertyName;

bitflags! {
    /// Capabilities a component kind exposes to the framework.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// No capabilities.
        const NONE            = 0b0000_0000;
        /// May hold child components.
        const CONTAINER       = 0b0000_0001;
        /// Fires actions in response to client input.
        const ACTION_SOURCE   = 0b0000_0010;
        /// Holds a boolean selection state the client may change.
        const SELECTABLE      = 0b0000_0100;
        /// Holds text the client may edit.
        const TEXT_INPUT      = 0b0000_1000;
        /// Hosts a list model and a client-editable selection.
        const LIST_MODEL_HOST = 0b0001_0000;
    }
}

/// Component kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// Top-level window; the root of every tree.
    Window,
    ContentPane,
    WindowPane,
    SplitPane,
    Row,
    Column,
    Grid,
    Label,
    Button,
    CheckBox,
    RadioButton,
    TextField,
    TextArea,
    ListBox,
    SelectField,
    Table,
}

impl ComponentKind {
    /// Stable kind name used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Window => "Window",
            Self::ContentPane => "ContentPane",
            Self::WindowPane => "WindowPane",
            Self::SplitPane => "SplitPane",
            Self::Row => "Row",
            Self::Column => "Column",
            Self::Grid => "Grid",
            Self::Label => "Label",
            Self::Button => "Button",
            Self::CheckBox => "CheckBox",
            Self::RadioButton => "RadioButton",
            Self::TextField => "TextField",
            Self::TextArea => "TextArea",
            Self::ListBox => "ListBox",
            Self::SelectField => "SelectField",
            Self::Table => "Table",
        }
    }

    /// Capabilities of this kind.
    #[must_use]
    pub const fn capabilities(self) -> Capabilities {
        match self {
            Self::Window
            | Self::ContentPane
            | Self::WindowPane
            | Self::SplitPane
            | Self::Row
            | Self::Column
            | Self::Grid => Capabilities::CONTAINER,
            Self::Label => Capabilities::NONE,
            Self::Button => Capabilities::ACTION_SOURCE,
            Self::CheckBox | Self::RadioButton => {
                Capabilities::ACTION_SOURCE.union(Capabilities::SELECTABLE)
            }
            Self::TextField => Capabilities::ACTION_SOURCE.union(Capabilities::TEXT_INPUT),
            Self::TextArea => Capabilities::TEXT_INPUT,
            Self::ListBox | Self::SelectField | Self::Table => {
                Capabilities::ACTION_SOURCE.union(Capabilities::LIST_MODEL_HOST)
            }
        }
    }

    /// Maximum number of children, `None` for unbounded.
    #[must_use]
    pub const fn max_children(self) -> Option<usize> {
        match self {
            Self::Window | Self::WindowPane => Some(1),
            Self::SplitPane => Some(2),
            _ if self.capabilities().contains(Capabilities::CONTAINER) => None,
            _ => Some(0),
        }
    }

    /// Whether a component of kind `child` may be added to this kind.
    #[must_use]
    pub const fn accepts_child(self, child: Self) -> bool {
        match (self, child) {
            (_, Self::Window) => false,
            (Self::Window, Self::ContentPane) => true,
            (Self::Window, _) => false,
            (Self::ContentPane, Self::ContentPane) => false,
            (Self::ContentPane, _) => true,
            (Self::SplitPane, Self::ContentPane) => true,
            (_, Self::ContentPane | Self::WindowPane) => false,
            _ => self.capabilities().contains(Capabilities::CONTAINER),
        }
    }

    /// Whether this kind processes client input for `name`.
    ///
    /// Application-defined properties are always accepted.
    #[must_use]
    pub fn accepts_input(self, name: &PropertyName) -> bool {
        let caps = self.capabilities();
        match name {
            PropertyName::Text => caps.contains(Capabilities::TEXT_INPUT),
            PropertyName::Selected => caps.contains(Capabilities::SELECTABLE),
            PropertyName::Selection => caps.contains(Capabilities::LIST_MODEL_HOST),
            PropertyName::Custom(_) => true,
            _ => false,
        }
    }

    /// Whether this kind requires a non-null `Model` property.
    #[must_use]
    pub const fn requires_model(self) -> bool {
        self.capabilities().contains(Capabilities::LIST_MODEL_HOST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_accepts_only_content_pane() {
        assert!(ComponentKind::Window.accepts_child(ComponentKind::ContentPane));
        assert!(!ComponentKind::Window.accepts_child(ComponentKind::Row));
        assert_eq!(ComponentKind::Window.max_children(), Some(1));
    }

    #[test]
    fn leaves_take_no_children() {
        assert_eq!(ComponentKind::Label.max_children(), Some(0));
        assert!(!ComponentKind::Label.accepts_child(ComponentKind::Button));
    }

    #[test]
    fn nothing_accepts_a_window() {
        assert!(!ComponentKind::ContentPane.accepts_child(ComponentKind::Window));
        assert!(!ComponentKind::Row.accepts_child(ComponentKind::Window));
    }

    #[test]
    fn window_pane_lives_in_content_pane_only() {
        assert!(ComponentKind::ContentPane.accepts_child(ComponentKind::WindowPane));
        assert!(!ComponentKind::Column.accepts_child(ComponentKind::WindowPane));
    }

    #[test]
    fn input_acceptance_follows_capabilities() {
        assert!(ComponentKind::TextField.accepts_input(&PropertyName::Text));
        assert!(!ComponentKind::Label.accepts_input(&PropertyName::Text));
        assert!(ComponentKind::CheckBox.accepts_input(&PropertyName::Selected));
        assert!(ComponentKind::ListBox.accepts_input(&PropertyName::Selection));
        assert!(!ComponentKind::Button.accepts_input(&PropertyName::Foreground));
        assert!(ComponentKind::Label.accepts_input(&PropertyName::custom("scroll")));
    }

    #[test]
    fn list_hosts_require_models() {
        assert!(ComponentKind::ListBox.requires_model());
        assert!(ComponentKind::Table.requires_model());
        assert!(!ComponentKind::TextField.requires_model());
    }
}
