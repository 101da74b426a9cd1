#![forbid(unsafe_code)]

//! Update tracking configuration.
//!
//! # Env Var Contract
//!
//! - `TANDEM_TRACK_HIDDEN` - track components that are not render-visible
//! - `TANDEM_COALESCE_ADDED` - suppress updates inside subtrees queued as added
//! - `TANDEM_FULL_REFRESH_ON_ROOT_REPLACE` - replacing the root window's
//!   content triggers a full refresh
//!
//! Each accepts `1/true/yes/on` or `0/false/no/off`; anything else keeps the
//! default.

use std::env;

pub const ENV_TRACK_HIDDEN: &str = "TANDEM_TRACK_HIDDEN";
pub const ENV_COALESCE_ADDED: &str = "TANDEM_COALESCE_ADDED";
pub const ENV_FULL_REFRESH_ON_ROOT_REPLACE: &str = "TANDEM_FULL_REFRESH_ON_ROOT_REPLACE";

/// Configuration for an update manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Record updates for components that are not render-visible.
    ///
    /// When false, hiding a component is tracked as its removal and showing
    /// it as its addition.
    pub track_hidden_components: bool,
    /// Drop updates inside a subtree that is already queued as added; the
    /// client renders the whole subtree fresh anyway.
    pub coalesce_added_subtrees: bool,
    /// Removing a direct child of the root window switches to full refresh.
    pub full_refresh_on_root_replace: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            track_hidden_components: false,
            coalesce_added_subtrees: true,
            full_refresh_on_root_replace: true,
        }
    }
}

impl SyncConfig {
    /// Defaults overridden by the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    /// Defaults overridden through a custom environment lookup (for tests).
    #[must_use]
    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            track_hidden_components: env_override_bool(&get_env, ENV_TRACK_HIDDEN)
                .unwrap_or(defaults.track_hidden_components),
            coalesce_added_subtrees: env_override_bool(&get_env, ENV_COALESCE_ADDED)
                .unwrap_or(defaults.coalesce_added_subtrees),
            full_refresh_on_root_replace: env_override_bool(
                &get_env,
                ENV_FULL_REFRESH_ON_ROOT_REPLACE,
            )
            .unwrap_or(defaults.full_refresh_on_root_replace),
        }
    }

    #[must_use]
    pub fn with_track_hidden_components(mut self, enabled: bool) -> Self {
        self.track_hidden_components = enabled;
        self
    }

    #[must_use]
    pub fn with_coalesce_added_subtrees(mut self, enabled: bool) -> Self {
        self.coalesce_added_subtrees = enabled;
        self
    }

    #[must_use]
    pub fn with_full_refresh_on_root_replace(mut self, enabled: bool) -> Self {
        self.full_refresh_on_root_replace = enabled;
        self
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_override_bool<F>(get_env: &F, key: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    get_env(key).and_then(|value| parse_bool(&value))
}
