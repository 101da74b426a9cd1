#![forbid(unsafe_code)]

//! Logging configuration.
//!
//! Every crate in the workspace emits structured events through `tracing`
//! and never installs a subscriber on its own. Hosts that do not already
//! manage one can opt into a `tracing-subscriber` fmt subscriber through
//! [`LoggingConfig::install`] (requires the `subscriber` feature).
//!
//! # Env Var Contract
//!
//! - `TANDEM_LOG` - `EnvFilter` directives (default `info`)
//! - `TANDEM_LOG_FORMAT` - `compact` (default) or `json`

use std::env;
use std::fmt;

/// Filter directive environment variable.
pub const LOG_FILTER_ENV: &str = "TANDEM_LOG";
/// Output format environment variable.
pub const LOG_FORMAT_ENV: &str = "TANDEM_LOG_FORMAT";

const DEFAULT_FILTER: &str = "info";

/// Subscriber output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Single-line human readable output.
    #[default]
    Compact,
    /// Newline-delimited JSON.
    Json,
}

impl LogFormat {
    /// Parse a format name; unknown names fall back to compact.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Compact
        }
    }
}

/// Subscriber configuration parsed from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `EnvFilter` directives.
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl LoggingConfig {
    /// Read `TANDEM_LOG` and `TANDEM_LOG_FORMAT`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    #[must_use]
    pub fn from_env_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let filter = lookup(LOG_FILTER_ENV)
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());
        let format = lookup(LOG_FORMAT_ENV)
            .map(|raw| LogFormat::parse(&raw))
            .unwrap_or_default();
        Self { filter, format }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Install a global fmt subscriber.
    ///
    /// # Errors
    ///
    /// Fails when the filter does not parse or a global subscriber is
    /// already installed.
    #[cfg(feature = "subscriber")]
    pub fn install(&self) -> Result<(), LoggingError> {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_new(&self.filter)
            .map_err(|err| LoggingError::InvalidFilter(err.to_string()))?;
        let builder = tracing_subscriber::fmt().with_env_filter(filter);
        let installed = match self.format {
            LogFormat::Compact => builder.compact().try_init(),
            LogFormat::Json => builder.json().try_init(),
        };
        installed.map_err(|_| LoggingError::SubscriberAlreadySet)?;
        tracing::debug!(filter = %self.filter, format = ?self.format, "logging installed");
        Ok(())
    }
}

/// Errors raised while installing a subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingError {
    /// The filter directives did not parse.
    InvalidFilter(String),
    /// A global tracing subscriber is already set.
    SubscriberAlreadySet,
}

impl fmt::Display for LoggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFilter(msg) => write!(f, "invalid log filter: {msg}"),
            Self::SubscriberAlreadySet => {
                write!(f, "a global tracing subscriber is already set")
            }
        }
    }
}

impl std::error::Error for LoggingError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_string())
        }
    }

    #[test]
    fn defaults_without_env() {
        let config = LoggingConfig::from_env_with(|_| None);
        assert_eq!(config, LoggingConfig::default());
    }

    #[test]
    fn reads_filter_and_format() {
        let config = LoggingConfig::from_env_with(lookup(&[
            (LOG_FILTER_ENV, "tandem_sync=trace"),
            (LOG_FORMAT_ENV, "JSON"),
        ]));
        assert_eq!(config.filter, "tandem_sync=trace");
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn blank_filter_falls_back() {
        let config = LoggingConfig::from_env_with(lookup(&[(LOG_FILTER_ENV, "  ")]));
        assert_eq!(config.filter, "info");
    }

    #[test]
    fn unknown_format_is_compact() {
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Compact);
    }

    #[cfg(feature = "subscriber")]
    #[test]
    fn malformed_filter_is_rejected() {
        let err = LoggingConfig::default()
            .with_filter("tandem=notalevel")
            .install()
            .expect_err("filter must not parse");
        assert!(matches!(err, LoggingError::InvalidFilter(_)));
    }
}
