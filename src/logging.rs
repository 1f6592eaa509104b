//! # Structured Logging Module
//!
//! Console logging for bulk runs, either human readable with ANSI colors or
//! one JSON object per event for log shippers.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing_subscriber::{
    fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use crate::config::LoggingSettings;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{other}', expected 'pretty' or 'json'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingOptions {
    /// Filter directive used when `RUST_LOG` is not set, e.g. `info` or `twbulk=debug`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self::from(&LoggingSettings::default())
    }
}

impl From<&LoggingSettings> for LoggingOptions {
    fn from(settings: &LoggingSettings) -> Self {
        Self {
            level: settings.level.clone(),
            format: settings.format,
        }
    }
}

impl LoggingOptions {
    /// `RUST_LOG` wins over the configured level.
    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_logging(options: &LoggingOptions) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let layer = match options.format {
            LogFormat::Pretty => tracing_fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_ansi(true)
                .boxed(),
            LogFormat::Json => tracing_fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .boxed(),
        };

        let subscriber = tracing_subscriber::registry()
            .with(layer)
            .with(options.env_filter());

        // An embedding application may already own the global subscriber.
        if subscriber.try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
            return;
        }

        tracing::debug!(
            level = %options.level,
            format = %options.format,
            "Logging initialized"
        );
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("PRETTY".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_options_from_settings() {
        let settings = LoggingSettings {
            level: "twbulk=debug".to_string(),
            format: LogFormat::Json,
        };
        let options = LoggingOptions::from(&settings);
        assert_eq!(options.level, "twbulk=debug");
        assert_eq!(options.format, LogFormat::Json);
        assert_eq!(LoggingOptions::default().format, LogFormat::Pretty);
    }

    #[test]
    fn test_init_is_idempotent() {
        init_logging(&LoggingOptions::default());
        init_logging(&LoggingOptions {
            level: "debug".to_string(),
            format: LogFormat::Json,
        });
    }
}
