//! # Configuration
//!
//! Layered configuration for bulk runs: built-in defaults, an optional user
//! file and `TWBULK__` environment overrides, merged by [`ConfigLoader`].
//!
//! Nothing here is looked up implicitly. The user file path is always handed
//! to the loader by the caller.
//!
//! ```rust,no_run
//! use twbulk::config::ConfigLoader;
//!
//! # fn main() -> twbulk::Result<()> {
//! let config = ConfigLoader::new()
//!     .with_user_file("twbulk.toml")
//!     .load()?;
//! let credentials = config.api.app_credentials()?;
//! println!("chunk size {}", config.bulk.chunk_size);
//! # let _ = credentials;
//! # Ok(())
//! # }
//! ```

pub mod loader;

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_FILENAME_TEMPLATE};
use crate::error::{BulkError, Result};
use crate::logging::LogFormat;
use crate::template::FilenameTemplate;

pub use loader::ConfigLoader;

/// Root configuration mirroring `config/defaults.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BulkConfig {
    /// Remote API credentials
    #[serde(default)]
    pub api: ApiConfig,

    /// Bulk runner settings
    #[serde(default)]
    pub bulk: BulkSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl BulkConfig {
    /// Reject settings that would only fail once a run is under way.
    pub fn validate(&self) -> Result<()> {
        if self.bulk.chunk_size == 0 {
            return Err(BulkError::configuration("bulk.chunk_size must be at least 1"));
        }
        FilenameTemplate::parse(&self.bulk.filename_template)?;
        if self.logging.level.trim().is_empty() {
            return Err(BulkError::configuration("logging.level must not be empty"));
        }
        Ok(())
    }

    /// JSON view of the configuration with credentials masked.
    pub fn sanitized(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        sanitize_json_recursive(&mut value, &SENSITIVE_PATTERNS);
        value
    }
}

const SENSITIVE_PATTERNS: [&str; 3] = ["secret", "key", "token"];

fn sanitize_json_recursive(value: &mut serde_json::Value, sensitive_patterns: &[&str]) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                let key_lower = key.to_lowercase();
                let is_sensitive = sensitive_patterns
                    .iter()
                    .any(|pattern| key_lower.contains(pattern));

                if !is_sensitive {
                    sanitize_json_recursive(val, sensitive_patterns);
                    continue;
                }

                *val = match val {
                    serde_json::Value::String(s) if s.is_empty() => "[EMPTY]".into(),
                    serde_json::Value::String(s) if s.len() > 4 && s.is_ascii() => {
                        format!("[MASKED: {}***{}]", &s[..2], &s[s.len() - 2..]).into()
                    }
                    serde_json::Value::Null => serde_json::Value::Null,
                    _ => "[MASKED]".into(),
                };
            }
        }
        serde_json::Value::Array(items) => {
            for item in items.iter_mut() {
                sanitize_json_recursive(item, sensitive_patterns);
            }
        }
        _ => {}
    }
}

/// Remote API credentials. Empty strings count as missing.
#[derive(Clone, Default, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub consumer_key: Option<String>,
    #[serde(default)]
    pub consumer_secret: Option<String>,
    #[serde(default)]
    pub access_token_key: Option<String>,
    #[serde(default)]
    pub access_token_secret: Option<String>,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = |value: &Option<String>| {
            if present(value).is_some() {
                "[SET]"
            } else {
                "[UNSET]"
            }
        };
        f.debug_struct("ApiConfig")
            .field("consumer_key", &state(&self.consumer_key))
            .field("consumer_secret", &state(&self.consumer_secret))
            .field("access_token_key", &state(&self.access_token_key))
            .field("access_token_secret", &state(&self.access_token_secret))
            .finish()
    }
}

/// Application-only credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct AppCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
}

/// Credentials acting on behalf of a user.
#[derive(Clone, PartialEq, Eq)]
pub struct UserCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token_key: String,
    pub access_token_secret: String,
}

impl fmt::Debug for AppCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppCredentials").finish_non_exhaustive()
    }
}

impl fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserCredentials").finish_non_exhaustive()
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn required(value: &Option<String>, field: &str) -> Result<String> {
    present(value)
        .map(str::to_string)
        .ok_or_else(|| BulkError::configuration(format!("missing required setting api.{field}")))
}

impl ApiConfig {
    pub fn app_credentials(&self) -> Result<AppCredentials> {
        Ok(AppCredentials {
            consumer_key: required(&self.consumer_key, "consumer_key")?,
            consumer_secret: required(&self.consumer_secret, "consumer_secret")?,
        })
    }

    pub fn user_credentials(&self) -> Result<UserCredentials> {
        Ok(UserCredentials {
            consumer_key: required(&self.consumer_key, "consumer_key")?,
            consumer_secret: required(&self.consumer_secret, "consumer_secret")?,
            access_token_key: required(&self.access_token_key, "access_token_key")?,
            access_token_secret: required(&self.access_token_secret, "access_token_secret")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BulkSettings {
    pub output_dir: PathBuf,
    pub filename_template: String,
    pub chunk_size: usize,
    pub resume: bool,
}

impl Default for BulkSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            filename_template: DEFAULT_FILENAME_TEMPLATE.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            resume: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}
