//! Configuration Loader
//!
//! Merges three layers, later layers overriding earlier ones:
//! 1. the built-in defaults compiled into the binary,
//! 2. the user file, when one was given,
//! 3. environment variables such as `TWBULK__BULK__CHUNK_SIZE=50`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use tracing::debug;

use super::BulkConfig;
use crate::constants::{DEFAULT_CONFIG, ENV_PREFIX, USER_CONFIG_FILE};
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct ConfigLoader {
    user_file: Option<PathBuf>,
    user_file_required: bool,
    environment: EnvironmentSource,
}

#[derive(Debug, Clone)]
enum EnvironmentSource {
    Process,
    Fixed(HashMap<String, String>),
    Disabled,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            user_file: None,
            user_file_required: false,
            environment: EnvironmentSource::Process,
        }
    }

    /// Overlay a user file that must exist.
    pub fn with_user_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.user_file = Some(path.into());
        self.user_file_required = true;
        self
    }

    /// Overlay a user file if it exists.
    pub fn with_optional_user_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.user_file = Some(path.into());
        self.user_file_required = false;
        self
    }

    /// Read overrides from `vars` instead of the process environment.
    pub fn with_environment(mut self, vars: HashMap<String, String>) -> Self {
        self.environment = EnvironmentSource::Fixed(vars);
        self
    }

    pub fn without_environment(mut self) -> Self {
        self.environment = EnvironmentSource::Disabled;
        self
    }

    pub fn user_file(&self) -> Option<&Path> {
        self.user_file.as_deref()
    }

    /// Conventional user file location, `~/.twbulk.toml`.
    pub fn default_user_path() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(USER_CONFIG_FILE))
    }

    /// Merge all layers, deserialize and validate.
    pub fn load(&self) -> Result<BulkConfig> {
        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(path) = &self.user_file {
            debug!(
                path = %path.display(),
                required = self.user_file_required,
                "Adding user configuration file"
            );
            builder = builder.add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(self.user_file_required),
            );
        }

        let environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true);
        builder = match &self.environment {
            EnvironmentSource::Process => builder.add_source(environment),
            EnvironmentSource::Fixed(vars) => {
                builder.add_source(environment.source(Some(vars.clone())))
            }
            EnvironmentSource::Disabled => builder,
        };

        let config: BulkConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        debug!(
            config = %config.sanitized(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogFormat;
    use std::io::Write;

    #[test]
    fn test_defaults_only() {
        let config = ConfigLoader::new().without_environment().load().unwrap();

        assert_eq!(config.bulk.chunk_size, 10);
        assert_eq!(config.bulk.filename_template, "{}.jsonl");
        assert!(!config.bulk.resume);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.api.app_credentials().is_err());
    }

    #[test]
    fn test_user_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[api]\nconsumer_key = \"ck\"\nconsumer_secret = \"cs\"\n\n[bulk]\nresume = true\noutput_dir = \"timelines\""
        )
        .unwrap();

        let config = ConfigLoader::new()
            .with_user_file(file.path())
            .without_environment()
            .load()
            .unwrap();

        assert!(config.bulk.resume);
        assert_eq!(config.bulk.output_dir, PathBuf::from("timelines"));
        assert_eq!(config.bulk.chunk_size, 10);
        assert_eq!(config.api.app_credentials().unwrap().consumer_secret, "cs");
    }

    #[test]
    fn test_missing_required_user_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigLoader::new()
            .with_user_file(dir.path().join("absent.toml"))
            .without_environment()
            .load();
        assert!(result.unwrap_err().is_configuration());

        let config = ConfigLoader::new()
            .with_optional_user_file(dir.path().join("absent.toml"))
            .without_environment()
            .load()
            .unwrap();
        assert_eq!(config.bulk.chunk_size, 10);
    }

    #[test]
    fn test_environment_overrides() {
        let vars = HashMap::from([
            ("TWBULK__BULK__CHUNK_SIZE".to_string(), "100".to_string()),
            ("TWBULK__LOGGING__FORMAT".to_string(), "json".to_string()),
        ]);

        let config = ConfigLoader::new().with_environment(vars).load().unwrap();

        assert_eq!(config.bulk.chunk_size, 100);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let vars = HashMap::from([("TWBULK__BULK__CHUNK_SIZE".to_string(), "0".to_string())]);
        let result = ConfigLoader::new().with_environment(vars).load();
        assert!(result.unwrap_err().is_configuration());
    }
}
