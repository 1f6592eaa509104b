//! # Bulk Processing Constants
//!
//! Defaults and fixed names shared by the chunker, the runner and the
//! configuration layer.

/// Default number of elements per chunk when no size is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 10;

/// Record field holding the monotonically increasing checkpoint value.
pub const CHECKPOINT_FIELD: &str = "id";

/// Lines in identity list files starting with this marker are ignored.
pub const COMMENT_MARKER: char = '#';

/// Placeholder substituted with the identity basename in filename templates.
pub const TEMPLATE_PLACEHOLDER: &str = "{}";

/// Default output filename template.
pub const DEFAULT_FILENAME_TEMPLATE: &str = "{}.jsonl";

/// Conventional user configuration file name, relative to the home directory.
pub const USER_CONFIG_FILE: &str = ".twbulk.toml";

/// Prefix for environment variable configuration overrides.
pub const ENV_PREFIX: &str = "TWBULK";

/// Built-in configuration defaults.
pub const DEFAULT_CONFIG: &str = include_str!("../config/defaults.toml");
