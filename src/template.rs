//! Output filename templates.
//!
//! A template holds exactly one `{}` placeholder that is replaced by the
//! identity basename. Callers must keep basenames unique within a run; two
//! identities rendering to the same name would share one output file.

use std::fmt;

use crate::constants::{DEFAULT_FILENAME_TEMPLATE, TEMPLATE_PLACEHOLDER};
use crate::error::{BulkError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameTemplate {
    prefix: String,
    suffix: String,
}

impl FilenameTemplate {
    pub fn parse(template: &str) -> Result<Self> {
        let mut parts = template.split(TEMPLATE_PLACEHOLDER);
        let (prefix, suffix) = match (parts.next(), parts.next(), parts.next()) {
            (Some(prefix), Some(suffix), None) => (prefix, suffix),
            _ => {
                return Err(BulkError::configuration(format!(
                    "filename template '{template}' must contain exactly one '{TEMPLATE_PLACEHOLDER}' placeholder"
                )))
            }
        };

        if prefix.contains(is_separator) || suffix.contains(is_separator) {
            return Err(BulkError::configuration(format!(
                "filename template '{template}' must not contain path separators"
            )));
        }

        Ok(Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        })
    }

    pub fn render(&self, basename: &str) -> String {
        format!("{}{basename}{}", self.prefix, self.suffix)
    }
}

fn is_separator(c: char) -> bool {
    c == '/' || c == std::path::MAIN_SEPARATOR
}

impl Default for FilenameTemplate {
    fn default() -> Self {
        let (prefix, suffix) = DEFAULT_FILENAME_TEMPLATE
            .split_once(TEMPLATE_PLACEHOLDER)
            .unwrap_or(("", ".jsonl"));
        Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        }
    }
}

impl fmt::Display for FilenameTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{TEMPLATE_PLACEHOLDER}{}", self.prefix, self.suffix)
    }
}

impl std::str::FromStr for FilenameTemplate {
    type Err = BulkError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
