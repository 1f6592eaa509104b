//! # Checkpoint Scan
//!
//! The checkpoint of an output file is the largest `id` found across its
//! records. It is never stored on its own: every resume rescans the whole file,
//! so the cost grows with the file.
//!
//! Blank lines are ignored. Any other line that is not a JSON object with a
//! non-negative integer `id` makes the scan fail with
//! [`CheckpointError::Malformed`] rather than produce a checkpoint that might
//! be too low.

use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, instrument};

use crate::constants::CHECKPOINT_FIELD;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed record at {}:{line}: {reason}", path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

/// Scan `path` and return the highest record id, or `None` for a file with
/// no records.
#[instrument(skip(path), fields(path = %path.display()))]
pub async fn latest_id(path: &Path) -> Result<Option<u64>, CheckpointError> {
    let io_error = |source| CheckpointError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).await.map_err(io_error)?;
    let mut reader = BufReader::new(file);

    let mut latest: Option<u64> = None;
    let mut line_number = 0;
    let mut records = 0usize;
    let mut line = Vec::new();

    // raw bytes, so invalid UTF-8 is reported as a malformed record
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await.map_err(io_error)? == 0 {
            break;
        }
        line_number += 1;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let id = record_id(&line).map_err(|reason| CheckpointError::Malformed {
            path: path.to_path_buf(),
            line: line_number,
            reason,
        })?;

        records += 1;
        latest = Some(latest.map_or(id, |current| current.max(id)));
    }

    debug!(records, latest_id = ?latest, "Scanned output file for checkpoint");

    Ok(latest)
}

fn record_id(line: &[u8]) -> Result<u64, String> {
    let record: Value =
        serde_json::from_slice(line).map_err(|e| format!("invalid JSON: {e}"))?;

    let Some(object) = record.as_object() else {
        return Err("record is not a JSON object".to_string());
    };

    match object.get(CHECKPOINT_FIELD) {
        Some(value) => value
            .as_u64()
            .ok_or_else(|| format!("'{CHECKPOINT_FIELD}' is not a non-negative integer: {value}")),
        None => Err(format!("record has no '{CHECKPOINT_FIELD}' field")),
    }
}
