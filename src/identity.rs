//! # Identities
//!
//! The keys a bulk run is driven by: numeric user ids and screen names. This
//! module validates the identity arguments a caller supplies, loads identity
//! lists from plain-text files, and turns an identity set into work items or
//! lookup batches.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chunker::chunks;
use crate::constants::COMMENT_MARKER;
use crate::error::{BulkError, Result};
use crate::runner::WorkItem;

/// A single identity on the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Identity {
    UserId(u64),
    ScreenName(String),
}

impl Identity {
    /// Key used to derive the output file name.
    pub fn basename(&self) -> String {
        match self {
            Identity::UserId(id) => id.to_string(),
            Identity::ScreenName(name) => name.clone(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::UserId(id) => write!(f, "user_id={id}"),
            Identity::ScreenName(name) => write!(f, "screen_name={name}"),
        }
    }
}

/// Validated collection of identities of both kinds, at least one non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentitySet {
    user_ids: Vec<u64>,
    screen_names: Vec<String>,
}

/// Identities sent together in one batched remote call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityBatch {
    pub user_ids: Vec<u64>,
    pub screen_names: Vec<String>,
}

impl IdentityBatch {
    pub fn len(&self) -> usize {
        self.user_ids.len() + self.screen_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.user_ids.is_empty() && self.screen_names.is_empty()
    }
}

impl IdentitySet {
    pub fn user_ids(&self) -> &[u64] {
        &self.user_ids
    }

    pub fn screen_names(&self) -> &[String] {
        &self.screen_names
    }

    pub fn len(&self) -> usize {
        self.user_ids.len() + self.screen_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One work item per identity, user ids first, then screen names.
    pub fn work_items(&self) -> Vec<WorkItem<Identity>> {
        let ids = self.user_ids.iter().map(|id| Identity::UserId(*id));
        let names = self
            .screen_names
            .iter()
            .map(|name| Identity::ScreenName(name.clone()));

        ids.chain(names)
            .map(|identity| WorkItem::new(identity.basename(), identity))
            .collect()
    }

    /// Batches of at most `size` identities, user ids before screen names.
    pub fn chunks(&self, size: usize) -> Result<impl Iterator<Item = IdentityBatch> + '_> {
        let ids = self.user_ids.iter().map(|id| Identity::UserId(*id));
        let names = self
            .screen_names
            .iter()
            .map(|name| Identity::ScreenName(name.clone()));
        let sources: Vec<Box<dyn Iterator<Item = Identity> + '_>> =
            vec![Box::new(ids), Box::new(names)];

        Ok(chunks(sources, size)?.map(|chunk| {
            let mut batch = IdentityBatch::default();
            for identity in chunk.into_components().into_iter().flatten() {
                match identity {
                    Identity::UserId(id) => batch.user_ids.push(id),
                    Identity::ScreenName(name) => batch.screen_names.push(name),
                }
            }
            batch
        }))
    }
}

/// Require at least one identity across both kinds.
///
/// Absent lists are treated as empty.
pub fn ensure_at_least_one(
    user_ids: Option<Vec<u64>>,
    screen_names: Option<Vec<String>>,
) -> Result<IdentitySet> {
    let user_ids = user_ids.unwrap_or_default();
    let screen_names = screen_names.unwrap_or_default();

    if user_ids.is_empty() && screen_names.is_empty() {
        return Err(BulkError::configuration(
            "at least user ids or screen names must be provided",
        ));
    }

    Ok(IdentitySet {
        user_ids,
        screen_names,
    })
}

/// Require exactly one of a user id or a screen name.
pub fn ensure_only_one(user_id: Option<u64>, screen_name: Option<String>) -> Result<Identity> {
    match (user_id, screen_name) {
        (Some(id), None) => Ok(Identity::UserId(id)),
        (None, Some(name)) => Ok(Identity::ScreenName(name)),
        _ => Err(BulkError::configuration(
            "exactly one of user id or screen name must be provided",
        )),
    }
}

/// Read one token per line, skipping blank lines and comments.
pub async fn read_identity_lines(path: impl AsRef<Path>) -> Result<Vec<(usize, String)>> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| BulkError::filesystem(path, e))?;

    let tokens: Vec<(usize, String)> = contents
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with(COMMENT_MARKER))
        .map(|(number, line)| (number, line.to_string()))
        .collect();

    debug!(path = %path.display(), count = tokens.len(), "Read identity list");

    Ok(tokens)
}

/// Read a list of numeric user ids.
pub async fn read_user_ids(path: impl AsRef<Path>) -> Result<Vec<u64>> {
    let path = path.as_ref();
    read_identity_lines(path)
        .await?
        .into_iter()
        .map(|(number, token)| {
            token.parse::<u64>().map_err(|e| {
                BulkError::configuration(format!(
                    "invalid user id '{token}' at {}:{number}: {e}",
                    path.display()
                ))
            })
        })
        .collect()
}

/// Read a list of screen names.
pub async fn read_screen_names(path: impl AsRef<Path>) -> Result<Vec<String>> {
    Ok(read_identity_lines(path)
        .await?
        .into_iter()
        .map(|(_, token)| token)
        .collect())
}
