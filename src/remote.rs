//! # Remote Collaborator Boundary
//!
//! The bulk runner never talks to the remote service itself. It calls a
//! [`WorkFn`], a capability that performs one fetch-and-write for one work
//! item. Remote clients expose one operation per data kind through
//! [`RemoteApi`], and [`ApiWork`] adapts any of those operations into a
//! [`WorkFn`].
//!
//! Failures are split in two classes:
//! - [`RemoteApiError`] is expected. The runner records it against the item
//!   and moves on; rerunning with resume picks the item up again.
//! - I/O errors on the output file end the run.

use std::fmt;
use std::io;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::Identity;
use crate::sink::RecordSink;

/// Failure reported by the remote service after its own retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Rate limit exhausted: {0}")]
    RateLimited(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Error returned by a work capability.
#[derive(Debug, Error)]
pub enum WorkError {
    #[error("Remote API error: {0}")]
    Remote(#[from] RemoteApiError),
    #[error("Output I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Arguments handed to a work capability for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkArgs<V> {
    pub value: V,
    /// Only records with an id strictly greater than this are wanted.
    pub since_id: Option<u64>,
}

impl<V> WorkArgs<V> {
    pub fn new(value: V, since_id: Option<u64>) -> Self {
        Self { value, since_id }
    }
}

/// One remote fetch-and-write for one work item.
#[async_trait]
pub trait WorkFn<V>: Send + Sync
where
    V: Send + 'static,
{
    async fn call(&self, sink: &mut RecordSink, args: WorkArgs<V>) -> Result<(), WorkError>;
}

/// Per-item result of invoking a work capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkOutcome {
    Success,
    RemoteFailure(RemoteApiError),
}

/// Invoke `work` and sort its result into an item-local outcome or an I/O
/// error that must end the run.
pub async fn invoke<V, W>(
    work: &W,
    sink: &mut RecordSink,
    args: WorkArgs<V>,
) -> io::Result<WorkOutcome>
where
    V: Send + 'static,
    W: WorkFn<V> + ?Sized,
{
    match work.call(sink, args).await {
        Ok(()) => Ok(WorkOutcome::Success),
        Err(WorkError::Remote(error)) => Ok(WorkOutcome::RemoteFailure(error)),
        Err(WorkError::Io(error)) => Err(error),
    }
}

/// Kinds of per-identity data a remote client can fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    Timeline,
    Followers,
    Friends,
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataKind::Timeline => write!(f, "timeline"),
            DataKind::Followers => write!(f, "followers"),
            DataKind::Friends => write!(f, "friends"),
        }
    }
}

/// Rate-limited remote client, one operation per data kind.
///
/// Implementations block (await) on rate limits internally and write each
/// record to the sink as it arrives. When `since_id` is given they must only
/// return records with a strictly greater id.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn user_timeline(
        &self,
        sink: &mut RecordSink,
        identity: &Identity,
        since_id: Option<u64>,
    ) -> Result<(), WorkError>;

    async fn followers_ids(
        &self,
        sink: &mut RecordSink,
        identity: &Identity,
        since_id: Option<u64>,
    ) -> Result<(), WorkError>;

    async fn friends_ids(
        &self,
        sink: &mut RecordSink,
        identity: &Identity,
        since_id: Option<u64>,
    ) -> Result<(), WorkError>;
}

/// Adapts one [`RemoteApi`] operation into a [`WorkFn`] over identities.
pub struct ApiWork<'a, A: ?Sized> {
    api: &'a A,
    kind: DataKind,
}

impl<'a, A: RemoteApi + ?Sized> ApiWork<'a, A> {
    pub fn new(api: &'a A, kind: DataKind) -> Self {
        Self { api, kind }
    }

    pub fn timeline(api: &'a A) -> Self {
        Self::new(api, DataKind::Timeline)
    }

    pub fn followers(api: &'a A) -> Self {
        Self::new(api, DataKind::Followers)
    }

    pub fn friends(api: &'a A) -> Self {
        Self::new(api, DataKind::Friends)
    }

    pub fn kind(&self) -> DataKind {
        self.kind
    }
}

impl<A: ?Sized> fmt::Debug for ApiWork<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiWork").field("kind", &self.kind).finish()
    }
}

#[async_trait]
impl<'a, A: RemoteApi + ?Sized> WorkFn<Identity> for ApiWork<'a, A> {
    async fn call(
        &self,
        sink: &mut RecordSink,
        args: WorkArgs<Identity>,
    ) -> Result<(), WorkError> {
        match self.kind {
            DataKind::Timeline => {
                self.api
                    .user_timeline(sink, &args.value, args.since_id)
                    .await
            }
            DataKind::Followers => {
                self.api
                    .followers_ids(sink, &args.value, args.since_id)
                    .await
            }
            DataKind::Friends => self.api.friends_ids(sink, &args.value, args.since_id).await,
        }
    }
}
