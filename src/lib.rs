#![allow(clippy::doc_markdown)] // Allow technical terms like JSONL, TOML in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # twbulk
//!
//! Resumable bulk fetching of per-identity data from rate-limited remote APIs.
//!
//! ## Overview
//!
//! A bulk run takes a list of identities (numeric user ids, screen names or
//! both), asks a remote collaborator for the data of each one and writes the
//! records as line-delimited JSON, one output file per identity. Reruns skip
//! identities that already have output or, with resume enabled, continue each
//! file from the highest record `id` it already holds.
//!
//! A remote failure on one identity is logged and counted, never fatal. A
//! broken output location ends the run.
//!
//! ## Module Organization
//!
//! - [`chunker`] - Lazy fixed-size chunking over parallel input sequences
//! - [`identity`] - Identity kinds, validation and identity list files
//! - [`runner`] - The bulk runner and its run report
//! - [`checkpoint`] - Resume checkpoint scanning of existing output
//! - [`sink`] - Line-delimited JSON output files
//! - [`remote`] - Work capability and remote client boundary
//! - [`config`] - Layered configuration
//! - [`logging`] - Tracing subscriber setup
//! - [`error`] - Run-level error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use twbulk::{ApiWork, BulkRunner, ConfigLoader, RemoteApi};
//!
//! # async fn example(api: &dyn RemoteApi) -> twbulk::Result<()> {
//! let config = ConfigLoader::new().load()?;
//! let runner = BulkRunner::from_settings(&config.bulk)?;
//!
//! let report = runner
//!     .run_identities(&ApiWork::timeline(api), None, Some(vec!["jack".to_string()]))
//!     .await?;
//! println!("processed {} of {}", report.processed, report.outcomes.len());
//! # Ok(())
//! # }
//! ```

pub mod checkpoint;
pub mod chunker;
pub mod config;
pub mod constants;
pub mod error;
pub mod identity;
pub mod logging;
pub mod remote;
pub mod runner;
pub mod sink;
pub mod template;

pub use chunker::{chunks, Chunk, Chunks};
pub use config::{BulkConfig, ConfigLoader};
pub use error::{BulkError, Result};
pub use identity::{
    ensure_at_least_one, ensure_only_one, Identity, IdentityBatch, IdentitySet,
};
pub use remote::{ApiWork, DataKind, RemoteApi, RemoteApiError, WorkArgs, WorkError, WorkFn};
pub use runner::{
    BulkRunner, ItemDisposition, ItemOutcome, ItemPlan, PlannedAction, RunReport, WorkItem,
};
pub use sink::{OpenMode, RecordSink};
pub use template::FilenameTemplate;
