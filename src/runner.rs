//! # Bulk Runner
//!
//! Turns a sequence of work items into one line-delimited output file per
//! item, resuming earlier partial output when asked to.
//!
//! ## Per-item lifecycle
//!
//! | Output file | `resume` | Action |
//! |---|---|---|
//! | absent | any | create the file, call the work capability without a checkpoint |
//! | present | `false` | skip the item, the file is not opened |
//! | present | `true` | scan the file for its checkpoint, append, call with `since_id` |
//!
//! Items run one at a time in input order. A remote API failure is recorded
//! against its item and the run continues; filesystem errors end the run.
//! A malformed record found while computing a checkpoint fails only that item.
//!
//! The runner holds at most one output file open at a time. Checkpoint scan
//! and append are not atomic with respect to other writers of the same file:
//! running two runners over one output directory is not supported.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use twbulk::remote::{ApiWork, RemoteApi};
//! use twbulk::runner::BulkRunner;
//! use twbulk::template::FilenameTemplate;
//!
//! # async fn example(api: &dyn RemoteApi) -> twbulk::Result<()> {
//! let runner = BulkRunner::new("timelines", FilenameTemplate::parse("{}.jsonl")?)
//!     .with_resume(true);
//! let report = runner
//!     .run_identities(&ApiWork::timeline(api), None, Some(vec!["jack".to_string()]))
//!     .await?;
//! println!("processed {} of {}", report.processed, report.outcomes.len());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::checkpoint::{self, CheckpointError};
use crate::config::BulkSettings;
use crate::error::{BulkError, Result};
use crate::identity::{ensure_at_least_one, Identity};
use crate::remote::{self, RemoteApiError, WorkArgs, WorkFn, WorkOutcome};
use crate::sink::{OpenMode, RecordSink};
use crate::template::FilenameTemplate;

/// One unit of work: the basename keying its output file and the value handed
/// to the work capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem<V> {
    basename: String,
    value: V,
}

impl<V> WorkItem<V> {
    pub fn new(basename: impl Into<String>, value: V) -> Self {
        Self {
            basename: basename.into(),
            value,
        }
    }

    pub fn basename(&self) -> &str {
        &self.basename
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn into_parts(self) -> (String, V) {
        (self.basename, self.value)
    }
}

impl<V> From<(String, V)> for WorkItem<V> {
    fn from((basename, value): (String, V)) -> Self {
        Self::new(basename, value)
    }
}

/// What happened to one item during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemDisposition {
    /// Fresh output file written.
    Written { records: u64 },
    /// Existing output file extended past its checkpoint.
    Resumed {
        checkpoint: Option<u64>,
        records: u64,
    },
    /// Output file already present and resume disabled.
    Skipped,
    /// The remote service failed for this item.
    RemoteFailure {
        #[serde(serialize_with = "serialize_display")]
        error: RemoteApiError,
        resumed: bool,
    },
    /// The existing output file holds a record without a usable id.
    MalformedCheckpoint { reason: String },
}

impl ItemDisposition {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Written { .. } | Self::Resumed { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::RemoteFailure { .. } | Self::MalformedCheckpoint { .. }
        )
    }
}

fn serialize_display<T: fmt::Display, S: serde::Serializer>(
    value: &T,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemOutcome {
    pub basename: String,
    pub path: PathBuf,
    pub disposition: ItemDisposition,
}

/// Summary of one run. `processed` counts items whose work completed.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub outcomes: Vec<ItemOutcome>,
}

impl RunReport {
    fn start(run_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            run_id,
            started_at: now,
            finished_at: now,
            processed: 0,
            skipped: 0,
            failed: 0,
            outcomes: Vec::new(),
        }
    }

    fn record(&mut self, outcome: ItemOutcome) {
        if outcome.disposition.is_success() {
            self.processed += 1;
        } else if outcome.disposition.is_failure() {
            self.failed += 1;
        } else {
            self.skipped += 1;
        }
        self.outcomes.push(outcome);
    }

    /// True when no item failed. Skipped items do not count as failures.
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }

    pub fn outcome(&self, basename: &str) -> Option<&ItemOutcome> {
        self.outcomes.iter().find(|o| o.basename == basename)
    }
}

/// Action a run would take for one item, computed without writing anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlannedAction {
    Fresh,
    Skip,
    Resume { checkpoint: Option<u64> },
    MalformedCheckpoint { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemPlan {
    pub basename: String,
    pub path: PathBuf,
    pub action: PlannedAction,
}

/// Drives a work capability over many items, one output file per item.
#[derive(Debug, Clone)]
pub struct BulkRunner {
    output_dir: PathBuf,
    template: FilenameTemplate,
    resume: bool,
}

impl BulkRunner {
    pub fn new(output_dir: impl Into<PathBuf>, template: FilenameTemplate) -> Self {
        Self {
            output_dir: output_dir.into(),
            template,
            resume: false,
        }
    }

    pub fn from_settings(settings: &BulkSettings) -> Result<Self> {
        let template = FilenameTemplate::parse(&settings.filename_template)?;
        Ok(Self::new(&settings.output_dir, template).with_resume(settings.resume))
    }

    /// Resume existing output files instead of skipping them.
    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn resume(&self) -> bool {
        self.resume
    }

    pub fn output_path(&self, basename: &str) -> PathBuf {
        self.output_dir.join(self.template.render(basename))
    }

    /// Validate the identity arguments, then run one item per identity.
    ///
    /// Nothing touches the filesystem when both lists are absent or empty.
    pub async fn run_identities<W>(
        &self,
        work: &W,
        user_ids: Option<Vec<u64>>,
        screen_names: Option<Vec<String>>,
    ) -> Result<RunReport>
    where
        W: WorkFn<Identity> + ?Sized,
    {
        let identities = ensure_at_least_one(user_ids, screen_names)?;
        self.run(work, identities.work_items()).await
    }

    /// Process every item in order and report what happened to each.
    pub async fn run<V, W, I>(&self, work: &W, items: I) -> Result<RunReport>
    where
        V: fmt::Debug + Send + 'static,
        W: WorkFn<V> + ?Sized,
        I: IntoIterator<Item = WorkItem<V>>,
    {
        let run_id = Uuid::new_v4();
        let span = info_span!(
            "bulk_run",
            run_id = %run_id,
            output_dir = %self.output_dir.display(),
            resume = self.resume
        );

        async move {
            self.ensure_output_dir().await?;

            let mut report = RunReport::start(run_id);
            for item in items {
                let (basename, value) = item.into_parts();
                let path = self.output_path(&basename);
                let disposition = self.process_item(work, &basename, &path, value).await?;
                report.record(ItemOutcome {
                    basename,
                    path,
                    disposition,
                });
            }
            report.finished_at = Utc::now();

            info!(
                processed = report.processed,
                skipped = report.skipped,
                failed = report.failed,
                "Bulk run finished"
            );

            Ok::<_, BulkError>(report)
        }
        .instrument(span)
        .await
    }

    /// Classify every item without creating, opening for write or changing
    /// any file.
    pub async fn plan<V, I>(&self, items: I) -> Result<Vec<ItemPlan>>
    where
        I: IntoIterator<Item = WorkItem<V>>,
    {
        let mut plans = Vec::new();
        for item in items {
            let basename = item.basename().to_string();
            let path = self.output_path(&basename);

            let action = if !exists(&path).await? {
                PlannedAction::Fresh
            } else if !self.resume {
                PlannedAction::Skip
            } else {
                match checkpoint::latest_id(&path).await {
                    Ok(checkpoint) => PlannedAction::Resume { checkpoint },
                    Err(error @ CheckpointError::Malformed { .. }) => {
                        PlannedAction::MalformedCheckpoint {
                            reason: error.to_string(),
                        }
                    }
                    Err(CheckpointError::Io { path, source }) => {
                        return Err(BulkError::filesystem(path, source))
                    }
                }
            };

            plans.push(ItemPlan {
                basename,
                path,
                action,
            });
        }
        Ok(plans)
    }

    async fn ensure_output_dir(&self) -> Result<()> {
        if !exists(&self.output_dir).await? {
            tokio::fs::create_dir_all(&self.output_dir)
                .await
                .map_err(|e| BulkError::filesystem(&self.output_dir, e))?;
            info!(output_dir = %self.output_dir.display(), "Created output directory");
        }
        Ok(())
    }

    async fn process_item<V, W>(
        &self,
        work: &W,
        basename: &str,
        path: &Path,
        value: V,
    ) -> Result<ItemDisposition>
    where
        V: fmt::Debug + Send + 'static,
        W: WorkFn<V> + ?Sized,
    {
        let existed = exists(path).await?;

        let since_id = if existed {
            if !self.resume {
                warn!(
                    identity = basename,
                    path = %path.display(),
                    "Skipping existing output file"
                );
                return Ok(ItemDisposition::Skipped);
            }

            match checkpoint::latest_id(path).await {
                Ok(checkpoint) => checkpoint,
                Err(CheckpointError::Malformed { path, line, reason }) => {
                    warn!(
                        identity = basename,
                        path = %path.display(),
                        line,
                        reason = %reason,
                        "Cannot resume, output file holds a malformed record"
                    );
                    return Ok(ItemDisposition::MalformedCheckpoint {
                        reason: format!("line {line}: {reason}"),
                    });
                }
                Err(CheckpointError::Io { path, source }) => {
                    return Err(BulkError::filesystem(path, source));
                }
            }
        } else {
            None
        };

        info!(identity = basename, value = ?value, "Processing item");
        if let Some(checkpoint) = since_id {
            info!(identity = basename, checkpoint, "Resuming from latest processed id");
        }

        let mode = if existed {
            OpenMode::Append
        } else {
            OpenMode::Truncate
        };
        let mut sink = RecordSink::open(path, mode)
            .await
            .map_err(|e| BulkError::filesystem(path, e))?;

        let outcome = remote::invoke(work, &mut sink, WorkArgs::new(value, since_id))
            .await
            .map_err(|e| BulkError::filesystem(path, e))?;
        sink.flush()
            .await
            .map_err(|e| BulkError::filesystem(path, e))?;
        let records = sink.records_written();
        drop(sink);

        match outcome {
            WorkOutcome::Success if existed => Ok(ItemDisposition::Resumed {
                checkpoint: since_id,
                records,
            }),
            WorkOutcome::Success => Ok(ItemDisposition::Written { records }),
            WorkOutcome::RemoteFailure(error) => {
                error!(
                    identity = basename,
                    path = %path.display(),
                    records_written = records,
                    error = %error,
                    details = ?error,
                    "Remote API failure while processing item"
                );

                // an empty fresh file would make a plain rerun skip this item
                if !existed && records == 0 {
                    tokio::fs::remove_file(path)
                        .await
                        .map_err(|e| BulkError::filesystem(path, e))?;
                }

                Ok(ItemDisposition::RemoteFailure {
                    error,
                    resumed: existed,
                })
            }
        }
    }
}

async fn exists(path: &Path) -> Result<bool> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| BulkError::filesystem(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::WorkError;
    use async_trait::async_trait;
    use serde_json::json;

    /// Writes `count` records with ids above the checkpoint.
    struct CountingWork {
        count: u64,
    }

    #[async_trait]
    impl WorkFn<u64> for CountingWork {
        async fn call(
            &self,
            sink: &mut RecordSink,
            args: WorkArgs<u64>,
        ) -> std::result::Result<(), WorkError> {
            let base = args.since_id.unwrap_or(0);
            for offset in 1..=self.count {
                sink.write_record(&json!({"id": base + offset, "owner": args.value}))
                    .await?;
            }
            Ok(())
        }
    }

    fn runner(dir: &Path) -> BulkRunner {
        BulkRunner::new(dir.join("out"), FilenameTemplate::default())
    }

    #[tokio::test]
    async fn test_creates_missing_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path());

        let report = runner
            .run(&CountingWork { count: 2 }, vec![WorkItem::new("a", 1u64)])
            .await
            .unwrap();

        assert!(runner.output_dir().is_dir());
        assert_eq!(report.processed, 1);
        assert_eq!(
            report.outcome("a").unwrap().disposition,
            ItemDisposition::Written { records: 2 }
        );
    }

    #[tokio::test]
    async fn test_skip_then_resume_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path());
        let items = || vec![WorkItem::new("a", 1u64)];

        runner.run(&CountingWork { count: 3 }, items()).await.unwrap();

        let report = runner.run(&CountingWork { count: 3 }, items()).await.unwrap();
        assert_eq!(report.processed, 0);
        assert_eq!(report.skipped, 1);

        let resumed = runner.clone().with_resume(true);
        let report = resumed.run(&CountingWork { count: 1 }, items()).await.unwrap();
        assert_eq!(
            report.outcomes[0].disposition,
            ItemDisposition::Resumed {
                checkpoint: Some(3),
                records: 1
            }
        );

        let contents = std::fs::read_to_string(runner.output_path("a")).unwrap();
        assert_eq!(contents.lines().count(), 4);
    }

    #[tokio::test]
    async fn test_plan_does_not_touch_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path()).with_resume(true);

        let plans = runner.plan(vec![WorkItem::new("a", ())]).await.unwrap();

        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].action, PlannedAction::Fresh);
        assert!(!runner.output_dir().exists());
    }

    #[tokio::test]
    async fn test_plan_classifies_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path());
        std::fs::create_dir_all(runner.output_dir()).unwrap();
        std::fs::write(runner.output_path("good"), "{\"id\": 4}\n{\"id\": 9}\n").unwrap();
        std::fs::write(runner.output_path("bad"), "{\"id\": 4}\nnot json\n").unwrap();

        let items = || vec![WorkItem::new("good", ()), WorkItem::new("bad", ())];

        let plans = runner.plan(items()).await.unwrap();
        assert!(plans.iter().all(|p| p.action == PlannedAction::Skip));

        let plans = runner.clone().with_resume(true).plan(items()).await.unwrap();
        assert_eq!(
            plans[0].action,
            PlannedAction::Resume {
                checkpoint: Some(9)
            }
        );
        assert!(matches!(
            plans[1].action,
            PlannedAction::MalformedCheckpoint { .. }
        ));
    }

    #[test]
    fn test_disposition_serializes_with_status_tag() {
        let disposition = ItemDisposition::RemoteFailure {
            error: RemoteApiError::RateLimited("15 minute window".to_string()),
            resumed: false,
        };
        let value = serde_json::to_value(&disposition).unwrap();
        assert_eq!(value["status"], "remote_failure");
        assert_eq!(value["error"], "Rate limit exhausted: 15 minute window");
    }
}
