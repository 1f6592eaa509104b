//! # twbulk CLI
//!
//! Inspection tool for bulk runs: dry-run planning against an output
//! directory, checkpoint lookup, identity batching and effective
//! configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;

use twbulk::checkpoint::latest_id;
use twbulk::identity::{read_screen_names, read_user_ids};
use twbulk::logging::{init_logging, LogFormat, LoggingOptions};
use twbulk::{ensure_at_least_one, BulkConfig, BulkRunner, ConfigLoader, IdentitySet};

#[derive(Parser, Debug)]
#[command(name = "twbulk")]
#[command(about = "Resumable bulk fetching of per-identity data")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Configuration file path (default: ~/.twbulk.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, overrides logging.level (RUST_LOG still wins)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    /// Subcommands
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show what a run would do for each identity without writing anything
    Plan {
        /// Output directory (default: bulk.output_dir)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// File with one numeric user id per line
        #[arg(short, long, value_name = "FILE")]
        user_ids: Option<PathBuf>,
        /// File with one screen name per line
        #[arg(short, long, value_name = "FILE")]
        screen_names: Option<PathBuf>,
        /// Resume existing output files instead of skipping them
        #[arg(short, long)]
        resume: bool,
        /// Output filename template with one {} placeholder
        #[arg(short, long)]
        template: Option<String>,
    },
    /// Print the checkpoint (highest record id) of an output file
    Checkpoint {
        /// Line-delimited JSON output file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print identity batches as JSON lines
    Chunk {
        /// File with one numeric user id per line
        #[arg(short, long, value_name = "FILE")]
        user_ids: Option<PathBuf>,
        /// File with one screen name per line
        #[arg(short, long, value_name = "FILE")]
        screen_names: Option<PathBuf>,
        /// Identities per batch (default: bulk.chunk_size)
        #[arg(long)]
        size: Option<usize>,
    },
    /// Print the effective configuration with secrets masked
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;

    let mut logging = LoggingOptions::from(&config.logging);
    if let Some(level) = cli.log_level {
        logging.level = level;
    }
    if let Some(format) = cli.log_format {
        logging.format = format;
    }
    init_logging(&logging);

    match cli.command {
        Commands::Plan {
            output_dir,
            user_ids,
            screen_names,
            resume,
            template,
        } => {
            let mut settings = config.bulk.clone();
            if let Some(dir) = output_dir {
                settings.output_dir = dir;
            }
            if let Some(template) = template {
                settings.filename_template = template;
            }
            settings.resume |= resume;

            let identities = load_identities(user_ids.as_deref(), screen_names.as_deref()).await?;
            let runner = BulkRunner::from_settings(&settings)?;
            let plans = runner.plan(identities.work_items()).await?;

            info!(
                items = plans.len(),
                output_dir = %runner.output_dir().display(),
                "Planned bulk run"
            );
            for plan in &plans {
                println!("{}", serde_json::to_string(plan)?);
            }
        }
        Commands::Checkpoint { file } => {
            let checkpoint = latest_id(&file)
                .await
                .with_context(|| format!("Failed to read checkpoint from {}", file.display()))?;
            println!(
                "{}",
                json!({ "path": file.display().to_string(), "checkpoint": checkpoint })
            );
        }
        Commands::Chunk {
            user_ids,
            screen_names,
            size,
        } => {
            let identities = load_identities(user_ids.as_deref(), screen_names.as_deref()).await?;
            let size = size.unwrap_or(config.bulk.chunk_size);
            for batch in identities.chunks(size)? {
                println!("{}", serde_json::to_string(&batch)?);
            }
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config.sanitized())?);
        }
    }

    Ok(())
}

fn load_config(explicit: Option<&Path>) -> Result<BulkConfig> {
    let loader = match (explicit, ConfigLoader::default_user_path()) {
        (Some(path), _) => ConfigLoader::new().with_user_file(path),
        (None, Some(path)) => ConfigLoader::new().with_optional_user_file(path),
        (None, None) => ConfigLoader::new(),
    };
    loader.load().context("Failed to load configuration")
}

async fn load_identities(
    user_ids: Option<&Path>,
    screen_names: Option<&Path>,
) -> Result<IdentitySet> {
    let user_ids = match user_ids {
        Some(path) => Some(read_user_ids(path).await?),
        None => None,
    };
    let screen_names = match screen_names {
        Some(path) => Some(read_screen_names(path).await?),
        None => None,
    };
    Ok(ensure_at_least_one(user_ids, screen_names)?)
}
