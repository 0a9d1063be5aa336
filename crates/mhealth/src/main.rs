use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use mhealth_core::batch::process_files;
use mhealth_core::config::{PreprocessConfig, ProcessContext, StageOptions, DEFAULT_SETNAME};
use mhealth_core::discovery::discover_files;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "mHealth sensor data preprocessing", long_about = None)]
struct Cli {
    /// Processing root containing participant folders and DerivedCrossParticipants
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Restrict the run to one participant folder, e.g. SPADES_1
    #[arg(short, long)]
    participant: Option<String>,

    /// TOML file overriding reference paths and output formatting
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Calibrate, sync and clip every accelerometer file matching a pattern
    Process(ProcessArgs),
}

#[derive(Args, Debug)]
struct ProcessArgs {
    /// Glob relative to the root (or participant folder)
    #[arg(long)]
    pattern: String,

    /// Process files concurrently
    #[arg(long)]
    par: bool,

    /// Worker count for --par (defaults to available cores)
    #[arg(long)]
    workers: Option<usize>,

    /// Log per-stage diagnostics
    #[arg(long)]
    verbose: bool,

    /// Name of the derived output set
    #[arg(long, default_value = DEFAULT_SETNAME)]
    setname: String,

    /// Treat each file as its own data region; `false` clips rows to the file's hour
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    independent: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Command::Process(args) = cli.command;

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .json()
        .init();

    let root = match cli.root {
        Some(root) => root,
        None => env::var("MHEALTH_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".")),
    };
    let root = root
        .canonicalize()
        .with_context(|| format!("processing root {} is not accessible", root.display()))?;

    let config = match &cli.config {
        Some(path) => PreprocessConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PreprocessConfig::default(),
    };

    let files = discover_files(&root, cli.participant.as_deref(), &args.pattern)?;
    if files.is_empty() {
        warn!(pattern = %args.pattern, root = %root.display(), "no files matched");
        return Ok(());
    }

    let context = ProcessContext::new(root, args.setname)
        .with_options(StageOptions {
            verbose: args.verbose,
            independent: args.independent,
        })
        .with_config(config);

    let workers = args.workers.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    });

    let summary = process_files(files, Arc::new(context), args.par, workers).await;

    info!(
        processed = summary.total(),
        succeeded = summary.succeeded,
        failed = summary.failed.len(),
        "preprocessing summary"
    );
    for failure in &summary.failed {
        warn!(
            file = %failure.path.display(),
            stage = ?failure.stage,
            "{}",
            failure.message
        );
    }

    if !summary.failed.is_empty() {
        bail!("{} of {} files failed", summary.failed.len(), summary.total());
    }
    Ok(())
}
