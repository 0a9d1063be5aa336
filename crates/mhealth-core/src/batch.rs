use std::path::PathBuf;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::config::ProcessContext;
use crate::processor::process_file;

#[derive(Debug, Clone)]
pub struct FailedFile {
    pub path: PathBuf,
    pub stage: Option<&'static str>,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ProcessSummary {
    pub succeeded: usize,
    pub failed: Vec<FailedFile>,
}

impl ProcessSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed.len()
    }

    fn record(&mut self, path: PathBuf, outcome: crate::error::Result<()>) {
        match outcome {
            Ok(()) => self.succeeded += 1,
            Err(err) => self.failed.push(FailedFile {
                path,
                stage: err.failed_stage(),
                message: err.to_string(),
            }),
        }
    }
}

/// Runs every file through its own pipeline. Failures are collected, never
/// propagated, so one bad file does not stop the others.
pub async fn process_files(
    files: Vec<PathBuf>,
    context: Arc<ProcessContext>,
    parallel: bool,
    workers: usize,
) -> ProcessSummary {
    let mut summary = ProcessSummary::default();
    let workers = if parallel { workers.max(1) } else { 1 };
    info!(files = files.len(), workers, "starting preprocessing run");

    let mut outcomes = stream::iter(files)
        .map(|path| {
            let context = Arc::clone(&context);
            async move {
                let task_path = path.clone();
                let joined = tokio::task::spawn_blocking(move || {
                    process_file(&task_path, &context).map(|_| ())
                })
                .await;
                (path, joined)
            }
        })
        .buffer_unordered(workers);

    while let Some((path, joined)) = outcomes.next().await {
        match joined {
            Ok(outcome) => summary.record(path, outcome),
            Err(join_err) => {
                warn!(file = %path.display(), "worker panicked: {join_err}");
                summary.failed.push(FailedFile {
                    path,
                    stage: None,
                    message: join_err.to_string(),
                });
            }
        }
    }

    summary.failed.sort_by(|a, b| a.path.cmp(&b.path));
    info!(
        succeeded = summary.succeeded,
        failed = summary.failed.len(),
        "preprocessing run finished"
    );
    summary
}
