use std::fs;
use std::path::Path;

use mhealth_parser::parse_sensor_csv;
use polars::prelude::DataFrame;
use tracing::{error, info};

use crate::config::ProcessContext;
use crate::error::Result;
use crate::metadata::RunMetadata;
use crate::outputs::write_output;
use crate::pipeline;
use crate::transforms::DataBoundary;

/// Loads one sensor file, runs the pipeline and writes the derived file.
/// Nothing is written when any step fails.
pub fn process_file(path: &Path, context: &ProcessContext) -> Result<DataFrame> {
    match run_file(path, context) {
        Ok(sentinel) => Ok(sentinel),
        Err(err) => {
            error!(
                file = %path.display(),
                stage = ?err.failed_stage(),
                error = %err,
                "preprocessing aborted"
            );
            Err(err)
        }
    }
}

fn run_file(path: &Path, context: &ProcessContext) -> Result<DataFrame> {
    info!(file = %path.display(), "processing sensor file");

    let metadata = RunMetadata::from_path(path, &context.config.source_segment)?;
    let content = fs::read_to_string(path)?;
    let parsed = parse_sensor_csv(&content)?;
    let timestamp_layout = parsed.timestamp_layout.clone();
    let table = parsed.into_dataframe();
    let boundary = boundary_for(&metadata, context);

    let result = pipeline::run(&table, &boundary, &metadata, context)?;
    write_output(
        &result,
        &timestamp_layout,
        path,
        &context.setname,
        &context.config,
    )
}

/// Independent runs treat the whole file as valid data; otherwise rows are
/// limited to the hour named in the file.
pub fn boundary_for(metadata: &RunMetadata, context: &ProcessContext) -> DataBoundary {
    if context.options.independent {
        DataBoundary::unbounded()
    } else {
        let (start, stop) = metadata.hour_window();
        DataBoundary::between(start, stop)
    }
}
