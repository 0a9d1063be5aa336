use polars::prelude::DataFrame;
use tracing::{debug, info};

use crate::calibrator::Calibrator;
use crate::clipper::Clipper;
use crate::config::ProcessContext;
use crate::error::{PreprocessError, Result};
use crate::metadata::RunMetadata;
use crate::timestamp_syncer::TimestampSyncer;
use crate::transforms::{DataBoundary, TransformUnit};

pub const STAGE_COUNT: usize = 3;

pub type Pipeline = [Box<dyn TransformUnit>; STAGE_COUNT];

/// Calibrate, sync, clip. Each unit knows its reference file but does not
/// read it until it runs.
pub fn build_pipeline(context: &ProcessContext) -> Pipeline {
    let config = &context.config;
    let pipeline: Pipeline = [
        Box::new(Calibrator::new(
            context.reference_path(&config.static_chunk_file),
            context.options,
        )),
        Box::new(TimestampSyncer::new(
            context.reference_path(&config.offset_mapping_file),
            context.options,
        )),
        Box::new(Clipper::new(
            context.reference_path(&config.session_file),
            context.options,
        )),
    ];
    pipeline
}

/// Runs a freshly built pipeline over `table`. The caller's table is never
/// modified.
pub fn run(
    table: &DataFrame,
    boundary: &DataBoundary,
    metadata: &RunMetadata,
    context: &ProcessContext,
) -> Result<DataFrame> {
    let pipeline = build_pipeline(context);
    run_stages(&pipeline, table, boundary, metadata)
}

/// Threads `table` through `stages` in order. The first failing stage aborts
/// the run and its error is returned wrapped with the stage name.
pub fn run_stages(
    stages: &[Box<dyn TransformUnit>],
    table: &DataFrame,
    boundary: &DataBoundary,
    metadata: &RunMetadata,
) -> Result<DataFrame> {
    let mut result = table.clone();

    for stage in stages {
        let (rows, columns) = result.shape();
        debug!(
            stage = stage.name(),
            file = %metadata.source_file.display(),
            rows,
            columns,
            "executing stage"
        );

        result = stage
            .apply(&result, boundary, metadata)
            .map_err(|err| PreprocessError::stage(stage.name(), err))?;

        let (rows, columns) = result.shape();
        info!(
            stage = stage.name(),
            file = %metadata.source_file.display(),
            rows,
            columns,
            "stage complete"
        );
    }

    Ok(result)
}
