use std::path::PathBuf;

use polars::lazy::dsl::*;
use polars::prelude::*;
use tracing::{debug, info};

use crate::config::StageOptions;
use crate::error::{PreprocessError, Result};
use crate::metadata::RunMetadata;
use crate::reference::load_offset_mapping;
use crate::transforms::{micros_lit, timestamp_column, DataBoundary, TransformUnit};

const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// Shifts every timestamp by the participant's constant clock offset.
pub struct TimestampSyncer {
    sync_file: PathBuf,
    options: StageOptions,
}

impl TimestampSyncer {
    pub fn new(sync_file: impl Into<PathBuf>, options: StageOptions) -> Self {
        Self {
            sync_file: sync_file.into(),
            options,
        }
    }

    fn offset_for(&self, metadata: &RunMetadata) -> Result<f64> {
        let participant = metadata
            .participant_number()
            .ok_or_else(|| PreprocessError::Metadata {
                path: metadata.source_file.clone(),
                reason: format!(
                    "participant id '{}' has no numeric suffix",
                    metadata.participant_id
                ),
            })?;

        load_offset_mapping(&self.sync_file)?
            .into_iter()
            .find(|entry| entry.participant_number == participant)
            .map(|entry| entry.offset_seconds)
            .ok_or_else(|| PreprocessError::MissingReferenceEntry {
                path: self.sync_file.clone(),
                key: format!("participant {participant}"),
            })
    }
}

impl TransformUnit for TimestampSyncer {
    fn name(&self) -> &'static str {
        "sync"
    }

    fn apply(
        &self,
        table: &DataFrame,
        _boundary: &DataBoundary,
        metadata: &RunMetadata,
    ) -> Result<DataFrame> {
        let ts = timestamp_column(table)?;
        let offset_seconds = self.offset_for(metadata)?;

        if self.options.verbose {
            info!(participant = %metadata.participant_id, offset_seconds, "syncing timestamps");
        } else {
            debug!(participant = %metadata.participant_id, offset_seconds, "syncing timestamps");
        }

        shift_timestamps(table, &ts, offset_seconds)
    }
}

pub fn shift_timestamps(table: &DataFrame, ts: &str, offset_seconds: f64) -> Result<DataFrame> {
    let offset_micros = (offset_seconds * MICROS_PER_SECOND).round() as i64;

    let shifted = table
        .clone()
        .lazy()
        .with_column(
            (col(ts).cast(DataType::Int64) + micros_lit(offset_micros))
                .cast(DataType::Datetime(TimeUnit::Microseconds, None))
                .alias(ts),
        )
        .collect()?;

    Ok(shifted)
}
