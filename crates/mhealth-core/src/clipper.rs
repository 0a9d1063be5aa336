use std::path::PathBuf;

use polars::lazy::dsl::*;
use polars::prelude::*;
use tracing::{debug, info};

use crate::config::StageOptions;
use crate::error::{PreprocessError, Result};
use crate::metadata::RunMetadata;
use crate::reference::{load_sessions, SessionWindow};
use crate::transforms::{
    micros_lit, naive_to_micros, timestamp_column, DataBoundary, TransformUnit,
};

/// Keeps only rows recorded during one of the participant's sessions and
/// inside the data boundary.
pub struct Clipper {
    session_file: PathBuf,
    options: StageOptions,
}

impl Clipper {
    pub fn new(session_file: impl Into<PathBuf>, options: StageOptions) -> Self {
        Self {
            session_file: session_file.into(),
            options,
        }
    }
}

impl TransformUnit for Clipper {
    fn name(&self) -> &'static str {
        "clip"
    }

    fn apply(
        &self,
        table: &DataFrame,
        boundary: &DataBoundary,
        metadata: &RunMetadata,
    ) -> Result<DataFrame> {
        let ts = timestamp_column(table)?;

        let sessions: Vec<SessionWindow> = load_sessions(&self.session_file)?
            .into_iter()
            .filter(|session| session.participant_id == metadata.participant_id)
            .collect();

        if sessions.is_empty() {
            return Err(PreprocessError::MissingReferenceEntry {
                path: self.session_file.clone(),
                key: metadata.participant_id.clone(),
            });
        }

        let clipped = clip_to_sessions(table, &ts, &sessions, boundary)?;

        if self.options.verbose {
            info!(
                participant = %metadata.participant_id,
                sessions = sessions.len(),
                dropped = table.height() - clipped.height(),
                "clipped to session windows"
            );
        } else {
            debug!(dropped = table.height() - clipped.height(), "clipped to session windows");
        }

        Ok(clipped)
    }
}

pub fn clip_to_sessions(
    table: &DataFrame,
    ts: &str,
    sessions: &[SessionWindow],
    boundary: &DataBoundary,
) -> Result<DataFrame> {
    let micros = || col(ts).cast(DataType::Int64);

    let mut predicate = sessions
        .iter()
        .map(|session| {
            micros()
                .gt_eq(micros_lit(naive_to_micros(session.start)))
                .and(micros().lt_eq(micros_lit(naive_to_micros(session.stop))))
        })
        .reduce(|acc, window| acc.or(window))
        .unwrap_or_else(|| lit(false));

    if let Some(start) = boundary.start {
        predicate = predicate.and(micros().gt_eq(micros_lit(naive_to_micros(start))));
    }
    if let Some(stop) = boundary.stop {
        predicate = predicate.and(micros().lt(micros_lit(naive_to_micros(stop))));
    }

    Ok(table.clone().lazy().filter(predicate).collect()?)
}
