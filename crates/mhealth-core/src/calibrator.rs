use std::path::PathBuf;

use polars::lazy::dsl::*;
use polars::prelude::*;
use tracing::{debug, info, warn};

use crate::config::StageOptions;
use crate::error::Result;
use crate::metadata::RunMetadata;
use crate::reference::{load_static_chunks, StaticChunk};
use crate::transforms::{axis_columns, timestamp_column, DataBoundary, TransformUnit};

pub const MIN_STATIC_CHUNKS: usize = 3;
const MAX_ITERATIONS: usize = 1000;
const CONVERGENCE_TOLERANCE: f64 = 1e-10;
const MIN_AXIS_VARIANCE: f64 = 1e-12;

/// Per-axis correction: `calibrated = (raw + offset) * scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationParams {
    pub offset: [f64; 3],
    pub scale: [f64; 3],
    pub iterations: usize,
}

impl CalibrationParams {
    pub fn identity() -> Self {
        Self {
            offset: [0.0; 3],
            scale: [1.0; 3],
            iterations: 0,
        }
    }

    pub fn apply_to(&self, raw: [f64; 3]) -> [f64; 3] {
        [0, 1, 2].map(|axis| (raw[axis] + self.offset[axis]) * self.scale[axis])
    }
}

/// Removes per-device offset and gain error using the participant's static
/// chunks: motionless readings must have a magnitude of 1 g.
pub struct Calibrator {
    static_chunk_file: PathBuf,
    options: StageOptions,
}

impl Calibrator {
    pub fn new(static_chunk_file: impl Into<PathBuf>, options: StageOptions) -> Self {
        Self {
            static_chunk_file: static_chunk_file.into(),
            options,
        }
    }
}

impl TransformUnit for Calibrator {
    fn name(&self) -> &'static str {
        "calibration"
    }

    fn apply(
        &self,
        table: &DataFrame,
        _boundary: &DataBoundary,
        metadata: &RunMetadata,
    ) -> Result<DataFrame> {
        timestamp_column(table)?;
        let axes = axis_columns(table)?;

        let chunks: Vec<[f64; 3]> = load_static_chunks(&self.static_chunk_file)?
            .iter()
            .filter(|chunk| {
                chunk.participant_id == metadata.participant_id
                    && chunk.sensor_id == metadata.sensor_id
            })
            .map(StaticChunk::as_vector)
            .collect();

        let Some(params) = fit_calibration(&chunks) else {
            warn!(
                participant = %metadata.participant_id,
                sensor = %metadata.sensor_id,
                chunks = chunks.len(),
                "not enough static chunks; skipping calibration"
            );
            return Ok(table.clone());
        };

        if self.options.verbose {
            info!(
                sensor = %metadata.sensor_id,
                offset = ?params.offset,
                scale = ?params.scale,
                iterations = params.iterations,
                "calibration parameters"
            );
        } else {
            debug!(sensor = %metadata.sensor_id, iterations = params.iterations, "calibration fitted");
        }

        apply_calibration(table, &axes, &params)
    }
}

/// Iterative sphere fit over static chunk means. Returns `None` when fewer
/// than [`MIN_STATIC_CHUNKS`] chunks are available.
pub fn fit_calibration(chunks: &[[f64; 3]]) -> Option<CalibrationParams> {
    if chunks.len() < MIN_STATIC_CHUNKS {
        return None;
    }

    let mut params = CalibrationParams::identity();
    let mut previous_residual: Option<f64> = None;

    for iteration in 1..=MAX_ITERATIONS {
        let calibrated: Vec<[f64; 3]> = chunks.iter().map(|raw| params.apply_to(*raw)).collect();
        let projected: Vec<[f64; 3]> = calibrated.iter().map(project_to_unit_sphere).collect();

        for axis in 0..3 {
            let xs: Vec<f64> = calibrated.iter().map(|point| point[axis]).collect();
            let ys: Vec<f64> = projected.iter().map(|point| point[axis]).collect();
            if let Some((intercept, slope)) = linear_fit(&xs, &ys) {
                params.offset[axis] += intercept / (params.scale[axis] * slope);
                params.scale[axis] *= slope;
            }
        }

        let residual = calibrated
            .iter()
            .zip(&projected)
            .map(|(cal, proj)| (0..3).map(|axis| (cal[axis] - proj[axis]).powi(2)).sum::<f64>())
            .sum::<f64>()
            / calibrated.len() as f64;

        params.iterations = iteration;
        if previous_residual.is_some_and(|prev| (residual - prev).abs() < CONVERGENCE_TOLERANCE) {
            break;
        }
        previous_residual = Some(residual);
    }

    Some(params)
}

pub fn apply_calibration(
    table: &DataFrame,
    axes: &[String; 3],
    params: &CalibrationParams,
) -> Result<DataFrame> {
    let exprs: Vec<Expr> = axes
        .iter()
        .enumerate()
        .map(|(axis, name)| {
            ((col(name.as_str()) + lit(params.offset[axis])) * lit(params.scale[axis]))
                .alias(name.as_str())
        })
        .collect();

    Ok(table.clone().lazy().with_columns(exprs).collect()?)
}

fn project_to_unit_sphere(point: &[f64; 3]) -> [f64; 3] {
    let norm = point.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm == 0.0 {
        return *point;
    }
    point.map(|v| v / norm)
}

/// Least-squares `y = intercept + slope * x`; `None` for degenerate input.
fn linear_fit(xs: &[f64], ys: &[f64]) -> Option<(f64, f64)> {
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let variance: f64 = xs.iter().map(|x| (x - mean_x).powi(2)).sum();
    if variance < MIN_AXIS_VARIANCE {
        return None;
    }
    let covariance: f64 = xs
        .iter()
        .zip(ys)
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum();

    let slope = covariance / variance;
    if slope.abs() < f64::EPSILON {
        return None;
    }
    Some((mean_y - slope * mean_x, slope))
}
