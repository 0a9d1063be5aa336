mod common;

use mhealth_core::calibrator::{apply_calibration, fit_calibration, Calibrator, MIN_STATIC_CHUNKS};
use mhealth_core::config::{StageOptions, DEFAULT_STATIC_CHUNK_FILE};
use mhealth_core::error::PreprocessError;
use mhealth_core::transforms::{axis_columns, DataBoundary, TransformUnit};
use polars::prelude::*;

use common::{
    distorted_chunks, metadata_for, sensor_table, static_orientations, Workspace, SENSOR_CSV,
    TRUE_OFFSET, TRUE_SCALE,
};

#[test]
fn fit_recovers_offset_and_scale() {
    let params = fit_calibration(&distorted_chunks()).expect("enough chunks");

    for axis in 0..3 {
        assert!(
            (params.offset[axis] - TRUE_OFFSET[axis]).abs() < 1e-3,
            "offset {axis}: {:?}",
            params.offset
        );
        assert!(
            (params.scale[axis] - TRUE_SCALE[axis]).abs() < 1e-3,
            "scale {axis}: {:?}",
            params.scale
        );
    }

    for (raw, unit) in distorted_chunks().into_iter().zip(static_orientations()) {
        let calibrated = params.apply_to(raw);
        for axis in 0..3 {
            assert!((calibrated[axis] - unit[axis]).abs() < 1e-3);
        }
    }
}

#[test]
fn fit_requires_minimum_chunks() {
    let chunks = distorted_chunks();
    assert!(fit_calibration(&chunks[..MIN_STATIC_CHUNKS - 1]).is_none());
}

#[test]
fn apply_calibration_only_touches_axis_columns() -> PolarsResult<()> {
    let table = sensor_table(SENSOR_CSV);
    let axes = axis_columns(&table).expect("axes");
    let params = fit_calibration(&distorted_chunks()).expect("params");

    let calibrated = apply_calibration(&table, &axes, &params).expect("calibrate");

    assert_eq!(calibrated.shape(), table.shape());
    assert!(calibrated
        .column("HEADER_TIME_STAMP")?
        .as_materialized_series()
        .equals(table.column("HEADER_TIME_STAMP")?.as_materialized_series()));

    let raw_x = table.column(axes[0].as_str())?.f64()?.get(0).unwrap();
    let cal_x = calibrated.column(axes[0].as_str())?.f64()?.get(0).unwrap();
    let expected = (raw_x + params.offset[0]) * params.scale[0];
    assert!((cal_x - expected).abs() < 1e-12);
    Ok(())
}

#[test]
fn calibrator_skips_sensor_without_static_chunks() {
    let workspace = Workspace::new();
    let chunk_file = workspace.write_reference(
        DEFAULT_STATIC_CHUNK_FILE,
        "PID,SENSOR_ID,MEAN_X,MEAN_Y,MEAN_Z\nSPADES_9,OTHER,0.0,0.0,1.0\n",
    );
    let path = workspace.write_sensor_file(SENSOR_CSV);
    let table = sensor_table(SENSOR_CSV);

    let calibrator = Calibrator::new(chunk_file, StageOptions::default());
    let output = calibrator
        .apply(&table, &DataBoundary::unbounded(), &metadata_for(&path))
        .expect("pass-through");

    assert!(output.equals(&table));
}

#[test]
fn calibrator_reports_missing_reference_file() {
    let workspace = Workspace::new();
    let path = workspace.write_sensor_file(SENSOR_CSV);
    let calibrator = Calibrator::new(
        workspace.root().join(DEFAULT_STATIC_CHUNK_FILE),
        StageOptions::default(),
    );

    let err = calibrator
        .apply(&sensor_table(SENSOR_CSV), &DataBoundary::unbounded(), &metadata_for(&path))
        .expect_err("missing reference");
    assert!(matches!(err, PreprocessError::ReferenceUnavailable { .. }));
}

#[test]
fn calibrator_rejects_tables_without_three_axes() {
    let workspace = Workspace::with_references();
    let path = workspace.write_sensor_file(SENSOR_CSV);
    let table = sensor_table("TS,X,Y\n2015-09-24 14:00:00.000,0.1,0.2\n");

    let calibrator = Calibrator::new(
        workspace.root().join(DEFAULT_STATIC_CHUNK_FILE),
        StageOptions::default(),
    );
    let err = calibrator
        .apply(&table, &DataBoundary::unbounded(), &metadata_for(&path))
        .expect_err("two channels");
    assert!(matches!(err, PreprocessError::Data(_)));
}
