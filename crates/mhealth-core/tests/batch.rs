#![cfg(feature = "runtime")]

mod common;

use std::fs;
use std::sync::Arc;

use mhealth_core::batch::process_files;
use mhealth_core::discovery::discover_files;

use common::{Workspace, FILE_NAME, SENSOR_CSV};

const SECOND_FILE: &str =
    "ActigraphGT9X-AccelerationCalibrated-NA.TAS1E23150066-AccelerationCalibrated.2015-09-24-15-00-00-000-M0400.sensor.csv";

fn write_hour_file(workspace: &Workspace, hour: &str, name: &str, content: &str) {
    let dir = workspace
        .root()
        .join("SPADES_1/MasterSynced/2015/09/24")
        .join(hour);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(name), content).unwrap();
}

#[test]
fn discovery_expands_pattern_under_participant() {
    let workspace = Workspace::with_references();
    workspace.write_sensor_file(SENSOR_CSV);
    write_hour_file(&workspace, "15", SECOND_FILE, SENSOR_CSV);
    write_hour_file(&workspace, "15", "notes.txt", "ignored");

    let files = discover_files(
        workspace.root(),
        Some("SPADES_1"),
        "MasterSynced/**/Actigraph*.sensor.csv",
    )
    .expect("discover");

    assert_eq!(files.len(), 2);
    assert!(files[0].ends_with(FILE_NAME));
    assert!(files[1].ends_with(SECOND_FILE));
}

#[tokio::test(flavor = "multi_thread")]
async fn parallel_run_isolates_failing_files() {
    let workspace = Workspace::with_references();
    workspace.write_sensor_file(SENSOR_CSV);
    write_hour_file(&workspace, "15", SECOND_FILE, "HEADER_TIME_STAMP,X,Y,Z\nbroken,1,2,3\n");

    let files = discover_files(workspace.root(), None, "SPADES_1/MasterSynced/**/*.sensor.csv")
        .expect("discover");
    let context = Arc::new(workspace.context("Preprocessed"));

    let summary = process_files(files, context, true, 4).await;

    assert_eq!(summary.total(), 2);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed.len(), 1);
    assert!(summary.failed[0].path.ends_with(SECOND_FILE));
    assert!(workspace.expected_output("Preprocessed").exists());
}

#[tokio::test]
async fn sequential_run_processes_every_file() {
    let workspace = Workspace::with_references();
    workspace.write_sensor_file(SENSOR_CSV);

    let files = discover_files(workspace.root(), Some("SPADES_1"), "MasterSynced/**/*.sensor.csv")
        .expect("discover");
    let summary = process_files(files, Arc::new(workspace.context("Preprocessed")), false, 8).await;

    assert_eq!(summary.succeeded, 1);
    assert!(summary.failed.is_empty());
}
