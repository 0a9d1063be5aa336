#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use mhealth_core::config::{
    ProcessContext, DEFAULT_OFFSET_MAPPING_FILE, DEFAULT_SESSION_FILE, DEFAULT_STATIC_CHUNK_FILE,
};
use mhealth_core::metadata::RunMetadata;
use mhealth_parser::parse_sensor_csv;
use polars::prelude::DataFrame;
use tempfile::TempDir;

pub const PARTICIPANT: &str = "SPADES_1";
pub const SENSOR_ID: &str = "TAS1E23150066";
pub const FILE_NAME: &str =
    "ActigraphGT9X-AccelerationCalibrated-NA.TAS1E23150066-AccelerationCalibrated.2015-09-24-14-00-00-000-M0400.sensor.csv";

pub const TRUE_OFFSET: [f64; 3] = [0.05, -0.03, 0.02];
pub const TRUE_SCALE: [f64; 3] = [1.02, 0.98, 1.01];

pub const SENSOR_CSV: &str = "\
HEADER_TIME_STAMP,X_ACCELERATION_METERS_PER_SECOND_SQUARED,Y_ACCELERATION_METERS_PER_SECOND_SQUARED,Z_ACCELERATION_METERS_PER_SECOND_SQUARED
2015-09-24 14:00:00.000,0.031,-0.984,0.117
2015-09-24 14:00:00.013,0.035,-0.980,0.121
2015-09-24 14:00:00.027,0.027,-0.992,0.109
2015-09-24 14:00:00.040,0.039,-0.988,0.113
2015-09-24 14:00:00.053,0.023,-0.977,0.125
";

pub const HEADER_ONLY_CSV: &str = "\
HEADER_TIME_STAMP,X_ACCELERATION_METERS_PER_SECOND_SQUARED,Y_ACCELERATION_METERS_PER_SECOND_SQUARED,Z_ACCELERATION_METERS_PER_SECOND_SQUARED
";

pub const OFFSET_MAPPING_CSV: &str = "PID,OFFSET_IN_SECONDS\n1,2.5\n2,-1.0\n";

pub const SESSIONS_CSV: &str = "\
PID,START_TIME,STOP_TIME
SPADES_1,2015-09-24 14:00:00.000,2015-09-24 14:00:02.540
SPADES_2,2015-09-25 09:00:00.000,2015-09-25 11:00:00.000
";

/// Unit vectors a motionless sensor can report, including two tilted poses.
pub fn static_orientations() -> Vec<[f64; 3]> {
    let d = 1.0 / 3f64.sqrt();
    vec![
        [1.0, 0.0, 0.0],
        [-1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, -1.0, 0.0],
        [0.0, 0.0, 1.0],
        [0.0, 0.0, -1.0],
        [d, d, d],
        [-d, d, -d],
    ]
}

/// Raw readings a miscalibrated sensor would report for `orientations`.
pub fn distorted_chunks() -> Vec<[f64; 3]> {
    static_orientations()
        .into_iter()
        .map(|unit| [0, 1, 2].map(|axis| unit[axis] / TRUE_SCALE[axis] - TRUE_OFFSET[axis]))
        .collect()
}

pub fn static_chunks_csv() -> String {
    let mut content = String::from("PID,SENSOR_ID,MEAN_X,MEAN_Y,MEAN_Z\n");
    for chunk in distorted_chunks() {
        content.push_str(&format!(
            "{PARTICIPANT},{SENSOR_ID},{:.12},{:.12},{:.12}\n",
            chunk[0], chunk[1], chunk[2]
        ));
    }
    content.push_str("SPADES_1,OTHERSENSOR,0.0,0.0,1.0\n");
    content
}

pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    /// A root with all three reference files populated.
    pub fn with_references() -> Self {
        let workspace = Self::new();
        workspace.write_reference(DEFAULT_STATIC_CHUNK_FILE, &static_chunks_csv());
        workspace.write_reference(DEFAULT_OFFSET_MAPPING_FILE, OFFSET_MAPPING_CSV);
        workspace.write_reference(DEFAULT_SESSION_FILE, SESSIONS_CSV);
        workspace
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_reference(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root().join(relative);
        fs::create_dir_all(path.parent().expect("reference parent")).expect("mkdir");
        fs::write(&path, content).expect("write reference");
        path
    }

    pub fn sensor_path(&self) -> PathBuf {
        self.root()
            .join(PARTICIPANT)
            .join("MasterSynced/2015/09/24/14")
            .join(FILE_NAME)
    }

    pub fn write_sensor_file(&self, content: &str) -> PathBuf {
        let path = self.sensor_path();
        fs::create_dir_all(path.parent().expect("sensor parent")).expect("mkdir");
        fs::write(&path, content).expect("write sensor file");
        path
    }

    pub fn expected_output(&self, setname: &str) -> PathBuf {
        self.root()
            .join(PARTICIPANT)
            .join("Derived")
            .join(setname)
            .join("2015/09/24/14")
            .join(FILE_NAME)
    }

    pub fn context(&self, setname: &str) -> ProcessContext {
        ProcessContext::new(self.root(), setname)
    }
}

pub fn sensor_table(content: &str) -> DataFrame {
    parse_sensor_csv(content).expect("parse sensor csv").into_dataframe()
}

pub fn metadata_for(path: &Path) -> RunMetadata {
    RunMetadata::from_path(path, "MasterSynced").expect("metadata")
}
