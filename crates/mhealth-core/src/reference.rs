//! Loaders for the cross-participant reference tables under
//! `DerivedCrossParticipants/`.

use std::fs::File;
use std::path::Path;

use chrono::NaiveDateTime;
use mhealth_parser::parse_timestamp;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{PreprocessError, Result};

/// Mean acceleration (in g) of one motionless chunk of a sensor recording.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StaticChunk {
    #[serde(rename = "PID")]
    pub participant_id: String,
    #[serde(rename = "SENSOR_ID")]
    pub sensor_id: String,
    #[serde(rename = "MEAN_X")]
    pub mean_x: f64,
    #[serde(rename = "MEAN_Y")]
    pub mean_y: f64,
    #[serde(rename = "MEAN_Z")]
    pub mean_z: f64,
}

impl StaticChunk {
    pub fn as_vector(&self) -> [f64; 3] {
        [self.mean_x, self.mean_y, self.mean_z]
    }
}

/// Clock offset of one participant's sensors relative to the reference clock.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OffsetEntry {
    #[serde(rename = "PID")]
    pub participant_number: u32,
    #[serde(rename = "OFFSET_IN_SECONDS")]
    pub offset_seconds: f64,
}

#[derive(Debug, Deserialize)]
struct SessionRecord {
    #[serde(rename = "PID")]
    participant_id: String,
    #[serde(rename = "START_TIME")]
    start_time: String,
    #[serde(rename = "STOP_TIME")]
    stop_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionWindow {
    pub participant_id: String,
    pub start: NaiveDateTime,
    pub stop: NaiveDateTime,
}

pub fn load_static_chunks(path: &Path) -> Result<Vec<StaticChunk>> {
    read_records(path)
}

pub fn load_offset_mapping(path: &Path) -> Result<Vec<OffsetEntry>> {
    let entries: Vec<OffsetEntry> = read_records(path)?;
    if let Some(entry) = entries.iter().find(|entry| !entry.offset_seconds.is_finite()) {
        return Err(PreprocessError::InvalidReference {
            path: path.to_path_buf(),
            message: format!(
                "offset for participant {} is not a finite number of seconds",
                entry.participant_number
            ),
        });
    }
    Ok(entries)
}

pub fn load_sessions(path: &Path) -> Result<Vec<SessionWindow>> {
    let records: Vec<SessionRecord> = read_records(path)?;
    records
        .into_iter()
        .map(|record| {
            let start = parse_reference_time(path, &record.start_time)?;
            let stop = parse_reference_time(path, &record.stop_time)?;
            if stop < start {
                return Err(PreprocessError::InvalidReference {
                    path: path.to_path_buf(),
                    message: format!(
                        "session for {} stops before it starts",
                        record.participant_id
                    ),
                });
            }
            Ok(SessionWindow {
                participant_id: record.participant_id,
                start,
                stop,
            })
        })
        .collect()
}

fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).map_err(|source| PreprocessError::ReferenceUnavailable {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    reader
        .deserialize()
        .map(|row| {
            row.map_err(|err| PreprocessError::InvalidReference {
                path: path.to_path_buf(),
                message: err.to_string(),
            })
        })
        .collect()
}

fn parse_reference_time(path: &Path, value: &str) -> Result<NaiveDateTime> {
    parse_timestamp(value).ok_or_else(|| PreprocessError::InvalidReference {
        path: path.to_path_buf(),
        message: format!("invalid timestamp '{value}'"),
    })
}
