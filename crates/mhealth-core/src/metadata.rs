use std::path::{Component, Path, PathBuf};

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::error::{PreprocessError, Result};

/// Identity of the sensor file being processed. Built once per input file and
/// handed read-only to every stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunMetadata {
    pub participant_id: String,
    pub sensor_id: String,
    pub date: NaiveDate,
    pub hour: u32,
    pub source_file: PathBuf,
}

impl RunMetadata {
    /// Derives metadata from a path laid out as
    /// `<root>/<PID>/<source_segment>/.../<TYPE>.<SENSOR_ID>-<DATA>.<YYYY-MM-DD-HH-mm-ss-SSS>-<TZ>.sensor.csv`.
    pub fn from_path(path: &Path, source_segment: &str) -> Result<Self> {
        let participant_id = participant_from_path(path, source_segment)?;

        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| metadata_error(path, "path has no UTF-8 file name"))?;

        let fields: Vec<&str> = file_name.split('.').collect();
        if fields.len() < 5 {
            return Err(metadata_error(
                path,
                format!("expected at least 5 dot-separated fields in '{file_name}'"),
            ));
        }

        let sensor_id = fields[1]
            .split('-')
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| metadata_error(path, "missing sensor id"))?
            .to_string();

        let (date, hour) = parse_file_timestamp(fields[2])
            .ok_or_else(|| metadata_error(path, format!("invalid file timestamp '{}'", fields[2])))?;

        Ok(Self {
            participant_id,
            sensor_id,
            date,
            hour,
            source_file: path.to_path_buf(),
        })
    }

    /// Trailing integer of the participant id, e.g. `SPADES_12` -> 12.
    pub fn participant_number(&self) -> Option<u32> {
        let id = self.participant_id.as_str();
        let prefix = id.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        id[prefix..].parse().ok()
    }

    /// Nominal `[start, stop)` hour covered by the file.
    pub fn hour_window(&self) -> (NaiveDateTime, NaiveDateTime) {
        let start = self
            .date
            .and_hms_opt(self.hour, 0, 0)
            .unwrap_or_else(|| self.date.and_time(chrono::NaiveTime::MIN));
        (start, start + Duration::hours(1))
    }
}

fn participant_from_path(path: &Path, source_segment: &str) -> Result<String> {
    let components: Vec<&str> = path
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();

    let position = components
        .iter()
        .position(|part| *part == source_segment)
        .ok_or_else(|| metadata_error(path, format!("no '{source_segment}' segment")))?;

    if position == 0 {
        return Err(metadata_error(
            path,
            format!("no participant directory before '{source_segment}'"),
        ));
    }

    Ok(components[position - 1].to_string())
}

fn parse_file_timestamp(field: &str) -> Option<(NaiveDate, u32)> {
    let parts: Vec<&str> = field.split('-').collect();
    if parts.len() < 4 {
        return None;
    }
    let date = NaiveDate::parse_from_str(&parts[..3].join("-"), "%Y-%m-%d").ok()?;
    let hour: u32 = parts[3].parse().ok()?;
    (hour < 24).then_some((date, hour))
}

fn metadata_error(path: &Path, reason: impl Into<String>) -> PreprocessError {
    PreprocessError::Metadata {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}
