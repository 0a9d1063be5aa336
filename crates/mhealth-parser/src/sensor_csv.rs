use std::collections::HashSet;

use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord, Trim};
use polars::prelude::*;

use crate::errors::ParserError;
use crate::model::SensorFileData;

pub static TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

/// Layout of mhealth files, used when a file has no rows to take it from.
pub const DEFAULT_TIMESTAMP_LAYOUT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Parses a timestamp cell in any of the accepted mhealth layouts.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
}

/// Format string that writes a parsed timestamp back exactly as `value` was
/// spelled. `None` when the fractional digits cannot be reproduced at
/// microsecond resolution.
pub fn timestamp_layout(value: &str) -> Option<&'static str> {
    match value.trim().rsplit_once('.').map(|(_, fraction)| fraction.len()) {
        None => Some("%Y-%m-%d %H:%M:%S"),
        Some(3) => Some("%Y-%m-%d %H:%M:%S%.3f"),
        Some(6) => Some("%Y-%m-%d %H:%M:%S%.6f"),
        Some(_) => None,
    }
}

/// Parses mhealth sensor CSV text: a header row, a timestamp column first,
/// then one or more numeric channel columns.
pub fn parse_sensor_csv(content: &str) -> Result<SensorFileData, ParserError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let header = reader.headers()?.clone();
    let (timestamp_column, channel_columns) = classify_header(&header)?;

    let mut timestamps: Vec<i64> = Vec::new();
    let mut layout: Option<&'static str> = None;
    let mut channels: Vec<Vec<Option<f64>>> = vec![Vec::new(); channel_columns.len()];

    for record in reader.records() {
        let record = record?;
        let line_index = record.position().map(|pos| pos.line()).unwrap_or_default();

        let raw_ts = record.get(0).unwrap_or_default();
        let timestamp = parse_timestamp(raw_ts).ok_or_else(|| ParserError::DataRow {
            line_index,
            message: format!("invalid timestamp '{raw_ts}'"),
        })?;
        let micros = timestamp.and_utc().timestamp_micros();

        let row_layout = timestamp_layout(raw_ts).ok_or_else(|| ParserError::DataRow {
            line_index,
            message: format!("timestamp '{raw_ts}' must have 0, 3 or 6 fractional digits"),
        })?;
        match layout {
            None => layout = Some(row_layout),
            Some(expected) if expected != row_layout => {
                return Err(ParserError::Validation {
                    message: format!("timestamp precision changes at line {line_index}"),
                });
            }
            Some(_) => {}
        }

        if let Some(&previous) = timestamps.last() {
            if micros < previous {
                return Err(ParserError::Validation {
                    message: format!("timestamps decrease at line {line_index}"),
                });
            }
        }
        timestamps.push(micros);

        for (idx, column) in channel_columns.iter().enumerate() {
            let cell = record.get(idx + 1).unwrap_or_default();
            channels[idx].push(parse_optional_f64(cell, line_index, column)?);
        }
    }

    let df = build_sensor_dataframe(&timestamp_column, timestamps, &channel_columns, channels)?;

    Ok(SensorFileData {
        timestamp_column,
        timestamp_layout: layout.unwrap_or(DEFAULT_TIMESTAMP_LAYOUT).to_string(),
        channel_columns,
        df,
    })
}

fn classify_header(header: &StringRecord) -> Result<(String, Vec<String>), ParserError> {
    if header.len() < 2 {
        return Err(ParserError::InvalidHeader {
            message: format!(
                "expected a timestamp column and at least one channel, found {} columns",
                header.len()
            ),
        });
    }

    let mut seen = HashSet::new();
    for name in header.iter() {
        if name.is_empty() {
            return Err(ParserError::InvalidHeader {
                message: "empty column name".to_string(),
            });
        }
        if !seen.insert(name) {
            return Err(ParserError::InvalidHeader {
                message: format!("duplicate column '{name}'"),
            });
        }
    }

    let timestamp_column = header.get(0).unwrap_or_default().to_string();
    let channel_columns = header.iter().skip(1).map(str::to_string).collect();
    Ok((timestamp_column, channel_columns))
}

fn parse_optional_f64(value: &str, line_index: u64, column: &str) -> Result<Option<f64>, ParserError> {
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }

    value
        .parse::<f64>()
        .map(Some)
        .map_err(|err| ParserError::DataRow {
            line_index,
            message: format!("failed to parse column '{column}' as float: {err}"),
        })
}

fn build_sensor_dataframe(
    timestamp_column: &str,
    timestamps: Vec<i64>,
    channel_columns: &[String],
    channels: Vec<Vec<Option<f64>>>,
) -> Result<DataFrame, ParserError> {
    let ts_series = Series::new(timestamp_column.into(), timestamps)
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))
        .map_err(|err| ParserError::Validation {
            message: format!("failed to cast timestamp column: {err}"),
        })?;

    let mut columns: Vec<Column> = Vec::with_capacity(channel_columns.len() + 1);
    columns.push(ts_series.into());
    for (name, values) in channel_columns.iter().zip(channels) {
        columns.push(Series::new(name.as_str().into(), values).into());
    }

    DataFrame::new(columns).map_err(|err| ParserError::Validation {
        message: format!("failed to construct sensor dataframe: {err}"),
    })
}
