use chrono::NaiveDateTime;
use polars::lazy::dsl::*;
use polars::prelude::*;

use crate::error::{PreprocessError, Result};
use crate::metadata::RunMetadata;

/// Delimits the valid data region of a table. `start` is inclusive and `stop`
/// exclusive; `None` leaves that side open. Stages read it, never change it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataBoundary {
    pub start: Option<NaiveDateTime>,
    pub stop: Option<NaiveDateTime>,
}

impl DataBoundary {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn between(start: NaiveDateTime, stop: NaiveDateTime) -> Self {
        Self {
            start: Some(start),
            stop: Some(stop),
        }
    }
}

/// One step of the preprocessing pipeline. Each call returns a new table and
/// leaves the input untouched.
pub trait TransformUnit: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(
        &self,
        table: &DataFrame,
        boundary: &DataBoundary,
        metadata: &RunMetadata,
    ) -> Result<DataFrame>;
}

/// Name of the first column, which must hold `Datetime` values.
pub fn timestamp_column(table: &DataFrame) -> Result<String> {
    let column = table
        .get_columns()
        .first()
        .ok_or_else(|| PreprocessError::Data("table has no columns".to_string()))?;

    match column.dtype() {
        DataType::Datetime(TimeUnit::Microseconds, _) => Ok(column.name().to_string()),
        other => Err(PreprocessError::Data(format!(
            "first column '{}' must be a microsecond datetime, found {other}",
            column.name()
        ))),
    }
}

/// The first three channel columns after the timestamp.
pub fn axis_columns(table: &DataFrame) -> Result<[String; 3]> {
    let names: Vec<String> = table
        .get_column_names()
        .into_iter()
        .skip(1)
        .take(3)
        .map(|name| name.to_string())
        .collect();

    match <[String; 3]>::try_from(names) {
        Ok(axes) => Ok(axes),
        Err(found) => Err(PreprocessError::Data(format!(
            "expected three acceleration channels, found {}",
            found.len()
        ))),
    }
}

pub fn naive_to_micros(value: NaiveDateTime) -> i64 {
    value.and_utc().timestamp_micros()
}

/// Int64 literal for comparing against or adding to a timestamp cast to
/// microseconds. A bare `lit(i64)` is dynamically typed and does not
/// survive supertype resolution against Int64 columns.
pub fn micros_lit(value: i64) -> Expr {
    lit(Scalar::new(DataType::Int64, AnyValue::Int64(value)))
}
