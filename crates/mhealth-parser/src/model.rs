use polars::prelude::DataFrame;

/// A parsed mhealth sensor file. Column 0 of `df` is the timestamp
/// (`Datetime(Microseconds)`); every other column is a `Float64` channel.
#[derive(Debug, Clone)]
pub struct SensorFileData {
    pub timestamp_column: String,
    /// chrono format that reproduces the timestamps as they appeared in the file.
    pub timestamp_layout: String,
    pub channel_columns: Vec<String>,
    pub df: DataFrame,
}

impl SensorFileData {
    pub fn row_count(&self) -> usize {
        self.df.height()
    }

    pub fn into_dataframe(self) -> DataFrame {
        self.df
    }
}
