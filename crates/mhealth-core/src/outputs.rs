use std::ffi::OsString;
use std::fs::{self, File};
use std::path::{Component, Path, PathBuf};

use polars::prelude::{CsvWriter, DataFrame, SerWriter};
use tracing::info;

use crate::config::PreprocessConfig;
use crate::error::{PreprocessError, Result};

/// Replaces the first `source_segment` component of `input` with
/// `<derived_segment>/<setname>`, keeping everything else.
pub fn derive_output_path(input: &Path, setname: &str, config: &PreprocessConfig) -> Result<PathBuf> {
    let mut output = PathBuf::new();
    let mut replaced = false;

    for component in input.components() {
        match component {
            Component::Normal(part) if !replaced && part == config.source_segment.as_str() => {
                output.push(&config.derived_segment);
                output.push(setname);
                replaced = true;
            }
            other => output.push(other.as_os_str()),
        }
    }

    if !replaced {
        return Err(PreprocessError::Config(format!(
            "input path {} does not contain a '{}' segment",
            input.display(),
            config.source_segment
        )));
    }

    Ok(output)
}

/// Persists `table` at the derived path and returns an empty frame: results
/// are written per file, so there is nothing to aggregate. Timestamps are
/// written with `timestamp_layout`, the layout they were read with.
pub fn write_output(
    table: &DataFrame,
    timestamp_layout: &str,
    input: &Path,
    setname: &str,
    config: &PreprocessConfig,
) -> Result<DataFrame> {
    let output_path = derive_output_path(input, setname, config)?;
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let staging_path = staging_path(&output_path);
    let persisted = write_csv(table, timestamp_layout, &staging_path, config)
        .and_then(|()| fs::rename(&staging_path, &output_path).map_err(PreprocessError::from));
    if let Err(err) = persisted {
        let _ = fs::remove_file(&staging_path);
        return Err(err);
    }

    info!(
        output = %output_path.display(),
        rows = table.height(),
        "saved preprocessed sensor data"
    );

    Ok(DataFrame::empty())
}

fn write_csv(
    table: &DataFrame,
    timestamp_layout: &str,
    path: &Path,
    config: &PreprocessConfig,
) -> Result<()> {
    let mut file = File::create(path)?;
    let mut frame = table.clone();
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_float_precision(Some(config.float_precision))
        .with_datetime_format(Some(timestamp_layout.to_string()))
        .finish(&mut frame)?;
    file.sync_all()?;
    Ok(())
}

fn staging_path(output_path: &Path) -> PathBuf {
    let mut name = output_path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(".partial");
    output_path.with_file_name(name)
}
