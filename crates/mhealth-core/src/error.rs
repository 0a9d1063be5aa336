// crates/mhealth-core/src/error.rs

use std::path::PathBuf;

use mhealth_parser::ParserError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Sensor file parsing failed: {0}")]
    Parser(#[from] ParserError),

    #[error("Configuration file error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("reference file {path} could not be opened: {source}")]
    ReferenceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("reference file {path} is malformed: {message}")]
    InvalidReference { path: PathBuf, message: String },

    #[error("reference file {path} has no entry for {key}")]
    MissingReferenceEntry { path: PathBuf, key: String },

    #[error("cannot derive run metadata from {path}: {reason}")]
    Metadata { path: PathBuf, reason: String },

    #[error("Invalid sensor table: {0}")]
    Data(String),

    #[error("stage {stage} failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<PreprocessError>,
    },
}

impl PreprocessError {
    pub fn stage(stage: &'static str, source: PreprocessError) -> Self {
        PreprocessError::Stage {
            stage,
            source: Box::new(source),
        }
    }

    /// Name of the transform unit that raised this error, if any.
    pub fn failed_stage(&self) -> Option<&'static str> {
        match self {
            PreprocessError::Stage { stage, .. } => Some(stage),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PreprocessError>;
