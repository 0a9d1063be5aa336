use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{PreprocessError, Result};

pub const DEFAULT_STATIC_CHUNK_FILE: &str = "DerivedCrossParticipants/static_chunks.csv";
pub const DEFAULT_OFFSET_MAPPING_FILE: &str = "DerivedCrossParticipants/offset_mapping.csv";
pub const DEFAULT_SESSION_FILE: &str = "DerivedCrossParticipants/sessions.csv";
pub const DEFAULT_SOURCE_SEGMENT: &str = "MasterSynced";
pub const DEFAULT_DERIVED_SEGMENT: &str = "Derived";
pub const DEFAULT_SETNAME: &str = "Preprocessed";

/// Settings shared by every file of a run. Reference file paths are relative
/// to the processing root.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub static_chunk_file: PathBuf,
    pub offset_mapping_file: PathBuf,
    pub session_file: PathBuf,
    pub source_segment: String,
    pub derived_segment: String,
    pub float_precision: usize,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            static_chunk_file: PathBuf::from(DEFAULT_STATIC_CHUNK_FILE),
            offset_mapping_file: PathBuf::from(DEFAULT_OFFSET_MAPPING_FILE),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            source_segment: DEFAULT_SOURCE_SEGMENT.to_string(),
            derived_segment: DEFAULT_DERIVED_SEGMENT.to_string(),
            float_precision: 3,
        }
    }
}

impl PreprocessConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PreprocessConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.source_segment.is_empty() || self.source_segment.contains(['/', '\\']) {
            return Err(PreprocessError::Config(format!(
                "source_segment must be a single path component, got '{}'",
                self.source_segment
            )));
        }
        if self.derived_segment.is_empty() {
            return Err(PreprocessError::Config(
                "derived_segment must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Flags every transform unit is built with.
#[derive(Debug, Clone, Copy)]
pub struct StageOptions {
    pub verbose: bool,
    pub independent: bool,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            independent: true,
        }
    }
}

/// Everything a per-file run needs besides the file itself.
#[derive(Debug, Clone)]
pub struct ProcessContext {
    pub root: PathBuf,
    pub setname: String,
    pub options: StageOptions,
    pub config: PreprocessConfig,
}

impl ProcessContext {
    pub fn new(root: impl Into<PathBuf>, setname: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            setname: setname.into(),
            options: StageOptions::default(),
            config: PreprocessConfig::default(),
        }
    }

    pub fn with_options(mut self, options: StageOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_config(mut self, config: PreprocessConfig) -> Self {
        self.config = config;
        self
    }

    pub fn reference_path(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }
}
