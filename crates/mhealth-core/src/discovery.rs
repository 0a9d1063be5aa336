use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{PreprocessError, Result};

/// Expands `pattern` beneath `root` (or `root/participant`) into a sorted
/// list of files.
pub fn discover_files(root: &Path, participant: Option<&str>, pattern: &str) -> Result<Vec<PathBuf>> {
    let base = match participant {
        Some(participant) => root.join(participant),
        None => root.to_path_buf(),
    };
    let base_str = base.to_str().ok_or_else(|| {
        PreprocessError::Config(format!("root {} is not valid UTF-8", base.display()))
    })?;
    let full_pattern = Path::new(&glob::Pattern::escape(base_str)).join(pattern);
    let pattern_str = full_pattern.to_str().ok_or_else(|| {
        PreprocessError::Config(format!("pattern {} is not valid UTF-8", full_pattern.display()))
    })?;

    let entries = glob::glob(pattern_str)
        .map_err(|err| PreprocessError::Config(format!("invalid glob pattern '{pattern}': {err}")))?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(err) => warn!("could not read path from glob pattern: {err}"),
        }
    }

    files.sort();
    Ok(files)
}
