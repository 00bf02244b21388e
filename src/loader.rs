//! IR loading and artifact writing
//!
//! IR files are JSON arrays of records. Files that cannot be read or parsed
//! are logged and skipped; the caller decides what an empty result means.

use crate::error::{GenerateError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Extension of IR input files
pub const IR_FILE_EXTENSION: &str = "json";

/// List the IR files of a directory in file-name order
pub fn ir_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(GenerateError::InvalidIrDirectory(dir.to_path_buf()));
    }

    let entries = fs::read_dir(dir).map_err(|e| GenerateError::io(dir, e))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == IR_FILE_EXTENSION))
        .collect();
    files.sort();

    Ok(files)
}

/// Load the records of one IR file
///
/// Returns `None` (after logging) when the file is unreadable, is not valid
/// JSON, or does not hold an array.
pub fn load_ir_file(path: &Path) -> Option<Vec<serde_json::Value>> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Could not read IR file {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str::<serde_json::Value>(&content) {
        Ok(serde_json::Value::Array(records)) => Some(records),
        Ok(_) => {
            tracing::warn!("IR file {} does not contain a JSON array", path.display());
            None
        }
        Err(e) => {
            tracing::warn!("Could not parse IR file {}: {}", path.display(), e);
            None
        }
    }
}

/// Load and concatenate all IR records of a directory
pub fn load_ir_dir(dir: &Path) -> Result<Vec<serde_json::Value>> {
    let mut records = Vec::new();

    for file in ir_files(dir)? {
        tracing::debug!("Loading IR file: {}", file.display());
        if let Some(data) = load_ir_file(&file) {
            records.extend(data);
        }
    }

    Ok(records)
}

/// Create a directory and its parents
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| GenerateError::io(path, e))
}

/// Write an artifact, replacing any previous content
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| GenerateError::io(path, e))?;
    tracing::debug!("Successfully wrote to {}", path.display());
    Ok(())
}
