//! Recursive JSON file discovery.

use crate::error::{EtlError, EtlResult};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

const JSON_EXTENSION: &str = "json";

/// Returns the absolute path of every `*.json` file below `root`.
///
/// Directory entries are visited in file name order, so repeated calls on an
/// unchanged tree return the same sequence.
pub fn discover_json_files(root: &Path) -> EtlResult<Vec<PathBuf>> {
    if !root.exists() {
        return Err(EtlError::NotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(EtlError::NotADirectory(root.to_path_buf()));
    }
    let root = root
        .canonicalize()
        .map_err(|e| EtlError::io(root, e))?;

    let mut files = Vec::new();
    for entry in WalkDir::new(&root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
                return Err(EtlError::io(path, e.into()));
            }
        };
        if entry.file_type().is_file() && has_json_extension(entry.path()) {
            files.push(entry.into_path());
        }
    }

    if files.is_empty() {
        warn!("No JSON files found in {}", root.display());
    }
    info!("{} files found in {}", files.len(), root.display());
    Ok(files)
}

fn has_json_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == JSON_EXTENSION)
        .unwrap_or(false)
}
