use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::image_pipeline::common::error::{ConversionError, Result};

/// An archive found under the input root, with the output directory that
/// mirrors its location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: PathBuf,
    pub output_dir: PathBuf,
}

/// Recursively lists archives with `extension` under `input_root`, sorted by
/// path.
pub fn discover_archives(input_root: &Path, output_root: &Path, extension: &str) -> Result<Vec<ArchiveEntry>> {
    if !input_root.is_dir() {
        return Err(ConversionError::InputReadError(format!(
            "{}: not a directory",
            input_root.display()
        )));
    }

    let mut archives: Vec<ArchiveEntry> = WalkDir::new(input_root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| has_extension(path, extension))
        .map(|path| {
            let relative_parent = path
                .strip_prefix(input_root)
                .ok()
                .and_then(Path::parent)
                .map(Path::to_path_buf)
                .unwrap_or_default();
            ArchiveEntry {
                output_dir: output_root.join(relative_parent),
                path,
            }
        })
        .collect();

    archives.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(archives)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}
