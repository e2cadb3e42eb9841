use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

/// Every regular file below `root`, recursively. Directories are traversed but
/// not returned; symlinks are not followed. Unreadable entries are logged and
/// left out.
pub fn collect_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                warn!("skipping unreadable entry: {}", err);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect()
}
