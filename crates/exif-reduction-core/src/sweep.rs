use std::fs;
use std::path::Path;

use tracing::{debug, warn};

/// Remove, bottom-up, every directory below `root` that ends up holding
/// neither files nor subdirectories. `root` itself is kept. Returns the number
/// of directories removed.
pub fn remove_empty_dirs(root: &Path) -> u64 {
    let Ok(entries) = fs::read_dir(root) else {
        return 0;
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let Ok(kind) = entry.file_type() else { continue };
        if !kind.is_dir() {
            continue;
        }
        let dir = entry.path();
        removed += remove_empty_dirs(&dir);

        if is_empty(&dir) {
            match fs::remove_dir(&dir) {
                Ok(()) => {
                    debug!(dir = %dir.display(), "removed empty directory");
                    removed += 1;
                }
                Err(err) => warn!("could not remove {}: {}", dir.display(), err),
            }
        }
    }
    removed
}

fn is_empty(dir: &Path) -> bool {
    fs::read_dir(dir).map_or(false, |mut it| it.next().is_none())
}
