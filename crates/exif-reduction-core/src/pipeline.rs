//! The three batch passes: retime in place, file into month folders, mirror.

use std::path::Path;
use std::sync::Mutex;

use tracing::{debug, info, warn};

use crate::batch::run_batch;
use crate::date::folder::{month_folder_name, parse_month_folder};
use crate::date::guess::guess_date_from_filename;
use crate::date::{CandidateDate, DatePolicy, DateSource, FileRecord};
use crate::metadata::{MetadataReader, MetadataWriter};
use crate::outcome::{FileOutcome, RunSummary, SkipReason};
use crate::progress::ThrottledProgress;
use crate::relocate::{relocate, RelocationMode};
use crate::scan::collect_files;
use crate::sweep::remove_empty_dirs;
use crate::timestamps::{apply_timestamps, read_fs_times};
use crate::Operation;

/// The external metadata capabilities a run uses.
#[derive(Clone, Copy)]
pub struct Capabilities<'a> {
    pub reader: &'a dyn MetadataReader,
    pub writer: &'a dyn MetadataWriter,
}

impl Default for Capabilities<'static> {
    fn default() -> Self {
        Self {
            reader: &crate::metadata::ContainerReader,
            writer: &crate::metadata::NoopWriter,
        }
    }
}

/// Collect every date candidate for `path`. The parent folder name is only
/// consulted when `use_folder` is set.
pub fn gather_candidates(
    path: &Path,
    policy: &DatePolicy,
    reader: &dyn MetadataReader,
    use_folder: bool,
) -> Result<FileRecord, SkipReason> {
    let mut record = FileRecord::new(path);

    if use_folder {
        let folder_date = path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .and_then(parse_month_folder);
        record.admit(policy, DateSource::Folder, folder_date);
    }

    record.admit(policy, DateSource::Embedded, reader.read(path));

    let times = read_fs_times(path).map_err(SkipReason::Stat)?;
    record.admit(policy, DateSource::FsCreated, times.created);
    record.admit(policy, DateSource::FsModified, times.modified);

    let name = path.file_name().ok_or(SkipReason::NoFileName)?.to_string_lossy();
    let guessed = guess_date_from_filename(&name).map(|g| g.date);
    record.admit(policy, DateSource::Filename, guessed);

    Ok(record)
}

fn resolve(path: &Path, policy: &DatePolicy, reader: &dyn MetadataReader, use_folder: bool) -> Result<CandidateDate, SkipReason> {
    let mut record = gather_candidates(path, policy, reader, use_folder)?;
    let resolved = record.resolve(policy);
    debug!(
        path = %path.display(),
        date = %resolved.date,
        source = %resolved.source,
        candidates = record.candidates.len(),
        "resolved date"
    );
    Ok(resolved)
}

/// Rewrite each file's timestamps, and the embedded date of writable images,
/// to the resolved date.
pub fn exif_reduction(
    root: &Path,
    workers: usize,
    caps: Capabilities,
    progress: &ThrottledProgress,
) -> anyhow::Result<RunSummary> {
    let files = collect_files(root);
    info!("{}: {} files under {}", Operation::ExifReduction, files.len(), root.display());

    let policy = DatePolicy::at_local_now();
    let warnings = Mutex::new(Vec::new());

    let mut summary = run_batch(Operation::ExifReduction, &files, workers, progress, |path| {
        let resolved = resolve(path, &policy, caps.reader, false)?;

        let mut metadata_written = false;
        if caps.writer.supports(path) {
            match caps.writer.write(path, resolved.date) {
                Ok(()) => metadata_written = true,
                Err(err) => {
                    warn!("could not write metadata to {}: {:#}", path.display(), err);
                    if let Ok(mut w) = warnings.lock() {
                        w.push(format!("{}: {:#}", path.display(), err));
                    }
                }
            }
        }

        // after the metadata write, which itself bumps the modification time
        apply_timestamps(path, resolved.date).map_err(SkipReason::Timestamps)?;

        Ok(FileOutcome::Retimed {
            date: resolved.date,
            source: resolved.source,
            metadata_written,
        })
    })?;

    summary.warnings = warnings.into_inner().unwrap_or_else(|e| e.into_inner());
    Ok(summary)
}

/// Move each file into `<root>/<YYYY>年<MM>月/` and sweep emptied directories.
pub fn folder_structure(
    root: &Path,
    workers: usize,
    caps: Capabilities,
    progress: &ThrottledProgress,
) -> anyhow::Result<RunSummary> {
    let files = collect_files(root);
    info!("{}: {} files under {}", Operation::FolderStructure, files.len(), root.display());

    let policy = DatePolicy::at_local_now();

    let mut summary = run_batch(Operation::FolderStructure, &files, workers, progress, |path| {
        let resolved = resolve(path, &policy, caps.reader, true)?;
        let name = path.file_name().ok_or(SkipReason::NoFileName)?;
        let destination = root.join(month_folder_name(&resolved.date)).join(name);
        relocate(path, &destination, RelocationMode::Move).map(FileOutcome::Relocated)
    })?;

    summary.dirs_removed = remove_empty_dirs(root);
    Ok(summary)
}

/// Copy each file to the same relative path under `target`.
pub fn directory_copy(
    root: &Path,
    target: &Path,
    workers: usize,
    progress: &ThrottledProgress,
) -> anyhow::Result<RunSummary> {
    let files = collect_files(root);
    info!(
        "{}: {} files from {} to {}",
        Operation::DirectoryCopy,
        files.len(),
        root.display(),
        target.display()
    );

    run_batch(Operation::DirectoryCopy, &files, workers, progress, |path| {
        let relative = path.strip_prefix(root).map_err(|_| SkipReason::OutsideRoot {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
        })?;
        relocate(path, &target.join(relative), RelocationMode::Copy).map(FileOutcome::Relocated)
    })
}
