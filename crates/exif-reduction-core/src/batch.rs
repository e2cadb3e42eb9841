use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::warn;

use crate::outcome::{FileOutcome, RunSummary, SkipReason};
use crate::progress::{ProgressState, ThrottledProgress};
use crate::Operation;

/// Apply `work` to every file on a pool of exactly `workers` threads.
///
/// Each file is processed to completion by one worker; no ordering is kept
/// between files. A failing file is recorded in the summary and the batch
/// carries on.
pub fn run_batch<F>(
    operation: Operation,
    files: &[PathBuf],
    workers: usize,
    progress: &ThrottledProgress,
    work: F,
) -> anyhow::Result<RunSummary>
where
    F: Fn(&Path) -> Result<FileOutcome, SkipReason> + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("exif-reduction-{i}"))
        .build()?;

    let state = ProgressState::new(files.len() as u64);
    progress.report(&state.snapshot(operation, 0));

    let results: Vec<(PathBuf, Result<FileOutcome, SkipReason>)> = pool.install(|| {
        files
            .par_iter()
            .map(|path| {
                let result = work(path);
                if let Err(reason) = &result {
                    warn!("skipped {}: {}", path.display(), reason);
                }
                let completed = state.complete_one();
                progress.report(&state.snapshot(operation, completed));
                (path.clone(), result)
            })
            .collect()
    });

    let mut summary = RunSummary::new(operation, files.len() as u64);
    for (path, result) in results {
        summary.record(path, result);
    }
    summary.elapsed = state.elapsed();
    Ok(summary)
}
