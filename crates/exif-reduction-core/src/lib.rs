pub mod batch;
pub mod config;
pub mod date;
pub mod digest;
pub mod metadata;
pub mod outcome;
pub mod pipeline;
pub mod progress;
pub mod relocate;
pub mod scan;
pub mod sweep;
pub mod timestamps;

use thiserror::Error;
use tracing::info;

pub use config::{ConfigError, Operation, ProcessOptions, DEFAULT_WORKERS};
pub use metadata::{ContainerReader, ExiftoolWriter, MetadataReader, MetadataWriter, NoopWriter};
pub use outcome::{FileOutcome, RunSummary, SkipReason};
pub use pipeline::Capabilities;
pub use progress::{Progress, ProgressCallback, ThrottledProgress};

/// Returned when a run is requested without confirmation. Nothing on disk has
/// been touched.
#[derive(Debug, Clone, Error)]
#[error("Run not confirmed")]
pub struct NotConfirmedError;

/// Run the selected operation with progress reporting. Returns one summary per
/// pass; `All` runs exif-reduction and then folder-structure.
pub fn process(
    options: &ProcessOptions,
    caps: Capabilities,
    progress_callback: &ProgressCallback<'_>,
) -> anyhow::Result<Vec<RunSummary>> {
    options.validate()?;
    if !options.confirmed {
        return Err(NotConfirmedError.into());
    }

    let tp = ThrottledProgress::new(progress_callback);
    let root = options.directory.as_path();
    let workers = options.worker_count;

    let summaries = match options.operation {
        Operation::ExifReduction => vec![pipeline::exif_reduction(root, workers, caps, &tp)?],
        Operation::FolderStructure => vec![pipeline::folder_structure(root, workers, caps, &tp)?],
        Operation::DirectoryCopy => {
            let target = options.target_directory.as_deref().ok_or(ConfigError::MissingTarget)?;
            vec![pipeline::directory_copy(root, target, workers, &tp)?]
        }
        Operation::All => vec![
            pipeline::exif_reduction(root, workers, caps, &tp)?,
            pipeline::folder_structure(root, workers, caps, &tp)?,
        ],
    };

    for summary in &summaries {
        info!(
            "{}: {} of {} files done, {} skipped in {:.1}s",
            summary.operation.map(|o| o.to_string()).unwrap_or_default(),
            summary.succeeded(),
            summary.total,
            summary.skipped.len(),
            summary.elapsed.as_secs_f64()
        );
    }
    Ok(summaries)
}
