use std::io;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;

use crate::date::DateSource;
use crate::relocate::{Relocation, RelocationMode, Resolution};
use crate::Operation;

/// What happened to a file that was processed successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Retimed {
        date: NaiveDateTime,
        source: DateSource,
        metadata_written: bool,
    },
    Relocated(Relocation),
}

/// Why a file was left unprocessed. The batch always carries on.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("could not create directory {}: {source}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("could not hash {}: {source}", .path.display())]
    Digest { path: PathBuf, source: io::Error },

    #[error("could not move to {}: {source}", .to.display())]
    Move { to: PathBuf, source: io::Error },

    #[error("could not copy to {}: {source}", .to.display())]
    Copy { to: PathBuf, source: io::Error },

    #[error("could not remove duplicate: {0}")]
    RemoveDuplicate(#[source] io::Error),

    #[error("could not read file metadata: {0}")]
    Stat(#[source] io::Error),

    #[error("could not set timestamps: {0}")]
    Timestamps(#[source] io::Error),

    #[error("{} is not under {}", .path.display(), .root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("path has no file name")]
    NoFileName,
}

/// Aggregated result of one operation over the whole tree.
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub operation: Option<Operation>,
    pub total: u64,
    pub retimed: u64,
    pub metadata_written: u64,
    pub moved: u64,
    pub copied: u64,
    pub renamed: u64,
    pub duplicates: u64,
    pub in_place: u64,
    pub dirs_removed: u64,
    /// Files that failed, with the rendered reason.
    pub skipped: Vec<(PathBuf, String)>,
    pub warnings: Vec<String>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn new(operation: Operation, total: u64) -> Self {
        Self {
            operation: Some(operation),
            total,
            ..Self::default()
        }
    }

    pub fn record(&mut self, path: PathBuf, result: Result<FileOutcome, SkipReason>) {
        match result {
            Ok(FileOutcome::Retimed { metadata_written, .. }) => {
                self.retimed += 1;
                if metadata_written {
                    self.metadata_written += 1;
                }
            }
            Ok(FileOutcome::Relocated(r)) => match (r.resolution, r.mode) {
                (Resolution::Direct, RelocationMode::Move) => self.moved += 1,
                (Resolution::Direct, RelocationMode::Copy) => self.copied += 1,
                (Resolution::Renamed, _) => self.renamed += 1,
                (Resolution::Identical, _) => self.duplicates += 1,
                (Resolution::InPlace, _) => self.in_place += 1,
            },
            Err(reason) => self.skipped.push((path, reason.to_string())),
        }
    }

    /// Files that ended in a successful outcome.
    pub fn succeeded(&self) -> u64 {
        self.total - self.skipped.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts_each_outcome() {
        let mut s = RunSummary::new(Operation::FolderStructure, 4);
        let reloc = |resolution| {
            Ok(FileOutcome::Relocated(Relocation {
                from: PathBuf::from("a"),
                to: PathBuf::from("b"),
                resolution,
                mode: RelocationMode::Move,
            }))
        };
        s.record(PathBuf::from("1"), reloc(Resolution::Direct));
        s.record(PathBuf::from("2"), reloc(Resolution::Identical));
        s.record(PathBuf::from("3"), reloc(Resolution::Renamed));
        s.record(PathBuf::from("4"), Err(SkipReason::NoFileName));

        assert_eq!((s.moved, s.duplicates, s.renamed, s.copied), (1, 1, 1, 0));
        assert_eq!(s.succeeded(), 3);
        assert_eq!(s.skipped, vec![(PathBuf::from("4"), "path has no file name".to_string())]);
    }

    #[test]
    fn test_skip_reason_messages_name_the_path() {
        let err = SkipReason::Copy {
            to: PathBuf::from("/t/a.jpg"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "could not copy to /t/a.jpg: denied");
    }

    #[test]
    fn test_summary_serializes_for_reports() {
        let mut s = RunSummary::new(Operation::DirectoryCopy, 2);
        s.copied = 1;
        s.record(PathBuf::from("/p/x.jpg"), Err(SkipReason::NoFileName));

        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["operation"], "directory-copy");
        assert_eq!(json["total"], 2);
        assert_eq!(json["copied"], 1);
        assert_eq!(json["skipped"][0][0], "/p/x.jpg");
        assert_eq!(json["skipped"][0][1], "path has no file name");
    }
}
