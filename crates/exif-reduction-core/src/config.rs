use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_WORKERS: usize = 5;

/// Which batch pass to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    /// Rewrite file timestamps (and JPEG capture dates) from the resolved date.
    ExifReduction,
    /// Move files into `<year>年<month>月` folders and drop emptied directories.
    FolderStructure,
    /// Mirror the tree into the target directory.
    DirectoryCopy,
    /// exif-reduction followed by folder-structure.
    All,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ExifReduction => "exif-reduction",
            Self::FolderStructure => "folder-structure",
            Self::DirectoryCopy => "directory-copy",
            Self::All => "all",
        };
        f.write_str(s)
    }
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_operation() -> Operation {
    Operation::ExifReduction
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessOptions {
    pub directory: PathBuf,
    #[serde(default)]
    pub target_directory: Option<PathBuf>,
    #[serde(default = "default_workers")]
    pub worker_count: usize,
    #[serde(default = "default_operation")]
    pub operation: Operation,
    /// Confirmation gate: nothing is touched unless this is set.
    #[serde(default)]
    pub confirmed: bool,
}

impl ProcessOptions {
    pub fn new(directory: impl Into<PathBuf>, operation: Operation) -> Self {
        Self {
            directory: directory.into(),
            target_directory: None,
            worker_count: DEFAULT_WORKERS,
            operation,
            confirmed: false,
        }
    }

    pub fn with_target(mut self, target: impl Into<PathBuf>) -> Self {
        self.target_directory = Some(target.into());
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.worker_count = workers;
        self
    }

    pub fn confirmed(mut self, confirmed: bool) -> Self {
        self.confirmed = confirmed;
        self
    }

    /// Check the options before anything is mutated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if !self.directory.is_dir() {
            return Err(ConfigError::NotADirectory(self.directory.clone()));
        }
        if self.operation == Operation::DirectoryCopy {
            let target = self.target_directory.as_deref().ok_or(ConfigError::MissingTarget)?;
            if is_within(target, &self.directory) {
                return Err(ConfigError::TargetInsideSource {
                    target: target.to_path_buf(),
                    source_dir: self.directory.clone(),
                });
            }
        }
        Ok(())
    }
}

/// `path` equals `root` or lies beneath it. Compared on canonical paths when
/// they can be resolved.
fn is_within(path: &Path, root: &Path) -> bool {
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    let mut probe = path.to_path_buf();
    // the target may not exist yet; resolve its nearest existing ancestor
    let mut tail = Vec::new();
    while !probe.exists() {
        let Some(name) = probe.file_name().map(|n| n.to_os_string()) else { break };
        let Some(parent) = probe.parent().map(Path::to_path_buf) else { break };
        tail.push(name);
        probe = parent;
    }
    let mut resolved = probe.canonicalize().unwrap_or(probe);
    for name in tail.into_iter().rev() {
        resolved.push(name);
    }
    resolved.starts_with(&root)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("worker count must be at least 1")]
    ZeroWorkers,

    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("directory-copy needs a target directory")]
    MissingTarget,

    #[error("target {} lies inside the source {}", .target.display(), .source_dir.display())]
    TargetInsideSource { target: PathBuf, source_dir: PathBuf },
}
