//! Move or copy a file to a computed destination without losing data.
//!
//! When the destination is taken, the two files are compared by SHA-256. Equal
//! content is treated as a duplicate; different content is placed next to the
//! occupant as `<stem>_<HEX><.ext>`.
//!
//! Known race: the "destination exists?" check and the write that follows are
//! not atomic as a pair. Two workers placing different files under the same
//! name can both observe an absent destination, and the later write replaces
//! the earlier one. Writes are not serialised per destination path.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::digest::{digest_suffix, file_digest};
use crate::outcome::SkipReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocationMode {
    Move,
    Copy,
}

/// How a destination conflict was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Destination was free.
    Direct,
    /// Destination already holds the same bytes; nothing new is written.
    Identical,
    /// Destination holds other bytes; the source goes to a digest-suffixed name.
    Renamed,
    /// Destination is the source itself.
    InPlace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationPlan {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub resolution: Resolution,
}

/// A completed relocation. `to` is where the content now lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub from: PathBuf,
    pub to: PathBuf,
    pub resolution: Resolution,
    pub mode: RelocationMode,
}

/// Inspect the destination and decide how the source will be placed.
pub fn plan(source: &Path, destination: &Path) -> Result<RelocationPlan, SkipReason> {
    let planned = |destination: PathBuf, resolution| RelocationPlan {
        source: source.to_path_buf(),
        destination,
        resolution,
    };

    if is_same_file(source, destination) {
        return Ok(planned(destination.to_path_buf(), Resolution::InPlace));
    }
    if !destination.exists() {
        return Ok(planned(destination.to_path_buf(), Resolution::Direct));
    }

    let source_digest = digest_of(source)?;
    let existing_digest = digest_of(destination)?;
    if source_digest == existing_digest {
        return Ok(planned(destination.to_path_buf(), Resolution::Identical));
    }

    let renamed = suffixed_path(destination, &digest_suffix(&source_digest))?;
    // the suffix names the content, so an occupied suffixed name is a duplicate
    if renamed.exists() && digest_of(&renamed)? == source_digest {
        return Ok(planned(renamed, Resolution::Identical));
    }
    Ok(planned(renamed, Resolution::Renamed))
}

/// Carry out a plan. Parent directories of the destination are created.
pub fn execute(plan: &RelocationPlan, mode: RelocationMode) -> Result<Relocation, SkipReason> {
    let done = || Relocation {
        from: plan.source.clone(),
        to: plan.destination.clone(),
        resolution: plan.resolution,
        mode,
    };

    match (plan.resolution, mode) {
        (Resolution::InPlace, _) | (Resolution::Identical, RelocationMode::Copy) => {}
        (Resolution::Identical, RelocationMode::Move) => {
            fs::remove_file(&plan.source).map_err(SkipReason::RemoveDuplicate)?;
        }
        (Resolution::Direct | Resolution::Renamed, _) => {
            if let Some(parent) = plan.destination.parent() {
                fs::create_dir_all(parent).map_err(|source| SkipReason::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            match mode {
                RelocationMode::Move => move_file(&plan.source, &plan.destination).map_err(|source| {
                    SkipReason::Move {
                        to: plan.destination.clone(),
                        source,
                    }
                })?,
                RelocationMode::Copy => {
                    fs::copy(&plan.source, &plan.destination).map_err(|source| SkipReason::Copy {
                        to: plan.destination.clone(),
                        source,
                    })?;
                }
            }
        }
    }

    debug!(
        from = %plan.source.display(),
        to = %plan.destination.display(),
        resolution = ?plan.resolution,
        "relocated"
    );
    Ok(done())
}

/// Plan and execute in one step.
pub fn relocate(source: &Path, destination: &Path, mode: RelocationMode) -> Result<Relocation, SkipReason> {
    let plan = plan(source, destination)?;
    execute(&plan, mode)
}

fn digest_of(path: &Path) -> Result<Vec<u8>, SkipReason> {
    file_digest(path).map_err(|source| SkipReason::Digest {
        path: path.to_path_buf(),
        source,
    })
}

/// `dir/name.ext` -> `dir/name_SUFFIX.ext`
fn suffixed_path(path: &Path, suffix: &str) -> Result<PathBuf, SkipReason> {
    let stem = path.file_stem().ok_or(SkipReason::NoFileName)?;
    let mut name = OsString::from(stem);
    name.push("_");
    name.push(suffix);
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    Ok(path.with_file_name(name))
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(x), Ok(y)) => x == y,
        _ => false,
    }
}

/// Rename, falling back to copy + size check + delete across filesystems.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }

    let expected = fs::metadata(from)?.len();
    fs::copy(from, to)?;
    let written = fs::metadata(to)?.len();
    if written != expected {
        let _ = fs::remove_file(to);
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("copy verification failed: source {expected} bytes, destination {written} bytes"),
        ));
    }
    fs::remove_file(from)
}
