//! Capability seams for reading and writing a file's embedded capture date.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{bail, Context};
use chrono::NaiveDateTime;

use crate::date::{exif, video};

/// Image extensions the EXIF reader understands.
const EXIF_EXTENSIONS: &[&str] = &["jpg", "jpeg", "tif", "tiff", "heic", "heif", "png", "webp"];
/// Container formats carrying a QuickTime movie header.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov"];
/// Files whose embedded date is rewritten during exif-reduction.
const WRITABLE_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

fn extension_in(path: &Path, list: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| list.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

/// Returns the embedded capture timestamp of a file, if it has one.
///
/// Implementations must not fail: unreadable or unsupported files yield `None`.
pub trait MetadataReader: Send + Sync {
    fn read(&self, path: &Path) -> Option<NaiveDateTime>;
}

/// Persists a capture timestamp into a file's own metadata.
pub trait MetadataWriter: Send + Sync {
    /// Whether this writer should be asked to handle `path` at all.
    fn supports(&self, path: &Path) -> bool {
        extension_in(path, WRITABLE_EXTENSIONS)
    }

    fn write(&self, path: &Path, date: NaiveDateTime) -> anyhow::Result<()>;
}

/// Dispatches on extension: EXIF for images, `mvhd` for MP4/MOV.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContainerReader;

impl MetadataReader for ContainerReader {
    fn read(&self, path: &Path) -> Option<NaiveDateTime> {
        if extension_in(path, EXIF_EXTENSIONS) {
            exif::read_exif_date(path)
        } else if extension_in(path, VIDEO_EXTENSIONS) {
            video::read_video_date(path)
        } else {
            None
        }
    }
}

/// Writes `DateTimeOriginal` by running an external `exiftool`.
#[derive(Debug, Clone)]
pub struct ExiftoolWriter {
    program: PathBuf,
}

impl ExiftoolWriter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }

    /// Probe `program -ver`; `None` when the tool cannot be run.
    pub fn detect(program: impl Into<PathBuf>) -> Option<Self> {
        let writer = Self::new(program);
        let status = Command::new(&writer.program)
            .arg("-ver")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .ok()?;
        status.success().then_some(writer)
    }
}

impl MetadataWriter for ExiftoolWriter {
    fn write(&self, path: &Path, date: NaiveDateTime) -> anyhow::Result<()> {
        let stamp = date.format("%Y:%m:%d %H:%M:%S").to_string();
        let output = Command::new(&self.program)
            .arg("-overwrite_original")
            .arg("-q")
            .arg(format!("-DateTimeOriginal={stamp}"))
            .arg(path)
            .output()
            .with_context(|| format!("running {}", self.program.display()))?;

        if !output.status.success() {
            bail!(
                "exiftool exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

/// Leaves metadata untouched; used when no writer is available or wanted.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopWriter;

impl MetadataWriter for NoopWriter {
    fn supports(&self, _path: &Path) -> bool {
        false
    }

    fn write(&self, _path: &Path, _date: NaiveDateTime) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_extension_dispatch_is_case_insensitive() {
        assert!(extension_in(Path::new("a/IMG_1.JPG"), EXIF_EXTENSIONS));
        assert!(extension_in(Path::new("clip.MoV"), VIDEO_EXTENSIONS));
        assert!(!extension_in(Path::new("notes.txt"), EXIF_EXTENSIONS));
        assert!(!extension_in(Path::new("README"), EXIF_EXTENSIONS));
    }

    #[test]
    fn test_container_reader_reads_video_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.MP4");
        fs::write(&path, video::tests::minimal_mov(1_600_000_000)).unwrap();
        assert!(ContainerReader.read(&path).is_some());

        let txt = dir.path().join("clip.txt");
        fs::write(&txt, video::tests::minimal_mov(1_600_000_000)).unwrap();
        assert!(ContainerReader.read(&txt).is_none());
    }

    #[test]
    fn test_writers_declare_support() {
        let exiftool = ExiftoolWriter::new("exiftool");
        assert!(exiftool.supports(Path::new("a.jpeg")));
        assert!(!exiftool.supports(Path::new("a.mp4")));
        assert!(!NoopWriter.supports(Path::new("a.jpg")));
    }

    #[test]
    fn test_missing_exiftool_is_not_detected() {
        assert!(ExiftoolWriter::detect("/nonexistent/exiftool-binary").is_none());
    }
}
