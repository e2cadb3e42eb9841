pub mod exif;
pub mod folder;
pub mod guess;
pub mod video;

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, NaiveDateTime};

/// Where a candidate date came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateSource {
    Embedded,
    FsCreated,
    FsModified,
    Filename,
    Folder,
    /// No candidate survived; the run's wall-clock time was used.
    Now,
}

impl fmt::Display for DateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Embedded => "embedded metadata",
            Self::FsCreated => "creation time",
            Self::FsModified => "modification time",
            Self::Filename => "filename",
            Self::Folder => "folder name",
            Self::Now => "current time",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateDate {
    pub date: NaiveDateTime,
    pub source: DateSource,
}

impl CandidateDate {
    pub fn new(date: NaiveDateTime, source: DateSource) -> Self {
        Self { date, source }
    }
}

/// The date sources collected for one file while it is being processed.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: PathBuf,
    pub candidates: Vec<CandidateDate>,
    pub resolved: Option<CandidateDate>,
}

impl FileRecord {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            candidates: Vec::new(),
            resolved: None,
        }
    }

    /// Offer a candidate. Dates outside the sane window are dropped here, so
    /// `candidates` only ever holds admissible values.
    pub fn admit(&mut self, policy: &DatePolicy, source: DateSource, date: Option<NaiveDateTime>) {
        if let Some(date) = date.filter(|d| policy.is_sane(d)) {
            self.candidates.push(CandidateDate::new(date, source));
        }
    }

    pub fn resolve(&mut self, policy: &DatePolicy) -> CandidateDate {
        let resolved = policy.resolve(&self.candidates);
        self.resolved = Some(resolved);
        resolved
    }
}

/// Reconciles untrustworthy date sources into one authoritative date.
///
/// A date is sane when it is strictly after 2000-01-01 00:00:00 and not after
/// `now`. The working value starts at `now`, is replaced by a sane folder date,
/// and is replaced again by a sane embedded date. The result is the earliest of
/// the working value and the sane filesystem and filename dates.
#[derive(Debug, Clone, Copy)]
pub struct DatePolicy {
    now: NaiveDateTime,
    floor: NaiveDateTime,
}

impl DatePolicy {
    pub fn new(now: NaiveDateTime) -> Self {
        let floor = NaiveDate::from_ymd_opt(2000, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or(NaiveDateTime::MIN);
        Self { now, floor }
    }

    /// Policy anchored at the local wall-clock time.
    pub fn at_local_now() -> Self {
        Self::new(Local::now().naive_local())
    }

    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    pub fn is_sane(&self, date: &NaiveDateTime) -> bool {
        *date > self.floor && *date <= self.now
    }

    pub fn resolve(&self, candidates: &[CandidateDate]) -> CandidateDate {
        let sane = || candidates.iter().filter(|c| self.is_sane(&c.date));
        let first_of = |source: DateSource| sane().find(|c| c.source == source).copied();

        let working = first_of(DateSource::Embedded)
            .or_else(|| first_of(DateSource::Folder))
            .unwrap_or(CandidateDate::new(self.now, DateSource::Now));

        sane()
            .filter(|c| {
                matches!(
                    c.source,
                    DateSource::FsCreated | DateSource::FsModified | DateSource::Filename
                )
            })
            .fold(working, |best, c| if c.date < best.date { *c } else { best })
    }
}
