use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Local, LocalResult, NaiveDateTime, TimeDelta, TimeZone};
use filetime::FileTime;

/// Creation and modification times of a file, as local wall-clock time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FsTimes {
    /// `None` on filesystems that do not record a birth time.
    pub created: Option<NaiveDateTime>,
    pub modified: Option<NaiveDateTime>,
}

pub fn read_fs_times(path: &Path) -> io::Result<FsTimes> {
    let meta = fs::metadata(path)?;
    Ok(FsTimes {
        created: meta.created().ok().map(to_local),
        modified: meta.modified().ok().map(to_local),
    })
}

fn to_local(t: SystemTime) -> NaiveDateTime {
    DateTime::<Local>::from(t).naive_local()
}

/// Interpret a naive local date as an instant. Ambiguous DST times take the
/// earlier instant. Times skipped by a DST jump are read with the offset in
/// force just before the jump, so they land just after the gap.
fn to_file_time(date: NaiveDateTime) -> io::Result<FileTime> {
    let instant = match date.and_local_timezone(Local) {
        LocalResult::Single(t) | LocalResult::Ambiguous(t, _) => t.fixed_offset(),
        LocalResult::None => {
            let before = (date - TimeDelta::days(1))
                .and_local_timezone(Local)
                .earliest()
                .ok_or_else(|| unrepresentable(date))?;
            before
                .offset()
                .from_local_datetime(&date)
                .single()
                .ok_or_else(|| unrepresentable(date))?
        }
    };
    Ok(FileTime::from_unix_time(instant.timestamp(), instant.timestamp_subsec_nanos()))
}

fn unrepresentable(date: NaiveDateTime) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("{date} cannot be placed in the local time zone"),
    )
}

/// Set the modification time of `path` to `date`, and on Windows the
/// creation time as well.
pub fn apply_timestamps(path: &Path, date: NaiveDateTime) -> io::Result<()> {
    let ft = to_file_time(date)?;
    filetime::set_file_mtime(path, ft)?;

    #[cfg(windows)]
    {
        use std::os::windows::fs::FileTimesExt;
        let when = SystemTime::UNIX_EPOCH
            + std::time::Duration::new(ft.unix_seconds().max(0) as u64, ft.nanoseconds());
        let file = fs::OpenOptions::new().write(true).open(path)?;
        file.set_times(fs::FileTimes::new().set_created(when))?;
    }

    Ok(())
}
