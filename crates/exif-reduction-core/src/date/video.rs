use chrono::{DateTime, Local, NaiveDateTime};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Seconds between the QuickTime epoch (1904-01-01) and the Unix epoch.
const QT_TO_UNIX_OFFSET: i64 = 2_082_844_800;

#[derive(Debug, Clone, Copy)]
struct AtomRange {
    data_start: u64,
    data_end: u64,
}

/// Read the movie header (`moov/mvhd`) creation time of an MP4/MOV file.
///
/// The header stores UTC; the result is converted to local wall-clock time.
pub fn read_video_date(path: &Path) -> Option<NaiveDateTime> {
    let file = File::open(path).ok()?;
    let len = file.metadata().ok()?.len();
    let mut reader = BufReader::new(file);

    let moov = find_atom(&mut reader, 0, len, *b"moov")?;
    let mvhd = find_atom(&mut reader, moov.data_start, moov.data_end, *b"mvhd")?;
    let qt_seconds = read_mvhd_creation(&mut reader, mvhd)?;

    let unix = i64::try_from(qt_seconds).ok()?.checked_sub(QT_TO_UNIX_OFFSET)?;
    let utc = DateTime::from_timestamp(unix, 0)?;
    Some(utc.with_timezone(&Local).naive_local())
}

fn find_atom<R: Read + Seek>(r: &mut R, start: u64, end: u64, kind: [u8; 4]) -> Option<AtomRange> {
    let mut offset = start;
    while offset + 8 <= end {
        r.seek(SeekFrom::Start(offset)).ok()?;
        let mut header = [0u8; 8];
        r.read_exact(&mut header).ok()?;
        let mut size = u64::from(u32::from_be_bytes([header[0], header[1], header[2], header[3]]));
        let mut header_len = 8u64;

        if size == 1 {
            let mut ext = [0u8; 8];
            r.read_exact(&mut ext).ok()?;
            size = u64::from_be_bytes(ext);
            header_len = 16;
        } else if size == 0 {
            // atom runs to the end of its parent
            size = end - offset;
        }
        if size < header_len {
            return None;
        }

        let atom_end = offset.saturating_add(size).min(end);
        if header[4..8] == kind {
            return Some(AtomRange {
                data_start: offset + header_len,
                data_end: atom_end,
            });
        }
        offset = atom_end;
    }
    None
}

fn read_mvhd_creation<R: Read + Seek>(r: &mut R, mvhd: AtomRange) -> Option<u64> {
    r.seek(SeekFrom::Start(mvhd.data_start)).ok()?;
    let mut version_flags = [0u8; 4];
    r.read_exact(&mut version_flags).ok()?;

    if version_flags[0] == 1 {
        let mut buf = [0u8; 8];
        r.read_exact(&mut buf).ok()?;
        Some(u64::from_be_bytes(buf))
    } else {
        let mut buf = [0u8; 4];
        r.read_exact(&mut buf).ok()?;
        Some(u64::from(u32::from_be_bytes(buf)))
    }
}
