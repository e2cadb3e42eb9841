use chrono::{DateTime, Local, NaiveDateTime};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// How the digits captured by a [`DatePattern`] are turned into a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// A chrono format string applied to the whole capture.
    Format(&'static str),
    /// Unix epoch milliseconds, converted to local time.
    EpochMillis,
}

struct DatePattern {
    regex: &'static LazyLock<Regex>,
    layout: Layout,
}

// The regex crate has no lookaround, so each digit run is fenced by a
// non-capturing `^|\D` / `\D|$` pair and the date itself is the named group.
static RE_DASHED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\D)(?P<date>\d{8}-\d{6})(?:\D|$)").unwrap());
static RE_UNDERSCORED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\D)(?P<date>\d{8}_\d{6})(?:\D|$)").unwrap());
static RE_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\D)(?P<date>\d{8})(?:\D|$)").unwrap());
static RE_EPOCH_MS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\D)(?P<date>\d{13})(?:\D|$)").unwrap());
static RE_COMPACT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\D)(?P<date>\d{14})(?:\D|$)").unwrap());
static RE_SPLIT_MILLIS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\D)(?P<date>\d{4}-\d{2}-\d{2}-\d{2}-\d{2}-\d{2}-\d{3})(?:\D|$)").unwrap()
});
static RE_PACKED_MILLIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\D)(?P<date>\d{4}-\d{2}-\d{2}-\d{9})(?:\D|$)").unwrap());

/// Priority order matters: the first pattern that matches decides the outcome.
static PATTERNS: &[DatePattern] = &[
    DatePattern { regex: &RE_DASHED, layout: Layout::Format("%Y%m%d-%H%M%S") },
    DatePattern { regex: &RE_UNDERSCORED, layout: Layout::Format("%Y%m%d_%H%M%S") },
    DatePattern { regex: &RE_DAY, layout: Layout::Format("%Y%m%d") },
    DatePattern { regex: &RE_EPOCH_MS, layout: Layout::EpochMillis },
    DatePattern { regex: &RE_COMPACT, layout: Layout::Format("%Y%m%d%H%M%S") },
    DatePattern { regex: &RE_SPLIT_MILLIS, layout: Layout::Format("%Y-%m-%d-%H-%M-%S-%3f") },
    DatePattern { regex: &RE_PACKED_MILLIS, layout: Layout::Format("%Y-%m-%d-%H%M%S%3f") },
];

/// A timestamp recovered from a filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameDate {
    pub date: NaiveDateTime,
    /// The text that matched, e.g. `20190101-132809`.
    pub matched: String,
    pub layout: Layout,
}

/// Extract a date from the file name component of `filename`.
///
/// Patterns are tried in priority order. The first pattern that matches is the
/// only one consulted: if its capture is not a valid calendar date the result is
/// `None`, broader patterns further down the table are not retried.
pub fn guess_date_from_filename(filename: &str) -> Option<FilenameDate> {
    let basename = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    let (pat, matched) = PATTERNS.iter().find_map(|pat| {
        pat.regex
            .captures(basename)
            .and_then(|caps| caps.name("date"))
            .map(|m| (pat, m.as_str()))
    })?;

    let date = parse_capture(matched, pat.layout)?;
    Some(FilenameDate {
        date,
        matched: matched.to_string(),
        layout: pat.layout,
    })
}

fn parse_capture(s: &str, layout: Layout) -> Option<NaiveDateTime> {
    match layout {
        Layout::Format(fmt) if !fmt.contains("%H") => chrono::NaiveDate::parse_from_str(s, fmt)
            .ok()?
            .and_hms_opt(0, 0, 0),
        Layout::Format(fmt) => NaiveDateTime::parse_from_str(s, fmt).ok(),
        Layout::EpochMillis => {
            let millis: i64 = s.parse().ok()?;
            let utc = DateTime::from_timestamp_millis(millis)?;
            Some(utc.with_timezone(&Local).naive_local())
        }
    }
}
