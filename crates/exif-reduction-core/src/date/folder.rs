use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, TimeDelta};
use regex::Regex;
use std::sync::LazyLock;

static MONTH_FOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<year>\d{4})年(?P<month>\d{2})月$").unwrap());

/// Name of the month bucket a date is filed under, e.g. `2021年07月`.
pub fn month_folder_name(date: &NaiveDateTime) -> String {
    format!("{:04}年{:02}月", date.year(), date.month())
}

/// Parse a `YYYY年MM月` folder name into the last second of that month.
pub fn parse_month_folder(name: &str) -> Option<NaiveDateTime> {
    let caps = MONTH_FOLDER_RE.captures(name)?;
    let year: i32 = caps["year"].parse().ok()?;
    let month: u32 = caps["month"].parse().ok()?;

    let first = NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)?;
    first.checked_add_months(Months::new(1))?.checked_sub_signed(TimeDelta::seconds(1))
}
