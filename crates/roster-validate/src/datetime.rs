//! Date parsing for registrar exports.
//!
//! Accepted shapes:
//!
//! - ISO `YYYY-MM-DD`, optionally followed by a time part
//! - `YYYY/MM/DD` and `YYYY.MM.DD`
//! - US `MM/DD/YYYY`
//! - spreadsheet serial numbers (1900 date system)
//!
//! Every accepted value is normalized to `YYYY-MM-DD`.

use chrono::{Datelike, Days, NaiveDate};

/// Earliest year accepted.
pub const MIN_YEAR: i32 = 1900;
/// Latest year accepted.
pub const MAX_YEAR: i32 = 2100;

/// Serial number of the phantom 1900-02-29 in the 1900 date system.
const PHANTOM_LEAP_DAY_SERIAL: u64 = 60;

/// Parses a raw cell into a calendar date.
///
/// Returns `None` for empty input, unknown shapes, impossible calendar
/// dates (e.g. `2024-02-30`) and years outside `[1900, 2100]`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    let date = if value.bytes().all(|b| b.is_ascii_digit()) {
        from_serial(value.parse().ok()?)?
    } else {
        parse_delimited(strip_time(value))?
    };
    (MIN_YEAR..=MAX_YEAR).contains(&date.year()).then_some(date)
}

/// Parses a raw cell and renders it as `YYYY-MM-DD`.
pub fn normalize_date(raw: &str) -> Option<String> {
    parse_date(raw).map(|date| date.format("%Y-%m-%d").to_string())
}

/// Converts a spreadsheet serial to a date.
///
/// Serial 1 is 1900-01-01. Serial 60 is the non-existent 1900-02-29 that
/// spreadsheet software inherited, so serials above it are shifted back by
/// one day.
pub fn from_serial(serial: u64) -> Option<NaiveDate> {
    let (epoch, offset) = match serial {
        0 | PHANTOM_LEAP_DAY_SERIAL => return None,
        1..PHANTOM_LEAP_DAY_SERIAL => (NaiveDate::from_ymd_opt(1899, 12, 31)?, serial),
        _ => (NaiveDate::from_ymd_opt(1899, 12, 30)?, serial),
    };
    epoch.checked_add_days(Days::new(offset))
}

/// Inverse of [`from_serial`].
pub fn to_serial(date: NaiveDate) -> Option<u64> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let days = u64::try_from((date - epoch).num_days()).ok()?;
    match days {
        0 | 1 => None,
        // Dates before the phantom leap day sit one serial lower.
        1..=PHANTOM_LEAP_DAY_SERIAL => Some(days - 1),
        _ => Some(days),
    }
}

fn strip_time(value: &str) -> &str {
    match value.find(['T', ' ']) {
        Some(idx) if idx >= 8 => &value[..idx],
        _ => value,
    }
}

fn parse_delimited(value: &str) -> Option<NaiveDate> {
    let delimiter = value.chars().find(|ch| matches!(ch, '-' | '/' | '.'))?;
    let parts: Vec<&str> = value.split(delimiter).collect();
    let [first, second, third] = parts.as_slice() else {
        return None;
    };
    if ![first, second, third]
        .iter()
        .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }
    let (year, month, day) = if first.len() == 4 {
        (*first, *second, *third)
    } else if third.len() == 4 && delimiter == '/' {
        (*third, *first, *second)
    } else {
        return None;
    };
    if month.len() > 2 || day.len() > 2 {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn iso_and_slash_forms() {
        assert_eq!(parse_date("2024-06-15"), Some(ymd(2024, 6, 15)));
        assert_eq!(parse_date("2024/6/5"), Some(ymd(2024, 6, 5)));
        assert_eq!(parse_date("2024.06.15"), Some(ymd(2024, 6, 15)));
        assert_eq!(parse_date("06/15/2024"), Some(ymd(2024, 6, 15)));
        assert_eq!(parse_date(" 2024-06-15T00:00:00 "), Some(ymd(2024, 6, 15)));
        assert_eq!(parse_date("2024-06-15 13:45"), Some(ymd(2024, 6, 15)));
    }

    #[test]
    fn impossible_dates_are_rejected() {
        assert_eq!(parse_date("13/45/2024"), None);
        assert_eq!(parse_date("2024-02-30"), None);
        assert_eq!(parse_date("2023-02-29"), None);
        assert_eq!(parse_date("2024-00-10"), None);
    }

    #[test]
    fn out_of_range_years_are_rejected() {
        assert_eq!(parse_date("1899-12-31"), None);
        assert_eq!(parse_date("2101-01-01"), None);
        assert_eq!(parse_date("2100-12-31"), Some(ymd(2100, 12, 31)));
    }

    #[test]
    fn unknown_shapes_are_rejected() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("next week"), None);
        assert_eq!(parse_date("15-06-2024"), None);
        assert_eq!(parse_date("2024-06"), None);
        assert_eq!(parse_date("2024-006-15"), None);
        assert_eq!(parse_date("-45458"), None);
    }

    #[test]
    fn serial_dates_use_1900_system() {
        assert_eq!(from_serial(1), Some(ymd(1900, 1, 1)));
        assert_eq!(from_serial(59), Some(ymd(1900, 2, 28)));
        assert_eq!(from_serial(60), None);
        assert_eq!(from_serial(61), Some(ymd(1900, 3, 1)));
        assert_eq!(from_serial(45458), Some(ymd(2024, 6, 15)));
        assert_eq!(parse_date("45458"), Some(ymd(2024, 6, 15)));
        assert_eq!(parse_date("0"), None);
    }

    #[test]
    fn serial_round_trip() {
        assert_eq!(to_serial(ymd(2024, 6, 15)), Some(45458));
        assert_eq!(to_serial(ymd(1900, 1, 1)), Some(1));
        assert_eq!(to_serial(ymd(1900, 3, 1)), Some(61));
    }

    #[test]
    fn normalized_output_is_canonical() {
        assert_eq!(normalize_date("2024-06-15").as_deref(), Some("2024-06-15"));
        assert_eq!(normalize_date("45458").as_deref(), Some("2024-06-15"));
        assert_eq!(normalize_date("1/2/2024").as_deref(), Some("2024-01-02"));
    }
}
