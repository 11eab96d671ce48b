//! Permissive date/time parsing for timestamp scoring.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use critiq_core::Cell;

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M%z",
];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%b %d, %Y %H:%M:%S",
    "%B %d, %Y %I:%M %p",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m/%d/%y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%Y%m%d",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%d %b %Y",
    "%d %B %Y",
    "%a, %d %b %Y",
];

/// Parse a date or date-time string, normalising to UTC.
///
/// Offsets are honoured; naive values are taken as UTC. Returns `None` for
/// anything no known layout accepts.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    let s = s
        .strip_suffix(" UTC")
        .or_else(|| s.strip_suffix('Z'))
        .unwrap_or(s);

    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}

/// Whether a cell holds a parseable timestamp. Only text cells qualify.
#[must_use]
pub fn cell_is_timestamp(cell: &Cell) -> bool {
    match cell {
        Cell::Text(s) => parse_timestamp(s).is_some(),
        Cell::Null | Cell::Int(_) | Cell::Float(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    #[test]
    fn parses_iso_with_offset_into_utc() {
        let dt = parse_timestamp("2024-03-01T10:00:00+02:00").unwrap();
        assert_eq!(dt.hour(), 8);
        assert_eq!(dt.day(), 1);
    }

    #[test]
    fn parses_plain_dates_in_common_layouts() {
        for raw in [
            "2024-03-01",
            "2024/03/01",
            "03/01/2024",
            "March 1, 2024",
            "Mar 1, 2024",
            "1 Mar 2024",
        ] {
            let dt = parse_timestamp(raw).unwrap_or_else(|| panic!("failed on {raw}"));
            assert_eq!(dt.year(), 2024, "{raw}");
        }
    }

    #[test]
    fn parses_naive_datetime_and_utc_suffix() {
        assert!(parse_timestamp("2024-03-01 12:30:00").is_some());
        assert!(parse_timestamp("2024-03-01 12:30:00 UTC").is_some());
        assert!(parse_timestamp("Fri, 01 Mar 2024 12:30:00 +0000").is_some());
    }

    #[test]
    fn rejects_free_text_and_blanks() {
        assert!(parse_timestamp("great product").is_none());
        assert!(parse_timestamp("   ").is_none());
        assert!(parse_timestamp("2024-13-45").is_none());
    }

    #[test]
    fn numeric_cells_are_never_timestamps() {
        assert!(!cell_is_timestamp(&Cell::Int(20_240_301)));
        assert!(!cell_is_timestamp(&Cell::Float(1.5)));
        assert!(!cell_is_timestamp(&Cell::Null));
        assert!(cell_is_timestamp(&Cell::Text("2024-03-01".to_string())));
    }
}
