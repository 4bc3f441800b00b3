//! Calendar arithmetic for the yearly minute records.
//!
//! Every counter record covers one calendar year at one sample per minute,
//! so a timestamp addresses its sample by minute-of-year. All arithmetic
//! runs on civil datetimes in the reference timezone (UTC); zoned inputs
//! must go through [`to_reference`] first.

use jiff::civil::{DateTime, date};
use jiff::tz::TimeZone;
use jiff::{Span, Zoned};

use super::error::SeriesError;

pub const MINUTES_PER_DAY: i64 = 1440;

/// 525600 for common years, 527040 for leap years.
pub fn minutes_in_year(year: i16) -> i64 {
    date(year, 1, 1).days_in_year() as i64 * MINUTES_PER_DAY
}

/// Minutes elapsed since January 1 00:00 of `at`'s own year.
/// Range [0, minutes_in_year(year)).
pub fn minute_of_year(at: DateTime) -> i64 {
    let jan1 = date(at.year(), 1, 1).at(0, 0, 0, 0);
    at.duration_since(jan1).as_mins()
}

/// 0-based byte offset of `at`'s sample in the yearly record (2 bytes per
/// minute). The SQL layer translates to 1-based substr positions.
pub fn byte_offset(at: DateTime) -> i64 {
    minute_of_year(at) * 2
}

/// Whole minutes in [from, to).
pub fn minute_count(from: DateTime, to: DateTime) -> Result<i64, SeriesError> {
    if to <= from {
        return Err(SeriesError::InvalidRange { from, to });
    }
    Ok(to.duration_since(from).as_mins())
}

/// A single yearly record cannot answer a range that touches two calendar
/// years; callers must split such queries per year. `to` is exclusive, so
/// a range ending exactly at the next January 1 00:00 still passes.
pub fn ensure_single_year(from: DateTime, to: DateTime) -> Result<(), SeriesError> {
    if to <= from {
        return Err(SeriesError::InvalidRange { from, to });
    }
    let last = to.saturating_sub(Span::new().minutes(1));
    if from.year() != last.year() {
        return Err(SeriesError::YearBoundary { from, to });
    }
    Ok(())
}

/// Normalizes a zoned timestamp to the reference timezone used by the
/// record index.
pub fn to_reference(at: &Zoned) -> DateTime {
    at.with_time_zone(TimeZone::UTC).datetime()
}

/// Drops seconds and below. Sample addressing is minute-resolution.
pub fn floor_minute(at: DateTime) -> DateTime {
    at.date().at(at.hour(), at.minute(), 0, 0)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn year_lengths() {
        assert_eq!(minutes_in_year(2023), 365 * 1440);
        assert_eq!(minutes_in_year(2024), 366 * 1440);
        assert_eq!(minutes_in_year(2100), 365 * 1440);
        assert_eq!(minutes_in_year(2000), 366 * 1440);
    }

    #[test]
    fn minute_of_year_landmarks() {
        assert_eq!(minute_of_year(date(2024, 1, 1).at(0, 0, 0, 0)), 0);
        assert_eq!(minute_of_year(date(2024, 1, 1).at(0, 1, 0, 0)), 1);
        assert_eq!(minute_of_year(date(2024, 1, 2).at(0, 0, 0, 0)), 1440);
        // leap day present in 2024
        assert_eq!(
            minute_of_year(date(2024, 3, 1).at(0, 0, 0, 0)),
            (31 + 29) * 1440
        );
        assert_eq!(
            minute_of_year(date(2023, 3, 1).at(0, 0, 0, 0)),
            (31 + 28) * 1440
        );
        assert_eq!(
            minute_of_year(date(2024, 12, 31).at(23, 59, 0, 0)),
            minutes_in_year(2024) - 1
        );
    }

    #[test]
    fn byte_offset_strictly_increases_by_two() {
        let mut at = date(2024, 6, 15).at(11, 58, 0, 0);
        let mut prev = byte_offset(at);
        for _ in 0..5 {
            at = at.saturating_add(Span::new().minutes(1));
            let next = byte_offset(at);
            assert_eq!(next, prev + 2);
            prev = next;
        }
    }

    #[test]
    fn minute_count_over_ranges() {
        let from = date(2024, 1, 1).at(0, 0, 0, 0);
        let to = date(2024, 1, 2).at(0, 0, 0, 0);
        assert_eq!(minute_count(from, to).unwrap(), 1440);
        assert!(matches!(
            minute_count(to, from),
            Err(SeriesError::InvalidRange { .. })
        ));
        assert!(matches!(
            minute_count(from, from),
            Err(SeriesError::InvalidRange { .. })
        ));
    }

    #[test]
    fn single_year_guard() {
        let dec = date(2024, 12, 31).at(23, 0, 0, 0);
        let jan1 = date(2025, 1, 1).at(0, 0, 0, 0);
        // exclusive end right on New Year is still one year of data
        assert!(ensure_single_year(dec, jan1).is_ok());
        let jan = date(2025, 1, 1).at(0, 30, 0, 0);
        assert!(matches!(
            ensure_single_year(dec, jan),
            Err(SeriesError::YearBoundary { .. })
        ));
    }

    #[test]
    fn reference_normalization() {
        let zoned: Zoned = "2024-06-01T02:30:00+02:00[+02:00]".parse().unwrap();
        assert_eq!(to_reference(&zoned), date(2024, 6, 1).at(0, 30, 0, 0));
    }

    #[test]
    fn floor_drops_seconds() {
        let at = date(2024, 6, 1).at(10, 42, 59, 123_000_000);
        assert_eq!(floor_minute(at), date(2024, 6, 1).at(10, 42, 0, 0));
    }
}
