use chrono::{Datelike, Months, NaiveDate};
use thiserror::Error;

#[derive(Debug, Eq, Error, PartialEq)]
pub enum DateError {
    /// The value is not a `YYYY-MM-DD` date.
    #[error("invalid date {0:?}, expected YYYY-MM-DD")]
    Malformed(String),

    /// The start of a range comes after its end.
    #[error("start date {start} is after end date {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
}

/// Parse a calendar date provided by a client.
///
/// Only the `YYYY-MM-DD` format is accepted. Surrounding whitespace is
/// ignored.
pub fn parse_date(raw: &str) -> Result<NaiveDate, DateError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| DateError::Malformed(raw.to_owned()))
}

/// Parse a date that may be omitted. Blank values count as omitted.
pub fn parse_optional_date(raw: Option<&str>) -> Result<Option<NaiveDate>, DateError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_date(value).map(Some),
    }
}

/// An inclusive range of calendar dates.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateError> {
        if start > end {
            return Err(DateError::InvertedRange { start, end });
        }

        Ok(Self { start, end })
    }

    /// The calendar month containing `day`.
    pub fn month_of(day: NaiveDate) -> Self {
        let start = month_start(day);

        Self {
            start,
            end: start + Months::new(1) - chrono::Duration::days(1),
        }
    }

    /// The calendar year containing `day`.
    pub fn year_of(day: NaiveDate) -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(day.year(), 1, 1).unwrap_or(day),
            end: NaiveDate::from_ymd_opt(day.year(), 12, 31).unwrap_or(day),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// The first day of the month containing `day`.
pub fn month_start(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

#[cfg(test)]
mod test {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parse_valid_date() {
        assert_eq!(Ok(date(2024, 2, 29)), parse_date("2024-02-29"));
        assert_eq!(Ok(date(2024, 3, 1)), parse_date(" 2024-03-01 "));
    }

    #[test]
    fn parse_malformed_dates() {
        for raw in ["", "2024-13-01", "2023-02-29", "01/02/2024", "yesterday"] {
            assert_eq!(
                Err(DateError::Malformed(raw.to_owned())),
                parse_date(raw),
                "{:?} should not parse",
                raw
            );
        }
    }

    #[test]
    fn optional_dates() {
        assert_eq!(Ok(None), parse_optional_date(None));
        assert_eq!(Ok(None), parse_optional_date(Some("  ")));
        assert_eq!(Ok(Some(date(2024, 1, 5))), parse_optional_date(Some("2024-01-05")));
        assert!(parse_optional_date(Some("2024-1-5x")).is_err());
    }

    #[test]
    fn range_rejects_inverted_bounds() {
        let error = DateRange::new(date(2024, 5, 2), date(2024, 5, 1))
            .expect_err("start after end should be rejected");

        assert!(matches!(error, DateError::InvertedRange { .. }));
    }

    #[test]
    fn range_is_inclusive() {
        let range = DateRange::new(date(2024, 5, 1), date(2024, 5, 31)).unwrap();

        assert!(range.contains(date(2024, 5, 1)));
        assert!(range.contains(date(2024, 5, 31)));
        assert!(!range.contains(date(2024, 4, 30)));
        assert!(!range.contains(date(2024, 6, 1)));
    }

    #[test]
    fn month_of_handles_short_months() {
        let range = DateRange::month_of(date(2024, 2, 14));

        assert_eq!(date(2024, 2, 1), range.start());
        assert_eq!(date(2024, 2, 29), range.end());

        let range = DateRange::month_of(date(2023, 12, 31));

        assert_eq!(date(2023, 12, 1), range.start());
        assert_eq!(date(2023, 12, 31), range.end());
    }

    #[test]
    fn year_of_spans_calendar_year() {
        let range = DateRange::year_of(date(2024, 7, 4));

        assert_eq!(date(2024, 1, 1), range.start());
        assert_eq!(date(2024, 12, 31), range.end());
    }

    #[test]
    fn overlapping_ranges() {
        let may = DateRange::month_of(date(2024, 5, 10));
        let june = DateRange::month_of(date(2024, 6, 10));
        let spanning = DateRange::new(date(2024, 5, 31), date(2024, 6, 1)).unwrap();

        assert!(!may.overlaps(&june));
        assert!(may.overlaps(&spanning));
        assert!(june.overlaps(&spanning));
    }
}
