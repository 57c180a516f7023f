//! Period parsing for the price series endpoints.
//!
//! Town-level rows carry a `"YYYY-Qn"` quarter label; street-level rows
//! carry a date that may arrive as `YYYY-MM`, `YYYY-MM-DD`, or a full ISO
//! timestamp depending on how the backend serialized it.

use chrono::{Months, NaiveDate, NaiveDateTime};

/// Last day of the quarter named by a `"YYYY-Qn"` label.
#[must_use]
pub fn quarter_end(label: &str) -> Option<NaiveDate> {
    let (year, quarter) = label.trim().split_once("-Q")?;
    let year: i32 = year.parse().ok()?;
    let quarter: u32 = quarter.parse().ok()?;
    if !(1..=4).contains(&quarter) {
        return None;
    }
    let next_quarter_start = if quarter == 4 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, quarter * 3 + 1, 1)?
    };
    next_quarter_start.pred_opt()
}

/// Parses a series date in any of the formats the backend emits.
#[must_use]
pub fn parse_series_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    if let Some(date) = text.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()) {
        return Some(date);
    }
    NaiveDate::parse_from_str(&format!("{text}-01"), "%Y-%m-%d").ok()
}

/// `date` moved back by `months` calendar months (clamped to month end).
#[must_use]
pub fn months_before(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn quarter_labels() {
        assert_eq!(quarter_end("2023-Q1"), Some(d(2023, 3, 31)));
        assert_eq!(quarter_end("2024-Q2"), Some(d(2024, 6, 30)));
        assert_eq!(quarter_end("2024-Q4"), Some(d(2024, 12, 31)));
        assert_eq!(quarter_end("2024-Q5"), None);
        assert_eq!(quarter_end("2024Q1"), None);
    }

    #[test]
    fn series_dates() {
        assert_eq!(parse_series_date("2023-05"), Some(d(2023, 5, 1)));
        assert_eq!(parse_series_date("2023-05-01"), Some(d(2023, 5, 1)));
        assert_eq!(parse_series_date("2023-05-01T00:00:00.000"), Some(d(2023, 5, 1)));
        assert_eq!(parse_series_date("2023-05-01T00:00:00.000Z"), Some(d(2023, 5, 1)));
        assert_eq!(parse_series_date("soon"), None);
    }

    #[test]
    fn month_arithmetic_clamps() {
        assert_eq!(months_before(d(2024, 8, 31), 6), d(2024, 2, 29));
        assert_eq!(months_before(d(2024, 12, 1), 6), d(2024, 6, 1));
    }
}
