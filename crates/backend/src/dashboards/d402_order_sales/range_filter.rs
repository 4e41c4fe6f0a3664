use chrono::NaiveDate;
use contracts::shared::table::CellValue;

use super::error::AnalysisError;
use super::normalizer::{parse_date, Coerced};
use super::records::Dated;

/// Inclusive date interval. `start > end` is allowed and contains nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Widen the range so it also covers `date`
    fn extend(self, date: NaiveDate) -> Self {
        Self {
            start: self.start.min(date),
            end: self.end.max(date),
        }
    }
}

/// Rows whose period falls into the range. Rows without a period never match.
pub fn filter_by_range<T: Dated + Clone>(rows: &[T], range: &DateRange) -> Vec<T> {
    rows.iter()
        .filter(|row| row.period().is_some_and(|d| range.contains(d)))
        .cloned()
        .collect()
}

/// Earliest and latest valid period across both datasets
pub fn observed_bounds<A: Dated, B: Dated>(left: &[A], right: &[B]) -> Option<DateRange> {
    left.iter()
        .filter_map(Dated::period)
        .chain(right.iter().filter_map(Dated::period))
        .fold(None, |acc: Option<DateRange>, d| match acc {
            Some(range) => Some(range.extend(d)),
            None => Some(DateRange::new(d, d)),
        })
}

/// Parse a caller-supplied bound ("YYYY-MM-DD" or "DD.MM.YYYY")
pub fn parse_bound(value: &str) -> Result<NaiveDate, AnalysisError> {
    match parse_date(&CellValue::Text(value.to_string())) {
        Coerced::Value(d) => Ok(d),
        _ => Err(AnalysisError::InvalidRequest(format!(
            "cannot parse date bound '{}'",
            value
        ))),
    }
}

/// Effective range for a run: explicit bounds win, missing ones fall back to the
/// observed min/max. `Ok(None)` when a bound is missing and nothing has a valid period.
pub fn resolve_range(
    date_from: Option<&str>,
    date_to: Option<&str>,
    observed: Option<DateRange>,
) -> Result<Option<DateRange>, AnalysisError> {
    let from = date_from
        .filter(|s| !s.trim().is_empty())
        .map(parse_bound)
        .transpose()?;
    let to = date_to
        .filter(|s| !s.trim().is_empty())
        .map(parse_bound)
        .transpose()?;

    let start = from.or(observed.map(|r| r.start));
    let end = to.or(observed.map(|r| r.end));

    Ok(match (start, end) {
        (Some(start), Some(end)) => Some(DateRange::new(start, end)),
        _ => None,
    })
}
