use chrono::{Datelike, Weekday};
use contracts::dashboards::d402_order_sales::WeekdayBucket;

use super::records::Dated;

/// Fixed output order
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Sum `value` per day of the week.
///
/// Always 7 buckets, Monday first; days without rows are 0. Rows without a period
/// are skipped.
pub fn weekday_trend<T, F>(rows: &[T], value: F) -> Vec<WeekdayBucket>
where
    T: Dated,
    F: Fn(&T) -> f64,
{
    let mut sums = [0.0_f64; 7];
    for row in rows {
        if let Some(date) = row.period() {
            sums[date.weekday().num_days_from_monday() as usize] += value(row);
        }
    }

    WEEKDAYS
        .iter()
        .zip(sums)
        .map(|(day, quantity)| WeekdayBucket {
            weekday: weekday_name(*day).to_string(),
            quantity,
        })
        .collect()
}
