//! Time range labels and their date windows
//!
//! | label | from | to |
//! |---|---|---|
//! | `today` | today | today |
//! | `yesterday` | today−1 | today−1 |
//! | `last_3d` `last_7d` `last_14d` `last_30d` `last_90d` | today−(N−1) | today |
//! | `this_month` | 1st of month | today |
//! | `last_month` | 1st of previous month | last day of previous month |
//! | `lifetime` / `maximum` | 2000-01-01 | today |

use ads_core::TimeRange;
use chrono::{Datelike, Duration, NaiveDate};
use indexmap::IndexMap;

use crate::error::{MetricsError, MetricsResult};

/// Every label [`resolve`] accepts
pub const LABELS: [&str; 11] = [
    "today",
    "yesterday",
    "last_3d",
    "last_7d",
    "last_14d",
    "last_30d",
    "last_90d",
    "this_month",
    "last_month",
    "lifetime",
    "maximum",
];

/// First day covered by `lifetime`
pub fn lifetime_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Translate a label into a concrete window ending relative to `today`
pub fn resolve(label: &str, today: NaiveDate) -> MetricsResult<TimeRange> {
    let (from, to) = match label {
        "today" => (today, today),
        "yesterday" => {
            let day = today - Duration::days(1);
            (day, day)
        }
        "last_3d" => trailing(today, 3),
        "last_7d" => trailing(today, 7),
        "last_14d" => trailing(today, 14),
        "last_30d" => trailing(today, 30),
        "last_90d" => trailing(today, 90),
        "this_month" => (first_of_month(today), today),
        "last_month" => {
            let last = first_of_month(today) - Duration::days(1);
            (first_of_month(last), last)
        }
        "lifetime" | "maximum" => (lifetime_start(), today),
        other => return Err(MetricsError::UnknownTimeRange(other.to_string())),
    };
    Ok(TimeRange::new(label, from, to))
}

/// The most frequent label; ties go to the one seen first
pub fn dominant_label<'a, I>(labels: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: IndexMap<&'a str, usize> = IndexMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }

    let mut best: Option<(&'a str, usize)> = None;
    for (label, count) in counts {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label)
}

fn trailing(today: NaiveDate, days: i64) -> (NaiveDate, NaiveDate) {
    (today - Duration::days(days - 1), today)
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}
