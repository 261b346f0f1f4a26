use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

/// Week and month start instants derived from a caller-supplied `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodReference {
    pub week_start: NaiveDateTime,
    pub month_start: NaiveDateTime,
}

impl PeriodReference {
    pub fn from_now(now: NaiveDateTime) -> Self {
        Self {
            week_start: week_start(now),
            month_start: month_start(now),
        }
    }
}

/// Most recent Sunday at midnight; `now`'s own date when it is a Sunday.
pub fn week_start(now: NaiveDateTime) -> NaiveDateTime {
    let date = now.date();
    let days_back = i64::from(date.weekday().num_days_from_sunday());
    (date - Duration::days(days_back)).and_time(NaiveTime::MIN)
}

pub fn month_start(now: NaiveDateTime) -> NaiveDateTime {
    let date = now.date();
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .unwrap_or(date)
        .and_time(NaiveTime::MIN)
}
