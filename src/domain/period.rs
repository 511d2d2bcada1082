use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: i64 = 86_400;

/// Length of a budgeting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl BudgetPeriod {
    /// Parses a period keyword. Anything unrecognized falls back to monthly.
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword {
            "daily" => BudgetPeriod::Daily,
            "weekly" => BudgetPeriod::Weekly,
            "quarterly" => BudgetPeriod::Quarterly,
            "yearly" => BudgetPeriod::Yearly,
            _ => BudgetPeriod::Monthly,
        }
    }

    /// End of a window opened at `start`.
    pub fn end_date(&self, start: NaiveDate) -> NaiveDate {
        match self {
            BudgetPeriod::Daily => start + Duration::days(1),
            BudgetPeriod::Weekly => start + Duration::days(7),
            BudgetPeriod::Monthly => shift_month(start, 1),
            BudgetPeriod::Quarterly => shift_month(start, 3),
            BudgetPeriod::Yearly => shift_month(start, 12),
        }
    }
}

/// Whole days from the start of `start` until `now`, any partial day counted
/// as a full one. Zero while `start` is still in the future.
pub fn days_elapsed(start: NaiveDate, now: DateTime<Utc>) -> i64 {
    ceil_days((now - midnight(start)).num_seconds())
}

/// Whole days from `now` until the start of `end`, any partial day counted
/// as a full one. Zero once the window has closed.
pub fn days_remaining(end: NaiveDate, now: DateTime<Utc>) -> i64 {
    ceil_days((midnight(end) - now).num_seconds())
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0).unwrap().and_utc()
}

fn ceil_days(seconds: i64) -> i64 {
    if seconds <= 0 {
        0
    } else {
        (seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
    }
}

fn shift_month(date: NaiveDate, months: i32) -> NaiveDate {
    let mut year = date.year();
    let mut month = date.month() as i32 + months;
    let mut day = date.day();
    while month > 12 {
        month -= 12;
        year += 1;
    }
    while month < 1 {
        month += 12;
        year -= 1;
    }
    day = day.min(days_in_month(year, month as u32));
    NaiveDate::from_ymd_opt(year, month as u32, day).unwrap()
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };
    let first_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, month, 28).unwrap());
    let last_current = first_next - Duration::days(1);
    last_current.day()
}
