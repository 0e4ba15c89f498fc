//! UTC calendar primitives.
//!
//! Pure functions over `DateTime<Utc>`. Every boundary test works at minute
//! resolution: seconds and sub-second precision are discarded first, so
//! `00:00:59` counts as midnight.
//!
//! Two week conventions coexist:
//!
//! - [`week_of_year`] and the [`CalendarUnit::Week`] boundary use
//!   Sunday-start weeks where week 1 is the week containing January 1.
//! - [`first_full_week_start`] anchors weekly session walks on the first
//!   Monday that falls inside the year.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, TimeDelta, Timelike, Utc};
use serde::Serialize;

/// A calendar period used for truncation and boundary tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CalendarUnit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

/// Drop seconds and sub-second precision.
pub fn truncate_to_minute(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .with_nanosecond(0)
        .and_then(|dt| dt.with_second(0))
        .unwrap_or(instant)
}

/// The start of the `unit` period containing `instant`.
///
/// Weeks start on Sunday.
pub fn start_of(instant: DateTime<Utc>, unit: CalendarUnit) -> DateTime<Utc> {
    let instant = truncate_to_minute(instant);
    let date = instant.date_naive();
    match unit {
        CalendarUnit::Minute => instant,
        CalendarUnit::Hour => instant.with_minute(0).unwrap_or(instant),
        CalendarUnit::Day => midnight(date),
        CalendarUnit::Week => {
            let back = Days::new(u64::from(date.weekday().num_days_from_sunday()));
            midnight(date.checked_sub_days(back).unwrap_or(NaiveDate::MIN))
        }
        CalendarUnit::Month => midnight(date.with_day(1).unwrap_or(date)),
        CalendarUnit::Year => midnight(date.with_ordinal(1).unwrap_or(date)),
    }
}

/// The start of the `unit` period immediately before the one containing
/// `instant`, or `None` if it falls outside chrono's range.
pub fn start_of_previous(instant: DateTime<Utc>, unit: CalendarUnit) -> Option<DateTime<Utc>> {
    let start = start_of(instant, unit);
    match unit {
        CalendarUnit::Minute => start.checked_sub_signed(TimeDelta::minutes(1)),
        CalendarUnit::Hour => start.checked_sub_signed(TimeDelta::hours(1)),
        CalendarUnit::Day => start.checked_sub_days(Days::new(1)),
        CalendarUnit::Week => start.checked_sub_days(Days::new(7)),
        CalendarUnit::Month => start.checked_sub_months(Months::new(1)),
        CalendarUnit::Year => start.checked_sub_months(Months::new(12)),
    }
}

/// Whether `a` and `b` fall in the same `unit` period.
pub fn same_period(a: DateTime<Utc>, b: DateTime<Utc>, unit: CalendarUnit) -> bool {
    start_of(a, unit) == start_of(b, unit)
}

/// Zero-based count of complete `unit`s elapsed since the start of the UTC
/// year containing `instant`.
///
/// Minutes, hours, days and weeks are counted as fixed-length spans; months
/// are the zero-based calendar month. The index for `Year` is always 0.
pub fn index_within_year(instant: DateTime<Utc>, unit: CalendarUnit) -> i64 {
    let instant = truncate_to_minute(instant);
    let elapsed = instant - start_of(instant, CalendarUnit::Year);
    match unit {
        CalendarUnit::Minute => elapsed.num_minutes(),
        CalendarUnit::Hour => elapsed.num_hours(),
        CalendarUnit::Day => elapsed.num_days(),
        CalendarUnit::Week => elapsed.num_weeks(),
        CalendarUnit::Month => i64::from(instant.month0()),
        CalendarUnit::Year => 0,
    }
}

/// True iff `instant`, truncated to the minute, is the first minute of its
/// `unit` period.
pub fn is_unit_boundary(instant: DateTime<Utc>, unit: CalendarUnit) -> bool {
    truncate_to_minute(instant) == start_of(instant, unit)
}

/// Week number of `instant`: Sunday-start weeks, week 1 contains January 1.
///
/// A week straddling New Year belongs to the new year, so the last days of
/// December can be in week 1.
pub fn week_of_year(instant: DateTime<Utc>) -> u32 {
    let sunday = start_of(instant, CalendarUnit::Week).date_naive();
    let saturday = sunday.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX);
    saturday.ordinal0() / 7 + 1
}

/// Midnight UTC on the first Monday that lies inside `year`.
///
/// When January 1 is not a Monday the week containing it starts in the
/// previous year, so the anchor moves to the following Monday.
pub fn first_full_week_start(year: i32) -> Option<DateTime<Utc>> {
    let jan1 = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let offset = (7 - jan1.weekday().num_days_from_monday()) % 7;
    jan1.checked_add_days(Days::new(u64::from(offset))).map(midnight)
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
