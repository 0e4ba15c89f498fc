//! Most-recent session open.
//!
//! Finds the open of the latest session that has fully elapsed at a
//! reference instant. The reference is always an explicit argument; only
//! [`is_most_recent_open_now`] reads the system clock.
//!
//! # Algorithm
//!
//! A clock walks forward from an epoch in steps of one session:
//!
//! | Family          | Epoch                                   | Reset period |
//! |-----------------|-----------------------------------------|--------------|
//! | minutes, hours  | start of the previous day               | day          |
//! | days, months    | start of the previous year              | year         |
//! | weeks           | [`first_full_week_start`] of the year   | none         |
//!
//! When a step crosses into a new reset period the clock snaps back to the
//! start of that period, so irregular quantifiers (`9H`, `5M`) restart at
//! every day / year instead of drifting, and the last session of each period
//! is cut short. Every session whose end is at or before the reference is
//! recorded; the last one recorded is the most recent open.
//!
//! Weekly walks advance `7 × quantifier` days with no reset. If no weekly
//! session has completed since this year's anchor, the walk starts from the
//! previous year's anchor instead. The two grids are not reconciled: the
//! session found on last year's grid may overlap one that already opened on
//! this year's. For `2W` at 2019-01-20 the result is the 2018-12-31 open
//! (running to Jan 14), although the 2019 grid opened a session on Jan 7.

use chrono::{DateTime, Datelike, Days, Months, TimeDelta, Utc};

use crate::calendar::{
    first_full_week_start, same_period, start_of, start_of_previous, truncate_to_minute,
    CalendarUnit,
};
use crate::error::Result;
use crate::timeframe::{TimeUnit, Timeframe};

/// Opens of every completed session from the epoch up to `reference`,
/// oldest first.
///
/// `reference` is truncated to the minute. The list is empty only when no
/// session of this length has completed since the epoch, which can happen
/// for quantifiers longer than the reset period.
pub fn session_opens(timeframe: Timeframe, reference: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let now = truncate_to_minute(reference);
    let timeframe = timeframe.canonical();

    let opens = match timeframe.unit() {
        TimeUnit::Minute | TimeUnit::Hour => start_of_previous(now, CalendarUnit::Day)
            .map(|epoch| walk(timeframe, epoch, now))
            .unwrap_or_default(),
        TimeUnit::Day | TimeUnit::Month => start_of_previous(now, CalendarUnit::Year)
            .map(|epoch| walk(timeframe, epoch, now))
            .unwrap_or_default(),
        TimeUnit::Week => {
            let year = now.year();
            let current = first_full_week_start(year)
                .map(|epoch| walk(timeframe, epoch, now))
                .unwrap_or_default();
            if current.is_empty() {
                first_full_week_start(year - 1)
                    .map(|epoch| walk(timeframe, epoch, now))
                    .unwrap_or_default()
            } else {
                current
            }
        }
    };

    tracing::debug!(
        timeframe = %timeframe,
        reference = %now,
        sessions = opens.len(),
        most_recent = ?opens.last(),
        "walked session opens"
    );
    opens
}

/// Open of the most recently completed session of length `timeframe` at
/// `reference`.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use market_session::{most_recent_open, Timeframe};
///
/// let now = Utc.with_ymd_and_hms(2019, 2, 8, 23, 22, 0).unwrap();
/// let open = most_recent_open(Timeframe::parse("2H").unwrap(), now);
/// assert_eq!(open, Utc.with_ymd_and_hms(2019, 2, 8, 20, 0, 0).single());
/// ```
pub fn most_recent_open(timeframe: Timeframe, reference: DateTime<Utc>) -> Option<DateTime<Utc>> {
    session_opens(timeframe, reference).last().copied()
}

/// Whether `candidate_open` is the open of the most recently completed
/// session of length `timeframe` at `reference`.
///
/// Comparison is exact: a candidate carrying seconds is never an open.
///
/// # Errors
///
/// Returns [`SessionError::InvalidFormat`](crate::SessionError::InvalidFormat)
/// if `timeframe` is malformed.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use market_session::is_most_recent_open;
///
/// let open = Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap();
/// let now = Utc.with_ymd_and_hms(2019, 1, 2, 12, 0, 0).unwrap();
/// assert!(is_most_recent_open("1D", open, now).unwrap());
/// ```
pub fn is_most_recent_open(
    timeframe: &str,
    candidate_open: DateTime<Utc>,
    reference: DateTime<Utc>,
) -> Result<bool> {
    let timeframe = Timeframe::parse(timeframe)?;
    Ok(most_recent_open(timeframe, reference) == Some(candidate_open))
}

/// [`is_most_recent_open`] against the current system time.
pub fn is_most_recent_open_now(timeframe: &str, candidate_open: DateTime<Utc>) -> Result<bool> {
    is_most_recent_open(timeframe, candidate_open, Utc::now())
}

/// Walk session opens from `epoch`, recording each session that ends at or
/// before `now`.
fn walk(timeframe: Timeframe, epoch: DateTime<Utc>, now: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let unit = timeframe.unit();
    let quantifier = timeframe.quantifier();
    let reset = reset_period(unit);

    let mut opens = Vec::new();
    let mut clock = epoch;
    loop {
        let Some(mut next) = advance(clock, quantifier, unit) else {
            break;
        };
        if let Some(period) = reset {
            if !same_period(next, clock, period) {
                next = start_of(next, period);
            }
        }
        if next > now {
            break;
        }
        opens.push(clock);
        clock = next;
    }

    tracing::trace!(
        epoch = %epoch,
        steps = opens.len(),
        stopped_at = %clock,
        "session walk finished"
    );
    opens
}

/// The period at whose start an irregular walk restarts.
fn reset_period(unit: TimeUnit) -> Option<CalendarUnit> {
    match unit {
        TimeUnit::Minute | TimeUnit::Hour => Some(CalendarUnit::Day),
        TimeUnit::Day | TimeUnit::Month => Some(CalendarUnit::Year),
        TimeUnit::Week => None,
    }
}

/// `clock` plus `quantifier` units; `None` past chrono's range.
fn advance(clock: DateTime<Utc>, quantifier: u64, unit: TimeUnit) -> Option<DateTime<Utc>> {
    match unit {
        TimeUnit::Minute => {
            clock.checked_add_signed(TimeDelta::try_minutes(i64::try_from(quantifier).ok()?)?)
        }
        TimeUnit::Hour => {
            clock.checked_add_signed(TimeDelta::try_hours(i64::try_from(quantifier).ok()?)?)
        }
        TimeUnit::Day => clock.checked_add_days(Days::new(quantifier)),
        TimeUnit::Week => clock.checked_add_days(Days::new(quantifier.checked_mul(7)?)),
        TimeUnit::Month => clock.checked_add_months(Months::new(u32::try_from(quantifier).ok()?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn recent(timeframe: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        most_recent_open(Timeframe::parse(timeframe).unwrap(), now)
    }

    // ── minute / hour walks ─────────────────────────────────────────────

    #[test]
    fn test_minutes_restart_at_midnight() {
        // 7-minute sessions: 23:55 is cut short by midnight
        let now = utc(2019, 2, 9, 0, 0, 0);
        assert_eq!(recent("7", now), Some(utc(2019, 2, 8, 23, 55, 0)));
    }

    #[test]
    fn test_minutes_ignore_reference_seconds() {
        let now = utc(2019, 2, 8, 0, 7, 1);
        assert_eq!(recent("7", now), Some(utc(2019, 2, 8, 0, 0, 0)));
    }

    #[test]
    fn test_hourly_from_late_evening() {
        let now = utc(2019, 2, 8, 23, 22, 0);
        assert_eq!(recent("H", now), Some(utc(2019, 2, 8, 22, 0, 0)));
        assert_eq!(recent("2H", now), Some(utc(2019, 2, 8, 20, 0, 0)));
        assert_eq!(recent("4H", now), Some(utc(2019, 2, 8, 16, 0, 0)));
        assert_eq!(recent("22H", now), Some(utc(2019, 2, 8, 0, 0, 0)));
    }

    #[test]
    fn test_nine_hour_sessions_cross_midnight() {
        // 00, 09, 18 → the 18:00 session closes at midnight
        let now = utc(2019, 2, 9, 1, 0, 0);
        assert_eq!(recent("9H", now), Some(utc(2019, 2, 8, 18, 0, 0)));
        let midnight = utc(2019, 2, 9, 0, 0, 0);
        assert_eq!(recent("9H", midnight), Some(utc(2019, 2, 8, 18, 0, 0)));
    }

    #[test]
    fn test_thirty_six_hours_truncated_by_day() {
        let now = utc(2019, 2, 9, 6, 0, 0);
        assert_eq!(recent("36H", now), Some(utc(2019, 2, 8, 0, 0, 0)));
    }

    #[test]
    fn test_sixty_minutes_walks_as_hours() {
        let now = utc(2019, 2, 8, 10, 30, 0);
        assert_eq!(recent("60", now), recent("1H", now));
    }

    // ── day / month walks ───────────────────────────────────────────────

    #[test]
    fn test_one_day_across_new_year() {
        assert_eq!(
            recent("1D", utc(2019, 1, 2, 12, 0, 0)),
            Some(utc(2019, 1, 1, 0, 0, 0))
        );
        assert_eq!(
            recent("1D", utc(2019, 1, 1, 12, 0, 0)),
            Some(utc(2018, 12, 31, 0, 0, 0))
        );
    }

    #[test]
    fn test_three_day_last_session_truncated_by_year() {
        // 2018 opens at day index 363 (Dec 30); year end closes it early
        assert_eq!(
            recent("3D", utc(2019, 1, 2, 0, 0, 0)),
            Some(utc(2018, 12, 30, 0, 0, 0))
        );
        assert_eq!(
            recent("3D", utc(2019, 1, 4, 0, 0, 0)),
            Some(utc(2019, 1, 1, 0, 0, 0))
        );
    }

    #[test]
    fn test_monthly() {
        let now = utc(2019, 3, 8, 0, 0, 0);
        assert_eq!(recent("M", now), Some(utc(2019, 2, 1, 0, 0, 0)));
        assert_eq!(recent("2M", now), Some(utc(2019, 1, 1, 0, 0, 0)));
        assert_eq!(recent("3M", now), Some(utc(2018, 10, 1, 0, 0, 0)));
        // Jan, Jun, Nov; November's session closes at year end
        assert_eq!(recent("5M", now), Some(utc(2018, 11, 1, 0, 0, 0)));
        assert_eq!(recent("13M", now), Some(utc(2018, 1, 1, 0, 0, 0)));
    }

    // ── week walks ──────────────────────────────────────────────────────

    #[test]
    fn test_weekly_mid_year() {
        // Friday; the week opening Monday Mar 4 is still running
        let now = utc(2019, 3, 8, 0, 0, 0);
        assert_eq!(recent("W", now), Some(utc(2019, 2, 25, 0, 0, 0)));
        // 2019 anchor is Jan 7; two-week opens: ..., Feb 18, Mar 4
        assert_eq!(recent("2W", now), Some(utc(2019, 2, 18, 0, 0, 0)));
    }

    #[test]
    fn test_weekly_before_first_full_week_uses_previous_anchor() {
        // Before 2019's first full week (Jan 7) the 2018 grid continues
        let now = utc(2019, 1, 3, 0, 0, 0);
        assert_eq!(recent("W", now), Some(utc(2018, 12, 24, 0, 0, 0)));
        let now = utc(2019, 1, 10, 0, 0, 0);
        assert_eq!(recent("W", now), Some(utc(2018, 12, 31, 0, 0, 0)));
    }

    #[test]
    fn test_weekly_fallback_overlaps_current_grid() {
        // 2019 grid: Jan 7, Jan 21; the first session is still open on Jan 20
        let now = utc(2019, 1, 20, 0, 0, 0);
        assert_eq!(recent("2W", now), Some(utc(2018, 12, 31, 0, 0, 0)));
    }

    #[test]
    fn test_huge_quantifiers_stop_the_walk() {
        let now = utc(2019, 2, 8, 12, 0, 0);
        for tf in [
            Timeframe::new(TimeUnit::Minute, 1 << 40).unwrap(),
            Timeframe::new(TimeUnit::Week, 1 << 40).unwrap(),
            Timeframe::new(TimeUnit::Month, 1 << 33).unwrap(),
        ] {
            assert_eq!(most_recent_open(tf, now), None);
        }
    }

    #[test]
    fn test_weekly_on_the_boundary() {
        let now = utc(2019, 1, 14, 0, 0, 0);
        assert_eq!(recent("W", now), Some(utc(2019, 1, 7, 0, 0, 0)));
    }

    // ── is_most_recent_open ─────────────────────────────────────────────

    #[test]
    fn test_is_most_recent_open_exact() {
        let open = utc(2019, 1, 1, 0, 0, 0);
        let now = utc(2019, 1, 2, 12, 0, 0);
        assert!(is_most_recent_open("1D", open, now).unwrap());
        assert!(!is_most_recent_open("1D", utc(2019, 1, 2, 0, 0, 0), now).unwrap());
        assert!(!is_most_recent_open("1D", open + TimeDelta::seconds(30), now).unwrap());
    }

    #[test]
    fn test_is_most_recent_open_rejects_bad_timeframe() {
        let t = utc(2019, 1, 1, 0, 0, 0);
        let err = is_most_recent_open("5b", t, t).unwrap_err();
        assert!(err.to_string().contains("Invalid timeframe"), "got: {err}");
    }

    #[test]
    fn test_session_opens_are_ordered_and_complete() {
        let now = utc(2019, 2, 8, 13, 0, 0);
        let opens = session_opens(Timeframe::parse("4H").unwrap(), now);
        assert!(opens.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(opens.first(), Some(&utc(2019, 2, 7, 0, 0, 0)));
        assert_eq!(opens.last(), Some(&utc(2019, 2, 8, 8, 0, 0)));
        // 6 yesterday + 00, 04, 08 today
        assert_eq!(opens.len(), 9);
    }

    #[test]
    fn test_long_quantifier_with_no_completed_session() {
        // 50-hour sessions restart daily and never finish within the window
        let now = utc(2019, 2, 8, 12, 0, 0);
        assert_eq!(recent("50H", now), None);
        assert!(!is_most_recent_open("50H", utc(2019, 2, 7, 0, 0, 0), now).unwrap());
    }
}
