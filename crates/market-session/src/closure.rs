//! Which sessions close at a given instant.
//!
//! A session closes at the instant the next one of the same length opens.
//! Alignment depends on the timeframe's canonical unit family:
//!
//! - **Months**: first minute of a calendar month whose zero-based index
//!   within the year is a multiple of the quantifier. Counting restarts every
//!   January, so `5M` closes in January, June and November.
//! - **Weeks**: Sunday midnight, when [`week_of_year`] is a multiple of the
//!   quantifier.
//! - **Days / hours**: the first minute of a day / hour whose index within the
//!   year is a multiple of the quantifier. Counting restarts every year, so
//!   large quantifiers leave a short last session in December.
//! - **Minutes**: any minute whose index within the year is a multiple of the
//!   quantifier.
//!
//! The first minute of a year has index 0 in every family, so it closes every
//! month, day, hour and minute session.

use std::num::NonZeroU64;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::{
    index_within_year, is_unit_boundary, truncate_to_minute, week_of_year, CalendarUnit,
};
use crate::error::Result;
use crate::timeframe::Timeframe;

/// Timeframes queried when the caller does not pass any.
pub const DEFAULT_TIMEFRAMES: [&str; 12] = [
    "5", "15", "30", "60", "4H", "12H", "1D", "3D", "1W", "1M", "3M", "12M",
];

/// [`DEFAULT_TIMEFRAMES`] in typed form.
const DEFAULT_SESSIONS: [Timeframe; 12] = [
    Timeframe::Minutes(quantifier(5)),
    Timeframe::Minutes(quantifier(15)),
    Timeframe::Minutes(quantifier(30)),
    Timeframe::Minutes(quantifier(60)),
    Timeframe::Hours(quantifier(4)),
    Timeframe::Hours(quantifier(12)),
    Timeframe::Days(quantifier(1)),
    Timeframe::Days(quantifier(3)),
    Timeframe::Weeks(quantifier(1)),
    Timeframe::Months(quantifier(1)),
    Timeframe::Months(quantifier(3)),
    Timeframe::Months(quantifier(12)),
];

const fn quantifier(n: u64) -> NonZeroU64 {
    match NonZeroU64::new(n) {
        Some(q) => q,
        None => panic!("default quantifier must be positive"),
    }
}

/// An ordered list of timeframes to test for closes.
///
/// Duplicates are kept and evaluated independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionSet {
    timeframes: Vec<Timeframe>,
}

impl SessionSet {
    pub fn new(timeframes: Vec<Timeframe>) -> Self {
        Self { timeframes }
    }

    /// Parse every entry; the first malformed one fails the whole set.
    pub fn parse<S: AsRef<str>>(texts: &[S]) -> Result<Self> {
        let timeframes = texts
            .iter()
            .map(|t| Timeframe::parse(t.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { timeframes })
    }

    pub fn timeframes(&self) -> &[Timeframe] {
        &self.timeframes
    }

    pub fn len(&self) -> usize {
        self.timeframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timeframes.is_empty()
    }

    /// Minute counts of the timeframes closing at `instant`, in set order.
    pub fn closed_at(&self, instant: DateTime<Utc>) -> Vec<i64> {
        let instant = truncate_to_minute(instant);
        let closed: Vec<i64> = self
            .timeframes
            .iter()
            .filter(|tf| closes_at(**tf, instant))
            .map(Timeframe::minutes)
            .collect();
        tracing::trace!(
            instant = %instant,
            queried = self.timeframes.len(),
            closed = closed.len(),
            "evaluated session closes"
        );
        closed
    }
}

impl Default for SessionSet {
    fn default() -> Self {
        Self {
            timeframes: DEFAULT_SESSIONS.to_vec(),
        }
    }
}

/// Whether a session of length `timeframe` closes at `instant`.
pub fn closes_at(timeframe: Timeframe, instant: DateTime<Utc>) -> bool {
    let instant = truncate_to_minute(instant);
    match timeframe.canonical() {
        Timeframe::Months(q) => {
            is_unit_boundary(instant, CalendarUnit::Month)
                && is_multiple(index_within_year(instant, CalendarUnit::Month), q)
        }
        Timeframe::Weeks(q) => {
            is_unit_boundary(instant, CalendarUnit::Week)
                && is_multiple(i64::from(week_of_year(instant)), q)
        }
        Timeframe::Days(q) => {
            is_unit_boundary(instant, CalendarUnit::Day)
                && is_multiple(index_within_year(instant, CalendarUnit::Day), q)
        }
        Timeframe::Hours(q) => {
            is_unit_boundary(instant, CalendarUnit::Hour)
                && is_multiple(index_within_year(instant, CalendarUnit::Hour), q)
        }
        Timeframe::Minutes(q) => is_multiple(index_within_year(instant, CalendarUnit::Minute), q),
    }
}

fn is_multiple(index: i64, quantifier: NonZeroU64) -> bool {
    index.unsigned_abs() % quantifier.get() == 0
}

/// Minute counts of the `timeframes` whose sessions close at `instant`.
///
/// `instant` is truncated to the minute. Results keep the order of
/// `timeframes`, duplicates included.
///
/// # Errors
///
/// Returns [`SessionError::InvalidFormat`](crate::SessionError::InvalidFormat)
/// if any entry is malformed; nothing is evaluated in that case.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use market_session::closed_sessions;
///
/// let three_am = Utc.with_ymd_and_hms(2019, 1, 1, 3, 0, 0).unwrap();
/// assert_eq!(closed_sessions(three_am, &["1H", "3H", "12H"]).unwrap(), vec![60, 180]);
/// ```
pub fn closed_sessions<S: AsRef<str>>(
    instant: DateTime<Utc>,
    timeframes: &[S],
) -> Result<Vec<i64>> {
    Ok(SessionSet::parse(timeframes)?.closed_at(instant))
}

/// [`closed_sessions`] over [`DEFAULT_TIMEFRAMES`].
pub fn closed_default_sessions(instant: DateTime<Utc>) -> Vec<i64> {
    SessionSet::default().closed_at(instant)
}
