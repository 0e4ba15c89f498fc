//! Timeframe notation: quantifier + unit suffix ↔ minutes.
//!
//! A timeframe is written as an optional quantifier (positive integer, no
//! leading zero, default 1) followed by an optional unit suffix:
//!
//! | Suffix | Unit   | Minutes |
//! |--------|--------|---------|
//! | (none) | minute | 1       |
//! | `H`    | hour   | 60      |
//! | `D`    | day    | 1440    |
//! | `W`    | week   | 10080   |
//! | `M`    | month  | 40320   |
//!
//! At least one of the two parts must be present: `"5"`, `"4H"` and `"W"` are
//! valid, `""`, `"0"`, `"05"` and `"5b"` are not.
//!
//! The minute count is the canonical form. Going back to text picks the
//! coarsest unit that divides it evenly, so `"1440"` becomes `"1D"` and
//! `"28D"` becomes `"1M"`.

use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

pub const MINUTES_IN_HOUR: i64 = 60;
pub const MINUTES_IN_DAY: i64 = 60 * 24;
pub const MINUTES_IN_WEEK: i64 = 60 * 24 * 7;
/// A session month is four weeks, not a calendar month.
pub const MINUTES_IN_MONTH: i64 = 60 * 24 * 7 * 4;

// ── Units ───────────────────────────────────────────────────────────────────

/// The base unit of a timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeUnit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
}

impl TimeUnit {
    /// Fixed size of one unit in minutes.
    pub const fn minutes(self) -> i64 {
        match self {
            TimeUnit::Minute => 1,
            TimeUnit::Hour => MINUTES_IN_HOUR,
            TimeUnit::Day => MINUTES_IN_DAY,
            TimeUnit::Week => MINUTES_IN_WEEK,
            TimeUnit::Month => MINUTES_IN_MONTH,
        }
    }

    /// Notation suffix; minutes have none.
    pub const fn suffix(self) -> &'static str {
        match self {
            TimeUnit::Minute => "",
            TimeUnit::Hour => "H",
            TimeUnit::Day => "D",
            TimeUnit::Week => "W",
            TimeUnit::Month => "M",
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "" => Some(TimeUnit::Minute),
            "H" => Some(TimeUnit::Hour),
            "D" => Some(TimeUnit::Day),
            "W" => Some(TimeUnit::Week),
            "M" => Some(TimeUnit::Month),
            _ => None,
        }
    }
}

// ── Family predicates ───────────────────────────────────────────────────────

/// Whether `minutes` is a whole number of session months.
pub fn is_monthly(minutes: i64) -> bool {
    minutes >= MINUTES_IN_MONTH && minutes % MINUTES_IN_MONTH == 0
}

/// Whether `minutes` is a whole number of weeks.
pub fn is_weekly(minutes: i64) -> bool {
    minutes >= MINUTES_IN_WEEK && minutes % MINUTES_IN_WEEK == 0
}

/// Whether `minutes` is a whole number of days.
pub fn is_daily(minutes: i64) -> bool {
    minutes >= MINUTES_IN_DAY && minutes % MINUTES_IN_DAY == 0
}

/// Whether `minutes` is a whole number of hours.
pub fn is_hourly(minutes: i64) -> bool {
    minutes >= MINUTES_IN_HOUR && minutes % MINUTES_IN_HOUR == 0
}

/// Whether `minutes` is a positive minute count.
pub fn is_minutely(minutes: i64) -> bool {
    minutes > 0
}

/// Families in the order they are tried: coarsest first.
const FAMILIES: [(fn(i64) -> bool, TimeUnit); 5] = [
    (is_monthly, TimeUnit::Month),
    (is_weekly, TimeUnit::Week),
    (is_daily, TimeUnit::Day),
    (is_hourly, TimeUnit::Hour),
    (is_minutely, TimeUnit::Minute),
];

// ── Timeframe ───────────────────────────────────────────────────────────────

/// A session length: one variant per unit family, each carrying its
/// quantifier.
///
/// [`Timeframe::parse`] keeps the family the text was written in (`"1440"` is
/// `Minutes(1440)`); [`Timeframe::canonical`] and [`Timeframe::from_minutes`]
/// give the coarsest family (`Days(1)`). Session alignment always works on
/// the canonical form, and so does `Display`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Timeframe {
    Minutes(NonZeroU64),
    Hours(NonZeroU64),
    Days(NonZeroU64),
    Weeks(NonZeroU64),
    Months(NonZeroU64),
}

impl Timeframe {
    /// Build a timeframe of `quantifier` `unit`s.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Range`] if `quantifier` is zero or the length
    /// does not fit in an `i64` minute count.
    pub fn new(unit: TimeUnit, quantifier: u64) -> Result<Self> {
        let q = NonZeroU64::new(quantifier).ok_or_else(|| {
            SessionError::Range(format!("quantifier must be positive, got {quantifier}"))
        })?;
        if quantifier_minutes(quantifier, unit).is_none() {
            return Err(SessionError::Range(format!(
                "{quantifier}{} overflows the minute count",
                unit.suffix()
            )));
        }
        Ok(match unit {
            TimeUnit::Minute => Timeframe::Minutes(q),
            TimeUnit::Hour => Timeframe::Hours(q),
            TimeUnit::Day => Timeframe::Days(q),
            TimeUnit::Week => Timeframe::Weeks(q),
            TimeUnit::Month => Timeframe::Months(q),
        })
    }

    /// Parse timeframe notation, keeping the unit it was written in.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidFormat`] if `text` is empty, does not
    /// match the notation, or spans more minutes than an `i64` holds.
    ///
    /// # Examples
    ///
    /// ```
    /// use market_session::{TimeUnit, Timeframe};
    ///
    /// let tf = Timeframe::parse("4H").unwrap();
    /// assert_eq!(tf.unit(), TimeUnit::Hour);
    /// assert_eq!(tf.quantifier(), 4);
    /// assert_eq!(tf.minutes(), 240);
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Err(SessionError::InvalidFormat("empty timeframe".to_string()));
        }
        if !is_timeframe_notation(text) {
            return Err(SessionError::InvalidFormat(format!(
                "expected quantifier and unit (e.g. '15', '4H', 'W'), got '{text}'"
            )));
        }

        let (digits, suffix) = split_notation(text);
        let unit = TimeUnit::from_suffix(suffix).ok_or_else(|| {
            SessionError::Unreachable(format!("no unit family for suffix '{suffix}' in '{text}'"))
        })?;
        let quantifier = if digits.is_empty() {
            1
        } else {
            digits
                .parse::<u64>()
                .ok()
                .filter(|q| quantifier_minutes(*q, unit).is_some())
                .ok_or_else(|| {
                    SessionError::InvalidFormat(format!("quantifier in '{text}' is too large"))
                })?
        };

        Timeframe::new(unit, quantifier)
    }

    /// The timeframe spanning `minutes`, expressed in the coarsest unit that
    /// divides it evenly.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Range`] if `minutes` is not positive.
    pub fn from_minutes(minutes: i64) -> Result<Self> {
        if minutes <= 0 {
            return Err(SessionError::Range(format!(
                "timeframe must be a positive number of minutes, got {minutes}"
            )));
        }

        let unit = FAMILIES
            .iter()
            .find(|(member, _)| member(minutes))
            .map(|(_, unit)| *unit)
            .ok_or_else(|| {
                SessionError::Unreachable(format!("no unit family for {minutes} minutes"))
            })?;
        let quantifier = (minutes / unit.minutes()).unsigned_abs();

        Timeframe::new(unit, quantifier)
    }

    pub fn unit(&self) -> TimeUnit {
        match self {
            Timeframe::Minutes(_) => TimeUnit::Minute,
            Timeframe::Hours(_) => TimeUnit::Hour,
            Timeframe::Days(_) => TimeUnit::Day,
            Timeframe::Weeks(_) => TimeUnit::Week,
            Timeframe::Months(_) => TimeUnit::Month,
        }
    }

    pub fn quantifier(&self) -> u64 {
        match self {
            Timeframe::Minutes(q)
            | Timeframe::Hours(q)
            | Timeframe::Days(q)
            | Timeframe::Weeks(q)
            | Timeframe::Months(q) => q.get(),
        }
    }

    /// Length in minutes, saturating at `i64::MAX` for variants built
    /// directly with an oversized quantifier.
    pub fn minutes(&self) -> i64 {
        quantifier_minutes(self.quantifier(), self.unit()).unwrap_or(i64::MAX)
    }

    /// The same length expressed in its coarsest unit.
    pub fn canonical(&self) -> Self {
        Timeframe::from_minutes(self.minutes()).unwrap_or(*self)
    }
}

/// `quantifier` units in minutes, if that fits in an `i64`.
fn quantifier_minutes(quantifier: u64, unit: TimeUnit) -> Option<i64> {
    i64::try_from(quantifier).ok()?.checked_mul(unit.minutes())
}

/// Canonical notation: `Timeframe::parse("1440")` displays as `1D`.
impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let canonical = self.canonical();
        write!(f, "{}{}", canonical.quantifier(), canonical.unit().suffix())
    }
}

impl FromStr for Timeframe {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self> {
        Timeframe::parse(s)
    }
}

impl TryFrom<String> for Timeframe {
    type Error = SessionError;

    fn try_from(s: String) -> Result<Self> {
        Timeframe::parse(&s)
    }
}

impl From<Timeframe> for String {
    fn from(tf: Timeframe) -> Self {
        tf.to_string()
    }
}

// ── Codec ───────────────────────────────────────────────────────────────────

/// Convert timeframe notation into a number of minutes.
///
/// # Errors
///
/// Returns [`SessionError::InvalidFormat`] for malformed notation.
///
/// # Examples
///
/// ```
/// use market_session::parse_timeframe;
///
/// assert_eq!(parse_timeframe("15").unwrap(), 15);
/// assert_eq!(parse_timeframe("D").unwrap(), 1440);
/// assert!(parse_timeframe("5b").is_err());
/// ```
pub fn parse_timeframe(text: &str) -> Result<i64> {
    Timeframe::parse(text).map(|tf| tf.minutes())
}

/// Convert a number of minutes into timeframe notation using the coarsest
/// unit that divides it evenly.
///
/// Numerically odd results such as `"53W"` are returned as-is.
///
/// # Errors
///
/// Returns [`SessionError::Range`] if `minutes` is not positive.
///
/// # Examples
///
/// ```
/// use market_session::format_timeframe;
///
/// assert_eq!(format_timeframe(59).unwrap(), "59");
/// assert_eq!(format_timeframe(1440).unwrap(), "1D");
/// assert_eq!(format_timeframe(40320).unwrap(), "1M");
/// ```
pub fn format_timeframe(minutes: i64) -> Result<String> {
    Timeframe::from_minutes(minutes).map(|tf| tf.to_string())
}

/// Whether `text` is valid timeframe notation.
pub fn is_timeframe_notation(text: &str) -> bool {
    let (digits, suffix) = split_notation(text);
    let quantifier_ok = !digits.starts_with('0');
    let suffix_ok = matches!(suffix, "" | "H" | "D" | "W" | "M");
    !(digits.is_empty() && suffix.is_empty()) && quantifier_ok && suffix_ok
}

/// Split at the first non-digit: `"12H"` → `("12", "H")`.
fn split_notation(text: &str) -> (&str, &str) {
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    text.split_at(end)
}
