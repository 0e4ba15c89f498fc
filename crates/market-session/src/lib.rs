//! # market-session
//!
//! Calendar-aligned session computation for candlestick charts.
//!
//! A session is a fixed-length time bucket (5 minutes, 4 hours, 1 week,
//! 3 months, ...). This crate converts between the compact timeframe
//! notation and minute counts, reports which sessions close at a given
//! instant, and resolves the open of the most recently completed session.
//! Everything is pure, UTC-only computation at minute resolution; the caller
//! supplies the "now" anchor.
//!
//! ## Modules
//!
//! - [`timeframe`] — `"4H"` ↔ `240` minutes, unit families
//! - [`calendar`] — UTC period truncation, year indexes, week numbering
//! - [`closure`] — Which timeframes close at an instant
//! - [`resolver`] — Most recently completed session open
//! - [`error`] — Error types

pub mod calendar;
pub mod closure;
pub mod error;
pub mod resolver;
pub mod timeframe;

pub use calendar::{
    first_full_week_start, index_within_year, is_unit_boundary, week_of_year, CalendarUnit,
};
pub use closure::{
    closed_default_sessions, closed_sessions, closes_at, SessionSet, DEFAULT_TIMEFRAMES,
};
pub use error::SessionError;
pub use resolver::{is_most_recent_open, is_most_recent_open_now, most_recent_open, session_opens};
pub use timeframe::{format_timeframe, parse_timeframe, TimeUnit, Timeframe};
