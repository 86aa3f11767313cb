//! Time types for availability computation.
//!
//! This module provides [`TimeInterval`], the half-open `[start, end)` value
//! every other component is built on, and [`SearchWindow`] for defining the
//! range (and cadence) over which slots are generated.

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Cadence at which slot starts are generated, in minutes.
pub const DEFAULT_STEP_MINUTES: u32 = 30;

/// Errors raised when constructing time values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    /// The interval would cover no time at all.
    #[error("interval start {start} is not before end {end}")]
    EmptyInterval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// A slot step must move forward in time.
    #[error("step must be positive, got {minutes} minutes")]
    NonPositiveStep { minutes: i64 },
}

/// A half-open interval of time `[start, end)` in UTC.
///
/// The invariant `start < end` holds for every value; construction of an
/// empty or inverted interval fails with [`TimeError::EmptyInterval`].
///
/// Ordering is by `start`, then by `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "IntervalRepr")]
pub struct TimeInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct IntervalRepr {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<IntervalRepr> for TimeInterval {
    type Error = TimeError;

    fn try_from(repr: IntervalRepr) -> Result<Self, Self::Error> {
        Self::new(repr.start, repr.end)
    }
}

impl TimeInterval {
    /// Creates a new interval.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::EmptyInterval`] unless `start < end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, TimeError> {
        if start < end {
            Ok(Self { start, end })
        } else {
            Err(TimeError::EmptyInterval { start, end })
        }
    }

    /// Creates an interval from a start time and a length.
    pub fn from_duration(start: DateTime<Utc>, length: Duration) -> Result<Self, TimeError> {
        Self::new(start, start + length)
    }

    /// Start of the interval (inclusive).
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// End of the interval (exclusive).
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Returns the length of this interval.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Checks if two intervals share any instant.
    ///
    /// Uses half-open semantics: an interval ending exactly when the other
    /// begins does not overlap it.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Checks if `inner` lies entirely within this interval.
    pub fn contains(&self, inner: &TimeInterval) -> bool {
        self.start <= inner.start && inner.end <= self.end
    }

    /// Checks if a single instant falls within this interval.
    pub fn contains_instant(&self, dt: DateTime<Utc>) -> bool {
        self.start <= dt && dt < self.end
    }

    /// Returns this interval with its end pushed out to `end` if later.
    pub(crate) fn extended_to(self, end: DateTime<Utc>) -> Self {
        Self {
            start: self.start,
            end: self.end.max(end),
        }
    }
}

/// How far ahead to look when a request carries no suggested times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Lookahead {
    /// A fixed number of calendar days.
    CalendarDays { days: u32 },
    /// A number of weekdays, skipping Saturdays and Sundays.
    BusinessDays { days: u32 },
}

impl Default for Lookahead {
    fn default() -> Self {
        Self::CalendarDays { days: 7 }
    }
}

impl Lookahead {
    /// Returns the end of the lookahead starting at `from`.
    pub fn end_from(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        match *self {
            Self::CalendarDays { days } => from + Duration::days(i64::from(days)),
            Self::BusinessDays { days } => add_business_days(from, days),
        }
    }
}

/// Adds `days` weekdays to `from`, keeping the time of day.
///
/// Starting on a weekend, the first counted day is the following Monday.
pub fn add_business_days(from: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    let mut current = from;
    let mut remaining = days;
    while remaining > 0 {
        current += Duration::days(1);
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            remaining -= 1;
        }
    }
    current
}

/// Rounds `dt` up to the next `step_minutes` boundary of its UTC day.
///
/// Boundaries count from midnight, so a 30-minute step lands on `:00` and
/// `:30`. Seconds and sub-second parts never survive; an instant already on
/// a boundary is returned unchanged. A zero step returns `dt` as is.
pub fn align_up(dt: DateTime<Utc>, step_minutes: u32) -> DateTime<Utc> {
    if step_minutes == 0 {
        return dt;
    }
    let step = Duration::minutes(i64::from(step_minutes));
    let mut aligned = dt.date_naive().and_time(NaiveTime::MIN).and_utc();
    while aligned < dt {
        aligned += step;
    }
    aligned
}

/// The range over which slots are generated and checked.
///
/// `from >= to` is allowed and simply yields no slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchWindow {
    /// First possible slot start.
    pub from: DateTime<Utc>,
    /// No slot may end after this instant.
    pub to: DateTime<Utc>,
    step_minutes: u32,
}

impl SearchWindow {
    /// Creates a window with the default 30-minute cadence.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from,
            to,
            step_minutes: DEFAULT_STEP_MINUTES,
        }
    }

    /// Creates the narrow window `[time, time + duration)` around one
    /// suggested meeting time.
    pub fn for_suggested_time(time: DateTime<Utc>, duration: Duration) -> Self {
        Self::new(time, time + duration)
    }

    /// Creates the default window starting at `now`.
    pub fn lookahead(now: DateTime<Utc>, lookahead: Lookahead) -> Self {
        Self::new(now, lookahead.end_from(now))
    }

    /// Builder: set the cadence between slot starts.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::NonPositiveStep`] for a zero step.
    pub fn with_step_minutes(mut self, minutes: u32) -> Result<Self, TimeError> {
        if minutes == 0 {
            return Err(TimeError::NonPositiveStep { minutes: 0 });
        }
        self.step_minutes = minutes;
        Ok(self)
    }

    /// Returns the cadence between slot starts.
    pub fn step(&self) -> Duration {
        Duration::minutes(i64::from(self.step_minutes))
    }

    /// Returns the cadence in minutes.
    pub fn step_minutes(&self) -> u32 {
        self.step_minutes
    }

    /// Returns the window as an interval, or `None` if it is empty.
    pub fn as_interval(&self) -> Option<TimeInterval> {
        TimeInterval::new(self.from, self.to).ok()
    }
}
