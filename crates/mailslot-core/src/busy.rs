//! Busy periods and their canonical, merged form.
//!
//! Calendar providers hand back busy periods in whatever order and shape
//! they like. [`NormalizedBusySet`] is the only form the availability
//! evaluator accepts: sorted by start, with overlapping and touching
//! periods merged so that for consecutive intervals `a.end < b.start`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::time::TimeInterval;

/// A busy period as received from a calendar provider.
///
/// Nothing about it is trusted: it may overlap its siblings, arrive out of
/// order, or have `start >= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyPeriod {
    /// Start of the busy period.
    pub start: DateTime<Utc>,
    /// End of the busy period.
    pub end: DateTime<Utc>,
}

impl BusyPeriod {
    /// Creates a new busy period.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Converts to an interval, or `None` if the period is malformed.
    pub fn to_interval(&self) -> Option<TimeInterval> {
        TimeInterval::new(self.start, self.end).ok()
    }
}

/// Sorted, non-overlapping, non-adjacent busy intervals.
///
/// Built once per query and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NormalizedBusySet {
    intervals: Vec<TimeInterval>,
}

impl NormalizedBusySet {
    /// Creates an empty busy set (a fully free calendar).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Normalizes raw provider data.
    ///
    /// Malformed periods (`start >= end`) are dropped and logged; they never
    /// fail the computation.
    pub fn from_periods(periods: &[BusyPeriod]) -> Self {
        let mut malformed = 0usize;
        let intervals: Vec<TimeInterval> = periods
            .iter()
            .filter_map(|p| {
                let interval = p.to_interval();
                if interval.is_none() {
                    malformed += 1;
                }
                interval
            })
            .collect();

        if malformed > 0 {
            warn!(
                malformed,
                received = periods.len(),
                "dropping malformed busy periods"
            );
        }

        Self::from_intervals(intervals)
    }

    /// Sorts and merges already-valid intervals.
    pub fn from_intervals(intervals: impl IntoIterator<Item = TimeInterval>) -> Self {
        let mut sorted: Vec<TimeInterval> = intervals.into_iter().collect();
        // Ord on TimeInterval is (start, end), which gives the tie-break
        sorted.sort();

        let received = sorted.len();
        let mut merged: Vec<TimeInterval> = Vec::with_capacity(received);
        let mut iter = sorted.into_iter();

        if let Some(mut running) = iter.next() {
            for next in iter {
                if next.start() <= running.end() {
                    running = running.extended_to(next.end());
                } else {
                    merged.push(running);
                    running = next;
                }
            }
            merged.push(running);
        }

        debug!(received, merged = merged.len(), "normalized busy set");
        Self { intervals: merged }
    }

    /// Returns the merged intervals in ascending order.
    pub fn intervals(&self) -> &[TimeInterval] {
        &self.intervals
    }

    /// Returns an iterator over the merged intervals.
    pub fn iter(&self) -> std::slice::Iter<'_, TimeInterval> {
        self.intervals.iter()
    }

    /// Returns the number of merged intervals.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Returns `true` if nothing is busy.
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Total busy time covered by the set.
    pub fn covered(&self) -> Duration {
        self.intervals
            .iter()
            .fold(Duration::zero(), |acc, i| acc + i.duration())
    }

    /// Checks if an instant falls inside any busy interval.
    pub fn is_busy_at(&self, dt: DateTime<Utc>) -> bool {
        let idx = self.intervals.partition_point(|i| i.end() <= dt);
        self.intervals
            .get(idx)
            .is_some_and(|i| i.contains_instant(dt))
    }
}

impl<'a> IntoIterator for &'a NormalizedBusySet {
    type Item = &'a TimeInterval;
    type IntoIter = std::slice::Iter<'a, TimeInterval>;

    fn into_iter(self) -> Self::IntoIter {
        self.intervals.iter()
    }
}
