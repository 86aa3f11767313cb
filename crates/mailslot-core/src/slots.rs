//! Slot generation, availability evaluation and recommendation.
//!
//! Slots are generated at a fixed cadence (30 minutes by default) no matter
//! how long the meeting is, so a 45-minute meeting is still offered at
//! `:00` and `:30` starts.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::busy::NormalizedBusySet;
use crate::time::{SearchWindow, TimeInterval};

/// A fixed-duration appointment time to check against the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotCandidate {
    /// When the meeting would start.
    pub start: DateTime<Utc>,
    /// Meeting length in minutes.
    pub duration_minutes: u32,
}

impl SlotCandidate {
    /// Creates a new candidate.
    pub fn new(start: DateTime<Utc>, duration_minutes: u32) -> Self {
        Self {
            start,
            duration_minutes,
        }
    }

    /// Returns when the meeting would end.
    pub fn end(&self) -> DateTime<Utc> {
        self.start + Duration::minutes(i64::from(self.duration_minutes))
    }

    /// Returns the candidate as an interval, or `None` for a zero duration.
    pub fn interval(&self) -> Option<TimeInterval> {
        TimeInterval::new(self.start, self.end()).ok()
    }
}

/// Produces the candidate slots of a window.
///
/// The generator itself holds no iteration state; every call to
/// [`SlotGenerator::iter`] starts again from the beginning of the window.
#[derive(Debug, Clone, Copy)]
pub struct SlotGenerator {
    window: SearchWindow,
    duration_minutes: u32,
}

impl SlotGenerator {
    /// Creates a generator for meetings of `duration_minutes` within `window`.
    pub fn new(window: SearchWindow, duration_minutes: u32) -> Self {
        Self {
            window,
            duration_minutes,
        }
    }

    /// Returns the window being walked.
    pub fn window(&self) -> &SearchWindow {
        &self.window
    }

    /// Returns a fresh iterator over the candidates.
    pub fn iter(&self) -> Slots {
        Slots {
            next_start: self.window.from,
            to: self.window.to,
            step: self.window.step(),
            duration_minutes: self.duration_minutes,
        }
    }
}

impl IntoIterator for &SlotGenerator {
    type Item = SlotCandidate;
    type IntoIter = Slots;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the candidates of a [`SlotGenerator`].
#[derive(Debug, Clone)]
pub struct Slots {
    next_start: DateTime<Utc>,
    to: DateTime<Utc>,
    step: Duration,
    duration_minutes: u32,
}

impl Iterator for Slots {
    type Item = SlotCandidate;

    fn next(&mut self) -> Option<Self::Item> {
        // A zero-length meeting has no bookable interval.
        if self.duration_minutes == 0 || self.step <= Duration::zero() {
            return None;
        }
        let candidate = SlotCandidate::new(self.next_start, self.duration_minutes);
        if candidate.end() > self.to {
            return None;
        }
        self.next_start += self.step;
        Some(candidate)
    }
}

/// Checks a candidate against the busy set using a binary search.
///
/// A candidate is available iff it overlaps no busy interval. Because the
/// set is sorted and non-overlapping, the ends are sorted too, so the first
/// interval ending after the candidate starts is the only one that can
/// conflict.
pub fn is_available(candidate: &SlotCandidate, busy: &NormalizedBusySet) -> bool {
    let Some(slot) = candidate.interval() else {
        return false;
    };
    let intervals = busy.intervals();
    let idx = intervals.partition_point(|b| b.end() <= slot.start());
    match intervals.get(idx) {
        Some(b) => !b.overlaps(&slot),
        None => true,
    }
}

/// Checks a candidate against the busy set with a linear scan.
///
/// Gives the same answer as [`is_available`]; stops as soon as a busy
/// interval starts at or after the candidate's end.
pub fn is_available_linear(candidate: &SlotCandidate, busy: &NormalizedBusySet) -> bool {
    let Some(slot) = candidate.interval() else {
        return false;
    };
    for b in busy {
        if b.start() >= slot.end() {
            break;
        }
        if b.overlaps(&slot) {
            return false;
        }
    }
    true
}

/// Returns the starts of every available candidate, in generation order.
pub fn available_slots(generator: &SlotGenerator, busy: &NormalizedBusySet) -> Vec<DateTime<Utc>> {
    generator
        .iter()
        .filter(|c| is_available(c, busy))
        .map(|c| c.start)
        .collect()
}

/// Picks the recommended slot: the earliest one, if any.
pub fn recommend(available: &[DateTime<Utc>]) -> Option<DateTime<Utc>> {
    available.first().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::busy::BusyPeriod;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 3, h, m, 0).unwrap()
    }

    fn busy(periods: &[(u32, u32, u32, u32)]) -> Vec<BusyPeriod> {
        periods
            .iter()
            .map(|&(sh, sm, eh, em)| BusyPeriod::new(at(sh, sm), at(eh, em)))
            .collect()
    }

    fn window(fh: u32, fm: u32, th: u32, tm: u32) -> SearchWindow {
        SearchWindow::new(at(fh, fm), at(th, tm))
    }

    mod generator {
        use super::*;

        #[test]
        fn half_hour_cadence() {
            let generator = SlotGenerator::new(window(9, 0, 11, 0), 30);
            let starts: Vec<_> = generator.iter().map(|c| c.start).collect();
            assert_eq!(starts, vec![at(9, 0), at(9, 30), at(10, 0), at(10, 30)]);
        }

        #[test]
        fn cadence_independent_of_duration() {
            let generator = SlotGenerator::new(window(9, 0, 11, 0), 45);
            let starts: Vec<_> = generator.iter().map(|c| c.start).collect();
            // 10:30 + 45 would end at 11:15, past the window
            assert_eq!(starts, vec![at(9, 0), at(9, 30), at(10, 0)]);

            let generator = SlotGenerator::new(window(9, 0, 11, 0), 90);
            let starts: Vec<_> = generator.iter().map(|c| c.start).collect();
            assert_eq!(starts, vec![at(9, 0), at(9, 30)]);
        }

        #[test]
        fn empty_or_inverted_window() {
            assert_eq!(SlotGenerator::new(window(9, 0, 9, 0), 30).iter().count(), 0);
            assert_eq!(SlotGenerator::new(window(10, 0, 9, 0), 30).iter().count(), 0);
        }

        #[test]
        fn meeting_longer_than_window() {
            assert_eq!(SlotGenerator::new(window(9, 0, 9, 30), 60).iter().count(), 0);
        }

        #[test]
        fn zero_duration_yields_nothing() {
            assert_eq!(SlotGenerator::new(window(9, 0, 11, 0), 0).iter().count(), 0);
        }

        #[test]
        fn restartable() {
            let generator = SlotGenerator::new(window(9, 0, 10, 0), 30);
            let first: Vec<_> = generator.iter().collect();
            let second: Vec<_> = (&generator).into_iter().collect();
            assert_eq!(first, second);
            assert_eq!(first.len(), 2);
        }

        #[test]
        fn custom_step() {
            let w = window(9, 0, 10, 0).with_step_minutes(15).unwrap();
            let starts: Vec<_> = SlotGenerator::new(w, 30).iter().map(|c| c.start).collect();
            assert_eq!(starts, vec![at(9, 0), at(9, 15), at(9, 30)]);
        }
    }

    mod evaluator {
        use super::*;

        fn set(periods: &[(u32, u32, u32, u32)]) -> NormalizedBusySet {
            NormalizedBusySet::from_periods(&busy(periods))
        }

        #[test]
        fn end_touching_busy_start_is_available() {
            let busy = set(&[(10, 0, 11, 0)]);
            let candidate = SlotCandidate::new(at(9, 30), 30);
            assert!(is_available(&candidate, &busy));
            assert!(is_available_linear(&candidate, &busy));
        }

        #[test]
        fn start_touching_busy_end_is_available() {
            let busy = set(&[(9, 0, 10, 0)]);
            let candidate = SlotCandidate::new(at(10, 0), 30);
            assert!(is_available(&candidate, &busy));
            assert!(is_available_linear(&candidate, &busy));
        }

        #[test]
        fn single_minute_overlap_is_unavailable() {
            let busy = set(&[(9, 59, 10, 0)]);
            for start in [at(9, 30), at(9, 45), at(9, 59)] {
                let candidate = SlotCandidate::new(start, 30);
                assert!(!is_available(&candidate, &busy), "{}", start);
                assert!(!is_available_linear(&candidate, &busy), "{}", start);
            }
        }

        #[test]
        fn inside_and_partial_overlap_unavailable() {
            let busy = set(&[(9, 0, 11, 0)]);
            assert!(!is_available(&SlotCandidate::new(at(9, 30), 30), &busy));
            assert!(!is_available(&SlotCandidate::new(at(10, 45), 30), &busy));
            assert!(!is_available(&SlotCandidate::new(at(8, 45), 30), &busy));
        }

        #[test]
        fn binary_search_matches_linear_and_brute_force() {
            let raw = busy(&[
                (9, 0, 10, 0),
                (9, 30, 10, 30),
                (12, 10, 12, 20),
                (13, 0, 13, 0),
                (15, 0, 14, 0),
                (14, 0, 14, 30),
                (14, 30, 15, 0),
            ]);
            let normalized = NormalizedBusySet::from_periods(&raw);

            for duration in [15, 30, 45, 60, 90] {
                let mut start = at(8, 0);
                while start < at(17, 0) {
                    let candidate = SlotCandidate::new(start, duration);
                    let slot = candidate.interval().unwrap();
                    let brute = !raw
                        .iter()
                        .filter_map(BusyPeriod::to_interval)
                        .any(|b| b.overlaps(&slot));

                    assert_eq!(is_available(&candidate, &normalized), brute, "{} {}", start, duration);
                    assert_eq!(
                        is_available_linear(&candidate, &normalized),
                        brute,
                        "{} {}",
                        start,
                        duration
                    );
                    start += Duration::minutes(5);
                }
            }
        }

        #[test]
        fn zero_duration_candidate_unavailable() {
            let candidate = SlotCandidate::new(at(9, 0), 0);
            assert!(!is_available(&candidate, &NormalizedBusySet::empty()));
        }
    }

    mod scenarios {
        use super::*;

        #[test]
        fn busy_first_hour() {
            let busy = NormalizedBusySet::from_periods(&busy(&[(9, 0, 10, 0)]));
            let slots = available_slots(&SlotGenerator::new(window(9, 0, 11, 0), 30), &busy);
            assert_eq!(slots, vec![at(10, 0), at(10, 30)]);
            assert_eq!(recommend(&slots), Some(at(10, 0)));
        }

        #[test]
        fn no_conflicts() {
            let slots = available_slots(
                &SlotGenerator::new(window(9, 0, 10, 0), 30),
                &NormalizedBusySet::empty(),
            );
            assert_eq!(slots, vec![at(9, 0), at(9, 30)]);
            assert_eq!(recommend(&slots), Some(at(9, 0)));
        }

        #[test]
        fn fully_covered_window() {
            let busy = NormalizedBusySet::from_periods(&busy(&[(9, 0, 11, 0)]));
            let slots = available_slots(&SlotGenerator::new(window(9, 0, 11, 0), 30), &busy);
            assert!(slots.is_empty());
            assert_eq!(recommend(&slots), None);
        }

        #[test]
        fn overlapping_busy_periods() {
            let busy = NormalizedBusySet::from_periods(&busy(&[(9, 0, 10, 0), (9, 30, 10, 30)]));
            assert_eq!(busy.len(), 1);
            assert_eq!(busy.intervals()[0].end(), at(10, 30));
            assert!(!is_available(&SlotCandidate::new(at(10, 0), 30), &busy));
            assert!(is_available(&SlotCandidate::new(at(10, 30), 30), &busy));
        }

        #[test]
        fn deterministic() {
            let raw = busy(&[(11, 0, 11, 30), (9, 0, 9, 30), (9, 15, 10, 0)]);
            let generator = SlotGenerator::new(window(8, 0, 12, 0), 30);
            let first = available_slots(&generator, &NormalizedBusySet::from_periods(&raw));
            let second = available_slots(&generator, &NormalizedBusySet::from_periods(&raw));
            assert_eq!(first, second);
        }
    }
}
