//! Scheduling orchestrator.
//!
//! Turns a [`MeetingRequest`] into a [`SchedulingResult`]:
//!
//! 1. one search window per suggested time (`[t, t + duration)`), or a single
//!    lookahead window from "now", rounded up to the cadence, when there are none
//! 2. a free/busy query per window
//! 3. normalize, generate, filter
//! 4. concatenate in window order and recommend the earliest slot
//!
//! Queries go out sequentially by default. With `concurrent_queries > 1` up
//! to that many are in flight at once; results are still consumed in window
//! order. Dropping the returned future cancels every pending query.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use mailslot_core::{
    BusyPeriod, DEFAULT_DURATION_MINUTES, DEFAULT_STEP_MINUTES, Lookahead, MeetingRequest,
    NormalizedBusySet, RequestError, SchedulingResult, SearchWindow, SlotGenerator, align_up,
    available_slots, resolve_duration,
};
use mailslot_providers::{FreeBusyProvider, FreeBusyQuery, ProviderError, ProviderResult, with_timeout};

/// What to do when the calendar cannot be queried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarFailurePolicy {
    /// Surface the failure as `CalendarUnavailable`.
    #[default]
    FailClosed,
    /// Treat the failed window as free and flag the result as partial.
    AssumeFree,
}

/// What to do when one of several windows fails under [`CalendarFailurePolicy::FailClosed`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowFailurePolicy {
    /// Fail the whole request on the first failed window.
    #[default]
    Abort,
    /// Drop the failed window and flag the result as partial.
    ///
    /// If every window fails the request still fails.
    Skip,
}

/// Tunables of a scheduling run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulingPolicy {
    /// Minutes between candidate starts.
    pub step_minutes: u32,
    /// Meeting length used when the request carries none (or zero).
    pub default_duration: u32,
    /// Window used when a request has no suggested times.
    pub lookahead: Lookahead,
    /// Whether a failed free/busy query fails the request or counts as free.
    pub on_calendar_failure: CalendarFailurePolicy,
    /// Whether a failed window aborts the run or is skipped, when failing closed.
    pub on_window_failure: WindowFailurePolicy,
    /// Free/busy queries allowed in flight at once; 1 means sequential.
    pub concurrent_queries: usize,
    /// Deadline for each free/busy query.
    pub call_timeout: Duration,
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        Self {
            step_minutes: DEFAULT_STEP_MINUTES,
            default_duration: DEFAULT_DURATION_MINUTES,
            lookahead: Lookahead::default(),
            on_calendar_failure: CalendarFailurePolicy::default(),
            on_window_failure: WindowFailurePolicy::default(),
            concurrent_queries: 1,
            call_timeout: Duration::from_secs(10),
        }
    }
}

impl SchedulingPolicy {
    /// Builder: set the window used when a request has no suggested times.
    pub fn with_lookahead(mut self, lookahead: Lookahead) -> Self {
        self.lookahead = lookahead;
        self
    }

    /// Builder: set what a failed free/busy query means.
    pub fn with_calendar_failure(mut self, policy: CalendarFailurePolicy) -> Self {
        self.on_calendar_failure = policy;
        self
    }

    /// Builder: set whether one failed window aborts the run.
    pub fn with_window_failure(mut self, policy: WindowFailurePolicy) -> Self {
        self.on_window_failure = policy;
        self
    }

    /// Builder: allow up to `limit` queries in flight (clamped to at least 1).
    pub fn with_concurrent_queries(mut self, limit: usize) -> Self {
        self.concurrent_queries = limit.max(1);
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_step_minutes(mut self, minutes: u32) -> Self {
        self.step_minutes = minutes;
        self
    }

    /// Builder: set the meeting length used when the request carries none.
    pub fn with_default_duration(mut self, minutes: u32) -> Self {
        self.default_duration = minutes;
        self
    }
}

/// Errors from a scheduling run.
#[derive(Debug, Error)]
pub enum SchedulingError {
    /// The calendar could not be queried (failure or timeout).
    #[error("calendar unavailable: {source}")]
    CalendarUnavailable {
        retryable: bool,
        source: ProviderError,
    },

    /// The request cannot be scheduled as given.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] RequestError),
}

impl SchedulingError {
    fn calendar(source: ProviderError) -> Self {
        Self::CalendarUnavailable {
            retryable: source.is_retryable(),
            source,
        }
    }

    /// Returns true if retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::CalendarUnavailable { retryable, .. } => *retryable,
            Self::InvalidRequest(_) => false,
        }
    }
}

/// Composes the calendar, the normalizer and the slot evaluator.
pub struct Scheduler {
    calendar: Arc<dyn FreeBusyProvider>,
    policy: SchedulingPolicy,
}

impl Scheduler {
    /// Creates a scheduler over the given calendar.
    pub fn new(calendar: Arc<dyn FreeBusyProvider>, policy: SchedulingPolicy) -> Self {
        Self { calendar, policy }
    }

    pub fn policy(&self) -> &SchedulingPolicy {
        &self.policy
    }

    /// Schedules `request` with the lookahead starting now.
    pub async fn schedule(
        &self,
        request: &MeetingRequest,
    ) -> Result<SchedulingResult, SchedulingError> {
        self.schedule_at(request, Utc::now()).await
    }

    /// Schedules `request` with the lookahead starting at the first cadence
    /// boundary at or after `now`.
    ///
    /// # Errors
    ///
    /// [`SchedulingError::InvalidRequest`] for a duration or cadence the
    /// scheduler cannot use; [`SchedulingError::CalendarUnavailable`] when a
    /// free/busy query fails and the policy does not absorb it.
    pub async fn schedule_at(
        &self,
        request: &MeetingRequest,
        now: DateTime<Utc>,
    ) -> Result<SchedulingResult, SchedulingError> {
        let duration = resolve_duration(
            request.duration.map(i64::from),
            self.policy.default_duration,
        )?;
        let windows = self.windows(request, duration, now)?;
        debug!(
            requested_by = %request.requested_by,
            windows = windows.len(),
            duration,
            "scheduling request"
        );

        let outcomes = self.query_windows(&windows).await?;

        let mut slots = Vec::new();
        let mut partial = false;
        let mut checked = 0usize;
        let mut first_failure = None;

        for (window, outcome) in windows.iter().zip(outcomes) {
            let periods = match outcome {
                Ok(periods) => periods,
                Err(err) => match self.policy.on_calendar_failure {
                    CalendarFailurePolicy::AssumeFree => {
                        warn!(error = %err, from = %window.from, "free/busy failed, assuming free");
                        partial = true;
                        Vec::new()
                    }
                    CalendarFailurePolicy::FailClosed => {
                        warn!(error = %err, from = %window.from, "free/busy failed, skipping window");
                        partial = true;
                        first_failure.get_or_insert(err);
                        continue;
                    }
                },
            };

            checked += 1;
            let busy = NormalizedBusySet::from_periods(&periods);
            let generator = SlotGenerator::new(*window, duration);
            slots.extend(available_slots(&generator, &busy));
        }

        if checked == 0
            && let Some(err) = first_failure
        {
            return Err(SchedulingError::calendar(err));
        }

        let result = SchedulingResult::from_slots(slots, duration).with_partial_failure(partial);
        info!(
            available = result.available_slots.len(),
            recommended = ?result.recommended_slot,
            partial,
            "scheduling complete"
        );
        Ok(result)
    }

    fn windows(
        &self,
        request: &MeetingRequest,
        duration: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<SearchWindow>, SchedulingError> {
        let length = chrono::Duration::minutes(i64::from(duration));
        let windows: Vec<SearchWindow> = if request.suggested_times.is_empty() {
            let start = align_up(now, self.policy.step_minutes);
            vec![SearchWindow::lookahead(start, self.policy.lookahead)]
        } else {
            request
                .suggested_times
                .iter()
                .map(|t| SearchWindow::for_suggested_time(*t, length))
                .collect()
        };

        windows
            .into_iter()
            .map(|w| w.with_step_minutes(self.policy.step_minutes))
            .collect::<Result<_, _>>()
            .map_err(|e| SchedulingError::InvalidRequest(e.into()))
    }

    /// Queries every window, yielding results in window order.
    ///
    /// Under fail-closed abort the first failure ends the run; queries still
    /// in flight are dropped.
    async fn query_windows(
        &self,
        windows: &[SearchWindow],
    ) -> Result<Vec<ProviderResult<Vec<BusyPeriod>>>, SchedulingError> {
        let abort = self.policy.on_calendar_failure == CalendarFailurePolicy::FailClosed
            && self.policy.on_window_failure == WindowFailurePolicy::Abort;

        let mut results = stream::iter(windows.iter().copied().map(|w| self.query_window(w)))
            .buffered(self.policy.concurrent_queries.max(1));

        let mut outcomes = Vec::with_capacity(windows.len());
        while let Some(outcome) = results.next().await {
            match outcome {
                Err(err) if abort => return Err(SchedulingError::calendar(err)),
                outcome => outcomes.push(outcome),
            }
        }
        Ok(outcomes)
    }

    async fn query_window(&self, window: SearchWindow) -> ProviderResult<Vec<BusyPeriod>> {
        if window.as_interval().is_none() {
            return Ok(Vec::new());
        }
        let query = FreeBusyQuery::new(window.from, window.to);
        with_timeout(
            "free/busy query",
            self.policy.call_timeout,
            self.calendar.query_free_busy(query),
        )
        .await
    }
}
