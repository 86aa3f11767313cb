//! Collaborator traits.
//!
//! The scheduler talks to the outside world through three handles:
//!
//! - [`FreeBusyProvider`] answers "when is this calendar busy?"
//! - [`EventWriter`] creates the confirmed meeting.
//! - [`IntentExtractor`] turns an email into a [`MeetingIntent`].
//!
//! Implementations are constructed explicitly and injected; nothing here is
//! process-global.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use mailslot_core::{BusyPeriod, CreatedEvent, EmailContent, MeetingEvent, MeetingIntent};

use crate::error::{ProviderError, ProviderResult};

/// A boxed future for async trait methods.
///
/// Boxed futures keep the traits object-safe so collaborators can be held
/// as `Arc<dyn Trait>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A free/busy question for one calendar over `[time_min, time_max)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeBusyQuery {
    pub time_min: DateTime<Utc>,
    pub time_max: DateTime<Utc>,
    /// Calendar to query; `None` means the provider's configured default.
    pub calendar_id: Option<String>,
}

impl FreeBusyQuery {
    pub fn new(time_min: DateTime<Utc>, time_max: DateTime<Utc>) -> Self {
        Self {
            time_min,
            time_max,
            calendar_id: None,
        }
    }

    pub fn with_calendar_id(mut self, id: impl Into<String>) -> Self {
        self.calendar_id = Some(id.into());
        self
    }
}

/// Source of busy periods.
///
/// An empty `Ok` vector means the calendar is free for the whole range; it
/// is never used to signal failure.
pub trait FreeBusyProvider: Send + Sync {
    /// Returns the name of this provider (e.g. "google").
    fn name(&self) -> &str;

    /// Returns the raw busy periods intersecting the query range.
    ///
    /// Periods come back as the calendar reports them: unsorted,
    /// overlapping, possibly malformed.
    fn query_free_busy(&self, query: FreeBusyQuery) -> BoxFuture<'_, ProviderResult<Vec<BusyPeriod>>>;
}

/// Writes confirmed meetings to a calendar.
pub trait EventWriter: Send + Sync {
    fn name(&self) -> &str;

    /// Creates the event. `event` has already been validated.
    fn create_event<'a>(&'a self, event: &'a MeetingEvent) -> BoxFuture<'a, ProviderResult<CreatedEvent>>;
}

/// Extracts the meeting intent from an email.
pub trait IntentExtractor: Send + Sync {
    fn name(&self) -> &str;

    /// Analyzes the email.
    ///
    /// A well-formed "not a meeting request" answer is `Ok`; only transport
    /// failures and unusable model output are errors.
    fn extract<'a>(&'a self, email: &'a EmailContent) -> BoxFuture<'a, ProviderResult<MeetingIntent>>;
}

/// Runs `call` with a deadline; expiry becomes a retryable timeout error.
pub async fn with_timeout<T, F>(operation: &str, limit: Duration, call: F) -> ProviderResult<T>
where
    F: Future<Output = ProviderResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::timeout(operation, limit)),
    }
}

/// A collaborator that always fails.
///
/// Stands in for a collaborator that failed to initialize, and for tests.
#[derive(Debug)]
pub struct ErrorProvider {
    name: String,
    error: ProviderError,
}

impl ErrorProvider {
    pub fn new(name: impl Into<String>, error: ProviderError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }

    fn fail<T: Send + 'static>(&self) -> BoxFuture<'static, ProviderResult<T>> {
        let error = self.error.duplicate().with_provider(&self.name);
        Box::pin(async move { Err(error) })
    }
}

impl FreeBusyProvider for ErrorProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn query_free_busy(&self, _query: FreeBusyQuery) -> BoxFuture<'_, ProviderResult<Vec<BusyPeriod>>> {
        self.fail()
    }
}

impl EventWriter for ErrorProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn create_event<'a>(&'a self, _event: &'a MeetingEvent) -> BoxFuture<'a, ProviderResult<CreatedEvent>> {
        self.fail()
    }
}

impl IntentExtractor for ErrorProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract<'a>(&'a self, _email: &'a EmailContent) -> BoxFuture<'a, ProviderResult<MeetingIntent>> {
        self.fail()
    }
}

/// A calendar with a fixed set of busy periods.
///
/// Returns every period that intersects the query range, unclipped and in
/// insertion order, and records each query it receives.
#[derive(Debug, Default)]
pub struct StaticFreeBusy {
    periods: Vec<BusyPeriod>,
    delay: Option<Duration>,
    queries: Mutex<Vec<FreeBusyQuery>>,
}

impl StaticFreeBusy {
    pub fn new(periods: Vec<BusyPeriod>) -> Self {
        Self {
            periods,
            delay: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// A calendar with nothing booked.
    pub fn free() -> Self {
        Self::default()
    }

    /// Builder: answer each query only after `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns the queries received so far, in arrival order.
    pub fn queries(&self) -> Vec<FreeBusyQuery> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

impl FreeBusyProvider for StaticFreeBusy {
    fn name(&self) -> &str {
        "static"
    }

    fn query_free_busy(&self, query: FreeBusyQuery) -> BoxFuture<'_, ProviderResult<Vec<BusyPeriod>>> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.clone());
        }

        // Malformed periods are passed through as well; the normalizer
        // decides what to do with them.
        let periods: Vec<BusyPeriod> = self
            .periods
            .iter()
            .filter(|p| p.start < query.time_max && query.time_min < p.end.max(p.start))
            .copied()
            .collect();
        let delay = self.delay;

        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            Ok(periods)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 3, h, m, 0).unwrap()
    }

    #[tokio::test]
    async fn error_provider_fails_every_call() {
        let provider = ErrorProvider::new("google", ProviderError::authentication("token expired"));

        let err = provider
            .query_free_busy(FreeBusyQuery::new(at(9, 0), at(10, 0)))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
        assert_eq!(err.provider(), Some("google"));

        let email = EmailContent {
            content: "hello".to_string(),
            ..Default::default()
        };
        assert!(provider.extract(&email).await.is_err());
    }

    #[tokio::test]
    async fn static_free_busy_filters_and_records() {
        let provider = StaticFreeBusy::new(vec![
            BusyPeriod::new(at(8, 0), at(9, 0)),
            BusyPeriod::new(at(9, 30), at(10, 30)),
            BusyPeriod::new(at(12, 0), at(13, 0)),
        ]);

        let query = FreeBusyQuery::new(at(9, 0), at(11, 0)).with_calendar_id("primary");
        let periods = provider.query_free_busy(query.clone()).await.unwrap();

        assert_eq!(periods, vec![BusyPeriod::new(at(9, 30), at(10, 30))]);
        assert_eq!(provider.queries(), vec![query]);
    }

    #[tokio::test]
    async fn empty_calendar_is_ok() {
        let provider = StaticFreeBusy::free();
        let periods = provider
            .query_free_busy(FreeBusyQuery::new(at(9, 0), at(17, 0)))
            .await
            .unwrap();
        assert!(periods.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn with_timeout_expires() {
        let provider = StaticFreeBusy::free().with_delay(Duration::from_secs(10));
        let err = with_timeout(
            "free/busy query",
            Duration::from_secs(2),
            provider.query_free_busy(FreeBusyQuery::new(at(9, 0), at(10, 0))),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code(), ProviderErrorCode::Timeout);
        assert!(err.is_retryable());
    }

    #[tokio::test(start_paused = true)]
    async fn with_timeout_passes_result_through() {
        let provider = StaticFreeBusy::new(vec![BusyPeriod::new(at(9, 0), at(9, 30))])
            .with_delay(Duration::from_millis(100));
        let periods = with_timeout(
            "free/busy query",
            Duration::from_secs(2),
            provider.query_free_busy(FreeBusyQuery::new(at(9, 0), at(10, 0))),
        )
        .await
        .unwrap();
        assert_eq!(periods.len(), 1);
    }
}
