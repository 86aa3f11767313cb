//! Google Calendar provider implementation.
//!
//! Implements [`FreeBusyProvider`] and [`EventWriter`] on top of
//! [`GoogleCalendarClient`].

use chrono::{DateTime, Utc};
use mailslot_core::{BusyPeriod, CreatedEvent, MeetingEvent};
use tracing::{debug, info};

use super::client::{
    ConferenceCreateRequest, ConferenceData, ConferenceSolutionKey, EventAttendee, EventDateTime,
    EventResource, GoogleCalendarClient,
};
use super::config::GoogleConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::provider::{BoxFuture, EventWriter, FreeBusyProvider, FreeBusyQuery};

const PROVIDER_NAME: &str = "google";

/// Google Calendar provider.
pub struct GoogleProvider {
    config: GoogleConfig,
    client: GoogleCalendarClient,
}

impl GoogleProvider {
    /// Creates a provider from the given configuration.
    pub fn new(config: GoogleConfig) -> ProviderResult<Self> {
        config
            .validate()
            .map_err(|e| ProviderError::configuration(e).with_provider(PROVIDER_NAME))?;
        let client = GoogleCalendarClient::new(&config)?;
        Ok(Self { config, client })
    }

    pub fn calendar_id(&self) -> &str {
        &self.config.calendar_id
    }

    async fn query_impl(&self, query: FreeBusyQuery) -> ProviderResult<Vec<BusyPeriod>> {
        let calendar_id = query
            .calendar_id
            .as_deref()
            .unwrap_or(&self.config.calendar_id);
        debug!(
            calendar_id,
            time_min = %query.time_min,
            time_max = %query.time_max,
            "querying free/busy"
        );

        self.client
            .free_busy(calendar_id, query.time_min, query.time_max)
            .await
            .map_err(|e| e.with_provider(PROVIDER_NAME))
    }

    async fn create_impl(&self, event: &MeetingEvent) -> ProviderResult<CreatedEvent> {
        let interval = event
            .validate()
            .map_err(|e| ProviderError::bad_request(e.to_string()).with_provider(PROVIDER_NAME))?;
        let resource = event_resource(event, interval.start(), interval.end(), Utc::now());

        let created = self
            .client
            .insert_event(&self.config.calendar_id, &resource, self.config.send_updates)
            .await
            .map_err(|e| e.with_provider(PROVIDER_NAME))?;

        info!(event_id = %created.id, attendees = event.attendees.len(), "created calendar event");
        Ok(created)
    }
}

/// Builds the events.insert body. Times are sent in UTC.
fn event_resource(
    event: &MeetingEvent,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> EventResource {
    let conference_data = event.conferencing.then(|| ConferenceData {
        create_request: ConferenceCreateRequest {
            request_id: format!("meeting-{}", now.timestamp_millis()),
            conference_solution_key: ConferenceSolutionKey {
                kind: "hangoutsMeet",
            },
        },
    });

    EventResource {
        summary: event.summary.clone(),
        description: Some(event.description.clone()).filter(|d| !d.is_empty()),
        start: EventDateTime::utc(start),
        end: EventDateTime::utc(end),
        attendees: event
            .attendees
            .iter()
            .map(|email| EventAttendee {
                email: email.clone(),
            })
            .collect(),
        conference_data,
    }
}

impl FreeBusyProvider for GoogleProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn query_free_busy(&self, query: FreeBusyQuery) -> BoxFuture<'_, ProviderResult<Vec<BusyPeriod>>> {
        Box::pin(async move { self.query_impl(query).await })
    }
}

impl EventWriter for GoogleProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn create_event<'a>(&'a self, event: &'a MeetingEvent) -> BoxFuture<'a, ProviderResult<CreatedEvent>> {
        Box::pin(async move { self.create_impl(event).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use chrono::TimeZone;

    fn sample_event(conferencing: bool) -> MeetingEvent {
        MeetingEvent {
            summary: "Quarterly review".to_string(),
            description: String::new(),
            start_time: "2025-03-03T12:00:00+02:00".to_string(),
            end_time: "2025-03-03T13:00:00+02:00".to_string(),
            attendees: vec!["alice@example.com".to_string(), "bob@example.com".to_string()],
            conferencing,
        }
    }

    #[test]
    fn provider_creation() {
        let provider = GoogleProvider::new(GoogleConfig::new("ya29.token")).unwrap();
        assert_eq!(FreeBusyProvider::name(&provider), "google");
        assert_eq!(provider.calendar_id(), "primary");
    }

    #[test]
    fn provider_rejects_bad_config() {
        let err = GoogleProvider::new(GoogleConfig::new("")).err().unwrap();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);
        assert_eq!(err.provider(), Some("google"));
    }

    #[test]
    fn event_resource_in_utc_with_meet() {
        let event = sample_event(true);
        let interval = event.validate().unwrap();
        let now = Utc.timestamp_millis_opt(1_741_000_000_123).unwrap();

        let resource = event_resource(&event, interval.start(), interval.end(), now);

        assert_eq!(resource.start.date_time, "2025-03-03T10:00:00+00:00");
        assert_eq!(resource.end.date_time, "2025-03-03T11:00:00+00:00");
        assert_eq!(resource.start.time_zone, "UTC");
        assert_eq!(resource.attendees.len(), 2);
        assert!(resource.description.is_none());

        let conference = resource.conference_data.unwrap();
        assert_eq!(conference.create_request.request_id, "meeting-1741000000123");
        assert_eq!(conference.create_request.conference_solution_key.kind, "hangoutsMeet");
    }

    #[test]
    fn event_resource_without_conference() {
        let event = sample_event(false);
        let interval = event.validate().unwrap();
        let resource = event_resource(&event, interval.start(), interval.end(), Utc::now());
        assert!(resource.conference_data.is_none());
    }

    #[tokio::test]
    async fn invalid_event_rejected_before_any_call() {
        let provider = GoogleProvider::new(GoogleConfig::new("ya29.token")).unwrap();
        let mut event = sample_event(true);
        event.end_time = event.start_time.clone();

        let err = provider.create_event(&event).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::BadRequest);
    }
}
