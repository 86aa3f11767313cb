//! Google Calendar API client.
//!
//! Low-level HTTP calls for the two endpoints mailslot needs: `freeBusy`
//! and `events.insert`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use mailslot_core::{BusyPeriod, CreatedEvent};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::config::{GoogleConfig, SendUpdates};
use crate::error::{ProviderError, ProviderResult, from_reqwest};
use crate::http::read_success_body;

/// Google Calendar API client.
#[derive(Debug)]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    access_token: String,
    base_url: String,
}

impl GoogleCalendarClient {
    /// Creates a client from a validated configuration.
    pub fn new(config: &GoogleConfig) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| ProviderError::configuration("failed to create HTTP client").with_source(e))?;

        Ok(Self {
            http_client,
            access_token: config.access_token.clone(),
            base_url: config.api_base().to_string(),
        })
    }

    /// Queries busy periods of one calendar over `[time_min, time_max)`.
    pub async fn free_busy(
        &self,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> ProviderResult<Vec<BusyPeriod>> {
        let url = format!("{}/freeBusy", self.base_url);
        let body = FreeBusyRequest {
            time_min: time_min.to_rfc3339(),
            time_max: time_max.to_rfc3339(),
            items: vec![CalendarItem {
                id: calendar_id.to_string(),
            }],
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let body = read_success_body(response).await?;
        let parsed: FreeBusyResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse response: {}", e))
        })?;

        let periods = busy_periods(parsed, calendar_id)?;
        debug!(calendar_id, busy = periods.len(), "free/busy query answered");
        Ok(periods)
    }

    /// Inserts an event and returns its id and links.
    pub(crate) async fn insert_event(
        &self,
        calendar_id: &str,
        event: &EventResource,
        send_updates: SendUpdates,
    ) -> ProviderResult<CreatedEvent> {
        let url = format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(calendar_id)
        );

        let mut request = self
            .http_client
            .post(&url)
            .bearer_auth(&self.access_token)
            .query(&[("sendUpdates", send_updates.as_str())]);
        if event.conference_data.is_some() {
            request = request.query(&[("conferenceDataVersion", "1")]);
        }

        let response = request.json(event).send().await.map_err(from_reqwest)?;
        let body = read_success_body(response).await?;
        let created: ApiCreatedEvent = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse response: {}", e))
        })?;

        Ok(created.into())
    }
}

/// Extracts the busy periods of `calendar_id` from a freeBusy response.
///
/// Entries whose instants do not parse are skipped; inverted entries are
/// passed through for the normalizer to drop.
fn busy_periods(response: FreeBusyResponse, calendar_id: &str) -> ProviderResult<Vec<BusyPeriod>> {
    let mut calendars = response.calendars;
    let calendar = calendars.remove(calendar_id).ok_or_else(|| {
        ProviderError::invalid_response(format!("response has no entry for calendar {}", calendar_id))
    })?;

    if let Some(error) = calendar.errors.first() {
        let message = format!("calendar {}: {} ({})", calendar_id, error.reason, error.domain);
        return Err(match error.reason.as_str() {
            "notFound" => ProviderError::not_found(message),
            "backendError" | "internalError" => ProviderError::server(message),
            "rateLimitExceeded" | "userRateLimitExceeded" => ProviderError::rate_limited(message),
            _ => ProviderError::invalid_response(message),
        });
    }

    let received = calendar.busy.len();
    let periods: Vec<BusyPeriod> = calendar
        .busy
        .into_iter()
        .filter_map(|b| {
            let start = DateTime::parse_from_rfc3339(&b.start).ok()?;
            let end = DateTime::parse_from_rfc3339(&b.end).ok()?;
            Some(BusyPeriod::new(start.with_timezone(&Utc), end.with_timezone(&Utc)))
        })
        .collect();

    if periods.len() < received {
        warn!(
            calendar_id,
            skipped = received - periods.len(),
            "skipping busy periods with unparseable instants"
        );
    }

    Ok(periods)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FreeBusyRequest {
    time_min: String,
    time_max: String,
    items: Vec<CalendarItem>,
}

#[derive(Debug, Serialize)]
struct CalendarItem {
    id: String,
}

/// Response from the freeBusy endpoint.
#[derive(Debug, Deserialize)]
struct FreeBusyResponse {
    #[serde(default)]
    calendars: HashMap<String, FreeBusyCalendar>,
}

#[derive(Debug, Deserialize)]
struct FreeBusyCalendar {
    #[serde(default)]
    busy: Vec<ApiBusyPeriod>,
    #[serde(default)]
    errors: Vec<ApiCalendarError>,
}

#[derive(Debug, Deserialize)]
struct ApiBusyPeriod {
    start: String,
    end: String,
}

#[derive(Debug, Deserialize)]
struct ApiCalendarError {
    #[serde(default)]
    domain: String,
    reason: String,
}

/// Request body of events.insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventResource {
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start: EventDateTime,
    pub end: EventDateTime,
    pub attendees: Vec<EventAttendee>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conference_data: Option<ConferenceData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventDateTime {
    pub date_time: String,
    pub time_zone: &'static str,
}

impl EventDateTime {
    pub fn utc(dt: DateTime<Utc>) -> Self {
        Self {
            date_time: dt.to_rfc3339(),
            time_zone: "UTC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct EventAttendee {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConferenceData {
    pub create_request: ConferenceCreateRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConferenceCreateRequest {
    pub request_id: String,
    pub conference_solution_key: ConferenceSolutionKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ConferenceSolutionKey {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

/// The subset of the created event we hand back.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCreatedEvent {
    id: String,
    html_link: Option<String>,
    hangout_link: Option<String>,
    conference_data: Option<ApiConferenceData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiConferenceData {
    #[serde(default)]
    entry_points: Vec<ApiEntryPoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEntryPoint {
    entry_point_type: String,
    uri: Option<String>,
}

impl From<ApiCreatedEvent> for CreatedEvent {
    fn from(event: ApiCreatedEvent) -> Self {
        let video_entry = event.conference_data.and_then(|cd| {
            cd.entry_points
                .into_iter()
                .find(|ep| ep.entry_point_type == "video")
                .and_then(|ep| ep.uri)
        });

        CreatedEvent {
            id: event.id,
            html_link: event.html_link,
            conference_link: event.hangout_link.or(video_entry),
        }
    }
}
