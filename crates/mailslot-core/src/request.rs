//! Request and result types exchanged with the scheduling core.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::slots::recommend;
use crate::time::{TimeError, TimeInterval};

/// Meeting length used when none (or a non-positive one) was requested and
/// the scheduler was not configured otherwise.
pub const DEFAULT_DURATION_MINUTES: u32 = 30;

/// Longest meeting the scheduler will look for.
pub const MAX_DURATION_MINUTES: u32 = 24 * 60;

/// Naive formats accepted for instants without an offset; read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Errors for requests that cannot be scheduled as given.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// A time string could not be parsed.
    #[error("invalid instant {value:?}: expected an ISO-8601 date-time")]
    InvalidInstant { value: String },

    /// The requested duration is longer than the scheduler supports.
    #[error("duration of {minutes} minutes is longer than one day")]
    DurationTooLong { minutes: i64 },

    /// Start and end do not form a valid interval.
    #[error(transparent)]
    Interval(#[from] TimeError),

    /// An attendee is not an email address.
    #[error("invalid attendee address {0:?}")]
    InvalidAttendee(String),
}

/// Parses an ISO-8601 instant into UTC.
///
/// Values with an offset are converted; values without one are read as UTC.
pub fn parse_instant(value: &str) -> Result<DateTime<Utc>, RequestError> {
    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| RequestError::InvalidInstant {
            value: value.to_string(),
        })
}

/// Resolves a requested duration, applying `default` for absent or
/// non-positive values.
pub fn resolve_duration(requested: Option<i64>, default: u32) -> Result<u32, RequestError> {
    match requested {
        Some(minutes) if minutes > i64::from(MAX_DURATION_MINUTES) => {
            Err(RequestError::DurationTooLong { minutes })
        }
        Some(minutes) if minutes > 0 => Ok(minutes as u32),
        _ => Ok(default),
    }
}

/// The raw email handed to the analyzer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailContent {
    /// Sender address.
    #[serde(default)]
    pub from: String,
    /// Subject line.
    #[serde(default)]
    pub subject: String,
    /// Message body.
    pub content: String,
    /// When the email was sent, as provided by the mail system.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Mail thread identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

/// A request to find meeting slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingRequest {
    /// Who asked for the meeting.
    pub requested_by: String,
    /// Times proposed in the email, in the order they were proposed.
    #[serde(default)]
    pub suggested_times: Vec<DateTime<Utc>>,
    /// Meeting length in minutes. `None` leaves the choice to the scheduler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    /// Meeting subject, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

impl MeetingRequest {
    /// Creates a request with no suggested times and no duration.
    pub fn new(requested_by: impl Into<String>) -> Self {
        Self {
            requested_by: requested_by.into(),
            suggested_times: Vec::new(),
            duration: None,
            subject: None,
        }
    }

    /// Builder: set the suggested times.
    pub fn with_suggested_times(mut self, times: Vec<DateTime<Utc>>) -> Self {
        self.suggested_times = times;
        self
    }

    /// Builder: set the duration. Absent or non-positive values clear it.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::DurationTooLong`] past one day.
    pub fn with_duration(mut self, minutes: Option<i64>) -> Result<Self, RequestError> {
        self.duration = match minutes {
            Some(m) if m > 0 => Some(resolve_duration(Some(m), DEFAULT_DURATION_MINUTES)?),
            _ => None,
        };
        Ok(self)
    }

    /// Builder: set the subject.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }
}

/// The outcome of a scheduling run.
///
/// An empty `available_slots` with no recommendation is a valid answer, not
/// a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingResult {
    /// Starts of every bookable slot, in window order.
    pub available_slots: Vec<DateTime<Utc>>,
    /// The earliest available slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_slot: Option<DateTime<Utc>>,
    /// Meeting length in minutes.
    pub duration: u32,
    /// Set when some windows could not be checked against the calendar.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub partial_failure: bool,
}

impl SchedulingResult {
    /// Builds a result from the available slots, picking the recommendation.
    pub fn from_slots(available_slots: Vec<DateTime<Utc>>, duration: u32) -> Self {
        Self {
            recommended_slot: recommend(&available_slots),
            available_slots,
            duration,
            partial_failure: false,
        }
    }

    /// Builder: flag the result as partial.
    pub fn with_partial_failure(mut self, partial: bool) -> Self {
        self.partial_failure = partial;
        self
    }

    /// Returns `true` if at least one slot is free.
    pub fn has_availability(&self) -> bool {
        !self.available_slots.is_empty()
    }
}

fn default_true() -> bool {
    true
}

/// A confirmed meeting to be written to the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingEvent {
    /// Event title.
    pub summary: String,
    /// Event body.
    #[serde(default)]
    pub description: String,
    /// Start instant (ISO-8601).
    pub start_time: String,
    /// End instant (ISO-8601).
    pub end_time: String,
    /// Attendee email addresses.
    #[serde(default)]
    pub attendees: Vec<String>,
    /// Whether to attach a video conference.
    #[serde(default = "default_true")]
    pub conferencing: bool,
}

impl MeetingEvent {
    /// Validates the event and returns its interval.
    ///
    /// # Errors
    ///
    /// Fails on unparseable instants, an empty or inverted interval, or an
    /// attendee that is not an email address.
    pub fn validate(&self) -> Result<TimeInterval, RequestError> {
        let start = parse_instant(&self.start_time)?;
        let end = parse_instant(&self.end_time)?;
        let interval = TimeInterval::new(start, end)?;

        if let Some(bad) = self.attendees.iter().find(|a| !is_email(a)) {
            return Err(RequestError::InvalidAttendee(bad.clone()));
        }

        Ok(interval)
    }
}

fn is_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !value.contains(' '),
        None => false,
    }
}

/// An event that was created in the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEvent {
    /// Provider event identifier.
    pub id: String,
    /// Link to the event in the calendar UI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
    /// Video conference link, if one was attached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conference_link: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 3, h, m, 0).unwrap()
    }

    mod instants {
        use super::*;

        #[test]
        fn rfc3339_with_offset_normalized() {
            assert_eq!(parse_instant("2025-03-03T11:00:00+02:00").unwrap(), at(9, 0));
            assert_eq!(parse_instant("2025-03-03T09:00:00Z").unwrap(), at(9, 0));
            assert_eq!(parse_instant("2025-03-03T09:00:00.000Z").unwrap(), at(9, 0));
        }

        #[test]
        fn naive_read_as_utc() {
            assert_eq!(parse_instant("2025-03-03T09:00:00").unwrap(), at(9, 0));
            assert_eq!(parse_instant("2025-03-03T09:00").unwrap(), at(9, 0));
            assert_eq!(parse_instant(" 2025-03-03 09:00 ").unwrap(), at(9, 0));
        }

        #[test]
        fn garbage_rejected() {
            let err = parse_instant("next tuesday").unwrap_err();
            assert_eq!(
                err,
                RequestError::InvalidInstant {
                    value: "next tuesday".to_string()
                }
            );
        }
    }

    mod duration {
        use super::*;

        #[test]
        fn defaults() {
            assert_eq!(resolve_duration(None, 30).unwrap(), 30);
            assert_eq!(resolve_duration(Some(0), 30).unwrap(), 30);
            assert_eq!(resolve_duration(Some(-15), 45).unwrap(), 45);
            assert_eq!(resolve_duration(Some(45), 30).unwrap(), 45);
        }

        #[test]
        fn too_long_rejected() {
            assert!(matches!(
                resolve_duration(Some(2000), 30),
                Err(RequestError::DurationTooLong { minutes: 2000 })
            ));
            assert_eq!(resolve_duration(Some(1440), 30).unwrap(), 1440);
        }

        #[test]
        fn request_builder() {
            let req = MeetingRequest::new("a@example.com")
                .with_duration(Some(-1))
                .unwrap()
                .with_subject("Sync");
            assert_eq!(req.duration, None);
            assert!(req.suggested_times.is_empty());
            assert_eq!(req.subject.as_deref(), Some("Sync"));
        }
    }

    mod result {
        use super::*;

        #[test]
        fn recommendation_is_first_slot() {
            let result = SchedulingResult::from_slots(vec![at(10, 0), at(10, 30)], 30);
            assert_eq!(result.recommended_slot, Some(at(10, 0)));
            assert!(result.has_availability());
        }

        #[test]
        fn empty_has_no_recommendation() {
            let result = SchedulingResult::from_slots(vec![], 30);
            assert_eq!(result.recommended_slot, None);
            assert!(!result.has_availability());
        }

        #[test]
        fn wire_shape() {
            let result = SchedulingResult::from_slots(vec![at(10, 0)], 30);
            let json = serde_json::to_value(&result).unwrap();
            assert_eq!(
                json,
                serde_json::json!({
                    "availableSlots": ["2025-03-03T10:00:00Z"],
                    "recommendedSlot": "2025-03-03T10:00:00Z",
                    "duration": 30
                })
            );

            let partial = SchedulingResult::from_slots(vec![], 30).with_partial_failure(true);
            let empty = serde_json::to_value(&partial).unwrap();
            assert_eq!(
                empty,
                serde_json::json!({"availableSlots": [], "duration": 30, "partialFailure": true})
            );
        }
    }

    mod event {
        use super::*;

        fn event() -> MeetingEvent {
            serde_json::from_value(serde_json::json!({
                "summary": "Project sync",
                "startTime": "2025-03-03T10:00:00Z",
                "endTime": "2025-03-03T10:30:00Z",
                "attendees": ["a@example.com"]
            }))
            .unwrap()
        }

        #[test]
        fn defaults_from_json() {
            let e = event();
            assert!(e.conferencing);
            assert_eq!(e.description, "");
        }

        #[test]
        fn validate_ok() {
            let interval = event().validate().unwrap();
            assert_eq!(interval.start(), at(10, 0));
            assert_eq!(interval.end(), at(10, 30));
        }

        #[test]
        fn inverted_interval_rejected() {
            let mut e = event();
            e.end_time = "2025-03-03T09:00:00Z".to_string();
            assert!(matches!(e.validate(), Err(RequestError::Interval(_))));
        }

        #[test]
        fn bad_attendee_rejected() {
            let mut e = event();
            e.attendees.push("not an email".to_string());
            assert_eq!(
                e.validate(),
                Err(RequestError::InvalidAttendee("not an email".to_string()))
            );
        }
    }
}
