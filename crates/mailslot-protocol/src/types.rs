//! Response types for the mailslot HTTP service.

use mailslot_core::{CreatedEvent, MeetingIntent, SchedulingResult};
use serde::{Deserialize, Serialize};

/// Message returned when the analyzed email is not asking for a meeting.
pub const NOT_MEETING_MESSAGE: &str = "This email does not appear to be a meeting request.";

/// Response body of the analyze and schedule endpoints.
///
/// The `status` field is the tag, so every body has the shape
/// `{"status": "...", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    /// The email was analyzed and is not a meeting request.
    NotMeetingRequest {
        /// Explanation for the caller.
        message: String,
    },

    /// The request succeeded.
    Success {
        /// Decoded meeting analysis (analyze endpoint).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        analysis: Option<MeetingIntent>,
        /// Proposed slots (analyze endpoint).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scheduling: Option<SchedulingResult>,
        /// The created calendar event (schedule endpoint).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        event: Option<CreatedEvent>,
    },

    /// The request failed.
    Error {
        #[serde(flatten)]
        error: ErrorResponse,
    },
}

impl Response {
    /// Creates a NotMeetingRequest response with the standard message.
    pub fn not_meeting_request() -> Self {
        Self::NotMeetingRequest {
            message: NOT_MEETING_MESSAGE.to_string(),
        }
    }

    /// Creates the success response of the analyze endpoint.
    pub fn analyzed(analysis: MeetingIntent, scheduling: SchedulingResult) -> Self {
        Self::Success {
            analysis: Some(analysis),
            scheduling: Some(scheduling),
            event: None,
        }
    }

    /// Creates the success response of the schedule endpoint.
    pub fn scheduled(event: CreatedEvent) -> Self {
        Self::Success {
            analysis: None,
            scheduling: None,
            event: Some(event),
        }
    }

    /// Creates an Error response.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            error: ErrorResponse::new(code, message),
        }
    }

    /// Creates an error response from an ErrorResponse.
    pub fn from_error(error: ErrorResponse) -> Self {
        Self::Error { error }
    }

    /// Returns the tri-state status.
    pub fn status(&self) -> ResponseStatus {
        match self {
            Self::NotMeetingRequest { .. } => ResponseStatus::NotMeetingRequest,
            Self::Success { .. } => ResponseStatus::Success,
            Self::Error { .. } => ResponseStatus::Error,
        }
    }

    /// Returns the error if this is an error response.
    pub fn as_error(&self) -> Option<&ErrorResponse> {
        match self {
            Self::Error { error } => Some(error),
            _ => None,
        }
    }
}

/// The `status` field of a [`Response`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    NotMeetingRequest,
    Success,
    Error,
}

/// Error codes carried by error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The language model call failed or returned something unusable.
    IntentExtractionFailed,

    /// The calendar could not be queried (failure or timeout).
    CalendarUnavailable,

    /// The request itself is invalid (bad duration, malformed instant, ...).
    InvalidRequest,

    /// The calendar rejected or failed to create the event.
    EventCreationFailed,

    /// Unknown or internal error.
    InternalError,
}

impl ErrorCode {
    /// Returns a human-readable description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::IntentExtractionFailed => "Could not analyze the email",
            Self::CalendarUnavailable => "Calendar is unavailable",
            Self::InvalidRequest => "The request was invalid",
            Self::EventCreationFailed => "Could not create the calendar event",
            Self::InternalError => "An internal error occurred",
        }
    }

    /// Returns true if the caller is at fault rather than a collaborator.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRequest)
    }

    /// Returns true if an upstream collaborator failed.
    pub fn is_upstream_error(&self) -> bool {
        matches!(
            self,
            Self::IntentExtractionFailed | Self::CalendarUnavailable | Self::EventCreationFailed
        )
    }
}

/// Error response details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// Whether retrying the same request may succeed.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub retryable: bool,
}

impl ErrorResponse {
    /// Creates a new, non-retryable error response.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retryable: false,
        }
    }

    /// Builder: mark the error as retryable.
    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Creates an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

impl std::error::Error for ErrorResponse {}

/// Body of the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
}

impl Health {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}
