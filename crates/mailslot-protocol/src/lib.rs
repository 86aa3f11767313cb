//! Request and response payloads for the mailslot HTTP service.
//!
//! # Endpoints
//!
//! | method | path | body | response |
//! |---|---|---|---|
//! | `GET` | [`HEALTH_PATH`] | none | [`Health`] |
//! | `POST` | [`PROCESS_EMAIL_PATH`] | [`EmailContent`] | [`Response`] |
//! | `POST` | [`SCHEDULE_MEETING_PATH`] | [`MeetingEvent`] | [`Response`] |
//!
//! Every [`Response`] carries a tri-state `status` field: `not_meeting_request`,
//! `success` or `error`.
//!
//! ```rust
//! use mailslot_protocol::{ErrorCode, Response, ResponseStatus};
//!
//! let response = Response::error(ErrorCode::CalendarUnavailable, "calendar timed out");
//! assert_eq!(response.status(), ResponseStatus::Error);
//! ```

mod types;

pub use mailslot_core::{CreatedEvent, EmailContent, MeetingEvent, MeetingIntent, SchedulingResult};
pub use types::{ErrorCode, ErrorResponse, Health, Response, ResponseStatus};

/// Liveness probe.
pub const HEALTH_PATH: &str = "/health";

/// Analyze an email and propose slots.
pub const PROCESS_EMAIL_PATH: &str = "/process-email";

/// Commit a chosen slot as a calendar event.
pub const SCHEDULE_MEETING_PATH: &str = "/schedule-meeting";
