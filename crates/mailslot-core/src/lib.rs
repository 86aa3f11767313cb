//! Core scheduling types: intervals, busy sets, slot generation and
//! availability, plus the request and result shapes shared by every crate.

pub mod busy;
pub mod intent;
pub mod request;
pub mod slots;
pub mod time;
pub mod tracing;

pub use busy::{BusyPeriod, NormalizedBusySet};
pub use intent::{IntentError, MeetingIntent};
pub use request::{
    CreatedEvent, DEFAULT_DURATION_MINUTES, EmailContent, MAX_DURATION_MINUTES, MeetingEvent,
    MeetingRequest, RequestError, SchedulingResult, parse_instant, resolve_duration,
};
pub use slots::{
    SlotCandidate, SlotGenerator, Slots, available_slots, is_available, is_available_linear,
    recommend,
};
pub use time::{
    DEFAULT_STEP_MINUTES, Lookahead, SearchWindow, TimeError, TimeInterval, add_business_days,
    align_up,
};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
