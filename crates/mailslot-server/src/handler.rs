//! Request handler.
//!
//! Sits between the transport (HTTP or the one-shot CLI) and the
//! collaborators. Every outcome, failures included, comes back as a
//! [`Response`]; the handler never returns an error of its own.

use std::sync::Arc;

use tracing::{Span, debug, info, warn};

use mailslot_core::{EmailContent, MeetingEvent};
use mailslot_protocol::{ErrorCode, ErrorResponse, Response};
use mailslot_providers::{EventWriter, IntentExtractor, ProviderError, with_timeout};

use crate::orchestrator::{Scheduler, SchedulingError};

/// Dispatches the analyze and schedule operations.
#[derive(Clone)]
pub struct Handler {
    extractor: Arc<dyn IntentExtractor>,
    writer: Arc<dyn EventWriter>,
    scheduler: Arc<Scheduler>,
}

impl Handler {
    /// Creates a handler from explicitly constructed collaborators.
    pub fn new(
        extractor: Arc<dyn IntentExtractor>,
        writer: Arc<dyn EventWriter>,
        scheduler: Arc<Scheduler>,
    ) -> Self {
        Self {
            extractor,
            writer,
            scheduler,
        }
    }

    /// Analyzes an email and, for meeting requests, proposes slots.
    #[tracing::instrument(skip_all, fields(from = %email.from, status))]
    pub async fn analyze_email(&self, email: &EmailContent) -> Response {
        if email.content.trim().is_empty() && email.subject.trim().is_empty() {
            return record(Response::from_error(ErrorResponse::invalid_request(
                "email has neither subject nor content",
            )));
        }

        let timeout = self.scheduler.policy().call_timeout;
        let extraction = with_timeout("intent extraction", timeout, self.extractor.extract(email));
        let intent = match extraction.await {
            Ok(intent) => intent,
            Err(err) => {
                warn!(error = %err, "intent extraction failed");
                return record(upstream(ErrorCode::IntentExtractionFailed, &err));
            }
        };

        if !intent.is_meeting_request {
            debug!("email is not a meeting request");
            return record(Response::not_meeting_request());
        }

        let request = match intent.to_request(&email.from) {
            Ok(request) => request,
            Err(err) => {
                return record(Response::from_error(ErrorResponse::invalid_request(
                    err.to_string(),
                )));
            }
        };
        debug!(
            suggested_times = request.suggested_times.len(),
            duration = ?request.duration,
            "extracted meeting request"
        );

        let response = match self.scheduler.schedule(&request).await {
            Ok(result) => Response::analyzed(intent, result),
            Err(err) => scheduling_failure(err),
        };
        record(response)
    }

    /// Validates a confirmed slot and writes it to the calendar.
    #[tracing::instrument(skip_all, fields(summary = %event.summary, status))]
    pub async fn schedule_meeting(&self, event: &MeetingEvent) -> Response {
        if event.summary.trim().is_empty() {
            return record(Response::from_error(ErrorResponse::invalid_request(
                "summary is required",
            )));
        }
        if let Err(err) = event.validate() {
            return record(Response::from_error(ErrorResponse::invalid_request(
                err.to_string(),
            )));
        }

        let timeout = self.scheduler.policy().call_timeout;
        let creation = with_timeout("event creation", timeout, self.writer.create_event(event));
        let response = match creation.await {
            Ok(created) => {
                info!(event_id = %created.id, "meeting scheduled");
                Response::scheduled(created)
            }
            Err(err) => {
                warn!(error = %err, "event creation failed");
                upstream(ErrorCode::EventCreationFailed, &err)
            }
        };
        record(response)
    }
}

fn upstream(code: ErrorCode, err: &ProviderError) -> Response {
    Response::from_error(ErrorResponse::new(code, err.to_string()).with_retryable(err.is_retryable()))
}

fn scheduling_failure(err: SchedulingError) -> Response {
    let retryable = err.is_retryable();
    let error = match err {
        SchedulingError::CalendarUnavailable { source, .. } => {
            warn!(error = %source, "calendar unavailable");
            ErrorResponse::new(ErrorCode::CalendarUnavailable, source.to_string())
        }
        SchedulingError::InvalidRequest(err) => ErrorResponse::invalid_request(err.to_string()),
    };
    Response::from_error(error.with_retryable(retryable))
}

fn record(response: Response) -> Response {
    Span::current().record("status", tracing::field::debug(response.status()));
    response
}
