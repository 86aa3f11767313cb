//! HTTP surface of the service.

use std::any::Any;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response as HttpResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use mailslot_core::{EmailContent, MeetingEvent};
use mailslot_protocol::{
    ErrorResponse, HEALTH_PATH, Health, PROCESS_EMAIL_PATH, Response, SCHEDULE_MEETING_PATH,
};

use crate::handler::Handler;

/// Builds the router with every endpoint, CORS and request tracing.
///
/// A panicking handler answers 500 with an `internal_error` body.
pub fn router(handler: Handler) -> Router {
    layered(routes(), handler)
}

/// Like [`router`], with every request bounded by `timeout`.
///
/// A request that runs out of time answers 500 with a retryable
/// `internal_error` body.
pub fn router_with_timeout(handler: Handler, timeout: Duration) -> Router {
    let routes = routes().layer(middleware::from_fn_with_state(timeout, deadline));
    layered(routes, handler)
}

fn routes() -> Router<Handler> {
    Router::new()
        .route(HEALTH_PATH, get(health))
        .route(PROCESS_EMAIL_PATH, post(process_email))
        .route(SCHEDULE_MEETING_PATH, post(schedule_meeting))
}

fn layered(routes: Router<Handler>, handler: Handler) -> Router {
    routes
        .layer(CatchPanicLayer::custom(panicked))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(handler)
}

async fn health() -> Json<Health> {
    Json(Health::healthy())
}

async fn process_email(
    State(handler): State<Handler>,
    body: Result<Json<EmailContent>, JsonRejection>,
) -> HttpResponse {
    match body {
        Ok(Json(email)) => reply(handler.analyze_email(&email).await),
        Err(rejection) => rejected(rejection),
    }
}

async fn schedule_meeting(
    State(handler): State<Handler>,
    body: Result<Json<MeetingEvent>, JsonRejection>,
) -> HttpResponse {
    match body {
        Ok(Json(event)) => reply(handler.schedule_meeting(&event).await),
        Err(rejection) => rejected(rejection),
    }
}

/// Maps a response onto its HTTP status.
///
/// Client errors are 400, collaborator failures 502, anything else 500.
pub fn status_for(response: &Response) -> StatusCode {
    match response.as_error() {
        None => StatusCode::OK,
        Some(error) if error.code.is_client_error() => StatusCode::BAD_REQUEST,
        Some(error) if error.code.is_upstream_error() => StatusCode::BAD_GATEWAY,
        Some(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reply(response: Response) -> HttpResponse {
    (status_for(&response), Json(response)).into_response()
}

fn rejected(rejection: JsonRejection) -> HttpResponse {
    reply(Response::from_error(ErrorResponse::invalid_request(
        rejection.body_text(),
    )))
}

async fn deadline(State(timeout): State<Duration>, request: Request, next: Next) -> HttpResponse {
    match tokio::time::timeout(timeout, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            warn!(?timeout, "request timed out");
            reply(Response::from_error(
                ErrorResponse::internal("request timed out").with_retryable(true),
            ))
        }
    }
}

fn panicked(payload: Box<dyn Any + Send + 'static>) -> HttpResponse {
    let detail = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };
    error!(%detail, "request handler panicked");
    reply(Response::from_error(ErrorResponse::internal(
        "internal error while handling the request",
    )))
}
