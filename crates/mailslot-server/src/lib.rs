//! Scheduling service: orchestrator, request handler and HTTP server.
//!
//! This crate wires the collaborators from `mailslot-providers` into:
//! - a [`Scheduler`] that turns meeting requests into proposed slots
//! - a [`Handler`] that runs the analyze and schedule operations
//! - an axum [`router`] exposing them over HTTP
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use mailslot_providers::{ErrorProvider, ProviderError, StaticFreeBusy};
//! use mailslot_server::{Handler, Scheduler, SchedulingPolicy, ServerConfig, SignalHandler, serve};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let offline = Arc::new(ErrorProvider::new("offline", ProviderError::configuration("no model")));
//!     let scheduler = Scheduler::new(Arc::new(StaticFreeBusy::free()), SchedulingPolicy::default());
//!     let handler = Handler::new(offline.clone(), offline, Arc::new(scheduler));
//!
//!     let signals = SignalHandler::new();
//!     signals.spawn_listener()?;
//!     serve(ServerConfig::default(), handler, signals.shutdown()).await?;
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod handler;
mod http;
mod orchestrator;
mod signals;

use tokio::net::TcpListener;
use tracing::info;

pub use config::{DEFAULT_BIND, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use handler::Handler;
pub use http::{router, router_with_timeout, status_for};
pub use orchestrator::{
    CalendarFailurePolicy, Scheduler, SchedulingError, SchedulingPolicy, WindowFailurePolicy,
};
pub use signals::{ShutdownHandle, ShutdownSignal, SignalHandler};

/// Serves `handler` on `config.bind` until `shutdown` fires.
pub async fn serve(
    config: ServerConfig,
    handler: Handler,
    shutdown: ShutdownSignal,
) -> ServerResult<()> {
    if config.request_timeout.is_zero() {
        return Err(ServerError::config("request timeout must be positive"));
    }

    let listener = TcpListener::bind(config.bind)
        .await
        .map_err(|e| ServerError::bind(config.bind, e))?;
    let addr = listener.local_addr()?;

    let app = router_with_timeout(handler, config.request_timeout);

    info!(%addr, "mailslot listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.wait())
        .await?;
    info!("server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use mailslot_providers::{ErrorProvider, ProviderError, StaticFreeBusy};

    fn handler() -> Handler {
        let offline = Arc::new(ErrorProvider::new(
            "offline",
            ProviderError::configuration("not configured"),
        ));
        let scheduler = Scheduler::new(Arc::new(StaticFreeBusy::free()), SchedulingPolicy::default());
        Handler::new(offline.clone(), offline, Arc::new(scheduler))
    }

    #[tokio::test]
    async fn serve_stops_on_shutdown() {
        let signals = SignalHandler::new();
        signals.trigger_shutdown();

        let config = ServerConfig::new("127.0.0.1:0".parse().unwrap());
        let result = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            serve(config, handler(), signals.shutdown()),
        )
        .await;

        assert!(matches!(result, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn zero_request_timeout_rejected() {
        let config = ServerConfig::new("127.0.0.1:0".parse().unwrap())
            .with_request_timeout(std::time::Duration::ZERO);

        let err = serve(config, handler(), SignalHandler::new().shutdown())
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::Config { .. }));
    }

    #[tokio::test]
    async fn serve_reports_bind_failure() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = ServerConfig::new(taken.local_addr().unwrap());

        let err = serve(config, handler(), SignalHandler::new().shutdown())
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::Bind { .. }));
    }
}
