//! Foreground HTTP service.

use std::net::SocketAddr;

use tracing::info;

use mailslot_server::SignalHandler;

use crate::config::AppConfig;
use crate::error::{CliError, CliResult};

/// Listener overrides from the command line.
#[derive(Debug, Default, Clone, Copy)]
pub struct ServeOverrides {
    pub bind: Option<SocketAddr>,
    pub port: Option<u16>,
}

/// Runs the service until SIGTERM or SIGINT.
pub async fn run(config: &AppConfig, overrides: ServeOverrides) -> CliResult<()> {
    let mut server_config = config.server.to_server_config().map_err(CliError::Config)?;
    if let Some(bind) = overrides.bind {
        server_config.bind = bind;
    }
    if let Some(port) = overrides.port {
        server_config = server_config.with_port(port);
    }

    let handler = super::build_handler(config)?;

    let signals = SignalHandler::new();
    signals.spawn_listener()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        bind = %server_config.bind,
        "starting mailslot"
    );
    mailslot_server::serve(server_config, handler, signals.shutdown()).await?;
    info!("mailslot stopped");
    Ok(())
}
