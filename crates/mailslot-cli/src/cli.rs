//! Command-line interface definition.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// mailslot - Turn meeting emails into bookable slots
#[derive(Debug, Parser)]
#[command(name = "mailslot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "MAILSLOT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP service in the foreground
    Serve {
        /// Address to listen on (overrides `[server] bind`)
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// Port to listen on, keeping the configured host
        #[arg(long, env = "PORT")]
        port: Option<u16>,

        /// Emit logs as JSON lines
        #[arg(long)]
        json_logs: bool,
    },

    /// Analyze an email and print the proposed slots
    Analyze {
        /// Email JSON file (`{"from", "subject", "content"}`), or `-` for stdin
        email: PathBuf,
    },

    /// Create a calendar event for a chosen slot
    Schedule {
        /// Event JSON file (`{"summary", "startTime", "endTime", ...}`), or `-` for stdin
        event: PathBuf,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration, with plain-text secrets masked
    Dump,

    /// Validate configuration and resolve secret references
    Validate,

    /// Show configuration file path
    Path,
}
