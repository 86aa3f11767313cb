//! Command-line front end for the mailslot service.
//!
//! Loads `config.toml`, wires the calendar and chat-model providers into the
//! request handler, and either serves HTTP or runs a single request.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod secret;

pub use cli::Cli;
pub use config::AppConfig;
pub use error::{CliError, CliResult};
