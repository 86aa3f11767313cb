//! CLI error types.

use std::fmt;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI.
#[derive(Debug)]
pub enum CliError {
    /// Configuration error.
    Config(String),
    /// A collaborator could not be constructed.
    Provider(String),
    /// IO error.
    Io(std::io::Error),
    /// Input file is not the expected JSON.
    Input(String),
    /// The server failed to start or stopped with an error.
    Server(mailslot_server::ServerError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Provider(msg) => write!(f, "provider error: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::Input(msg) => write!(f, "invalid input: {}", msg),
            Self::Server(err) => write!(f, "server error: {}", err),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Server(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<mailslot_server::ServerError> for CliError {
    fn from(err: mailslot_server::ServerError) -> Self {
        Self::Server(err)
    }
}

impl From<mailslot_providers::ProviderError> for CliError {
    fn from(err: mailslot_providers::ProviderError) -> Self {
        Self::Provider(err.to_string())
    }
}
