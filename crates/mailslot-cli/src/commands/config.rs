//! Configuration commands.

use crate::config::AppConfig;
use crate::error::{CliError, CliResult};

/// Dump the current configuration to stdout, with plain-text secrets masked.
pub fn dump(config: &AppConfig) -> CliResult<()> {
    let toml_str = toml::to_string_pretty(&config.redacted())
        .map_err(|e| CliError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", AppConfig::default_path().display());
    println!("{}", toml_str);

    Ok(())
}

/// Validate the configuration.
///
/// Secret references are resolved, so a missing environment variable or
/// `pass` entry fails here rather than on the first request.
pub fn validate(config: &AppConfig) -> CliResult<()> {
    config.server.to_server_config().map_err(CliError::Config)?;
    config.scheduling.to_policy().map_err(CliError::Config)?;

    #[cfg(feature = "google")]
    if let Some(ref google) = config.google {
        google
            .to_provider_config()
            .map_err(|e| CliError::Config(format!("invalid Google configuration: {}", e)))?;
        println!("Google Calendar settings are valid.");
    }

    #[cfg(feature = "openai")]
    if let Some(ref openai) = config.openai {
        openai
            .to_provider_config()
            .map_err(|e| CliError::Config(format!("invalid OpenAI configuration: {}", e)))?;
        println!("OpenAI settings are valid.");
    }

    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path() -> CliResult<()> {
    println!("config: {}", AppConfig::default_path().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(validate(&AppConfig::default()).is_ok());
    }

    #[test]
    fn bad_bind_fails_validation() {
        let mut config = AppConfig::default();
        config.server.bind = "not an address".to_string();
        assert!(matches!(validate(&config), Err(CliError::Config(_))));
    }

    #[test]
    fn bad_policy_fails_validation() {
        let mut config = AppConfig::default();
        config.scheduling.default_duration_minutes = 0;
        assert!(validate(&config).is_err());
    }
}
