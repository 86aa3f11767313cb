//! Subcommand implementations.

pub mod analyze;
pub mod config;
pub mod serve;

use std::sync::Arc;

use tracing::info;

use mailslot_providers::{EventWriter, FreeBusyProvider, IntentExtractor};
use mailslot_server::{Handler, Scheduler};

use crate::config::AppConfig;
use crate::error::{CliError, CliResult};

/// Builds the request handler and its collaborators from configuration.
///
/// Both the calendar and the chat model must be configured.
pub fn build_handler(config: &AppConfig) -> CliResult<Handler> {
    let policy = config.scheduling.to_policy().map_err(CliError::Config)?;
    let (calendar, writer) = build_calendar(config)?;
    let extractor = build_extractor(config)?;

    info!(
        calendar = calendar.name(),
        extractor = extractor.name(),
        "collaborators ready"
    );
    let scheduler = Scheduler::new(calendar, policy);
    Ok(Handler::new(extractor, writer, Arc::new(scheduler)))
}

#[cfg(feature = "google")]
fn build_calendar(
    config: &AppConfig,
) -> CliResult<(Arc<dyn FreeBusyProvider>, Arc<dyn EventWriter>)> {
    use mailslot_providers::google::GoogleProvider;

    let settings = config.google.as_ref().ok_or_else(|| {
        CliError::Config(format!(
            "no calendar configured; add a [google] section to {}",
            AppConfig::default_path().display()
        ))
    })?;
    let google_config = settings
        .to_provider_config()
        .map_err(|e| CliError::Config(format!("invalid Google configuration: {}", e)))?;
    let provider = Arc::new(GoogleProvider::new(google_config)?);
    Ok((provider.clone(), provider))
}

#[cfg(not(feature = "google"))]
fn build_calendar(
    _config: &AppConfig,
) -> CliResult<(Arc<dyn FreeBusyProvider>, Arc<dyn EventWriter>)> {
    Err(CliError::Config(
        "built without a calendar provider (enable the `google` feature)".to_string(),
    ))
}

#[cfg(feature = "openai")]
fn build_extractor(config: &AppConfig) -> CliResult<Arc<dyn IntentExtractor>> {
    use mailslot_providers::openai::OpenAiExtractor;

    let settings = config.openai.as_ref().ok_or_else(|| {
        CliError::Config(format!(
            "no chat model configured; add an [openai] section to {}",
            AppConfig::default_path().display()
        ))
    })?;
    let openai_config = settings
        .to_provider_config()
        .map_err(|e| CliError::Config(format!("invalid OpenAI configuration: {}", e)))?;
    Ok(Arc::new(OpenAiExtractor::new(openai_config)?))
}

#[cfg(not(feature = "openai"))]
fn build_extractor(_config: &AppConfig) -> CliResult<Arc<dyn IntentExtractor>> {
    Err(CliError::Config(
        "built without a chat model provider (enable the `openai` feature)".to_string(),
    ))
}

#[cfg(all(test, feature = "google", feature = "openai"))]
mod tests {
    use super::*;
    use crate::config::{GoogleSettings, OpenAiSettings};

    fn configured() -> AppConfig {
        AppConfig {
            google: Some(GoogleSettings {
                access_token: Some("ya29.test".to_string()),
                ..Default::default()
            }),
            openai: Some(OpenAiSettings {
                api_key: Some("sk-test".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn builds_from_full_config() {
        assert!(build_handler(&configured()).is_ok());
    }

    #[test]
    fn calendar_required() {
        let config = AppConfig {
            google: None,
            ..configured()
        };
        let err = build_handler(&config).err().unwrap();
        assert!(err.to_string().contains("[google]"));
    }

    #[test]
    fn chat_model_required() {
        let config = AppConfig {
            openai: None,
            ..configured()
        };
        let err = build_handler(&config).err().unwrap();
        assert!(err.to_string().contains("[openai]"));
    }

    #[test]
    fn bad_policy_reported_first() {
        let mut config = configured();
        config.scheduling.step_minutes = 0;
        let err = build_handler(&config).err().unwrap();
        assert!(matches!(err, CliError::Config(_)));
    }
}
