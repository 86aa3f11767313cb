//! Application configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/mailslot/config.toml` by default. Every section is optional.
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:3001"
//!
//! [scheduling]
//! lookahead = { kind = "business_days", days = 5 }
//! on_calendar_failure = "fail_closed"
//!
//! [google]
//! access_token = "pass::work/google-calendar"
//!
//! [openai]
//! api_key = "env::OPENAI_API_KEY"
//! ```
//!
//! Credential values (`access_token`, `api_key`) accept secret references,
//! see [`crate::secret`].

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use mailslot_core::{
    DEFAULT_DURATION_MINUTES, DEFAULT_STEP_MINUTES, Lookahead, MAX_DURATION_MINUTES,
};
use mailslot_server::{
    CalendarFailurePolicy, DEFAULT_BIND, SchedulingPolicy, ServerConfig, WindowFailurePolicy,
};

use crate::secret;

/// Configuration for the mailslot binary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Debug mode.
    pub debug: bool,

    pub server: ServerSettings,

    pub scheduling: SchedulingSettings,

    /// Google Calendar settings.
    #[cfg(feature = "google")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google: Option<GoogleSettings>,

    /// Chat model settings.
    #[cfg(feature = "openai")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai: Option<OpenAiSettings>,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Listen address.
    pub bind: String,

    /// Whole-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            request_timeout_secs: 60,
        }
    }
}

impl ServerSettings {
    /// Converts to the server's configuration.
    pub fn to_server_config(&self) -> Result<ServerConfig, String> {
        let bind: SocketAddr = self
            .bind
            .parse()
            .map_err(|e| format!("invalid [server] bind {:?}: {}", self.bind, e))?;
        if self.request_timeout_secs == 0 {
            return Err("[server] request_timeout_secs must be positive".to_string());
        }
        let timeout = Duration::from_secs(self.request_timeout_secs);
        Ok(ServerConfig::new(bind).with_request_timeout(timeout))
    }
}

/// Slot search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingSettings {
    /// Minutes between candidate starts.
    pub step_minutes: u32,

    /// Meeting length when the email does not state one.
    pub default_duration_minutes: u32,

    pub on_calendar_failure: CalendarFailurePolicy,

    pub on_window_failure: WindowFailurePolicy,

    /// Free/busy queries in flight at once; 1 is sequential.
    pub concurrent_queries: usize,

    /// Deadline for each calendar or model call, in seconds.
    pub call_timeout_secs: u64,

    /// Search range for emails without suggested times.
    pub lookahead: Lookahead,
}

impl Default for SchedulingSettings {
    fn default() -> Self {
        Self {
            step_minutes: DEFAULT_STEP_MINUTES,
            default_duration_minutes: DEFAULT_DURATION_MINUTES,
            on_calendar_failure: CalendarFailurePolicy::default(),
            on_window_failure: WindowFailurePolicy::default(),
            concurrent_queries: 1,
            call_timeout_secs: 10,
            lookahead: Lookahead::default(),
        }
    }
}

impl SchedulingSettings {
    /// Converts to the orchestrator's policy.
    pub fn to_policy(&self) -> Result<SchedulingPolicy, String> {
        if self.step_minutes == 0 {
            return Err("[scheduling] step_minutes must be positive".to_string());
        }
        if !(1..=MAX_DURATION_MINUTES).contains(&self.default_duration_minutes) {
            return Err(format!(
                "[scheduling] default_duration_minutes must be between 1 and {}",
                MAX_DURATION_MINUTES
            ));
        }
        if self.concurrent_queries == 0 {
            return Err("[scheduling] concurrent_queries must be at least 1".to_string());
        }
        if self.call_timeout_secs == 0 {
            return Err("[scheduling] call_timeout_secs must be positive".to_string());
        }

        Ok(SchedulingPolicy::default()
            .with_step_minutes(self.step_minutes)
            .with_default_duration(self.default_duration_minutes)
            .with_lookahead(self.lookahead)
            .with_calendar_failure(self.on_calendar_failure)
            .with_window_failure(self.on_window_failure)
            .with_concurrent_queries(self.concurrent_queries)
            .with_call_timeout(Duration::from_secs(self.call_timeout_secs)))
    }
}

impl AppConfig {
    /// Loads configuration from the default path, or defaults if it does not exist.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse {}: {}", path.display(), e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mailslot")
            .join("config.toml")
    }

    /// Returns a copy with plain-text credentials masked.
    pub fn redacted(&self) -> Self {
        #[allow(unused_mut)]
        let mut config = self.clone();
        #[cfg(feature = "google")]
        if let Some(google) = config.google.as_mut() {
            google.access_token = google.access_token.as_deref().map(secret::redact);
        }
        #[cfg(feature = "openai")]
        if let Some(openai) = config.openai.as_mut() {
            openai.api_key = openai.api_key.as_deref().map(secret::redact);
        }
        config
    }
}

// ---------------------------------------------------------------------------
// GoogleSettings
// ---------------------------------------------------------------------------

/// Google Calendar settings.
#[cfg(feature = "google")]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    /// OAuth bearer token with calendar scope (supports `pass::` and `env::`).
    pub access_token: Option<String>,

    /// Calendar queried for free/busy and written to.
    pub calendar_id: String,

    /// `all`, `external_only` or `none`.
    pub send_updates: String,

    /// HTTP timeout in seconds.
    pub timeout_secs: u64,

    /// API base URL override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

#[cfg(feature = "google")]
impl Default for GoogleSettings {
    fn default() -> Self {
        use mailslot_providers::google::GoogleConfig;

        Self {
            access_token: None,
            calendar_id: GoogleConfig::DEFAULT_CALENDAR_ID.to_string(),
            send_updates: "all".to_string(),
            timeout_secs: GoogleConfig::DEFAULT_TIMEOUT_SECS,
            base_url: None,
        }
    }
}

#[cfg(feature = "google")]
impl GoogleSettings {
    /// Converts to provider configuration, resolving the access token.
    pub fn to_provider_config(&self) -> Result<mailslot_providers::google::GoogleConfig, String> {
        use mailslot_providers::google::{GoogleConfig, SendUpdates};

        let raw = self.access_token.as_deref().ok_or_else(|| {
            format!(
                "Google access token not found. Add to {}:\n  \
                 [google]\n  \
                 access_token = \"env::GOOGLE_ACCESS_TOKEN\"",
                AppConfig::default_path().display()
            )
        })?;
        let token =
            secret::resolve(raw).map_err(|e| format!("failed to resolve access_token: {}", e))?;
        let send_updates = SendUpdates::parse(&self.send_updates).ok_or_else(|| {
            format!(
                "invalid send_updates {:?}: expected all, external_only or none",
                self.send_updates
            )
        })?;

        let mut config = GoogleConfig::new(token)
            .with_calendar_id(&self.calendar_id)
            .with_send_updates(send_updates)
            .with_timeout(Duration::from_secs(self.timeout_secs));
        if let Some(ref base_url) = self.base_url {
            config = config.with_base_url(base_url);
        }
        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// OpenAiSettings
// ---------------------------------------------------------------------------

/// OpenAI-compatible chat model settings.
#[cfg(feature = "openai")]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    /// API key (supports `pass::` and `env::`).
    pub api_key: Option<String>,

    /// Endpoint base URL, for compatible servers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Model name; must support JSON output mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// HTTP timeout in seconds.
    pub timeout_secs: u64,
}

#[cfg(feature = "openai")]
impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: None,
            timeout_secs: mailslot_providers::openai::OpenAiConfig::DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[cfg(feature = "openai")]
impl OpenAiSettings {
    /// Converts to provider configuration, resolving the API key.
    pub fn to_provider_config(&self) -> Result<mailslot_providers::openai::OpenAiConfig, String> {
        use mailslot_providers::openai::OpenAiConfig;

        let raw = self
            .api_key
            .as_deref()
            .ok_or_else(|| "api_key is missing from [openai] section in config.toml".to_string())?;
        let key = secret::resolve(raw).map_err(|e| format!("failed to resolve api_key: {}", e))?;

        let mut config = OpenAiConfig::new(key).with_timeout(Duration::from_secs(self.timeout_secs));
        if let Some(ref base_url) = self.base_url {
            config = config.with_base_url(base_url);
        }
        if let Some(ref model) = self.model {
            config = config.with_model(model);
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = AppConfig::default();
        let server = config.server.to_server_config().unwrap();
        assert_eq!(server.bind.to_string(), "127.0.0.1:3001");

        let policy = config.scheduling.to_policy().unwrap();
        assert_eq!(policy, SchedulingPolicy::default());
        assert_eq!(policy.lookahead, Lookahead::CalendarDays { days: 7 });
        assert_eq!(policy.on_calendar_failure, CalendarFailurePolicy::FailClosed);
    }

    #[test]
    fn empty_file_is_default() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.scheduling.step_minutes, 30);
        assert_eq!(config.server.bind, DEFAULT_BIND);
    }

    #[test]
    fn scheduling_section() {
        let config: AppConfig = toml::from_str(
            r#"
[scheduling]
default_duration_minutes = 45
lookahead = { kind = "business_days", days = 5 }
on_calendar_failure = "assume_free"
on_window_failure = "skip"
concurrent_queries = 4
call_timeout_secs = 3
"#,
        )
        .unwrap();

        let policy = config.scheduling.to_policy().unwrap();
        assert_eq!(policy.default_duration, 45);
        assert_eq!(policy.lookahead, Lookahead::BusinessDays { days: 5 });
        assert_eq!(policy.on_calendar_failure, CalendarFailurePolicy::AssumeFree);
        assert_eq!(policy.on_window_failure, WindowFailurePolicy::Skip);
        assert_eq!(policy.concurrent_queries, 4);
        assert_eq!(policy.call_timeout, Duration::from_secs(3));
    }

    #[test]
    fn invalid_scheduling_values() {
        let mut settings = SchedulingSettings {
            step_minutes: 0,
            ..Default::default()
        };
        assert!(settings.to_policy().is_err());

        settings.step_minutes = 30;
        settings.default_duration_minutes = 2000;
        assert!(settings.to_policy().is_err());

        settings.default_duration_minutes = 30;
        settings.concurrent_queries = 0;
        assert!(settings.to_policy().is_err());
    }

    #[test]
    fn unknown_policy_rejected() {
        let result: Result<AppConfig, _> =
            toml::from_str("[scheduling]\non_calendar_failure = \"fail_open\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn invalid_bind() {
        let settings = ServerSettings {
            bind: "localhost".to_string(),
            ..Default::default()
        };
        assert!(settings.to_server_config().is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nbind = \"0.0.0.0:8080\"\nrequest_timeout_secs = 5").unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        let server = config.server.to_server_config().unwrap();
        assert_eq!(server.bind.port(), 8080);
        assert_eq!(server.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn load_from_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.contains("failed to read"));
    }

    #[test]
    fn load_from_malformed_file_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nbind = ").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(err.contains("failed to parse"));
    }

    #[test]
    fn default_path_under_mailslot() {
        let path = AppConfig::default_path();
        assert!(path.ends_with("mailslot/config.toml"));
    }

    #[cfg(feature = "google")]
    mod google {
        use super::*;

        #[test]
        fn plain_token() {
            let config: AppConfig = toml::from_str(
                r#"
[google]
access_token = "ya29.plain"
calendar_id = "team@example.com"
send_updates = "external_only"
"#,
            )
            .unwrap();
            let google = config.google.unwrap().to_provider_config().unwrap();
            assert_eq!(google.access_token, "ya29.plain");
            assert_eq!(google.calendar_id, "team@example.com");
            assert_eq!(
                google.send_updates,
                mailslot_providers::google::SendUpdates::ExternalOnly
            );
        }

        #[test]
        fn env_token() {
            unsafe {
                std::env::set_var("_MAILSLOT_CFG_GOOGLE_TOKEN", "ya29.env");
            }
            let settings = GoogleSettings {
                access_token: Some("env::_MAILSLOT_CFG_GOOGLE_TOKEN".to_string()),
                ..Default::default()
            };
            assert_eq!(settings.to_provider_config().unwrap().access_token, "ya29.env");
            unsafe {
                std::env::remove_var("_MAILSLOT_CFG_GOOGLE_TOKEN");
            }
        }

        #[test]
        fn missing_token() {
            let config: AppConfig = toml::from_str("[google]\n").unwrap();
            let err = config.google.unwrap().to_provider_config().unwrap_err();
            assert!(err.contains("access token not found"));
        }

        #[test]
        fn bad_send_updates() {
            let settings = GoogleSettings {
                access_token: Some("t".to_string()),
                send_updates: "everyone".to_string(),
                ..Default::default()
            };
            assert!(settings.to_provider_config().is_err());
        }

        #[test]
        fn dump_masks_plain_token() {
            let config = AppConfig {
                google: Some(GoogleSettings {
                    access_token: Some("ya29.secret".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            };
            let dumped = toml::to_string_pretty(&config.redacted()).unwrap();
            assert!(!dumped.contains("ya29.secret"));
            assert!(dumped.contains("********"));
        }
    }

    #[cfg(feature = "openai")]
    mod openai {
        use super::*;

        #[test]
        fn model_and_base_url() {
            let config: AppConfig = toml::from_str(
                r#"
[openai]
api_key = "sk-test"
base_url = "http://localhost:11434/v1"
model = "llama3.1"
"#,
            )
            .unwrap();
            let openai = config.openai.unwrap().to_provider_config().unwrap();
            assert_eq!(openai.model, "llama3.1");
            assert_eq!(openai.base_url, "http://localhost:11434/v1");
        }

        #[test]
        fn missing_key() {
            let err = OpenAiSettings::default().to_provider_config().unwrap_err();
            assert!(err.contains("api_key"));
        }

        #[test]
        fn reference_survives_redaction() {
            let config = AppConfig {
                openai: Some(OpenAiSettings {
                    api_key: Some("env::OPENAI_API_KEY".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            };
            let dumped = toml::to_string_pretty(&config.redacted()).unwrap();
            assert!(dumped.contains("env::OPENAI_API_KEY"));
        }
    }
}
