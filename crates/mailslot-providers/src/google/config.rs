//! Google Calendar provider configuration.

use std::time::Duration;

use url::Url;

/// Base URL for Google Calendar API v3.
pub const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Who Google notifies when an event is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SendUpdates {
    /// Email every attendee.
    #[default]
    All,
    /// Email attendees outside the calendar owner's domain.
    ExternalOnly,
    /// Send nothing.
    None,
}

impl SendUpdates {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::ExternalOnly => "externalOnly",
            Self::None => "none",
        }
    }

    /// Parses the config spelling (`all`, `external_only`, `none`).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "external_only" | "externalonly" => Some(Self::ExternalOnly),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

/// Configuration for the Google Calendar provider.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// OAuth bearer token with calendar scope.
    pub access_token: String,

    /// Calendar to query and write to. Defaults to `"primary"`.
    pub calendar_id: String,

    pub send_updates: SendUpdates,

    /// HTTP timeout for a single request.
    pub timeout: Duration,

    /// API base URL; overridable for proxies.
    pub base_url: String,

    pub user_agent: String,
}

impl GoogleConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    pub const DEFAULT_CALENDAR_ID: &'static str = "primary";

    /// Creates a new configuration with the given access token.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            calendar_id: Self::DEFAULT_CALENDAR_ID.to_string(),
            send_updates: SendUpdates::default(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            base_url: CALENDAR_API_BASE.to_string(),
            user_agent: format!("mailslot/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn with_calendar_id(mut self, id: impl Into<String>) -> Self {
        self.calendar_id = id.into();
        self
    }

    pub fn with_send_updates(mut self, send_updates: SendUpdates) -> Self {
        self.send_updates = send_updates;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.access_token.trim().is_empty() {
            return Err("access token is required".to_string());
        }
        if self.calendar_id.trim().is_empty() {
            return Err("calendar id must not be empty".to_string());
        }
        if self.timeout.is_zero() {
            return Err("timeout must be positive".to_string());
        }
        let url = Url::parse(&self.base_url).map_err(|e| format!("invalid base url: {}", e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!("base url must be http(s), got {}", url.scheme()));
        }
        Ok(())
    }

    /// Base URL without a trailing slash.
    pub(crate) fn api_base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
