//! Meeting intent extraction through a chat model.

use chrono::{DateTime, SecondsFormat, Utc};
use mailslot_core::{EmailContent, MeetingIntent};
use tracing::{debug, warn};

use super::client::OpenAiClient;
use super::config::OpenAiConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::provider::{BoxFuture, IntentExtractor};

const PROVIDER_NAME: &str = "openai";

const SYSTEM_PROMPT: &str =
    "You read emails and extract meeting requests. Reply with a single JSON object and nothing else.";

/// [`IntentExtractor`] backed by an OpenAI-compatible chat model.
pub struct OpenAiExtractor {
    client: OpenAiClient,
}

impl OpenAiExtractor {
    pub fn new(config: OpenAiConfig) -> ProviderResult<Self> {
        config
            .validate()
            .map_err(|e| ProviderError::configuration(e).with_provider(PROVIDER_NAME))?;
        let client = OpenAiClient::new(&config)?;
        Ok(Self { client })
    }

    async fn extract_impl(&self, email: &EmailContent) -> ProviderResult<MeetingIntent> {
        let prompt = build_prompt(email, Utc::now());
        let raw = self
            .client
            .complete_json(SYSTEM_PROMPT, &prompt)
            .await
            .map_err(|e| e.with_provider(PROVIDER_NAME))?;

        let intent = MeetingIntent::from_json(&raw).map_err(|e| {
            warn!(error = %e, "model returned unusable analysis");
            ProviderError::invalid_response(e.to_string())
                .with_provider(PROVIDER_NAME)
                .with_source(e)
        })?;

        debug!(
            is_meeting_request = intent.is_meeting_request,
            suggested = intent.suggested_times.len(),
            "email analyzed"
        );
        Ok(intent)
    }
}

/// Builds the user prompt. `now` anchors relative dates ("tomorrow at 3").
pub fn build_prompt(email: &EmailContent, now: DateTime<Utc>) -> String {
    format!(
        r#"Analyze this email and determine if it is a meeting request. If it is, extract the key information.

The current time is {now} (UTC). Resolve relative dates against it and write every time as an ISO-8601 instant in UTC.

From: {from}
Subject: {subject}

{content}

Return JSON:
{{
  "isMeetingRequest": boolean,
  "requestedBy": "email address" or null,
  "suggestedTimes": ["ISO-8601 instant", ...] or null,
  "duration": number (in minutes) or null,
  "subject": "meeting subject" or null
}}"#,
        now = now.to_rfc3339_opts(SecondsFormat::Secs, true),
        from = email.from,
        subject = email.subject,
        content = email.content,
    )
}

impl IntentExtractor for OpenAiExtractor {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn extract<'a>(&'a self, email: &'a EmailContent) -> BoxFuture<'a, ProviderResult<MeetingIntent>> {
        Box::pin(async move { self.extract_impl(email).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use chrono::TimeZone;

    #[test]
    fn prompt_carries_email_and_clock() {
        let email = EmailContent {
            from: "alice@example.com".to_string(),
            subject: "Catch up?".to_string(),
            content: "Are you free tomorrow at 3pm for 45 minutes?".to_string(),
            ..Default::default()
        };
        let now = Utc.with_ymd_and_hms(2025, 3, 3, 8, 15, 0).unwrap();

        let prompt = build_prompt(&email, now);

        assert!(prompt.contains("The current time is 2025-03-03T08:15:00Z"));
        assert!(prompt.contains("From: alice@example.com"));
        assert!(prompt.contains("Subject: Catch up?"));
        assert!(prompt.contains("tomorrow at 3pm"));
        assert!(prompt.contains(r#""isMeetingRequest": boolean"#));
    }

    #[test]
    fn extractor_rejects_bad_config() {
        let err = OpenAiExtractor::new(OpenAiConfig::new("")).err().unwrap();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);
        assert_eq!(err.provider(), Some("openai"));
    }

    #[test]
    fn extractor_name() {
        let extractor = OpenAiExtractor::new(OpenAiConfig::new("sk-test")).unwrap();
        assert_eq!(extractor.name(), "openai");
    }
}
