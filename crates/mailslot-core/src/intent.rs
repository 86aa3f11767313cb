//! Validated decoding of the language model's meeting analysis.
//!
//! The model is asked for a JSON object, but nothing guarantees it returns
//! one. [`MeetingIntent::from_json`] accepts the shapes models actually
//! produce (fenced code blocks, a single time instead of a list, numeric
//! strings) and rejects everything else with an [`IntentError`].

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize, de};
use thiserror::Error;

use crate::request::{MeetingRequest, RequestError, parse_instant};

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```(?:json)?\s*(.*?)\s*```\s*$").expect("valid regex")
});

/// Errors from decoding the model's response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntentError {
    /// The model returned nothing.
    #[error("model returned an empty response")]
    Empty,

    /// The response is not JSON, or not the expected object.
    #[error("model response has an unexpected shape: {0}")]
    Shape(String),
}

/// The meeting analysis extracted from an email.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingIntent {
    /// Whether the email asks for a meeting at all.
    pub is_meeting_request: bool,
    /// Who asked, if the model could tell.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_by: Option<String>,
    /// Proposed times, as the model wrote them.
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "string_or_vec"
    )]
    pub suggested_times: Vec<String>,
    /// Meeting length in minutes.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_minutes"
    )]
    pub duration: Option<i64>,
    /// Meeting subject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Meeting purpose, which some prompts ask for instead of a subject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

impl MeetingIntent {
    /// Decodes the model's raw text response.
    ///
    /// # Errors
    ///
    /// Returns [`IntentError`] if the text is empty, is not a JSON object, or
    /// lacks a boolean `isMeetingRequest`.
    pub fn from_json(raw: &str) -> Result<Self, IntentError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IntentError::Empty);
        }

        let body = CODE_FENCE
            .captures(trimmed)
            .and_then(|c| c.get(1))
            .map_or(trimmed, |m| m.as_str());

        let value: serde_json::Value =
            serde_json::from_str(body).map_err(|e| IntentError::Shape(e.to_string()))?;
        if !value.is_object() {
            return Err(IntentError::Shape("expected a JSON object".to_string()));
        }

        serde_json::from_value(value).map_err(|e| IntentError::Shape(e.to_string()))
    }

    /// Returns the subject, falling back to the purpose.
    pub fn title(&self) -> Option<&str> {
        self.subject
            .as_deref()
            .or(self.purpose.as_deref())
            .filter(|s| !s.trim().is_empty())
    }

    /// Converts the analysis into a schedulable request.
    ///
    /// `sender` is used when the model did not name who asked. Blank
    /// suggested times are ignored; unparseable ones fail the request.
    pub fn to_request(&self, sender: &str) -> Result<MeetingRequest, RequestError> {
        let requested_by = self
            .requested_by
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(sender);

        let suggested_times = self
            .suggested_times
            .iter()
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_instant(s))
            .collect::<Result<Vec<_>, _>>()?;

        let mut request = MeetingRequest::new(requested_by)
            .with_suggested_times(suggested_times)
            .with_duration(self.duration)?;
        if let Some(title) = self.title() {
            request = request.with_subject(title);
        }
        Ok(request)
    }
}

/// Accepts a string, a list of strings, or null.
fn string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: de::Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> de::Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string, a sequence of strings, or null")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Vec<String>, E> {
            Ok(vec![value.to_string()])
        }

        fn visit_unit<E: de::Error>(self) -> Result<Vec<String>, E> {
            Ok(Vec::new())
        }

        fn visit_none<E: de::Error>(self) -> Result<Vec<String>, E> {
            Ok(Vec::new())
        }

        fn visit_seq<S: de::SeqAccess<'de>>(self, mut seq: S) -> Result<Vec<String>, S::Error> {
            let mut v = Vec::new();
            while let Some(s) = seq.next_element()? {
                v.push(s);
            }
            Ok(v)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

/// Accepts an integer, a float (rounded), a numeric string, or null.
fn lenient_minutes<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: de::Deserializer<'de>,
{
    struct Minutes;

    impl<'de> de::Visitor<'de> for Minutes {
        type Value = Option<i64>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a number of minutes or null")
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Option<i64>, E> {
            Ok(Some(value))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Option<i64>, E> {
            Ok(Some(i64::try_from(value).unwrap_or(i64::MAX)))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Option<i64>, E> {
            if value.is_finite() {
                Ok(Some(value.round() as i64))
            } else {
                Ok(None)
            }
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Option<i64>, E> {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<f64>()
                .map_err(|_| E::invalid_value(de::Unexpected::Str(value), &self))
                .and_then(|f| self.visit_f64(f))
        }

        fn visit_unit<E: de::Error>(self) -> Result<Option<i64>, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Option<i64>, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(Minutes)
}
