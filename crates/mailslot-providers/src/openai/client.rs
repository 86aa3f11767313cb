//! Chat completions client for OpenAI-compatible APIs.

use serde::Serialize;
use tracing::debug;

use super::config::OpenAiConfig;
use crate::error::{ProviderError, ProviderResult, from_reqwest};
use crate::http::read_success_body;

/// Client for a `/chat/completions` endpoint.
#[derive(Debug)]
pub struct OpenAiClient {
    http_client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &OpenAiConfig) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::configuration("failed to create HTTP client").with_source(e))?;

        Ok(Self {
            http_client,
            api_key: config.api_key.clone(),
            endpoint: config.completions_url(),
            model: config.model.clone(),
        })
    }

    /// Sends one system and one user message, asking for a JSON object
    /// back, and returns the raw message content.
    pub async fn complete_json(&self, system: &str, user: &str) -> ProviderResult<String> {
        let request = ChatRequest {
            model: &self.model,
            temperature: 0.0,
            response_format: ResponseFormat {
                kind: "json_object",
            },
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        debug!(model = %self.model, "requesting chat completion");
        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(from_reqwest)?;

        let body = read_success_body(response).await?;
        message_content(&body)
    }
}

/// Pulls `choices[0].message.content` out of a completion response.
fn message_content(body: &str) -> ProviderResult<String> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| {
        ProviderError::invalid_response(format!("failed to parse response: {}", e))
    })?;

    value
        .pointer("/choices/0/message/content")
        .and_then(|content| content.as_str())
        .map(str::to_string)
        .ok_or_else(|| ProviderError::invalid_response("response has no message content"))
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    response_format: ResponseFormat,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}
