//! Meeting intent extraction through OpenAI-compatible chat models.
//!
//! The model is asked for a JSON object (`response_format: json_object`);
//! its reply goes through [`MeetingIntent::from_json`](mailslot_core::MeetingIntent::from_json)
//! so a malformed answer becomes an `InvalidResponse` error rather than a
//! bogus analysis.

mod client;
mod config;
mod provider;

pub use client::OpenAiClient;
pub use config::{OPENAI_API_BASE, OpenAiConfig};
pub use provider::{OpenAiExtractor, build_prompt};
