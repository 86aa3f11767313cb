//! One-shot requests that bypass the HTTP layer.
//!
//! Both commands print the same JSON body the service would answer with.

use std::path::Path;

use serde::de::DeserializeOwned;
use tokio::io::AsyncReadExt;

use mailslot_protocol::{EmailContent, MeetingEvent, Response};
use mailslot_server::Handler;

use crate::error::{CliError, CliResult};

/// Analyzes an email and prints the proposed slots.
///
/// Returns false when the service would have answered with an error.
pub async fn analyze(handler: &Handler, input: &Path) -> CliResult<bool> {
    let email: EmailContent = read_json(input).await?;
    let response = handler.analyze_email(&email).await;
    print_response(&response)
}

/// Creates an event for a chosen slot and prints the result.
pub async fn schedule(handler: &Handler, input: &Path) -> CliResult<bool> {
    let event: MeetingEvent = read_json(input).await?;
    let response = handler.schedule_meeting(&event).await;
    print_response(&response)
}

fn print_response(response: &Response) -> CliResult<bool> {
    let body = serde_json::to_string_pretty(response)
        .map_err(|e| CliError::Input(format!("failed to render response: {}", e)))?;
    println!("{}", body);
    Ok(response.as_error().is_none())
}

async fn read_json<T: DeserializeOwned>(input: &Path) -> CliResult<T> {
    let raw = if input == Path::new("-") {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        buf
    } else {
        tokio::fs::read_to_string(input).await.map_err(|e| {
            CliError::Input(format!("failed to read {}: {}", input.display(), e))
        })?
    };
    parse_json(&raw, input)
}

fn parse_json<T: DeserializeOwned>(raw: &str, input: &Path) -> CliResult<T> {
    serde_json::from_str(raw)
        .map_err(|e| CliError::Input(format!("invalid JSON in {}: {}", input.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_email() {
        let email: EmailContent = parse_json(
            r#"{"from": "ana@example.com", "subject": "Sync", "content": "Tuesday?"}"#,
            Path::new("mail.json"),
        )
        .unwrap();
        assert_eq!(email.from, "ana@example.com");
        assert_eq!(email.subject, "Sync");
    }

    #[test]
    fn parse_error_names_input() {
        let err = parse_json::<EmailContent>("{", Path::new("mail.json")).unwrap_err();
        assert!(matches!(err, CliError::Input(ref m) if m.contains("mail.json")));
    }

    #[tokio::test]
    async fn reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"from": "a@b.c", "subject": "", "content": "hi"}}"#).unwrap();

        let email: EmailContent = read_json(file.path()).await.unwrap();
        assert_eq!(email.content, "hi");
    }

    #[tokio::test]
    async fn missing_file_is_input_error() {
        let result = read_json::<EmailContent>(Path::new("/nonexistent/mail.json")).await;
        assert!(matches!(result, Err(CliError::Input(_))));
    }
}
