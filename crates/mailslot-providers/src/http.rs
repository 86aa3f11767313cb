//! Response handling shared by the HTTP-backed providers.

use reqwest::StatusCode;

use crate::error::{ProviderError, ProviderErrorCode, ProviderResult};

/// Longest upstream error body quoted in an error message.
const MAX_QUOTED_BODY: usize = 512;

/// Returns the body of a 2xx response or the matching provider error.
pub(crate) async fn read_success_body(response: reqwest::Response) -> ProviderResult<String> {
    let status = response.status();

    if !status.is_success() {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        let body = response.text().await.unwrap_or_default();
        return Err(error_for_status(status, retry_after, &body));
    }

    response
        .text()
        .await
        .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))
}

/// Maps a non-success HTTP status onto a provider error.
pub(crate) fn error_for_status(
    status: StatusCode,
    retry_after: Option<u64>,
    body: &str,
) -> ProviderError {
    let body = quote(body);
    match status {
        StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limited(format!(
            "rate limit exceeded{}",
            retry_after
                .map(|s| format!(", retry after {} seconds", s))
                .unwrap_or_default()
        )),
        StatusCode::UNAUTHORIZED => ProviderError::authentication("credentials expired or invalid"),
        StatusCode::FORBIDDEN => ProviderError::authorization("access denied"),
        StatusCode::NOT_FOUND => ProviderError::not_found(format!("resource not found: {}", body)),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ProviderError::bad_request(format!("API rejected request: {}", body))
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ProviderError::new(
            ProviderErrorCode::Timeout,
            format!("upstream timed out ({})", status),
        ),
        s if s.is_server_error() => ProviderError::server(format!("API error ({}): {}", s, body)),
        s => ProviderError::invalid_response(format!("unexpected status ({}): {}", s, body)),
    }
}

fn quote(body: &str) -> &str {
    let body = body.trim();
    if body.len() <= MAX_QUOTED_BODY {
        return body;
    }
    let mut end = MAX_QUOTED_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let err = error_for_status(StatusCode::TOO_MANY_REQUESTS, Some(30), "");
        assert_eq!(err.code(), ProviderErrorCode::RateLimited);
        assert!(err.message().contains("retry after 30 seconds"));

        assert_eq!(
            error_for_status(StatusCode::UNAUTHORIZED, None, "").code(),
            ProviderErrorCode::AuthenticationFailed
        );
        assert_eq!(
            error_for_status(StatusCode::FORBIDDEN, None, "").code(),
            ProviderErrorCode::AuthorizationFailed
        );
        assert_eq!(
            error_for_status(StatusCode::BAD_REQUEST, None, "bad timeMin").code(),
            ProviderErrorCode::BadRequest
        );
        assert_eq!(
            error_for_status(StatusCode::GATEWAY_TIMEOUT, None, "").code(),
            ProviderErrorCode::Timeout
        );

        let err = error_for_status(StatusCode::SERVICE_UNAVAILABLE, None, "try later");
        assert_eq!(err.code(), ProviderErrorCode::ServerError);
        assert!(err.is_retryable());
    }

    #[test]
    fn long_bodies_truncated() {
        let body = "é".repeat(400);
        let err = error_for_status(StatusCode::INTERNAL_SERVER_ERROR, None, &body);
        assert!(err.message().len() < 600);
    }
}
