//! Completion service trait
//!
//! Defines the single-call interface used by the annotator, router and
//! synthesizer.

use async_trait::async_trait;
use nlsql_core::Prompt;
use std::time::Duration;

/// Longest response body kept in an HTTP error
const MAX_ERROR_BODY: usize = 500;

/// Errors from a completion call
#[derive(Debug, Clone, thiserror::Error)]
pub enum CompletionError {
    #[error("API key not configured (set {0})")]
    MissingApiKey(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("No scripted response left")]
    Exhausted,
}

/// Trait that all completion backends implement
///
/// One call is one outbound request. Implementations never retry.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Send `prompt` and return the raw completion text
    async fn complete(&self, prompt: &Prompt) -> Result<String, CompletionError>;
}

/// Build an error for a non-success HTTP status
pub fn parse_http_error(status: u16, body: &str) -> CompletionError {
    let body = match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    };
    CompletionError::Http { status, body }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_keeps_status_and_body() {
        let err = parse_http_error(429, "rate limited");
        assert!(matches!(err, CompletionError::Http { status: 429, ref body } if body == "rate limited"));
        assert_eq!(err.to_string(), "HTTP 429: rate limited");
    }

    #[test]
    fn long_error_body_is_truncated() {
        let body = "é".repeat(MAX_ERROR_BODY + 10);
        let CompletionError::Http { body, .. } = parse_http_error(500, &body) else {
            panic!("Expected Http error");
        };
        assert_eq!(body.chars().count(), MAX_ERROR_BODY + 3);
        assert!(body.ends_with("..."));
    }
}
