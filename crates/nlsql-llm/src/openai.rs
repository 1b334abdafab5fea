//! OpenAI-compatible chat completions client
//!
//! Works against any endpoint implementing `POST /chat/completions`
//! (OpenAI, Azure-style gateways, local servers).

use crate::provider::{parse_http_error, CompletionError, CompletionService};
use async_trait::async_trait;
use nlsql_core::{LlmConfig, Prompt};
use serde::Deserialize;
use serde_json::json;

/// Chat completions client
pub struct OpenAiCompletion {
    client: reqwest::Client,
    config: LlmConfig,
    api_key: Option<String>,
}

impl OpenAiCompletion {
    /// Create a client, reading the API key from `config.api_key_env`
    ///
    /// A missing key is only reported when a completion is requested.
    pub fn new(config: LlmConfig) -> Result<Self, CompletionError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        Self::with_api_key(config, api_key)
    }

    /// Create a client with an explicit API key
    pub fn with_api_key(config: LlmConfig, api_key: Option<String>) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| CompletionError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn build_request_body(&self, prompt: &Prompt) -> serde_json::Value {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &prompt.system {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": prompt.user }));

        json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        })
    }

    fn map_send_error(&self, error: reqwest::Error) -> CompletionError {
        if error.is_timeout() {
            CompletionError::Timeout(self.config.timeout())
        } else {
            CompletionError::Network(error.to_string())
        }
    }
}

/// Extract the first choice's text from a response body
fn parse_content(body: &str) -> Result<String, CompletionError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| CompletionError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or_else(|| CompletionError::InvalidResponse("response has no message content".to_string()))
}

#[async_trait]
impl CompletionService for OpenAiCompletion {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String, CompletionError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| CompletionError::MissingApiKey(self.config.api_key_env.clone()))?;

        tracing::debug!(model = %self.config.model, url = %self.config.base_url, "sending completion request");

        let response = self
            .client
            .post(&self.config.base_url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&self.build_request_body(prompt))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.map_send_error(e))?;

        if !(200..300).contains(&status) {
            tracing::warn!(status, "completion request failed");
            return Err(parse_http_error(status, &body));
        }

        parse_content(&body)
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn client(api_key: Option<&str>) -> OpenAiCompletion {
        OpenAiCompletion::with_api_key(LlmConfig::default(), api_key.map(str::to_string)).unwrap()
    }

    #[test]
    fn request_body_has_system_and_user_messages() {
        let body = client(Some("k")).build_request_body(&Prompt::new("be brief", "hi"));
        assert_eq!(
            body,
            json!({
                "model": "gpt-4o-mini",
                "messages": [
                    { "role": "system", "content": "be brief" },
                    { "role": "user", "content": "hi" }
                ],
                "temperature": 0.0,
                "max_tokens": 2048
            })
        );
    }

    #[test]
    fn request_body_without_system_message() {
        let body = client(Some("k")).build_request_body(&Prompt::user_only("hi"));
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn parses_first_choice() {
        let body = r#"{"id":"x","model":"m","choices":[{"index":0,"message":{"role":"assistant","content":"SELECT 1"},"finish_reason":"stop"}]}"#;
        assert_eq!(parse_content(body).unwrap(), "SELECT 1");
    }

    #[test]
    fn empty_choices_is_invalid() {
        assert!(matches!(
            parse_content(r#"{"choices":[]}"#),
            Err(CompletionError::InvalidResponse(_))
        ));
        assert!(matches!(parse_content("<html>"), Err(CompletionError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_sending() {
        let err = client(None).complete(&Prompt::user_only("hi")).await.unwrap_err();
        assert!(matches!(err, CompletionError::MissingApiKey(var) if var == "OPENAI_API_KEY"));
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        // Accepts connections and never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let config = LlmConfig {
            base_url: format!("http://{}/v1/chat/completions", addr),
            timeout_secs: 1,
            ..LlmConfig::default()
        };
        let llm = OpenAiCompletion {
            client: reqwest::Client::builder()
                .timeout(config.timeout())
                .no_proxy()
                .build()
                .unwrap(),
            config,
            api_key: Some("k".to_string()),
        };

        let started = std::time::Instant::now();
        let err = llm.complete(&Prompt::user_only("hi")).await.unwrap_err();

        assert!(matches!(err, CompletionError::Timeout(t) if t == std::time::Duration::from_secs(1)));
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
        server.abort();
    }
}
