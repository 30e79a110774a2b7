/// LLM Client: The single point of entry for all completion calls.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// Pipeline stages depend on the `CompletionService` trait, never on `LlmClient`.
///
/// Model: claude-sonnet-4-5 (hardcoded; do not make configurable to prevent drift)
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod decode;
pub mod prompts;
#[cfg(test)]
pub mod stub;

pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all completion calls.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "claude-sonnet-4-5";

#[derive(Debug, Error)]
pub enum LlmError {
    /// Transport failure, including the per-call timeout.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// One single-turn completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest<'a> {
    pub prompt: &'a str,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// The remote text-completion seam. `LlmClient` is the production backend;
/// tests script responses through `stub::ScriptedCompletion`.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, LlmError>;
}

/// Calls the service if one is configured, logging failures instead of
/// propagating them. `None` means the caller must take its fallback path.
pub async fn try_complete(
    llm: Option<&dyn CompletionService>,
    request: &CompletionRequest<'_>,
    purpose: &str,
) -> Option<String> {
    let llm = llm?;
    match llm.complete(request).await {
        Ok(text) if !text.trim().is_empty() => Some(text),
        Ok(_) => {
            warn!("Completion for {purpose} returned no text; using fallback");
            None
        }
        Err(e) => {
            warn!("Completion for {purpose} failed: {e}; using fallback");
            None
        }
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Wraps the Anthropic Messages API. One request per call: no retries, the
/// per-call timeout is enforced by the underlying HTTP client.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    api_url: String,
}

impl LlmClient {
    pub fn new(api_key: String, api_url: Option<String>, timeout: Duration) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            api_url: api_url.unwrap_or_else(|| ANTHROPIC_API_URL.to_string()),
        })
    }
}

#[async_trait]
impl CompletionService for LlmClient {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![AnthropicMessage {
                role: "user",
                content: request.prompt,
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Try to parse error message
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let llm_response: LlmResponse = response.json().await?;

        debug!(
            "LLM call succeeded: input_tokens={}, output_tokens={}",
            llm_response.usage.input_tokens, llm_response.usage.output_tokens
        );

        llm_response
            .text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }
}

#[cfg(test)]
mod tests {
    use super::stub::ScriptedCompletion;
    use super::*;

    fn request(prompt: &str) -> CompletionRequest<'_> {
        CompletionRequest {
            prompt,
            temperature: 0.5,
            max_tokens: 50,
        }
    }

    fn client_for(server_url: &str) -> LlmClient {
        LlmClient::new(
            "test-key".to_string(),
            Some(format!("{server_url}/v1/messages")),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_complete_returns_first_text_block() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "test-key")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": MODEL,
                "max_tokens": 50,
                "temperature": 0.5
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"content":[{"type":"text","text":"[0, 2]"}],
                    "usage":{"input_tokens":12,"output_tokens":4}}"#,
            )
            .create_async()
            .await;

        let text = client_for(&server.url()).complete(&request("pick")).await.unwrap();

        assert_eq!(text, "[0, 2]");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_maps_api_error_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(400)
            .with_body(r#"{"error":{"type":"invalid_request_error","message":"bad prompt"}}"#)
            .create_async()
            .await;

        let err = client_for(&server.url()).complete(&request("x")).await.unwrap_err();

        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad prompt");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .with_status(503)
            .with_body("overloaded")
            .expect(1)
            .create_async()
            .await;

        let err = client_for(&server.url()).complete(&request("x")).await.unwrap_err();

        assert!(matches!(err, LlmError::Api { status: 503, .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_without_text_block_is_empty_content() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(r#"{"content":[],"usage":{"input_tokens":1,"output_tokens":0}}"#)
            .create_async()
            .await;

        let err = client_for(&server.url()).complete(&request("x")).await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
    }

    #[tokio::test]
    async fn test_try_complete_without_service_is_none() {
        assert!(try_complete(None, &request("x"), "test").await.is_none());
    }

    #[tokio::test]
    async fn test_try_complete_swallows_failures_and_blank_text() {
        let failing = ScriptedCompletion::failing();
        assert!(try_complete(Some(&failing), &request("x"), "test").await.is_none());

        let blank = ScriptedCompletion::always("   ");
        assert!(try_complete(Some(&blank), &request("x"), "test").await.is_none());

        let ok = ScriptedCompletion::always("hello");
        assert_eq!(
            try_complete(Some(&ok), &request("x"), "test").await.as_deref(),
            Some("hello")
        );
    }
}
