//! OpenAI-compatible chat-completions client.
//!
//! Every agent talks to the model through [`ChatCompletion`], so tests can
//! swap the HTTP client for a mock.

use anyhow::{Context, Result};
use async_trait::async_trait;
use pcbuild_core::CollaboratorError;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::LlmConfig;

/// One system + user exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    /// Ask the provider for a JSON object when it supports that mode.
    pub json: bool,
}

impl ChatRequest {
    pub fn json(system: impl Into<String>, user: impl Into<String>, temperature: f32) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature,
            json: true,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Return the assistant message content. Empty content is an error.
    async fn complete(&self, request: ChatRequest) -> Result<String, CollaboratorError>;
}

/// Complete `request` and parse the reply as `T`.
///
/// Tolerates a Markdown code fence around the JSON, which local models add
/// even when told not to.
pub async fn complete_json<T: DeserializeOwned>(
    llm: &dyn ChatCompletion,
    request: ChatRequest,
) -> Result<T, CollaboratorError> {
    let raw = llm.complete(request).await?;
    let body = strip_code_fence(&raw);
    serde_json::from_str(body).map_err(|e| {
        debug!(error = %e, reply = %truncate(body, 400), "Model reply did not parse");
        CollaboratorError::malformed(format!("{e} in reply starting '{}'", truncate(body, 80)))
    })
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// HTTP client for one configured endpoint.
pub struct ChatClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl ChatClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client for chat completions")?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }
}

#[async_trait]
impl ChatCompletion for ChatClient {
    async fn complete(&self, request: ChatRequest) -> Result<String, CollaboratorError> {
        let body = CompletionBody {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            response_format: (request.json && self.config.provider.supports_json_mode())
                .then_some(ResponseFormat {
                    kind: "json_object",
                }),
        };

        let response = self
            .http
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, self.config.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(
                provider = %self.config.provider,
                model = %self.config.model,
                status = %status,
                "Chat completion request rejected"
            );
            return Err(status_error(status, &text));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| CollaboratorError::malformed(format!("completion envelope: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| CollaboratorError::malformed("model returned an empty response"))
    }
}

fn transport_error(err: reqwest::Error, timeout_secs: u64) -> CollaboratorError {
    if err.is_timeout() {
        CollaboratorError::Timeout {
            collaborator: "llm",
            secs: timeout_secs,
        }
    } else {
        CollaboratorError::Request(err.to_string())
    }
}

/// Map an HTTP status to the retry taxonomy. Client errors other than 408
/// and 429 will not get better on retry.
fn status_error(status: StatusCode, body: &str) -> CollaboratorError {
    let detail = format!("HTTP {status}: {}", truncate(body.trim(), 200));
    match status {
        StatusCode::TOO_MANY_REQUESTS => CollaboratorError::RateLimit(detail),
        StatusCode::REQUEST_TIMEOUT => CollaboratorError::Request(detail),
        s if s.is_server_error() => CollaboratorError::Request(detail),
        _ => CollaboratorError::Fatal(detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcbuild_core::RetryCategory;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Reply {
        ok: bool,
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"ok\": true}\n```"), "{\"ok\": true}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {\"ok\": false} "), "{\"ok\": false}");
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(
            status_error(StatusCode::TOO_MANY_REQUESTS, "slow down").retry_category(),
            RetryCategory::RateLimit
        );
        assert!(status_error(StatusCode::BAD_GATEWAY, "").is_retriable());
        assert!(status_error(StatusCode::REQUEST_TIMEOUT, "").is_retriable());
        assert!(!status_error(StatusCode::UNAUTHORIZED, "bad key").is_retriable());
        assert!(status_error(StatusCode::BAD_REQUEST, "no such model")
            .to_string()
            .contains("no such model"));
    }

    #[tokio::test]
    async fn test_complete_json_parses_fenced_reply() {
        let mut llm = MockChatCompletion::new();
        llm.expect_complete()
            .withf(|req| req.json && req.temperature == 0.3)
            .times(1)
            .returning(|_| Ok("```json\n{\"ok\": true}\n```".to_string()));

        let reply: Reply = complete_json(&llm, ChatRequest::json("sys", "user", 0.3))
            .await
            .unwrap();
        assert_eq!(reply, Reply { ok: true });
    }

    #[tokio::test]
    async fn test_complete_json_rejects_prose() {
        let mut llm = MockChatCompletion::new();
        llm.expect_complete()
            .returning(|_| Ok("Sure! Here is your build.".to_string()));

        let err = complete_json::<Reply>(&llm, ChatRequest::json("sys", "user", 0.3))
            .await
            .unwrap_err();
        assert!(matches!(err, CollaboratorError::Malformed(_)));
        assert!(err.is_retriable());
    }

    #[tokio::test]
    async fn test_client_maps_unreachable_endpoint_to_request_error() {
        let client = ChatClient::new(LlmConfig {
            provider: crate::config::LlmProvider::Ollama,
            base_url: "http://127.0.0.1:9/v1".into(),
            api_key: "ollama".into(),
            model: "test".into(),
            timeout_secs: 5,
        })
        .unwrap();

        let err = client
            .complete(ChatRequest::json("sys", "user", 0.3))
            .await
            .unwrap_err();
        assert!(err.is_retriable(), "unexpected error: {err}");
    }
}
