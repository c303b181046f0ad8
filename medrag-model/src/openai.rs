//! OpenAI-compatible chat-completion client.
//!
//! Speaks the `/chat/completions` wire format, which covers OpenAI, Mistral,
//! and local servers such as Ollama. Provider identity selects the base
//! endpoint and credential source.

use async_stream::try_stream;
use futures::StreamExt;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{ModelError, Result};
use crate::llm::{Llm, TokenStream};
use crate::retry::{RetryConfig, with_retry};

/// A known chat-completion provider.
///
/// Selects the base endpoint and the environment variable holding the API
/// credential. Local providers accept a dummy token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// A local Ollama server (`http://localhost:11434/v1`, no credential).
    Ollama,
    /// The Mistral platform (`MISTRAL_API_KEY`).
    Mistral,
    /// The OpenAI platform (`OPENAI_API_KEY`).
    OpenAi,
}

impl Provider {
    /// The base URL for this provider's OpenAI-compatible endpoint.
    pub fn base_url(&self) -> &'static str {
        match self {
            Provider::Ollama => "http://localhost:11434/v1",
            Provider::Mistral => "https://api.mistral.ai/v1",
            Provider::OpenAi => "https://api.openai.com/v1",
        }
    }

    /// Resolve the API key for this provider.
    ///
    /// Ollama does not authenticate and gets a dummy bearer token. The hosted
    /// providers read their respective environment variables.
    fn resolve_api_key(&self) -> Result<String> {
        let env_var = match self {
            Provider::Ollama => return Ok("ollama".to_string()),
            Provider::Mistral => "MISTRAL_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
        };
        std::env::var(env_var).map_err(|_| ModelError::Auth {
            provider: format!("env var '{env_var}' not set"),
        })
    }
}

/// A chat-completion client for OpenAI-compatible endpoints.
///
/// Calls are wrapped in the configured [`RetryConfig`]: transient failures
/// (rate limits, connection errors, timeouts) are retried with exponential
/// backoff, permanent failures surface immediately. For streaming calls only
/// the initial connection is retried; a stream that fails mid-flight is not
/// restartable.
///
/// # Example
///
/// ```rust,ignore
/// use medrag_model::{ChatClient, Llm, Provider};
///
/// let model = ChatClient::new(Provider::Mistral, "mistral-medium")?;
/// let reply = model.generate("You are a medical assistant.", "Hello").await?;
/// ```
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    retry: RetryConfig,
}

impl ChatClient {
    /// Create a client for a known provider.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Auth`] if the provider's credential environment
    /// variable is not set.
    pub fn new(provider: Provider, model: impl Into<String>) -> Result<Self> {
        let api_key = provider.resolve_api_key()?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: provider.base_url().to_string(),
            api_key,
            model: model.into(),
            retry: RetryConfig::default(),
        })
    }

    /// Create a client for an arbitrary OpenAI-compatible endpoint.
    pub fn compatible(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            retry: RetryConfig::default(),
        }
    }

    /// Replace the retry policy.
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn request_body(&self, system: &str, user: &str, stream: bool) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "stream": stream,
        })
    }

    async fn send(&self, body: &Value) -> Result<reqwest::Response> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(url = %url, model = %self.model, "sending chat completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Timeout { message: e.to_string() }
                } else {
                    ModelError::Connection { message: e.to_string() }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, &body_text));
        }
        Ok(response)
    }

    async fn complete_once(&self, system: &str, user: &str) -> Result<String> {
        let body = self.request_body(system, user, false);
        let response = self.send(&body).await?;

        let json: Value = response
            .json()
            .await
            .map_err(|e| ModelError::Parse { message: format!("invalid JSON: {e}") })?;

        json.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| ModelError::Parse {
                message: "response has no choices[0].message.content".to_string(),
            })
    }
}

/// Map an HTTP status code to the appropriate error.
fn map_http_error(status: reqwest::StatusCode, body: &str) -> ModelError {
    match status.as_u16() {
        401 | 403 => ModelError::Auth { provider: format!("HTTP {status}") },
        429 => {
            // Try to extract a wait from "Rate limit... try again in Xs"
            let retry_secs = serde_json::from_str::<Value>(body)
                .ok()
                .and_then(|v| v.get("error")?.get("message")?.as_str().map(str::to_string))
                .and_then(|msg| {
                    msg.split("in ").last().and_then(|s| s.trim_end_matches('s').parse().ok())
                })
                .unwrap_or(5);
            ModelError::RateLimited { retry_after_secs: retry_secs }
        }
        s if s >= 500 => ModelError::Connection { message: format!("server error ({s}): {body}") },
        s => ModelError::Api { message: format!("HTTP {s}: {body}") },
    }
}

/// Parse a single SSE data line. Returns the parsed JSON if valid.
fn parse_sse_line(line: &str) -> Option<Value> {
    let data = line.strip_prefix("data: ")?;
    if data == "[DONE]" {
        return None;
    }
    serde_json::from_str(data).ok()
}

/// Extract the content delta from a streamed chunk, if non-empty.
fn chunk_token(chunk: &Value) -> Option<String> {
    let content = chunk
        .get("choices")?
        .get(0)?
        .get("delta")?
        .get("content")?
        .as_str()?;
    if content.is_empty() { None } else { Some(content.to_string()) }
}

#[async_trait::async_trait]
impl Llm for ChatClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, system: &str, user: &str) -> Result<String> {
        with_retry(&self.retry, || self.complete_once(system, user)).await
    }

    async fn generate_stream(&self, system: &str, user: &str) -> Result<TokenStream> {
        let body = self.request_body(system, user, true);
        let response = with_retry(&self.retry, || self.send(&body)).await?;

        let stream = try_stream! {
            let mut bytes = response.bytes_stream();
            let mut buffer = String::new();

            'read: while let Some(chunk) = bytes.next().await {
                let chunk = chunk
                    .map_err(|e| ModelError::Stream { message: format!("failed to read stream: {e}") })?;
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                // Emit every complete line; keep the trailing partial in the buffer.
                while let Some(newline) = buffer.find('\n') {
                    let line: String = buffer.drain(..=newline).collect();
                    let line = line.trim();
                    if line.is_empty() || line.starts_with(':') {
                        continue;
                    }
                    if line == "data: [DONE]" {
                        break 'read;
                    }
                    if let Some(data) = parse_sse_line(line) {
                        if let Some(token) = chunk_token(&data) {
                            yield token;
                        }
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_base_urls() {
        assert_eq!(Provider::Ollama.base_url(), "http://localhost:11434/v1");
        assert_eq!(Provider::Mistral.base_url(), "https://api.mistral.ai/v1");
        assert_eq!(Provider::OpenAi.base_url(), "https://api.openai.com/v1");
    }

    #[test]
    fn ollama_needs_no_credential() {
        assert_eq!(Provider::Ollama.resolve_api_key().unwrap(), "ollama");
    }

    #[test]
    fn parse_sse_line_valid() {
        let parsed = parse_sse_line(r#"data: {"choices":[{"delta":{"content":"hi"}}]}"#).unwrap();
        assert_eq!(chunk_token(&parsed).unwrap(), "hi");
    }

    #[test]
    fn parse_sse_line_done_and_noise() {
        assert!(parse_sse_line("data: [DONE]").is_none());
        assert!(parse_sse_line(": keepalive").is_none());
        assert!(parse_sse_line("event: ping").is_none());
    }

    #[test]
    fn empty_delta_yields_no_token() {
        let parsed = parse_sse_line(r#"data: {"choices":[{"delta":{"content":""}}]}"#).unwrap();
        assert!(chunk_token(&parsed).is_none());
        let parsed = parse_sse_line(r#"data: {"choices":[{"delta":{}}]}"#).unwrap();
        assert!(chunk_token(&parsed).is_none());
    }

    #[test]
    fn http_error_mapping() {
        assert!(matches!(
            map_http_error(reqwest::StatusCode::UNAUTHORIZED, ""),
            ModelError::Auth { .. }
        ));
        assert!(matches!(
            map_http_error(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            ModelError::Connection { .. }
        ));
        assert!(matches!(
            map_http_error(reqwest::StatusCode::BAD_REQUEST, "nope"),
            ModelError::Api { .. }
        ));
    }

    #[test]
    fn rate_limit_parses_retry_after() {
        let body = r#"{"error":{"message":"Rate limit reached, try again in 12s"}}"#;
        match map_http_error(reqwest::StatusCode::TOO_MANY_REQUESTS, body) {
            ModelError::RateLimited { retry_after_secs } => assert_eq!(retry_after_secs, 12),
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }
}
