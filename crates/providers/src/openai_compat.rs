//! OpenAI-compatible provider implementation.
//!
//! Works with: OpenAI, OpenRouter, Ollama, vLLM, and any endpoint that
//! exposes a streaming `/chat/completions` API.
//!
//! The response is read as Server-Sent Events: `data: {...}` lines carrying
//! content deltas, terminated by `data: [DONE]`.

use async_trait::async_trait;
use autoline_core::error::ProviderError;
use autoline_core::message::Message;
use autoline_core::provider::{ChunkReceiver, Provider, ProviderRequest, StreamChunk};
use futures::StreamExt;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// An OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            // Bounds the gap between reads, not the whole response.
            .read_timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Convert our Message types to OpenAI API format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
                name: m.name.clone(),
            })
            .collect()
    }

    fn request_body(request: &ProviderRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "stream": true,
        });

        if let Some(temperature) = request.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        body
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn stream(&self, request: ProviderRequest) -> Result<ChunkReceiver, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::request_body(&request);

        debug!(provider = %self.name, model = %request.model, "Sending streaming request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited {
                retry_after_secs: retry_after(response.headers()),
            });
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider streaming error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let (tx, rx) = tokio::sync::mpsc::channel(64);
        let provider_name = self.name.clone();

        // Spawn task to read the SSE byte stream and parse chunks
        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            // Raw bytes: a multi-byte character may straddle two network reads.
            let mut buffer: Vec<u8> = Vec::new();
            let mut finished = false;

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(ProviderError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                buffer.extend_from_slice(&bytes);

                // Process complete lines
                while let Some(line_end) = buffer.iter().position(|&b| b == b'\n') {
                    let raw: Vec<u8> = buffer.drain(..=line_end).collect();
                    let line = String::from_utf8_lossy(&raw);

                    match parse_sse_line(&line) {
                        SseEvent::Skip => {}
                        SseEvent::Done => {
                            let _ = tx.send(Ok(StreamChunk::done())).await;
                            return;
                        }
                        SseEvent::Malformed { data, error } => {
                            trace!(
                                provider = %provider_name,
                                data = %data,
                                error = %error,
                                "Ignoring unparseable SSE chunk"
                            );
                        }
                        SseEvent::Data(stream_resp) => {
                            let Some(choice) = stream_resp.choices.into_iter().next() else {
                                continue;
                            };

                            if choice.finish_reason.is_some() {
                                finished = true;
                            }

                            if let Some(content) = choice.delta.content.filter(|c| !c.is_empty())
                            {
                                if tx.send(Ok(StreamChunk::text(content))).await.is_err() {
                                    return; // receiver dropped
                                }
                            }
                        }
                    }
                }
            }

            // Stream ended without [DONE]: complete only if the model said it was done.
            let last = if finished {
                Ok(StreamChunk::done())
            } else {
                Err(ProviderError::StreamInterrupted(
                    "connection closed before the response finished".into(),
                ))
            };
            let _ = tx.send(last).await;
        });

        Ok(rx)
    }
}

/// Seconds from a `Retry-After` header. The HTTP-date form is not parsed.
fn retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// One classified SSE line.
#[derive(Debug)]
enum SseEvent {
    /// Blank line, comment, or a non-data field.
    Skip,
    /// `data: [DONE]`
    Done,
    Data(StreamResponse),
    Malformed { data: String, error: String },
}

fn parse_sse_line(line: &str) -> SseEvent {
    let line = line.trim_end_matches(['\r', '\n']);

    // Skip empty lines and SSE comments
    if line.is_empty() || line.starts_with(':') {
        return SseEvent::Skip;
    }

    let Some(data) = line.strip_prefix("data:") else {
        return SseEvent::Skip;
    };
    let data = data.trim();

    if data == "[DONE]" {
        return SseEvent::Done;
    }

    match serde_json::from_str::<StreamResponse>(data) {
        Ok(parsed) => SseEvent::Data(parsed),
        Err(e) => SseEvent::Malformed {
            data: data.to_string(),
            error: e.to_string(),
        },
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

// --- Streaming SSE types ---

/// A single SSE `data: {...}` chunk from a streaming response.
#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_keeps_name_and_url() {
        let provider = OpenAiCompatProvider::new("openai", "https://api.openai.com/v1", "sk-test").unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let provider = OpenAiCompatProvider::new("local", "http://localhost:11434/v1/", "x").unwrap();
        assert_eq!(provider.base_url, "http://localhost:11434/v1");
    }

    #[test]
    fn message_conversion_keeps_order_and_name() {
        let messages = vec![
            Message::system("You autocomplete"),
            Message::user("git st").with_name("example_user"),
        ];
        let api_messages = OpenAiCompatProvider::to_api_messages(&messages);
        assert_eq!(api_messages.len(), 2);
        assert_eq!(api_messages[0].role, "system");
        assert!(api_messages[0].name.is_none());
        assert_eq!(api_messages[1].role, "user");
        assert_eq!(api_messages[1].name.as_deref(), Some("example_user"));
    }

    #[test]
    fn request_body_is_streaming() {
        let mut request = ProviderRequest::new("gpt-4", vec![Message::user("ls")]);
        request.max_tokens = Some(256);
        let body = OpenAiCompatProvider::request_body(&request);
        assert_eq!(body["model"], "gpt-4");
        assert_eq!(body["stream"], true);
        assert_eq!(body["max_tokens"], 256);
        assert!(body.get("temperature").is_none());
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[test]
    fn request_body_has_only_standard_fields() {
        let body = OpenAiCompatProvider::request_body(&ProviderRequest::new(
            "llama3",
            vec![Message::user("ls")],
        ));
        assert!(body.get("stream_options").is_none());
        let mut keys: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["messages", "model", "stream"]);
    }

    #[test]
    fn retry_after_seconds_are_parsed() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), None);

        headers.insert(RETRY_AFTER, "17".parse().unwrap());
        assert_eq!(retry_after(&headers), Some(17));

        headers.insert(RETRY_AFTER, "Wed, 21 Oct 2026 07:28:00 GMT".parse().unwrap());
        assert_eq!(retry_after(&headers), None);
    }

    // --- SSE parsing tests ---

    #[test]
    fn parse_content_delta() {
        let line = r#"data: {"choices":[{"delta":{"content":"git "},"finish_reason":null}]}"#;
        let SseEvent::Data(parsed) = parse_sse_line(line) else {
            panic!("expected data");
        };
        assert_eq!(parsed.choices[0].delta.content.as_deref(), Some("git "));
        assert!(parsed.choices[0].finish_reason.is_none());
    }

    #[test]
    fn parse_finish_chunk() {
        let line = "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\r\n";
        let SseEvent::Data(parsed) = parse_sse_line(line) else {
            panic!("expected data");
        };
        assert_eq!(parsed.choices[0].finish_reason.as_deref(), Some("stop"));
        assert!(parsed.choices[0].delta.content.is_none());
    }

    #[test]
    fn chunk_without_choices_still_parses() {
        let line = r#"data: {"choices":[],"usage":{"prompt_tokens":120,"completion_tokens":30,"total_tokens":150}}"#;
        let SseEvent::Data(parsed) = parse_sse_line(line) else {
            panic!("expected data");
        };
        assert!(parsed.choices.is_empty());
    }

    #[test]
    fn parse_done_with_and_without_space() {
        assert!(matches!(parse_sse_line("data: [DONE]\n"), SseEvent::Done));
        assert!(matches!(parse_sse_line("data:[DONE]"), SseEvent::Done));
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        assert!(matches!(parse_sse_line(""), SseEvent::Skip));
        assert!(matches!(parse_sse_line(": keep-alive"), SseEvent::Skip));
        assert!(matches!(parse_sse_line("event: message"), SseEvent::Skip));
    }

    #[test]
    fn garbage_is_reported_as_malformed() {
        assert!(matches!(
            parse_sse_line("data: {not json"),
            SseEvent::Malformed { .. }
        ));
    }
}
