use anyhow::Result;
use async_stream::stream;
use async_trait::async_trait;
use futures_util::StreamExt;

use gemchat_types::{ApiErrorBody, GenerateRequest, StreamChunk, Turn};

use crate::{ApiError, GenerativeClient, TextStream};

/// Public endpoint of the generation service.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// HTTP client for the streaming `generateContent` API.
pub struct GeminiClient {
    base_url: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the client at a different host (tests, proxies).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    fn stream_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, model
        )
    }
}

impl Default for GeminiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl GenerativeClient for GeminiClient {
    async fn stream_generate(
        &self,
        api_key: &str,
        model: &str,
        turns: Vec<Turn>,
    ) -> Result<TextStream> {
        let request = GenerateRequest { contents: turns };
        let url = self.stream_url(model);

        log::debug!("POST {} ({} turns)", url, request.contents.len());

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&request)
            .send()
            .await
            .map_err(ApiError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail: error_detail(&body),
            }
            .into());
        }

        let byte_stream = response.bytes_stream();

        // SSE framing: each event is a "data: {json}" line; one complete
        // chunk per line. Buffer across network reads and process whole
        // lines as they become available.
        let chunks: TextStream = Box::pin(stream! {
            let mut byte_stream = byte_stream;
            let mut buffer = String::new();

            while let Some(read) = byte_stream.next().await {
                match read {
                    Ok(bytes) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));

                        while let Some(line) = take_line(&mut buffer) {
                            if let Some(text) = event_text(&line) {
                                yield Ok(text);
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(anyhow::Error::new(ApiError::Stream(e.to_string())));
                        break;
                    }
                }
            }

            // Trailing data without a final newline.
            if !buffer.is_empty() {
                if let Some(text) = event_text(&buffer) {
                    yield Ok(text);
                }
            }
        });

        Ok(chunks)
    }
}

/// Pop one complete line off the front of the buffer.
fn take_line(buffer: &mut String) -> Option<String> {
    let end = buffer.find('\n')?;
    let line = buffer[..end].trim_end_matches('\r').to_string();
    buffer.drain(..=end);
    Some(line)
}

/// Extract the data payload of an SSE line, if it carries one.
fn sse_data(line: &str) -> Option<&str> {
    line.trim().strip_prefix("data:").map(str::trim_start)
}

/// Parse one SSE line into its chunk text. Non-data lines and payloads
/// that fail to parse are skipped.
fn event_text(line: &str) -> Option<String> {
    let data = sse_data(line)?;
    if data.is_empty() {
        return None;
    }
    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => Some(chunk.text()),
        Err(e) => {
            log::warn!("skipping unparseable stream event: {}", e);
            None
        }
    }
}

/// Best-effort provider message from an error body, raw body otherwise.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) if !parsed.error.message.is_empty() => parsed.error.message,
        _ => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_url_includes_model_and_sse() {
        let client = GeminiClient::with_base_url("http://localhost:8080/");
        assert_eq!(
            client.stream_url("gemini-1.5-flash"),
            "http://localhost:8080/v1beta/models/gemini-1.5-flash:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn take_line_handles_crlf_framing() {
        let mut buffer = "data: one\r\n\r\ndata: two\n".to_string();

        assert_eq!(take_line(&mut buffer).as_deref(), Some("data: one"));
        assert_eq!(take_line(&mut buffer).as_deref(), Some(""));
        assert_eq!(take_line(&mut buffer).as_deref(), Some("data: two"));
        assert_eq!(take_line(&mut buffer), None);
    }

    #[test]
    fn take_line_keeps_partial_tail() {
        let mut buffer = "data: whole\ndata: par".to_string();

        assert_eq!(take_line(&mut buffer).as_deref(), Some("data: whole"));
        assert_eq!(take_line(&mut buffer), None);
        assert_eq!(buffer, "data: par");
    }

    #[test]
    fn event_text_extracts_chunk_text() {
        let line = r#"data: {"candidates":[{"content":{"parts":[{"text":"Hel"}],"role":"model"}}]}"#;
        assert_eq!(event_text(line).as_deref(), Some("Hel"));
    }

    #[test]
    fn event_text_skips_non_data_lines() {
        assert_eq!(event_text(""), None);
        assert_eq!(event_text(": keepalive comment"), None);
        assert_eq!(event_text("event: ping"), None);
    }

    #[test]
    fn event_text_skips_garbage_payload() {
        assert_eq!(event_text("data: not json"), None);
    }

    #[test]
    fn metadata_only_event_yields_empty_text() {
        // Final events may carry only finishReason/usage, no parts.
        let line = r#"data: {"candidates":[{"finishReason":"STOP"}]}"#;
        assert_eq!(event_text(line).as_deref(), Some(""));
    }

    #[test]
    fn error_detail_prefers_provider_message() {
        let body = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(error_detail(body), "API key not valid");

        assert_eq!(error_detail("<html>bad gateway</html>"), "<html>bad gateway</html>");
    }
}
