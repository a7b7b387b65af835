//! Gemini backend implementation.
//!
//! Uses the Generative Language REST API directly.
//!
//! Features:
//! - `x-goog-api-key` header authentication
//! - System instruction as a top-level `systemInstruction` field
//! - Multi-part user content with `inlineData` images
//! - Streaming via SSE (`streamGenerateContent?alt=sse`)
//! - Extended reasoning through `thinkingConfig.thinkingBudget`
//!
//! The API is stateless, so each [`GeminiConversation`] keeps its own history
//! and sends it with every request. A turn is appended to that history only
//! after its stream completes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};
use tutor_config::AppConfig;
use tutor_core::error::ProviderError;
use tutor_core::message::{HistoryEntry, MessageContent};
use tutor_core::provider::{
    Backend, ConversationHandle, FragmentReceiver, GenerationConfig, StreamChunk,
};

const API_VERSION: &str = "v1beta";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini REST backend.
pub struct GeminiBackend {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiBackend {
    /// Create a new Gemini backend.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: "gemini".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Build from application config. Fails when no API key is configured.
    pub fn from_config(config: &AppConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ProviderError::NotConfigured("API key is missing".into()))?;

        Ok(Self::new(api_key, Duration::from_secs(config.request_timeout_secs))?
            .with_base_url(&config.base_url))
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Backend for GeminiBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn create_conversation(
        &self,
        model: &str,
        config: GenerationConfig,
        history: Vec<HistoryEntry>,
    ) -> std::result::Result<Box<dyn ConversationHandle>, ProviderError> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::NotConfigured("API key is missing".into()));
        }

        debug!(
            provider = "gemini",
            model = %model,
            history = history.len(),
            reasoning = config.reasoning_budget.is_some(),
            "Creating conversation"
        );

        Ok(Box::new(GeminiConversation {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            model: model.to_string(),
            config,
            history: Arc::new(Mutex::new(history)),
        }))
    }

    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        let url = format!("{}/{API_VERSION}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        Ok(body["models"]
            .as_array()
            .map(|models| {
                models
                    .iter()
                    .filter_map(|m| m["name"].as_str())
                    .map(|name| name.trim_start_matches("models/").to_string())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        match self.list_models().await {
            Ok(_) => Ok(true),
            Err(ProviderError::AuthenticationFailed(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// A conversation bound to one model and generation config.
pub struct GeminiConversation {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    config: GenerationConfig,
    history: Arc<Mutex<Vec<HistoryEntry>>>,
}

impl GeminiConversation {
    /// Build the `streamGenerateContent` request body.
    fn request_body(
        config: &GenerationConfig,
        history: &[HistoryEntry],
        user: &HistoryEntry,
    ) -> serde_json::Value {
        let mut contents: Vec<&HistoryEntry> = history.iter().collect();
        contents.push(user);

        let mut generation_config = serde_json::json!({
            "temperature": config.temperature,
        });
        if let Some(budget) = config.reasoning_budget {
            generation_config["thinkingConfig"] = serde_json::json!({
                "thinkingBudget": budget
            });
        }

        serde_json::json!({
            "systemInstruction": {
                "parts": [{ "text": config.system_instruction }]
            },
            "contents": contents,
            "generationConfig": generation_config,
        })
    }
}

#[async_trait]
impl ConversationHandle for GeminiConversation {
    fn model(&self) -> &str {
        &self.model
    }

    async fn history(&self) -> std::result::Result<Vec<HistoryEntry>, ProviderError> {
        Ok(self.history.lock().await.clone())
    }

    async fn send_message_stream(
        &self,
        content: MessageContent,
    ) -> std::result::Result<FragmentReceiver, ProviderError> {
        let url = format!(
            "{}/{API_VERSION}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        );
        let user_entry = HistoryEntry::user(content);
        let body = {
            let history = self.history.lock().await;
            Self::request_body(&self.config, &history, &user_entry)
        };

        debug!(provider = "gemini", model = %self.model, "Sending streaming request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Gemini API error");
            return Err(status_error(status, error_body));
        }

        let (tx, rx) = tokio::sync::mpsc::channel(64);
        let history = Arc::clone(&self.history);

        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut lines = SseLines::default();
            let mut full_text = String::new();

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

                lines.push(&bytes);

                while let Some(line) = lines.next_line() {
                    let Some(data) = line.strip_prefix("data:") else {
                        continue;
                    };

                    match parse_sse_data(data.trim()) {
                        Ok(Some(text)) => {
                            full_text.push_str(&text);
                            if tx.send(Ok(StreamChunk::text(text))).await.is_err() {
                                // Receiver dropped: the turn was abandoned.
                                return;
                            }
                        }
                        Ok(None) => {}
                        Err(e) => {
                            let _ = tx.send(Err(e)).await;
                            return;
                        }
                    }
                }
            }

            if full_text.is_empty() {
                warn!(provider = "gemini", "Stream finished without visible text");
                let _ = tx
                    .send(Err(ProviderError::MalformedResponse(
                        "response contained no text".into(),
                    )))
                    .await;
                return;
            }

            history
                .lock()
                .await
                .extend([user_entry, HistoryEntry::model(full_text)]);
            let _ = tx.send(Ok(StreamChunk::done())).await;
        });

        Ok(rx)
    }
}

/// Line splitter for an SSE byte stream.
///
/// Bytes are buffered until a full line arrives, so a multi-byte character
/// split across network chunks is decoded intact.
#[derive(Debug, Default)]
struct SseLines {
    buffer: Vec<u8>,
}

impl SseLines {
    fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Take the next complete line, without its line ending.
    fn next_line(&mut self) -> Option<String> {
        let end = self.buffer.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.buffer.drain(..=end).collect();
        let text = String::from_utf8_lossy(&line[..end]);
        Some(text.trim_end_matches('\r').to_string())
    }
}

/// Parse one SSE `data:` payload into the visible text it carries.
///
/// Thought parts are skipped. An `error` object in the payload is a
/// mid-stream failure.
fn parse_sse_data(data: &str) -> Result<Option<String>, ProviderError> {
    if data.is_empty() {
        return Ok(None);
    }

    let event: serde_json::Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(e) => {
            trace!(error = %e, data = %data, "Ignoring unparseable Gemini SSE");
            return Ok(None);
        }
    };

    if let Some(error) = event.get("error") {
        let status_code = error["code"].as_u64().unwrap_or(500) as u16;
        let message = error["message"].as_str().unwrap_or("unknown error").to_string();
        return Err(status_error(status_code, message));
    }

    let Some(parts) = event["candidates"][0]["content"]["parts"].as_array() else {
        return Ok(None);
    };

    let text: String = parts
        .iter()
        .filter(|p| !p["thought"].as_bool().unwrap_or(false))
        .filter_map(|p| p["text"].as_str())
        .collect();

    Ok((!text.is_empty()).then_some(text))
}

/// Map an HTTP status to a provider error.
fn status_error(status: u16, message: String) -> ProviderError {
    match status {
        429 => ProviderError::RateLimited {
            retry_after_secs: 5,
        },
        401 | 403 => ProviderError::AuthenticationFailed(if message.is_empty() {
            "Invalid Gemini API key".into()
        } else {
            message
        }),
        404 => ProviderError::ModelNotFound(message),
        _ => ProviderError::ApiError {
            status_code: status,
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_core::message::{HistoryRole, Part};

    fn config(budget: Option<u32>) -> GenerationConfig {
        GenerationConfig {
            system_instruction: "You are a tutor.".into(),
            temperature: 0.7,
            reasoning_budget: budget,
        }
    }

    #[test]
    fn sse_text_parts_are_concatenated() {
        let data = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Carbon "},{"text":"is tetravalent."}]}}]}"#;
        assert_eq!(
            parse_sse_data(data).unwrap().as_deref(),
            Some("Carbon is tetravalent.")
        );
    }

    #[test]
    fn sse_thought_parts_are_skipped() {
        let data = r#"{"candidates":[{"content":{"parts":[{"text":"hmm","thought":true},{"text":"Answer"}]}}]}"#;
        assert_eq!(parse_sse_data(data).unwrap().as_deref(), Some("Answer"));
    }

    #[test]
    fn sse_without_text_yields_nothing() {
        let data = r#"{"candidates":[{"finishReason":"STOP"}],"usageMetadata":{"totalTokenCount":12}}"#;
        assert!(parse_sse_data(data).unwrap().is_none());
        assert!(parse_sse_data("not json").unwrap().is_none());
        assert!(parse_sse_data("").unwrap().is_none());
    }

    #[test]
    fn sse_error_payload_is_an_error() {
        let data = r#"{"error":{"code":429,"message":"quota"}}"#;
        assert!(matches!(
            parse_sse_data(data),
            Err(ProviderError::RateLimited { .. })
        ));
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            status_error(401, String::new()),
            ProviderError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            status_error(404, "no model".into()),
            ProviderError::ModelNotFound(_)
        ));
        assert!(matches!(
            status_error(500, "boom".into()),
            ProviderError::ApiError {
                status_code: 500,
                ..
            }
        ));
    }

    #[test]
    fn request_body_includes_history_and_thinking_budget() {
        let history = vec![
            HistoryEntry::user(MessageContent::Text("Hi".into())),
            HistoryEntry::model("Hello! Ready for Level 0?"),
        ];
        let user = HistoryEntry::user(MessageContent::compose(
            "What is this?",
            Some("data:image/png;base64,AAAA"),
        ));
        let body = GeminiConversation::request_body(&config(Some(32768)), &history, &user);

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "You are a tutor.");
        assert_eq!(body["contents"].as_array().unwrap().len(), 3);
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][2]["parts"][1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(
            body["generationConfig"]["thinkingConfig"]["thinkingBudget"],
            32768
        );
    }

    #[test]
    fn request_body_without_budget_has_no_thinking_config() {
        let user = HistoryEntry::user(MessageContent::Text("Hi".into()));
        let body = GeminiConversation::request_body(&config(None), &[], &user);
        assert!(body["generationConfig"].get("thinkingConfig").is_none());
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Hi");
    }

    #[test]
    fn from_config_requires_api_key() {
        let config = AppConfig::default();
        assert!(matches!(
            GeminiBackend::from_config(&config),
            Err(ProviderError::NotConfigured(_))
        ));
    }

    #[tokio::test]
    async fn created_conversation_is_seeded_with_history() {
        let config_with_key = AppConfig {
            api_key: Some("test-key".into()),
            ..AppConfig::default()
        };
        let backend = GeminiBackend::from_config(&config_with_key).unwrap();
        assert_eq!(backend.name(), "gemini");

        let seeded = vec![
            HistoryEntry::user(MessageContent::Text("Start".into())),
            HistoryEntry::model("Overview..."),
        ];
        let handle = backend
            .create_conversation("gemini-3-flash-preview", config(None), seeded.clone())
            .await
            .unwrap();
        assert_eq!(handle.model(), "gemini-3-flash-preview");

        let history = handle.history().await.unwrap();
        assert_eq!(history, seeded);
        assert_eq!(history[1].role, HistoryRole::Model);
        assert_eq!(history[0].parts, vec![Part::text("Start")]);
    }

    #[test]
    fn sse_lines_keep_split_characters_intact() {
        let line = "data: F = m × a\r\n".as_bytes();
        let split = line.iter().position(|&b| b == 0xC3).unwrap() + 1;

        let mut lines = SseLines::default();
        lines.push(&line[..split]);
        assert!(lines.next_line().is_none());
        lines.push(&line[split..]);
        assert_eq!(lines.next_line().as_deref(), Some("data: F = m × a"));
        assert!(lines.next_line().is_none());
    }

    fn sse_event(text: &str) -> String {
        let event = serde_json::json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
        });
        format!("data: {event}\r\n\r\n")
    }

    async fn read_request_body(stream: &mut tokio::net::TcpStream) -> String {
        use tokio::io::AsyncReadExt;

        let mut data = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);

            let Some(head_end) = data.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&data[..head_end]).to_lowercase();
            let length = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            let body_start = head_end + 4;
            if data.len() >= body_start + length {
                return String::from_utf8_lossy(&data[body_start..body_start + length]).into_owned();
            }
        }
        String::new()
    }

    /// Serve one SSE response per connection, writing each body in the given
    /// byte pieces. Resolves to the request bodies received.
    async fn serve_sse(
        responses: Vec<Vec<Vec<u8>>>,
    ) -> (String, tokio::task::JoinHandle<Vec<String>>) {
        use tokio::io::AsyncWriteExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let server = tokio::spawn(async move {
            let mut requests = Vec::new();
            for pieces in responses {
                let (mut stream, _) = listener.accept().await.unwrap();
                requests.push(read_request_body(&mut stream).await);

                stream
                    .write_all(
                        b"HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nConnection: close\r\n\r\n",
                    )
                    .await
                    .unwrap();
                for piece in pieces {
                    stream.write_all(&piece).await.unwrap();
                    stream.flush().await.unwrap();
                    tokio::time::sleep(Duration::from_millis(30)).await;
                }
                stream.shutdown().await.unwrap();
            }
            requests
        });

        (base_url, server)
    }

    async fn collect(mut rx: FragmentReceiver) -> Result<String, ProviderError> {
        let mut text = String::new();
        while let Some(chunk) = rx.recv().await {
            let chunk = chunk?;
            if let Some(t) = chunk.text {
                text.push_str(&t);
            }
            if chunk.done {
                break;
            }
        }
        Ok(text)
    }

    #[tokio::test]
    async fn multibyte_character_split_across_reads_survives() {
        let body = sse_event("F = m × a").into_bytes();
        let split = body.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let (base_url, server) =
            serve_sse(vec![vec![body[..split].to_vec(), body[split..].to_vec()]]).await;

        let backend = GeminiBackend::new("test-key", Duration::from_secs(5))
            .unwrap()
            .with_base_url(base_url);
        let handle = backend
            .create_conversation("gemini-3-flash-preview", config(None), vec![])
            .await
            .unwrap();

        let rx = handle
            .send_message_stream(MessageContent::Text("Newton's second law?".into()))
            .await
            .unwrap();
        assert_eq!(collect(rx).await.unwrap(), "F = m × a");

        let history = handle.history().await.unwrap();
        assert_eq!(history[1], HistoryEntry::model("F = m × a"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn reply_without_text_is_not_stored_in_history() {
        let blocked = b"data: {\"candidates\":[{\"finishReason\":\"SAFETY\"}]}\r\n\r\n".to_vec();
        let answer = sse_event("Let's try that again.").into_bytes();
        let (base_url, server) = serve_sse(vec![vec![blocked], vec![answer]]).await;

        let backend = GeminiBackend::new("test-key", Duration::from_secs(5))
            .unwrap()
            .with_base_url(base_url);
        let handle = backend
            .create_conversation("gemini-3-flash-preview", config(None), vec![])
            .await
            .unwrap();

        let rx = handle
            .send_message_stream(MessageContent::Text("q".into()))
            .await
            .unwrap();
        assert!(matches!(
            collect(rx).await,
            Err(ProviderError::MalformedResponse(_))
        ));
        assert!(handle.history().await.unwrap().is_empty());

        let rx = handle
            .send_message_stream(MessageContent::Text("next".into()))
            .await
            .unwrap();
        assert_eq!(collect(rx).await.unwrap(), "Let's try that again.");

        let requests = server.await.unwrap();
        let second: serde_json::Value = serde_json::from_str(&requests[1]).unwrap();
        let contents = second["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0]["parts"][0]["text"], "next");
        assert_eq!(handle.history().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn blank_key_cannot_open_conversation() {
        let backend = GeminiBackend::new("", Duration::from_secs(5)).unwrap();
        let result = backend
            .create_conversation("gemini-3-flash-preview", config(None), vec![])
            .await;
        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    }
}
