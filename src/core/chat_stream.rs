use std::fmt;

use futures_util::StreamExt;
use memchr::memchr;
use tokio::sync::mpsc;
use tracing::debug;

use crate::api::{ChatMessage, ChatRequest, ChatResponse};
use crate::core::state::SessionFault;
use crate::utils::url::construct_api_url;

#[derive(Clone, Debug, PartialEq)]
pub enum StreamMessage {
    Chunk(String),
    Error(GatewayError),
    End,
}

/// A completion request failed or its stream was cut short.
#[derive(Clone, Debug, PartialEq)]
pub enum GatewayError {
    /// The request never reached the server, or the client could not be built.
    Transport(String),
    /// The server answered with an error status or an error payload.
    Api(String),
    /// The response stream broke off or carried unreadable data.
    Stream(String),
}

impl GatewayError {
    pub fn fault(&self) -> SessionFault {
        match self {
            GatewayError::Api(_) => SessionFault::Api,
            GatewayError::Transport(_) | GatewayError::Stream(_) => SessionFault::Client,
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Transport(msg) => write!(f, "Connection failed: {msg}"),
            GatewayError::Api(msg) => f.write_str(msg),
            GatewayError::Stream(msg) => write!(f, "Stream interrupted: {msg}"),
        }
    }
}

impl std::error::Error for GatewayError {}

/// Everything one completion round sends to the model server.
#[derive(Clone, Debug)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_k: u32,
    pub n_threads: u32,
}

impl From<CompletionRequest> for ChatRequest {
    fn from(request: CompletionRequest) -> Self {
        ChatRequest {
            model: request.model,
            messages: request.messages,
            temperature: request.temperature,
            stream: true,
            max_tokens: Some(request.max_tokens),
            top_k: Some(request.top_k),
            n_threads: Some(request.n_threads),
        }
    }
}

/// Source of streamed completions. The receiver yields chunks in order and
/// finishes with exactly one `End`, preceded by an `Error` on failure.
pub trait ChatGateway: Send + Sync {
    fn open_stream(&self, request: CompletionRequest) -> mpsc::UnboundedReceiver<StreamMessage>;
}

fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

fn handle_data_payload(payload: &str, tx: &mpsc::UnboundedSender<StreamMessage>) -> bool {
    if payload == "[DONE]" {
        let _ = tx.send(StreamMessage::End);
        return true;
    }

    match serde_json::from_str::<ChatResponse>(payload) {
        Ok(response) => {
            if let Some(choice) = response.choices.first() {
                if let Some(content) = &choice.delta.content {
                    if !content.is_empty() {
                        let _ = tx.send(StreamMessage::Chunk(content.clone()));
                    }
                }
            }
            false
        }
        Err(_) => {
            if payload.trim().is_empty() {
                return false;
            }

            let formatted_error = format_api_error(payload);
            let _ = tx.send(StreamMessage::Error(GatewayError::Api(formatted_error)));
            let _ = tx.send(StreamMessage::End);
            true
        }
    }
}

fn process_sse_line(line: &str, tx: &mpsc::UnboundedSender<StreamMessage>) -> bool {
    extract_data_payload(line)
        .map(|payload| handle_data_payload(payload, tx))
        .unwrap_or(false)
}

/// Handle a last line the body left without a trailing newline. Returns
/// `true` when that line finished the stream.
fn finish_unterminated_stream(rest: &[u8], tx: &mpsc::UnboundedSender<StreamMessage>) -> bool {
    match std::str::from_utf8(rest) {
        Ok(line) if !line.trim().is_empty() => process_sse_line(line.trim(), tx),
        Ok(_) => false,
        Err(e) => {
            let _ = tx.send(StreamMessage::Error(GatewayError::Stream(format!(
                "invalid UTF-8 in stream: {e}"
            ))));
            let _ = tx.send(StreamMessage::End);
            true
        }
    }
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value.get("error").and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.to_string()),
                _ => None,
            })
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        collapsed.trim().to_string()
    })
}

fn format_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();

    if trimmed.is_empty() {
        return "API Error: <empty response>".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(summary) = extract_error_summary(&json_value) {
            if !summary.is_empty() {
                return format!("API Error: {summary}");
            }
        }
        if let Ok(compact) = serde_json::to_string(&json_value) {
            return format!("API Error: {compact}");
        }
    }

    let collapsed = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
    format!("API Error: {collapsed}")
}

/// Streams completions from an OpenAI-compatible `chat/completions` endpoint.
#[derive(Clone)]
pub struct ChatStreamService {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ChatStreamService {
    pub fn new(client: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }
}

impl ChatGateway for ChatStreamService {
    fn open_stream(&self, request: CompletionRequest) -> mpsc::UnboundedReceiver<StreamMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = self.client.clone();
        let chat_url = construct_api_url(&self.base_url, "chat/completions");
        let api_key = self.api_key.clone();
        let request = ChatRequest::from(request);

        tokio::spawn(async move {
            debug!(
                url = %chat_url,
                messages = request.messages.len(),
                temperature = request.temperature,
                "sending completion request"
            );

            let response = match client
                .post(&chat_url)
                .header("Content-Type", "application/json")
                .bearer_auth(&api_key)
                .json(&request)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    let _ = tx.send(StreamMessage::Error(GatewayError::Transport(e.to_string())));
                    let _ = tx.send(StreamMessage::End);
                    return;
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<no body>".to_string());
                let formatted_error = format!("{} ({status})", format_api_error(&error_text));
                let _ = tx.send(StreamMessage::Error(GatewayError::Api(formatted_error)));
                let _ = tx.send(StreamMessage::End);
                return;
            }

            let mut stream = response.bytes_stream();
            let mut buffer: Vec<u8> = Vec::new();

            while let Some(chunk) = stream.next().await {
                let chunk_bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let _ = tx.send(StreamMessage::Error(GatewayError::Stream(e.to_string())));
                        let _ = tx.send(StreamMessage::End);
                        return;
                    }
                };
                buffer.extend_from_slice(&chunk_bytes);

                while let Some(newline_pos) = memchr(b'\n', &buffer) {
                    let line_str = match std::str::from_utf8(&buffer[..newline_pos]) {
                        Ok(s) => s.trim(),
                        Err(e) => {
                            let _ = tx.send(StreamMessage::Error(GatewayError::Stream(format!(
                                "invalid UTF-8 in stream: {e}"
                            ))));
                            let _ = tx.send(StreamMessage::End);
                            return;
                        }
                    };

                    let should_end = process_sse_line(line_str, &tx);
                    buffer.drain(..=newline_pos);
                    if should_end {
                        return;
                    }
                }
            }

            if finish_unterminated_stream(&buffer, &tx) {
                return;
            }
            let _ = tx.send(StreamMessage::Error(GatewayError::Stream(
                "stream ended before [DONE]".to_string(),
            )));
            let _ = tx.send(StreamMessage::End);
        });

        rx
    }
}
