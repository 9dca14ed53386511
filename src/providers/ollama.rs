//! Native Ollama API client (`/api/chat`, `/api/tags`).
//!
//! Wire types are private to this module; callers only see the
//! provider-agnostic types from [`super`]. Streamed responses are NDJSON:
//! one JSON object per line, assistant text as `message.content` deltas,
//! tool calls delivered complete inside a chunk's `message.tool_calls`,
//! and `done: true` on the final line.

#[cfg(test)]
use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};
use uuid::Uuid;

use super::{ChatChunk, ChatRequest, ChatResponse, ChatStream, LLMProvider, ToolDefinition};
use crate::error::{AgentError, Result};
use crate::session::{Message, Role, ToolCall};

/// Sampling temperature pinned for reproducible tool-calling behavior.
const TEMPERATURE: f32 = 0.1;

/// How long to wait for the TCP connection (generation itself is unbounded,
/// local models can be slow).
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for a local Ollama server.
#[derive(Clone, Debug)]
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    /// Create a provider for `model` served at `base_url`.
    pub fn new<U: Into<String>, M: Into<String>>(base_url: U, model: M) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    /// Names of the models the server has pulled (`GET /api/tags`).
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = self.client.get(&url).send().await?;
        let resp = check_status(resp).await?;
        let tags: TagsResponse = resp.json().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    async fn send_chat(&self, request: &ChatRequest, stream: bool) -> Result<reqwest::Response> {
        let payload = create_payload(&self.model, request, stream);
        debug!(
            model = %self.model,
            messages = payload.messages.len(),
            tools = payload.tools.len(),
            stream,
            "sending chat request"
        );
        trace!(payload = ?payload, "full chat payload");

        let url = format!("{}/api/chat", self.base_url);
        let resp = self.client.post(&url).json(&payload).send().await?;
        check_status(resp).await
    }
}

#[async_trait]
impl LLMProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let resp = self.send_chat(request, false).await?;
        let line: ChatLine = resp.json().await?;
        let chunk = decode_chat_line(line)?;
        Ok(ChatResponse {
            content: chunk.content,
            tool_calls: chunk.tool_calls,
        })
    }

    async fn chat_stream(&self, request: &ChatRequest) -> Result<ChatStream> {
        let resp = self.send_chat(request, true).await?;
        let lines = Lines::new(Chunks::Response(resp));
        let stream = futures::stream::try_unfold(lines, |mut lines| async move {
            loop {
                let Some(line) = lines.next_line().await? else {
                    return Ok(None);
                };
                if line.trim().is_empty() {
                    continue;
                }
                let chunk = decode_line(&line)?;
                return Ok(Some((chunk, lines)));
            }
        });
        Ok(ChatStream::new(stream))
    }
}

/// Surface HTTP failures with the response body (Ollama reports "model not
/// found" and friends as JSON error bodies).
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let body: String = body.chars().take(300).collect();
    Err(AgentError::Provider(format!(
        "Ollama request failed (HTTP {status}): {body}"
    )))
}

// ------------------------------
// Wire types
// ------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    arguments: Value,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct ApiToolCall {
    function: ApiFunction,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
}

#[derive(Clone, Debug, Serialize)]
struct ApiToolFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Clone, Debug, Serialize)]
struct ApiTool {
    r#type: &'static str,
    function: ApiToolFunction,
}

#[derive(Clone, Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Clone, Debug, Serialize)]
struct ChatPayload {
    model: String,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool>,
    stream: bool,
    options: ChatOptions,
}

/// One NDJSON line (or the whole non-streamed body). Error responses reuse
/// the same shape with only `error` set.
#[derive(Clone, Debug, Deserialize)]
struct ChatLine {
    #[serde(default)]
    message: Option<ApiMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
struct TagModel {
    name: String,
}

#[derive(Clone, Debug, Deserialize)]
struct TagsResponse {
    models: Vec<TagModel>,
}

// ------------------------------
// Conversions
// ------------------------------

fn create_payload(model: &str, request: &ChatRequest, stream: bool) -> ChatPayload {
    ChatPayload {
        model: model.to_string(),
        messages: request.messages.iter().map(api_message).collect(),
        tools: request.tools.iter().map(api_tool).collect(),
        stream,
        options: ChatOptions {
            temperature: TEMPERATURE,
        },
    }
}

fn api_message(msg: &Message) -> ApiMessage {
    let role = match msg.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    };
    let tool_calls = if msg.tool_calls.is_empty() {
        None
    } else {
        Some(
            msg.tool_calls
                .iter()
                .map(|call| ApiToolCall {
                    function: ApiFunction {
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    },
                })
                .collect(),
        )
    };
    ApiMessage {
        role: role.to_string(),
        content: msg.content.clone(),
        tool_calls,
    }
}

fn api_tool(tool: &ToolDefinition) -> ApiTool {
    ApiTool {
        r#type: "function",
        function: ApiToolFunction {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameters.clone(),
        },
    }
}

fn decode_line(line: &str) -> Result<ChatChunk> {
    let parsed: ChatLine = serde_json::from_str(line)
        .map_err(|err| AgentError::Provider(format!("malformed response line: {err}")))?;
    decode_chat_line(parsed)
}

fn decode_chat_line(line: ChatLine) -> Result<ChatChunk> {
    if let Some(error) = line.error {
        return Err(AgentError::Provider(error));
    }

    let mut chunk = ChatChunk {
        done: line.done,
        ..Default::default()
    };
    if let Some(message) = line.message {
        chunk.content = message.content;
        // The native API carries no call ids; assign them here so tool
        // results can be correlated in the session history.
        chunk.tool_calls = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| {
                ToolCall::new(
                    format!("call_{}", Uuid::new_v4().simple()),
                    call.function.name,
                    call.function.arguments,
                )
            })
            .collect();
    }
    Ok(chunk)
}

// ------------------------------
// NDJSON reading
// ------------------------------

/// Byte-chunk source; the queue variant backs unit tests.
enum Chunks {
    Response(reqwest::Response),
    #[cfg(test)]
    Queue(VecDeque<Bytes>),
}

impl Chunks {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        match self {
            Chunks::Response(resp) => Ok(resp.chunk().await?),
            #[cfg(test)]
            Chunks::Queue(queue) => Ok(queue.pop_front()),
        }
    }
}

/// Incremental line reader over a chunk stream.
///
/// Lines are only converted to UTF-8 once complete, so multi-byte
/// characters split across chunk boundaries are handled correctly.
struct Lines {
    buf: Vec<u8>,
    chunks: Chunks,
}

impl Lines {
    fn new(chunks: Chunks) -> Self {
        Self {
            buf: Vec::new(),
            chunks,
        }
    }

    async fn next_line(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(idx) = self.buf.iter().position(|&b| b == b'\n') {
                let rest = self.buf.split_off(idx + 1);
                let mut line = std::mem::replace(&mut self.buf, rest);
                line.pop(); // the newline itself
                return Ok(Some(into_utf8(line)?));
            }

            match self.chunks.next_chunk().await? {
                Some(bytes) => self.buf.extend_from_slice(&bytes),
                None => {
                    if self.buf.is_empty() {
                        return Ok(None);
                    }
                    // Final line without a trailing newline.
                    let line = std::mem::take(&mut self.buf);
                    return Ok(Some(into_utf8(line)?));
                }
            }
        }
    }
}

fn into_utf8(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes)
        .map_err(|_| AgentError::Provider("response contained invalid UTF-8".to_string()))
}
