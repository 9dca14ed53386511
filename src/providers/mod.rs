//! LLM provider abstraction.
//!
//! [`LLMProvider`] is the seam between the agent loop and whatever serves
//! the model. A provider receives a [`ChatRequest`] (full message window
//! plus tool declarations) and answers either with a complete
//! [`ChatResponse`] or a [`ChatStream`] of [`ChatChunk`]s. The only real
//! implementation is [`OllamaProvider`], which speaks the native Ollama
//! HTTP API.

mod ollama;

pub use ollama::OllamaProvider;

use async_trait::async_trait;
use futures::stream::{BoxStream, Stream, StreamExt};
use serde_json::Value;

use crate::error::Result;
use crate::session::{Message, ToolCall};

/// A tool declaration advertised to the model.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: String,
    /// Human-readable description the model sees.
    pub description: String,
    /// JSON-schema of the accepted arguments.
    pub parameters: Value,
}

/// One model invocation: the message window plus available tools.
#[derive(Clone, Debug, Default)]
pub struct ChatRequest {
    /// Messages in conversation order, system prompt first.
    pub messages: Vec<Message>,
    /// Tools the model may call.
    pub tools: Vec<ToolDefinition>,
}

/// A completed (non-streamed) model response.
#[derive(Clone, Debug, Default)]
pub struct ChatResponse {
    /// Assistant text.
    pub content: String,
    /// Tool calls requested by the model, if any.
    pub tool_calls: Vec<ToolCall>,
}

/// One streamed fragment of a model response.
#[derive(Clone, Debug, Default)]
pub struct ChatChunk {
    /// Text delta (may be empty).
    pub content: String,
    /// Tool calls arriving in this chunk (delivered complete by Ollama).
    pub tool_calls: Vec<ToolCall>,
    /// Whether this is the final chunk.
    pub done: bool,
}

/// A stream of [`ChatChunk`]s from a provider.
pub struct ChatStream {
    inner: BoxStream<'static, Result<ChatChunk>>,
}

impl ChatStream {
    /// Wrap any chunk stream.
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<ChatChunk>> + Send + 'static,
    {
        Self {
            inner: stream.boxed(),
        }
    }

    /// Pull the next chunk; `None` once the stream is exhausted.
    pub async fn next(&mut self) -> Option<Result<ChatChunk>> {
        self.inner.next().await
    }
}

/// A model backend.
///
/// Implementations are stateless beyond their connection configuration and
/// must be safe to share across tasks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// One blocking round trip.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse>;

    /// Streamed variant of [`LLMProvider::chat`].
    async fn chat_stream(&self, request: &ChatRequest) -> Result<ChatStream>;
}
