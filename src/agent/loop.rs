//! The conversation loop: call the model, run tool calls, repeat.

use serde_json::Value;
use tracing::{debug, warn};

use super::context::ContextBuilder;
use super::prompt::DEFAULT_SYSTEM_PROMPT;
use crate::config::{Config, WebSearchConfig};
use crate::error::{AgentError, Result};
use crate::providers::{ChatRequest, LLMProvider, OllamaProvider};
use crate::session::{Message, Session, SessionStore, ToolCall};
use crate::tools::{ToolContext, ToolRegistry};

/// Progress notifications emitted while [`Agent::run`] works.
#[derive(Clone, Debug, PartialEq)]
pub enum AgentEvent {
    /// A piece of streamed assistant text.
    TextDelta(String),
    /// The model invoked a tool.
    ToolUse { name: String, args: Value },
    /// A tool finished; `output` is truncated for display.
    ToolResult { name: String, output: String },
}

/// How much tool output to show in [`AgentEvent::ToolResult`].
const TOOL_PREVIEW_CHARS: usize = 100;

pub struct Agent {
    provider: Box<dyn LLMProvider>,
    tools: ToolRegistry,
    store: SessionStore,
    context: ContextBuilder,
    tool_ctx: ToolContext,
    session_key: String,
    show_tools: bool,
    max_iterations: usize,
}

impl Agent {
    pub fn builder(provider: Box<dyn LLMProvider>) -> AgentBuilder {
        AgentBuilder::new(provider)
    }

    /// Run one user turn, streaming progress through `on_event`.
    ///
    /// Loops until the model responds without tool calls, then returns the
    /// final assistant text. Tool failures are not fatal: the error text is
    /// fed back so the model can recover or explain.
    pub async fn run<F>(&self, input: &str, mut on_event: F) -> Result<String>
    where
        F: FnMut(AgentEvent),
    {
        let mut session = self.store.get_or_create(&self.session_key).await?;
        session.add_message(Message::user(input));

        for iteration in 0..self.max_iterations {
            debug!(iteration, provider = self.provider.name(), "model turn");
            let request = self.request_for(&session);
            let mut stream = self.provider.chat_stream(&request).await?;

            let mut content = String::new();
            let mut tool_calls: Vec<ToolCall> = Vec::new();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                if !chunk.content.is_empty() {
                    on_event(AgentEvent::TextDelta(chunk.content.clone()));
                    content.push_str(&chunk.content);
                }
                tool_calls.extend(chunk.tool_calls);
            }

            if tool_calls.is_empty() {
                session.add_message(Message::assistant(&content));
                self.store.save(&session).await?;
                return Ok(content);
            }

            session.add_message(Message::assistant_with_tools(&content, tool_calls.clone()));
            self.run_tool_calls(&mut session, tool_calls, &mut on_event)
                .await;
            self.store.save(&session).await?;
        }

        Err(AgentError::Agent(format!(
            "no final answer after {} iterations",
            self.max_iterations
        )))
    }

    /// Non-streaming variant of [`Agent::run`]: one complete response per
    /// model turn, no progress events.
    pub async fn chat(&self, input: &str) -> Result<String> {
        let mut session = self.store.get_or_create(&self.session_key).await?;
        session.add_message(Message::user(input));

        for iteration in 0..self.max_iterations {
            debug!(iteration, provider = self.provider.name(), "model turn");
            let request = self.request_for(&session);
            let response = self.provider.chat(&request).await?;

            if response.tool_calls.is_empty() {
                session.add_message(Message::assistant(&response.content));
                self.store.save(&session).await?;
                return Ok(response.content);
            }

            session.add_message(Message::assistant_with_tools(
                &response.content,
                response.tool_calls.clone(),
            ));
            self.run_tool_calls(&mut session, response.tool_calls, &mut |_| {})
                .await;
            self.store.save(&session).await?;
        }

        Err(AgentError::Agent(format!(
            "no final answer after {} iterations",
            self.max_iterations
        )))
    }

    /// Forget the stored conversation.
    pub async fn reset(&self) -> Result<()> {
        self.store.delete(&self.session_key).await
    }

    fn request_for(&self, session: &Session) -> ChatRequest {
        ChatRequest {
            messages: self.context.build(session),
            tools: self.tools.definitions(),
        }
    }

    async fn run_tool_calls<F>(
        &self,
        session: &mut Session,
        tool_calls: Vec<ToolCall>,
        on_event: &mut F,
    ) where
        F: FnMut(AgentEvent),
    {
        for call in tool_calls {
            if self.show_tools {
                on_event(AgentEvent::ToolUse {
                    name: call.name.clone(),
                    args: call.arguments.clone(),
                });
            }

            let output = match self
                .tools
                .execute(&call.name, call.arguments.clone(), &self.tool_ctx)
                .await
            {
                Ok(output) => output,
                Err(err) => {
                    warn!(tool = %call.name, error = %err, "tool failed");
                    format!("Error: {err}")
                }
            };

            if self.show_tools {
                on_event(AgentEvent::ToolResult {
                    name: call.name.clone(),
                    output: preview(&output, TOOL_PREVIEW_CHARS),
                });
            }
            session.add_message(Message::tool_result(&call.id, &output));
        }
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}

pub struct AgentBuilder {
    provider: Box<dyn LLMProvider>,
    tools: ToolRegistry,
    store: SessionStore,
    system_prompt: String,
    search: WebSearchConfig,
    session_key: String,
    show_tools: bool,
    max_iterations: usize,
}

impl AgentBuilder {
    pub fn new(provider: Box<dyn LLMProvider>) -> Self {
        Self {
            provider,
            tools: ToolRegistry::default_set(),
            store: SessionStore::in_memory(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            search: WebSearchConfig::default(),
            session_key: "cli".to_string(),
            show_tools: false,
            max_iterations: 10,
        }
    }

    /// Builder wired from configuration: Ollama provider, persistent or
    /// in-memory session store, prompt override and search settings.
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = OllamaProvider::new(&config.ollama_base_url, &config.ollama_model)?;
        let store = if config.use_longterm_memory {
            SessionStore::persistent()?
        } else {
            SessionStore::in_memory()
        };

        let mut builder = Self::new(Box::new(provider))
            .store(store)
            .search(config.web_search.clone())
            .max_iterations(config.max_iterations);
        if let Some(prompt) = &config.custom_system_prompt {
            builder = builder.system_prompt(prompt);
        }
        Ok(builder)
    }

    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn store(mut self, store: SessionStore) -> Self {
        self.store = store;
        self
    }

    pub fn system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn search(mut self, search: WebSearchConfig) -> Self {
        self.search = search;
        self
    }

    pub fn session_key<S: Into<String>>(mut self, key: S) -> Self {
        self.session_key = key.into();
        self
    }

    pub fn show_tools(mut self, show: bool) -> Self {
        self.show_tools = show;
        self
    }

    pub fn max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn build(self) -> Agent {
        Agent {
            provider: self.provider,
            tools: self.tools,
            store: self.store,
            context: ContextBuilder::new(self.system_prompt),
            tool_ctx: ToolContext {
                search: self.search,
            },
            session_key: self.session_key,
            show_tools: self.show_tools,
            max_iterations: self.max_iterations,
        }
    }
}
