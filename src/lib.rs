//! DeepAgent: a command-line AI assistant backed by a local Ollama server.
//!
//! The crate wires four pieces together:
//!
//! - [`config`]: a flat configuration record read once from environment
//!   variables,
//! - [`providers`]: the [`providers::LLMProvider`] trait and its native
//!   Ollama implementation (`/api/chat`, streamed NDJSON),
//! - [`tools`]: the toolset exposed to the model (web search, calculator,
//!   clock) behind a small registry,
//! - [`agent`]: the loop that builds conversation context, calls the model,
//!   dispatches requested tool calls, and iterates until a final answer.
//!
//! Conversation state lives in [`session`]; with long-term memory enabled it
//! is persisted as JSON under the per-user data directory.

pub mod agent;
pub mod config;
pub mod error;
pub mod providers;
pub mod session;
pub mod tools;

pub use agent::{Agent, AgentBuilder, AgentEvent};
pub use config::Config;
pub use error::{AgentError, Result};
