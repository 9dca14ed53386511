//! Core agent logic: conversation loop, context building and the default
//! system prompt.
//!
//! The agent takes user input, asks the model for a response, executes any
//! tool calls the model makes, feeds the results back, and repeats until the
//! model answers in plain text.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │     CLI     │────>│    Agent    │────>│ LLMProvider │
//! │ (rustyline) │     │             │     │  (Ollama)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │                   │
//!                            ▼                   ▼
//!                     ┌─────────────┐     ┌─────────────┐
//!                     │   Session   │     │    Tools    │
//!                     │    Store    │     │  Registry   │
//!                     └─────────────┘     └─────────────┘
//! ```

mod context;
mod r#loop;
mod prompt;


pub use context::ContextBuilder;
pub use prompt::DEFAULT_SYSTEM_PROMPT;
pub use r#loop::{Agent, AgentBuilder, AgentEvent};
