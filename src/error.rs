//! Error types for DeepAgent.
//!
//! All fallible operations in the crate return [`Result`], an alias over
//! [`AgentError`]. Failures that cross the model boundary (a tool call that
//! fails, a provider that is unreachable) are stringified by the agent loop
//! before being fed back to the model; nothing in this crate retries.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, AgentError>;

/// The error type for all DeepAgent operations.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Configuration is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// The LLM provider returned an error or was unreachable.
    #[error("provider error: {0}")]
    Provider(String),

    /// A tool call failed.
    #[error("tool error: {0}")]
    Tool(String),

    /// The agent loop itself failed (e.g. iteration cap reached).
    #[error("agent error: {0}")]
    Agent(String),

    /// HTTP transport failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem failure (session persistence).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
