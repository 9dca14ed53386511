//! Configuration for DeepAgent.
//!
//! Configuration is read once from environment variables (after an optional
//! `.env` file loaded by the binary) and is immutable afterwards:
//!
//! - `OLLAMA_BASE_URL` - Required. Base URL of the Ollama server.
//! - `OLLAMA_MODEL` - Required. Model name to use.
//! - `USE_LONGTERM_MEMORY` - Optional. Persist conversations across runs. Defaults to `false`.
//! - `CUSTOM_SYSTEM_PROMPT` - Optional. Overrides the built-in system prompt.
//! - `WEB_SEARCH_MAX_RESULTS` - Optional. Defaults to `5`.
//! - `WEB_SEARCH_REGION` - Optional. Defaults to `us-en`.
//! - `WEB_SEARCH_SAFESEARCH` - Optional. `off`, `moderate` or `strict`. Defaults to `moderate`.
//! - `AGENT_MAX_ITERATIONS` - Optional. Cap on model/tool round trips per query. Defaults to `10`.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AgentError, Result};

/// Web search defaults passed to the `web_search` tool.
///
/// Individual tool calls may override any of these per invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct WebSearchConfig {
    /// Maximum number of results to return.
    pub max_results: usize,
    /// DuckDuckGo region code (e.g. `us-en`).
    pub region: String,
    /// Safe search level: `off`, `moderate` or `strict`.
    pub safesearch: String,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            max_results: 5,
            region: "us-en".to_string(),
            safesearch: "moderate".to_string(),
        }
    }
}

/// DeepAgent configuration, loaded once at startup.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Base URL of the Ollama server (e.g. `http://localhost:11434`).
    pub ollama_base_url: String,
    /// Ollama model name (e.g. `qwen3:8b`).
    pub ollama_model: String,
    /// Whether conversations are persisted across runs.
    pub use_longterm_memory: bool,
    /// Custom system prompt, if set.
    pub custom_system_prompt: Option<String>,
    /// Web search defaults.
    pub web_search: WebSearchConfig,
    /// Cap on model/tool round trips per query.
    pub max_iterations: usize,
}

impl Config {
    /// Load the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value fails
    /// to parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self> {
        let ollama_base_url = lookup("OLLAMA_BASE_URL").ok_or_else(|| {
            AgentError::Config("OLLAMA_BASE_URL environment variable is required".to_string())
        })?;
        let ollama_model = lookup("OLLAMA_MODEL").ok_or_else(|| {
            AgentError::Config("OLLAMA_MODEL environment variable is required".to_string())
        })?;

        let use_longterm_memory = lookup("USE_LONGTERM_MEMORY")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        let custom_system_prompt = lookup("CUSTOM_SYSTEM_PROMPT").filter(|v| !v.is_empty());

        let defaults = WebSearchConfig::default();
        let max_results = match lookup("WEB_SEARCH_MAX_RESULTS") {
            Some(v) => v.parse::<usize>().map_err(|_| {
                AgentError::Config(format!("invalid value for WEB_SEARCH_MAX_RESULTS: {v}"))
            })?,
            None => defaults.max_results,
        };
        let region = lookup("WEB_SEARCH_REGION").unwrap_or(defaults.region);
        let safesearch = lookup("WEB_SEARCH_SAFESEARCH").unwrap_or(defaults.safesearch);

        let max_iterations = match lookup("AGENT_MAX_ITERATIONS") {
            Some(v) => v.parse::<usize>().map_err(|_| {
                AgentError::Config(format!("invalid value for AGENT_MAX_ITERATIONS: {v}"))
            })?,
            None => 10,
        };

        Ok(Self {
            ollama_base_url,
            ollama_model,
            use_longterm_memory,
            custom_system_prompt,
            web_search: WebSearchConfig {
                max_results,
                region,
                safesearch,
            },
            max_iterations,
        })
    }

    /// Replace the model name (CLI `--model` override, applied at load time).
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.ollama_model = model.into();
        self
    }

    /// Replace the base URL (CLI `--base-url` override, applied at load time).
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.ollama_base_url = base_url.into();
        self
    }

    /// Verify that the Ollama server is reachable.
    ///
    /// Probes `GET {base_url}/api/tags` with a 5-second timeout. Any HTTP
    /// success means the server is up; everything else is reported in a
    /// human-readable error.
    pub async fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        let url = format!("{}/api/tags", self.ollama_base_url.trim_end_matches('/'));
        match client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => errors.push(format!(
                "Ollama server not accessible at {} (HTTP {})",
                self.ollama_base_url,
                resp.status()
            )),
            Err(err) => errors.push(format!("Cannot connect to Ollama server: {err}")),
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AgentError::Config(format!(
                "configuration validation failed:\n{}",
                errors.join("\n")
            )))
        }
    }

    /// Per-user data directory (`~/.deepagent`), used for session storage.
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".deepagent")
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DeepAgent Configuration:")?;
        writeln!(f, "{}", "=".repeat(30))?;
        writeln!(f, "Ollama Base URL: {}", self.ollama_base_url)?;
        writeln!(f, "Ollama Model: {}", self.ollama_model)?;
        writeln!(f, "Use Long-term Memory: {}", self.use_longterm_memory)?;
        writeln!(f, "Web Search Max Results: {}", self.web_search.max_results)?;
        writeln!(f, "Web Search Region: {}", self.web_search.region)?;
        writeln!(f, "Web Search SafeSearch: {}", self.web_search.safesearch)?;
        writeln!(f, "Agent Max Iterations: {}", self.max_iterations)?;
        if let Some(prompt) = &self.custom_system_prompt {
            let preview: String = prompt.chars().take(100).collect();
            writeln!(f, "Custom System Prompt: {preview}...")?;
        }
        write!(f, "{}", "=".repeat(30))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn load(pairs: &[(&str, &str)]) -> Result<Config> {
        let map = env(pairs);
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_minimal_config() {
        let config = load(&[
            ("OLLAMA_BASE_URL", "http://localhost:11434"),
            ("OLLAMA_MODEL", "qwen3:8b"),
        ])
        .unwrap();

        assert_eq!(config.ollama_base_url, "http://localhost:11434");
        assert_eq!(config.ollama_model, "qwen3:8b");
        assert!(!config.use_longterm_memory);
        assert!(config.custom_system_prompt.is_none());
        assert_eq!(config.web_search, WebSearchConfig::default());
        assert_eq!(config.max_iterations, 10);
    }

    #[test]
    fn test_missing_required_vars() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("OLLAMA_BASE_URL"));

        let err = load(&[("OLLAMA_BASE_URL", "http://localhost:11434")]).unwrap_err();
        assert!(err.to_string().contains("OLLAMA_MODEL"));
    }

    #[test]
    fn test_memory_toggle_parsing() {
        for (value, expected) in [("true", true), ("TRUE", true), ("false", false), ("1", false)] {
            let config = load(&[
                ("OLLAMA_BASE_URL", "http://localhost:11434"),
                ("OLLAMA_MODEL", "m"),
                ("USE_LONGTERM_MEMORY", value),
            ])
            .unwrap();
            assert_eq!(config.use_longterm_memory, expected, "value: {value}");
        }
    }

    #[test]
    fn test_web_search_overrides() {
        let config = load(&[
            ("OLLAMA_BASE_URL", "http://localhost:11434"),
            ("OLLAMA_MODEL", "m"),
            ("WEB_SEARCH_MAX_RESULTS", "10"),
            ("WEB_SEARCH_REGION", "de-de"),
            ("WEB_SEARCH_SAFESEARCH", "strict"),
        ])
        .unwrap();

        assert_eq!(config.web_search.max_results, 10);
        assert_eq!(config.web_search.region, "de-de");
        assert_eq!(config.web_search.safesearch, "strict");
    }

    #[test]
    fn test_invalid_numeric_value() {
        let err = load(&[
            ("OLLAMA_BASE_URL", "http://localhost:11434"),
            ("OLLAMA_MODEL", "m"),
            ("WEB_SEARCH_MAX_RESULTS", "lots"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("WEB_SEARCH_MAX_RESULTS"));
    }

    #[test]
    fn test_empty_custom_prompt_ignored() {
        let config = load(&[
            ("OLLAMA_BASE_URL", "http://localhost:11434"),
            ("OLLAMA_MODEL", "m"),
            ("CUSTOM_SYSTEM_PROMPT", ""),
        ])
        .unwrap();
        assert!(config.custom_system_prompt.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("OLLAMA_BASE_URL", "http://localhost:11434"),
            ("OLLAMA_MODEL", "m"),
        ])
        .unwrap()
        .with_model("llama3.2")
        .with_base_url("http://10.0.0.2:11434");

        assert_eq!(config.ollama_model, "llama3.2");
        assert_eq!(config.ollama_base_url, "http://10.0.0.2:11434");
    }

    #[test]
    fn test_display_dump() {
        let config = load(&[
            ("OLLAMA_BASE_URL", "http://localhost:11434"),
            ("OLLAMA_MODEL", "qwen3:8b"),
            ("CUSTOM_SYSTEM_PROMPT", "You are terse."),
        ])
        .unwrap();

        let dump = config.to_string();
        assert!(dump.contains("Ollama Base URL: http://localhost:11434"));
        assert!(dump.contains("Ollama Model: qwen3:8b"));
        assert!(dump.contains("Custom System Prompt: You are terse."));
    }
}
