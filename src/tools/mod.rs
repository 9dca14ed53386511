//! Tool functions the model can invoke, plus the registry that
//! dispatches calls by name.

pub mod calculator;
pub mod time;
pub mod web_search;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

pub use calculator::CalculatorTool;
pub use time::TimeTool;
pub use web_search::WebSearchTool;

use crate::config::WebSearchConfig;
use crate::error::{AgentError, Result};
use crate::providers::ToolDefinition;

/// Shared state handed to every tool execution.
#[derive(Clone, Debug, Default)]
pub struct ToolContext {
    pub search: WebSearchConfig,
}

/// A function the model can call. Implementations describe themselves with a
/// JSON Schema and return their result as a plain string for the model to
/// read.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters(&self) -> Value;
    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<String>;
}

/// Name-indexed set of tools.
///
/// # Example
/// ```rust
/// use deepagent::tools::{ToolContext, ToolRegistry};
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let registry = ToolRegistry::default_set();
/// let ctx = ToolContext::default();
/// let result = registry.execute("calculate", json!({"expression": "6*7"}), &ctx).await;
/// assert_eq!(result.unwrap(), "Result: 42");
/// # });
/// ```
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in tools: web search, calculator, clock.
    pub fn default_set() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(WebSearchTool::new()));
        registry.register(Arc::new(CalculatorTool::new()));
        registry.register(Arc::new(TimeTool::new()));
        registry
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Definitions to advertise to the model, in a stable order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters(),
            })
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Run the named tool. Models occasionally hallucinate tool names, so an
    /// unknown name is an error the caller can feed back as text.
    pub async fn execute(&self, name: &str, args: Value, ctx: &ToolContext) -> Result<String> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| AgentError::Tool(format!("unknown tool: {name}")))?;
        tool.execute(args, ctx).await
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_default_set_contains_builtin_tools() {
        let registry = ToolRegistry::default_set();
        assert_eq!(registry.len(), 3);

        let names: Vec<String> = registry
            .definitions()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["calculate", "get_current_time", "web_search"]);
    }

    #[test]
    fn test_definitions_are_json_schemas() {
        for def in ToolRegistry::default_set().definitions() {
            assert_eq!(def.parameters["type"], "object");
            assert!(!def.description.is_empty());
        }
    }

    #[tokio::test]
    async fn test_execute_unknown_tool() {
        let registry = ToolRegistry::default_set();
        let err = registry
            .execute("launch_missiles", json!({}), &ToolContext::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unknown tool: launch_missiles"));
    }

    #[tokio::test]
    async fn test_execute_dispatches_by_name() {
        let registry = ToolRegistry::default_set();
        let output = registry
            .execute(
                "calculate",
                json!({"expression": "6*7"}),
                &ToolContext::default(),
            )
            .await
            .unwrap();
        assert_eq!(output, "Result: 42");
    }
}
