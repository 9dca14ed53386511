//! Clock tool: reports the current local date and time.

use async_trait::async_trait;
use chrono::Local;
use serde_json::{json, Value};

use super::{Tool, ToolContext};
use crate::error::Result;

#[derive(Clone, Debug, Default)]
pub struct TimeTool;

impl TimeTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for TimeTool {
    fn name(&self) -> &str {
        "get_current_time"
    }

    fn description(&self) -> &str {
        "Get the current date and time."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _args: Value, _ctx: &ToolContext) -> Result<String> {
        Ok(format!(
            "Current time: {}",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;

    #[tokio::test]
    async fn test_output_is_formatted_timestamp() {
        let out = TimeTool::new()
            .execute(json!({}), &ToolContext::default())
            .await
            .unwrap();

        let stamp = out.strip_prefix("Current time: ").unwrap();
        assert!(NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S").is_ok());
    }
}
