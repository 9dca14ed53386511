//! Arithmetic evaluation tool.
//!
//! A small recursive-descent parser over `+ - * /` with parentheses and
//! decimals. Input is whitelisted to arithmetic characters before parsing,
//! so the model cannot sneak anything else in.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::{Tool, ToolContext};
use crate::error::{AgentError, Result};

const ALLOWED_CHARS: &str = "0123456789+-*/()., ";

/// # Example
/// ```rust
/// use deepagent::tools::{CalculatorTool, Tool, ToolContext};
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let tool = CalculatorTool::new();
/// let ctx = ToolContext::default();
/// let result = tool.execute(json!({"expression": "2 + 3 * 4"}), &ctx).await;
/// assert_eq!(result.unwrap(), "Result: 14");
/// # });
/// ```
#[derive(Clone, Debug, Default)]
pub struct CalculatorTool;

impl CalculatorTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculate"
    }

    fn description(&self) -> &str {
        "Perform mathematical calculations. Supports +, -, *, / and parentheses."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Mathematical expression to evaluate, e.g. '2 + 3 * 4'"
                }
            },
            "required": ["expression"]
        })
    }

    async fn execute(&self, args: Value, _ctx: &ToolContext) -> Result<String> {
        let expression = args
            .get("expression")
            .and_then(Value::as_str)
            .ok_or_else(|| AgentError::Tool("calculate requires an 'expression' string".to_string()))?;

        debug!(expression, "evaluating expression");
        let result = evaluate(expression)?;

        // Render whole numbers without the trailing ".0".
        if result.fract() == 0.0 && result.abs() < 1e15 {
            Ok(format!("Result: {}", result as i64))
        } else {
            Ok(format!("Result: {result}"))
        }
    }
}

/// Evaluate an arithmetic expression.
pub fn evaluate(expression: &str) -> Result<f64> {
    if let Some(bad) = expression.chars().find(|c| !ALLOWED_CHARS.contains(*c)) {
        return Err(AgentError::Tool(format!(
            "invalid character in expression: '{bad}'"
        )));
    }

    let mut parser = Parser {
        chars: expression.chars().collect(),
        pos: 0,
    };
    let value = parser.expr()?;
    if let Some(c) = parser.peek() {
        return Err(AgentError::Tool(format!(
            "unexpected character at position {}: '{c}'",
            parser.pos
        )));
    }
    Ok(value)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    /// Skip whitespace and look at the next token character. Whitespace
    /// separates tokens, so `2 2` is a syntax error rather than `22`.
    fn peek(&mut self) -> Option<char> {
        while matches!(self.chars.get(self.pos), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
        self.chars.get(self.pos).copied()
    }

    fn expr(&mut self) -> Result<f64> {
        let mut value = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                '+' => {
                    self.pos += 1;
                    value += self.term()?;
                }
                '-' => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64> {
        let mut value = self.factor()?;
        while let Some(op) = self.peek() {
            match op {
                '*' => {
                    self.pos += 1;
                    value *= self.factor()?;
                }
                '/' => {
                    self.pos += 1;
                    let divisor = self.factor()?;
                    if divisor == 0.0 {
                        return Err(AgentError::Tool("division by zero".to_string()));
                    }
                    value /= divisor;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn factor(&mut self) -> Result<f64> {
        match self.peek() {
            Some('-') => {
                self.pos += 1;
                Ok(-self.factor()?)
            }
            Some('(') => {
                self.pos += 1;
                let value = self.expr()?;
                if self.peek() != Some(')') {
                    return Err(AgentError::Tool("missing closing parenthesis".to_string()));
                }
                self.pos += 1;
                Ok(value)
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) => Err(AgentError::Tool(format!(
                "unexpected character at position {}: '{c}'",
                self.pos
            ))),
            None => Err(AgentError::Tool("unexpected end of expression".to_string())),
        }
    }

    // Scans the raw characters: whitespace ends the number, so adjacent
    // numbers are caught by the caller as a stray token.
    fn number(&mut self) -> Result<f64> {
        let start = self.pos;
        while matches!(self.chars.get(self.pos), Some(c) if c.is_ascii_digit() || *c == '.') {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse()
            .map_err(|_| AgentError::Tool(format!("invalid number: '{text}'")))
    }
}
