//! Conversation data types: sessions, messages, roles and tool calls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The author of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions.
    System,
    /// End-user input.
    User,
    /// Model output.
    Assistant,
    /// Tool call result.
    Tool,
}

/// A tool call requested by the model.
///
/// The native Ollama API carries no call ids; providers assign one so the
/// result message can be correlated with the request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this call.
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// Arguments as a JSON object.
    pub arguments: Value,
}

impl ToolCall {
    /// Create a tool call.
    pub fn new<I: Into<String>, N: Into<String>>(id: I, name: N, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// One message in a conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who authored the message.
    pub role: Role,
    /// Text content (may be empty for tool-call-only assistant turns).
    pub content: String,
    /// Tool calls requested by an assistant message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// For `Role::Tool` messages, the id of the call this result answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// When the message was recorded.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new<S: Into<String>>(role: Role, content: S) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }

    /// A system instruction message.
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self::new(Role::System, content)
    }

    /// A user input message.
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::new(Role::User, content)
    }

    /// A plain assistant message.
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// An assistant message that requests tool calls.
    pub fn assistant_with_tools<S: Into<String>>(content: S, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::new(Role::Assistant, content)
        }
    }

    /// A tool result message answering the call with the given id.
    pub fn tool_result<I: Into<String>, S: Into<String>>(tool_call_id: I, content: S) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::new(Role::Tool, content)
        }
    }

    /// Whether this message requests any tool calls.
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Whether this message is a tool result.
    pub fn is_tool_result(&self) -> bool {
        self.role == Role::Tool
    }
}

/// An ordered conversation identified by a key.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    /// Unique session key (e.g. `cli`).
    pub key: String,
    /// Messages in arrival order.
    pub messages: Vec<Message>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create an empty session.
    pub fn new<S: Into<String>>(key: S) -> Self {
        let now = Utc::now();
        Self {
            key: key.into(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a message and bump the modification time.
    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
        self.updated_at = Utc::now();
    }

    /// Whether the session holds no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_message_constructors() {
        let user = Message::user("Hello");
        assert_eq!(user.role, Role::User);
        assert_eq!(user.content, "Hello");
        assert!(!user.has_tool_calls());

        let tool = Message::tool_result("call_1", "42");
        assert_eq!(tool.role, Role::Tool);
        assert!(tool.is_tool_result());
        assert_eq!(tool.tool_call_id.as_deref(), Some("call_1"));

        let assistant = Message::assistant_with_tools(
            "",
            vec![ToolCall::new("call_1", "calculate", json!({"expression": "2+2"}))],
        );
        assert!(assistant.has_tool_calls());
        assert_eq!(assistant.tool_calls[0].name, "calculate");
    }

    #[test]
    fn test_message_serde_round_trip() {
        let msg = Message::assistant_with_tools(
            "Let me check.",
            vec![ToolCall::new("call_9", "web_search", json!({"query": "rust"}))],
        );
        let encoded = serde_json::to_string(&msg).unwrap();
        let decoded: Message = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_role_serialization_is_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
        assert_eq!(serde_json::to_string(&Role::Tool).unwrap(), "\"tool\"");
    }

    #[test]
    fn test_session_add_message() {
        let mut session = Session::new("test");
        assert!(session.is_empty());

        session.add_message(Message::user("hi"));
        assert_eq!(session.messages.len(), 1);
        assert!(session.updated_at >= session.created_at);
    }
}
