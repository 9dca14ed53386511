//! Builds the message list sent to the model from a session's history.

use crate::session::{Message, Role, Session};

/// Assembles the model context: system prompt first, then a bounded window
/// of recent history.
#[derive(Clone, Debug)]
pub struct ContextBuilder {
    system_prompt: String,
    max_history: usize,
}

impl ContextBuilder {
    pub fn new<S: Into<String>>(system_prompt: S) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            max_history: 40,
        }
    }

    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history;
        self
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Build the context for one model call.
    ///
    /// The window never starts on a tool-result message: a tool result
    /// without its preceding assistant tool call is rejected by the API.
    pub fn build(&self, session: &Session) -> Vec<Message> {
        let messages = &session.messages;
        let mut start = messages.len().saturating_sub(self.max_history);
        while start < messages.len() && messages[start].role == Role::Tool {
            start += 1;
        }

        let mut context = Vec::with_capacity(1 + messages.len() - start);
        context.push(Message::system(&self.system_prompt));
        context.extend_from_slice(&messages[start..]);
        context
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::session::ToolCall;

    fn session_with(messages: Vec<Message>) -> Session {
        let mut session = Session::new("test");
        for msg in messages {
            session.add_message(msg);
        }
        session
    }

    #[test]
    fn test_system_prompt_comes_first() {
        let session = session_with(vec![Message::user("hello")]);
        let context = ContextBuilder::new("be nice").build(&session);

        assert_eq!(context.len(), 2);
        assert_eq!(context[0].role, Role::System);
        assert_eq!(context[0].content, "be nice");
        assert_eq!(context[1].content, "hello");
    }

    #[test]
    fn test_history_window_keeps_recent_messages() {
        let messages = (0..10)
            .map(|i| Message::user(format!("msg {i}")))
            .collect();
        let context = ContextBuilder::new("p")
            .with_max_history(4)
            .build(&session_with(messages));

        assert_eq!(context.len(), 5);
        assert_eq!(context[1].content, "msg 6");
        assert_eq!(context[4].content, "msg 9");
    }

    #[test]
    fn test_window_skips_leading_tool_results() {
        let messages = vec![
            Message::user("question"),
            Message::assistant_with_tools("", vec![ToolCall::new("c1", "calculate", json!({}))]),
            Message::tool_result("c1", "Result: 4"),
            Message::assistant("the answer is 4"),
        ];
        let context = ContextBuilder::new("p")
            .with_max_history(2)
            .build(&session_with(messages));

        // Window would start on the tool result; it advances past it.
        assert_eq!(context.len(), 2);
        assert_eq!(context[1].content, "the answer is 4");
    }

    #[test]
    fn test_empty_session() {
        let context = ContextBuilder::new("p").build(&Session::new("empty"));
        assert_eq!(context.len(), 1);
        assert_eq!(context[0].role, Role::System);
    }
}
