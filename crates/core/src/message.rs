//! Message and Transcript domain types.
//!
//! A transcript is the ordered message history exchanged with the LLM within
//! one turn: system instruction, the user's chat, then assistant tool calls
//! interleaved with their tool results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role of a message sender in a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI assistant
    Assistant,
    /// System instructions
    System,
    /// Tool execution result
    Tool,
}

/// A single message in a transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content (may be empty when the message only carries tool calls)
    pub content: String,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,

    /// If this is a tool result, which tool call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, content: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            tool_calls: Vec::new(),
            tool_call_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content.into())
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content.into())
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content.into())
    }

    /// Create an assistant message that carries a single tool call and no text.
    pub fn assistant_tool_call(call: MessageToolCall) -> Self {
        let mut msg = Self::with_role(Role::Assistant, String::new());
        msg.tool_calls.push(call);
        msg
    }

    /// Create a tool result message.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        let mut msg = Self::with_role(Role::Tool, content.into());
        msg.tool_call_id = Some(tool_call_id.into());
        msg
    }
}

/// A tool call embedded in an assistant message, in wire form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageToolCall {
    /// Unique ID for this tool call
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as JSON string
    pub arguments: String,
}

/// The ordered message history of one turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    pub messages: Vec<Message>,
}

impl Transcript {
    /// Start a transcript with a system instruction followed by the user's message.
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system), Message::user(user)],
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Replace the leading system message, inserting one if missing.
    pub fn replace_system(&mut self, content: impl Into<String>) {
        match self.messages.first_mut() {
            Some(first) if first.role == Role::System => *first = Message::system(content),
            _ => self.messages.insert(0, Message::system(content)),
        }
    }

    /// Replace the first user message. Returns false when the transcript has none.
    pub fn replace_first_user(&mut self, content: impl Into<String>) -> bool {
        match self.messages.iter_mut().find(|m| m.role == Role::User) {
            Some(msg) => {
                *msg = Message::user(content);
                true
            }
            None => false,
        }
    }

    /// All tool-result messages, in order.
    pub fn tool_results(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.role == Role::Tool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("Hello, journal!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello, journal!");
        assert!(msg.tool_calls.is_empty());
    }

    #[test]
    fn tool_result_links_call_id() {
        let msg = Message::tool_result("call_7", r#"{"success":true}"#);
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_7"));
    }

    #[test]
    fn assistant_tool_call_has_empty_content() {
        let msg = Message::assistant_tool_call(MessageToolCall {
            id: "call_1".into(),
            name: "calendar_insert".into(),
            arguments: "{}".into(),
        });
        assert_eq!(msg.role, Role::Assistant);
        assert!(msg.content.is_empty());
        assert_eq!(msg.tool_calls.len(), 1);
    }

    #[test]
    fn transcript_rewrites_system_and_user() {
        let mut t = Transcript::new("extract", "I went running");
        t.push(Message::tool_result("c1", "ok"));

        t.replace_system("answer conversationally");
        assert!(t.replace_first_user("Original request: I went running"));

        assert_eq!(t.len(), 3);
        assert_eq!(t.messages[0].role, Role::System);
        assert_eq!(t.messages[0].content, "answer conversationally");
        assert_eq!(t.messages[1].content, "Original request: I went running");
        assert_eq!(t.tool_results().count(), 1);
    }

    #[test]
    fn replace_system_inserts_when_missing() {
        let mut t = Transcript::default();
        t.push(Message::user("hi"));
        t.replace_system("sys");
        assert_eq!(t.messages[0].role, Role::System);
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn tool_call_serialization_omits_empty_fields() {
        let msg = Message::user("Test message");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("tool_calls"));
        assert!(!json.contains("tool_call_id"));
    }
}
