use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One message in a conversation. Immutable once created; histories only
/// ever append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    /// For tool observations: the tool call this message answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// For assistant messages: the tool invocations the model requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            tool_call_id: None,
            tool_calls: None,
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// An assistant message requesting tool invocations (scratchpad only).
    pub fn assistant_with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: Some(tool_calls),
            ..Self::with_role(Role::Assistant, content)
        }
    }

    /// A tool observation answering `tool_call_id` (scratchpad only).
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::with_role(Role::Tool, content)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A single tool invocation requested by the model. `arguments` is the raw
/// JSON string as the model produced it; parsing happens in the loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

/// What the model is told about a tool: name, usage description, and the
/// JSON Schema of its parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// The observation a tool execution produced, tied back to its call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub content: String,
    pub is_error: bool,
}

/// One tool-call/result pair recorded on the scratchpad during a turn.
#[derive(Debug, Clone)]
pub struct ToolExchange {
    pub call: ToolCall,
    pub output: ToolOutput,
}

/// The outcome of a single user turn: the final assistant message plus the
/// scratchpad accumulated along the way. The scratchpad is transient — it is
/// never written back into session history.
#[derive(Debug, Clone)]
pub struct TurnResult {
    pub message: Message,
    pub scratchpad: Vec<ToolExchange>,
}

/// Streaming event emitted during agent execution.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// A chunk of the assistant's response content.
    ContentChunk(String),
    /// The assistant is calling a tool.
    ToolCallStart { id: String, name: String },
    /// Tool execution completed.
    ToolResult(ToolOutput),
    /// The full assistant message is complete.
    Done(Message),
    /// An error occurred.
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_role_and_fields() {
        assert_eq!(Message::user("q").role, Role::User);
        assert_eq!(Message::system("s").role, Role::System);

        let plain = Message::assistant("a");
        assert!(plain.tool_calls.is_none() && plain.tool_call_id.is_none());

        let call = ToolCall {
            id: "call_1".into(),
            name: "web_search".into(),
            arguments: "{}".into(),
        };
        let with_calls = Message::assistant_with_tool_calls("", vec![call]);
        assert_eq!(with_calls.tool_calls.as_ref().unwrap()[0].name, "web_search");

        let observation = Message::tool_result("call_1", "result");
        assert_eq!(observation.role, Role::Tool);
        assert_eq!(observation.tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn test_messages_get_unique_ids() {
        assert_ne!(Message::user("a").id, Message::user("a").id);
    }
}
