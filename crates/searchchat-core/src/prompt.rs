use crate::types::{Message, Role};

/// The fixed prompt structure fed to the model on every call:
/// system instructions, prior context turns (ending with the current user
/// input), then the scratchpad accumulated within the running turn.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    system: String,
}

impl PromptTemplate {
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
        }
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    /// Render the full message sequence for one model call.
    ///
    /// The system prompt is injected only if the context doesn't already
    /// carry one.
    pub fn render(&self, context: &[Message], scratchpad: &[Message]) -> Vec<Message> {
        let mut messages = Vec::with_capacity(context.len() + scratchpad.len() + 1);
        if !context.iter().any(|m| m.role == Role::System) {
            messages.push(Message::system(&self.system));
        }
        messages.extend(context.iter().cloned());
        messages.extend(scratchpad.iter().cloned());
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolCall;

    #[test]
    fn test_system_prompt_comes_first() {
        let template = PromptTemplate::new("be helpful");
        let context = vec![Message::user("hi")];
        let rendered = template.render(&context, &[]);
        assert_eq!(rendered.len(), 2);
        assert_eq!(rendered[0].role, Role::System);
        assert_eq!(rendered[0].content, "be helpful");
        assert_eq!(rendered[1].role, Role::User);
    }

    #[test]
    fn test_existing_system_message_not_duplicated() {
        let template = PromptTemplate::new("be helpful");
        let context = vec![Message::system("custom"), Message::user("hi")];
        let rendered = template.render(&context, &[]);
        assert_eq!(rendered.len(), 2);
        assert_eq!(rendered[0].content, "custom");
    }

    #[test]
    fn test_scratchpad_follows_context() {
        let template = PromptTemplate::new("sys");
        let context = vec![
            Message::user("earlier question"),
            Message::assistant("earlier answer"),
            Message::user("what's the weather in Paris?"),
        ];
        let call = ToolCall {
            id: "call_1".into(),
            name: "web_search".into(),
            arguments: r#"{"query":"weather Paris"}"#.into(),
        };
        let scratchpad = vec![
            Message::assistant_with_tool_calls("", vec![call]),
            Message::tool_result("call_1", "Sunny, 21C"),
        ];
        let rendered = template.render(&context, &scratchpad);
        assert_eq!(rendered.len(), 6);
        // system, history pair, current input, then the scratchpad in order.
        assert_eq!(rendered[3].content, "what's the weather in Paris?");
        assert_eq!(rendered[4].role, Role::Assistant);
        assert_eq!(rendered[5].role, Role::Tool);
        assert_eq!(rendered[5].tool_call_id.as_deref(), Some("call_1"));
    }
}
