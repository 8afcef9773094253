use crate::config::ProviderConfig;
use crate::error::AgentError;
use crate::types::{Message, Role, ToolCall, ToolSchema};

use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionToolArgs, ChatCompletionToolType, CreateChatCompletionRequestArgs,
    FunctionObjectArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use std::time::Duration;

/// One model call: the rendered message sequence plus the tool schemas the
/// model may invoke.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolSchema>,
}

/// The model's reply: either direct content, or one or more tool calls
/// (possibly alongside content).
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

/// Seam between the agent loop and the wire client. The loop only ever sees
/// this trait, so it can be driven by a scripted provider in tests.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, AgentError>;
}

/// Chat provider over any OpenAI-compatible endpoint (Groq by default).
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout_secs: u64,
}

impl OpenAiProvider {
    pub fn new(config: &ProviderConfig, api_key: &str) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_base(&config.api_base)
            .with_api_key(api_key);
        Self {
            client: Client::with_config(openai_config),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout_secs: config.timeout_secs,
        }
    }

    /// Convert our neutral Message types to async-openai request messages.
    fn build_openai_messages(
        messages: &[Message],
    ) -> Result<Vec<ChatCompletionRequestMessage>, AgentError> {
        let mut result = Vec::with_capacity(messages.len());

        for msg in messages {
            match msg.role {
                Role::System => {
                    let m = ChatCompletionRequestSystemMessageArgs::default()
                        .content(msg.content.as_str())
                        .build()
                        .map_err(|e| AgentError::Provider(e.to_string()))?;
                    result.push(ChatCompletionRequestMessage::System(m));
                }
                Role::User => {
                    let m = ChatCompletionRequestUserMessageArgs::default()
                        .content(msg.content.as_str())
                        .build()
                        .map_err(|e| AgentError::Provider(e.to_string()))?;
                    result.push(ChatCompletionRequestMessage::User(m));
                }
                Role::Assistant => {
                    let mut builder = ChatCompletionRequestAssistantMessageArgs::default();
                    builder.content(msg.content.as_str());
                    if let Some(tool_calls) = &msg.tool_calls {
                        let tc_openai: Vec<ChatCompletionMessageToolCall> = tool_calls
                            .iter()
                            .map(|tc| ChatCompletionMessageToolCall {
                                id: tc.id.clone(),
                                r#type: ChatCompletionToolType::Function,
                                function: async_openai::types::FunctionCall {
                                    name: tc.name.clone(),
                                    arguments: tc.arguments.clone(),
                                },
                            })
                            .collect();
                        builder.tool_calls(tc_openai);
                    }
                    let m = builder
                        .build()
                        .map_err(|e| AgentError::Provider(e.to_string()))?;
                    result.push(ChatCompletionRequestMessage::Assistant(m));
                }
                Role::Tool => {
                    let m = ChatCompletionRequestToolMessageArgs::default()
                        .tool_call_id(msg.tool_call_id.as_deref().unwrap_or(""))
                        .content(msg.content.as_str())
                        .build()
                        .map_err(|e| AgentError::Provider(e.to_string()))?;
                    result.push(ChatCompletionRequestMessage::Tool(m));
                }
            }
        }

        Ok(result)
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, AgentError> {
        let messages = Self::build_openai_messages(&request.messages)?;

        let mut request_builder = CreateChatCompletionRequestArgs::default();
        request_builder
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .max_completion_tokens(self.max_tokens);

        if !request.tools.is_empty() {
            let tools: Vec<_> = request
                .tools
                .iter()
                .map(|s| {
                    let func = FunctionObjectArgs::default()
                        .name(&s.name)
                        .description(&s.description)
                        .parameters(s.parameters.clone())
                        .build()
                        .map_err(|e| AgentError::Schema(format!("function '{}': {}", s.name, e)))?;
                    ChatCompletionToolArgs::default()
                        .r#type(ChatCompletionToolType::Function)
                        .function(func)
                        .build()
                        .map_err(|e| AgentError::Schema(format!("tool '{}': {}", s.name, e)))
                })
                .collect::<Result<Vec<_>, _>>()?;
            request_builder.tools(tools);
        }

        let request = request_builder
            .build()
            .map_err(|e| AgentError::Provider(e.to_string()))?;

        // Every call carries an explicit deadline; a hung endpoint surfaces
        // as a Timeout rather than blocking the turn forever.
        let response = tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            self.client.chat().create(request),
        )
        .await
        .map_err(|_| AgentError::Timeout(self.timeout_secs))?
        .map_err(|e| AgentError::Provider(e.to_string()))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Provider("No choices in response".into()))?;

        let content = choice.message.content.unwrap_or_default();
        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments: tc.function.arguments,
            })
            .collect();

        Ok(Completion {
            content,
            tool_calls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_openai_messages_preserves_order_and_roles() {
        let messages = vec![
            Message::system("sys"),
            Message::user("question"),
            Message::assistant("answer"),
            Message::tool_result("call_1", "observation"),
        ];
        let built = OpenAiProvider::build_openai_messages(&messages).unwrap();
        assert_eq!(built.len(), 4);
        assert!(matches!(built[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(built[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(built[2], ChatCompletionRequestMessage::Assistant(_)));
        assert!(matches!(built[3], ChatCompletionRequestMessage::Tool(_)));
    }

    #[test]
    fn test_assistant_tool_calls_carried_through() {
        let call = ToolCall {
            id: "call_9".into(),
            name: "web_search".into(),
            arguments: r#"{"query":"rust"}"#.into(),
        };
        let messages = vec![Message::assistant_with_tool_calls("", vec![call])];
        let built = OpenAiProvider::build_openai_messages(&messages).unwrap();
        match &built[0] {
            ChatCompletionRequestMessage::Assistant(m) => {
                let calls = m.tool_calls.as_ref().unwrap();
                assert_eq!(calls.len(), 1);
                assert_eq!(calls[0].function.name, "web_search");
            }
            other => panic!("expected assistant message, got {other:?}"),
        }
    }
}
