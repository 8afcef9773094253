use crate::config::AppConfig;
use crate::error::AgentError;
use crate::prompt::PromptTemplate;
use crate::provider::{ChatProvider, CompletionRequest};
use crate::tool_registry::ToolRegistry;
use crate::types::{AgentEvent, Message, ToolExchange, ToolOutput, TurnResult};

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// The core agent loop — orchestrates model calls and tool execution for one
/// turn at a time.
///
/// Per turn: model call → zero or more tool rounds → final answer. The
/// number of tool rounds is bounded; exceeding the bound fails the turn with
/// a distinct error instead of looping indefinitely.
pub struct AgentLoop {
    provider: Arc<dyn ChatProvider>,
    tool_registry: Arc<ToolRegistry>,
    prompt: PromptTemplate,
    max_tool_rounds: usize,
}

impl AgentLoop {
    pub fn new(
        config: &AppConfig,
        provider: Arc<dyn ChatProvider>,
        tool_registry: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            provider,
            tool_registry,
            prompt: PromptTemplate::new(&config.system_prompt),
            max_tool_rounds: config.agent.max_tool_rounds,
        }
    }

    /// Run the agent for a single user turn. `context` is the session's model
    /// history, ending with the current user input. Streaming events go to
    /// `event_tx`; the final assistant message and the turn's scratchpad come
    /// back in the result.
    pub async fn run(
        &self,
        context: &[Message],
        event_tx: mpsc::UnboundedSender<AgentEvent>,
    ) -> Result<TurnResult, AgentError> {
        let tools = self.tool_registry.schemas();

        // Scratchpad: the tool-call/observation messages accumulated within
        // this turn. Discarded when the turn ends.
        let mut scratchpad: Vec<Message> = Vec::new();
        let mut exchanges: Vec<ToolExchange> = Vec::new();
        let mut rounds = 0;

        loop {
            debug!(rounds, "agent loop model call");

            let completion = self
                .provider
                .complete(CompletionRequest {
                    messages: self.prompt.render(context, &scratchpad),
                    tools: tools.clone(),
                })
                .await
                .inspect_err(|e| {
                    let _ = event_tx.send(AgentEvent::Error(e.to_string()));
                })?;

            if completion.tool_calls.is_empty() {
                // Final answer — the turn is done.
                if !completion.content.is_empty() {
                    let _ = event_tx.send(AgentEvent::ContentChunk(completion.content.clone()));
                }
                let message = Message::assistant(&completion.content);
                let _ = event_tx.send(AgentEvent::Done(message.clone()));
                return Ok(TurnResult {
                    message,
                    scratchpad: exchanges,
                });
            }

            rounds += 1;
            if rounds > self.max_tool_rounds {
                let err = AgentError::TurnExceeded {
                    rounds: self.max_tool_rounds,
                };
                let _ = event_tx.send(AgentEvent::Error(err.to_string()));
                return Err(err);
            }

            if !completion.content.is_empty() {
                let _ = event_tx.send(AgentEvent::ContentChunk(completion.content.clone()));
            }

            scratchpad.push(Message::assistant_with_tool_calls(
                &completion.content,
                completion.tool_calls.clone(),
            ));

            for call in completion.tool_calls {
                let _ = event_tx.send(AgentEvent::ToolCallStart {
                    id: call.id.clone(),
                    name: call.name.clone(),
                });

                // Malformed JSON arguments are the model's mistake — feed the
                // parse error back as an observation and let it try again.
                let output = match serde_json::from_str(&call.arguments) {
                    Ok(args) => {
                        self.tool_registry
                            .execute(&call.name, &call.id, args)
                            .await
                            .inspect_err(|e| {
                                let _ = event_tx.send(AgentEvent::Error(e.to_string()));
                            })?
                    }
                    Err(e) => ToolOutput {
                        tool_call_id: call.id.clone(),
                        content: format!("Invalid JSON arguments: {}", e),
                        is_error: true,
                    },
                };

                let _ = event_tx.send(AgentEvent::ToolResult(output.clone()));
                scratchpad.push(Message::tool_result(&call.id, &output.content));
                exchanges.push(ToolExchange { call, output });
            }
        }
    }
}
