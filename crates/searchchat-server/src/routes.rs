use crate::state::AppState;
use searchchat_core::error::AgentError;
use searchchat_core::types::{AgentEvent, Message, Role};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;

// ── Health ──────────────────────────────────────────────────────────────

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// ── Chat ────────────────────────────────────────────────────────────────

pub fn chat_routes() -> Router<AppState> {
    Router::new().route("/v1/chat", post(chat))
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    session_id: String,
    reply: String,
    tool_rounds: usize,
}

/// Map agent failures to distinct statuses: a hung provider is not the same
/// thing as a runaway tool loop.
fn error_status(err: &AgentError) -> StatusCode {
    match err {
        AgentError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        AgentError::TurnExceeded { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<axum::response::Response, (StatusCode, String)> {
    if req.message.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Empty message".into()));
    }

    // Append the user message and snapshot the model context.
    let (session_id, context) = {
        let mut sessions = state.sessions.write().await;
        let id = match &req.session_id {
            Some(id) => {
                if sessions.get(id).is_none() {
                    return Err((StatusCode::NOT_FOUND, format!("Session not found: {id}")));
                }
                id.clone()
            }
            None => sessions.active_id().to_string(),
        };
        let max = sessions.max_history();
        let session = sessions.get_mut(&id).unwrap();
        session.push_user(&req.message);
        (id, session.recent_context(max).to_vec())
    };

    if req.stream {
        let (agent_tx, mut agent_rx) = tokio::sync::mpsc::unbounded_channel::<AgentEvent>();
        let (client_tx, client_rx) = tokio::sync::mpsc::unbounded_channel::<AgentEvent>();

        let agent_loop = state.agent_loop.clone();
        tokio::spawn(async move {
            let _ = agent_loop.run(&context, agent_tx).await;
        });

        // Forward events to the client, persisting the assistant reply
        // before the terminal event goes out: a client that reads [DONE]
        // and immediately fetches the session must see the reply.
        let sessions = state.sessions.clone();
        let id = session_id.clone();
        tokio::spawn(async move {
            while let Some(event) = agent_rx.recv().await {
                if let AgentEvent::Done(message) = &event {
                    let mut sessions = sessions.write().await;
                    if let Some(session) = sessions.get_mut(&id) {
                        session.push_assistant(&message.content);
                    }
                }
                if client_tx.send(event).is_err() {
                    break;
                }
            }
        });

        let stream = UnboundedReceiverStream::new(client_rx).map(|event| {
            let sse_event: Result<Event, std::convert::Infallible> = match event {
                AgentEvent::ContentChunk(chunk) => Ok(Event::default()
                    .json_data(serde_json::json!({"content": chunk}))
                    .unwrap_or_default()),
                AgentEvent::ToolCallStart { name, .. } => Ok(Event::default()
                    .event("tool_call")
                    .json_data(serde_json::json!({"tool": name, "status": "started"}))
                    .unwrap_or_default()),
                AgentEvent::ToolResult(output) => Ok(Event::default()
                    .event("tool_result")
                    .json_data(serde_json::json!({
                        "tool_call_id": output.tool_call_id,
                        "content": output.content,
                        "is_error": output.is_error,
                    }))
                    .unwrap_or_default()),
                AgentEvent::Done(_) => Ok(Event::default().data("[DONE]")),
                AgentEvent::Error(e) => Ok(Event::default().event("error").data(e)),
            };
            sse_event
        });

        Ok(Sse::new(stream).into_response())
    } else {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel::<AgentEvent>();

        let result = state
            .agent_loop
            .run(&context, tx)
            .await
            .map_err(|e| (error_status(&e), e.to_string()))?;

        {
            let mut sessions = state.sessions.write().await;
            if let Some(session) = sessions.get_mut(&session_id) {
                session.push_assistant(&result.message.content);
            }
        }

        Ok(Json(ChatResponse {
            session_id,
            reply: result.message.content,
            tool_rounds: result.scratchpad.len(),
        })
        .into_response())
    }
}

// ── Sessions ────────────────────────────────────────────────────────────

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/sessions", get(list_sessions).post(create_session))
        .route("/v1/sessions/{id}/messages", get(session_messages))
}

#[derive(Debug, Serialize)]
struct SessionInfo {
    id: String,
    name: String,
    message_count: usize,
    updated_at: String,
}

async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    let sessions = state.sessions.read().await;
    let list: Vec<SessionInfo> = sessions
        .list()
        .into_iter()
        .map(|(id, name, updated, count)| SessionInfo {
            id: id.to_string(),
            name: name.to_string(),
            message_count: count,
            updated_at: updated.to_rfc3339(),
        })
        .collect();
    Json(list)
}

#[derive(Debug, Deserialize)]
struct CreateSessionRequest {
    name: String,
}

async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> impl IntoResponse {
    let mut sessions = state.sessions.write().await;
    let id = sessions.create(req.name);
    let session = sessions.get(&id).unwrap();
    Json(serde_json::json!({
        "id": session.id,
        "name": session.name,
    }))
}

#[derive(Debug, Serialize)]
struct DisplayMessage {
    role: &'static str,
    content: String,
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

/// The display history of a session (greeting included), in order.
async fn session_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let sessions = state.sessions.read().await;
    let session = sessions
        .get(&id)
        .ok_or((StatusCode::NOT_FOUND, format!("Session not found: {id}")))?;
    let messages: Vec<DisplayMessage> = session
        .display()
        .iter()
        .map(|m: &Message| DisplayMessage {
            role: role_str(m.role),
            content: m.content.clone(),
        })
        .collect();
    Ok(Json(messages))
}
