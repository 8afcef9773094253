pub mod routes;
pub mod state;

use searchchat_core::config::AppConfig;
use searchchat_core::provider::ChatProvider;
use searchchat_core::tool_registry::ToolRegistry;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the axum Router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = state.config.server.cors;

    let mut app = Router::new()
        .merge(routes::health_routes())
        .merge(routes::chat_routes())
        .merge(routes::session_routes())
        .with_state(state);

    app = app.layer(TraceLayer::new_for_http());
    if cors {
        app = app.layer(CorsLayer::permissive());
    }

    app
}

/// Start the HTTP server.
pub async fn serve(
    config: AppConfig,
    provider: Arc<dyn ChatProvider>,
    tool_registry: Arc<ToolRegistry>,
) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, provider, tool_registry);
    let router = build_router(state);

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use searchchat_core::error::AgentError;
    use searchchat_core::provider::{Completion, CompletionRequest};
    use searchchat_core::types::ToolCall;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Provider that replays a fixed script of results.
    struct ScriptedProvider {
        script: Mutex<Vec<Result<Completion, AgentError>>>,
    }

    impl ScriptedProvider {
        fn new(script: Vec<Result<Completion, AgentError>>) -> Self {
            let mut script = script;
            script.reverse();
            Self {
                script: Mutex::new(script),
            }
        }
    }

    #[async_trait]
    impl ChatProvider for ScriptedProvider {
        async fn complete(&self, _request: CompletionRequest) -> Result<Completion, AgentError> {
            self.script
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(AgentError::Provider("script exhausted".into())))
        }
    }

    fn test_router(script: Vec<Result<Completion, AgentError>>) -> Router {
        let provider = Arc::new(ScriptedProvider::new(script));
        let state = AppState::new(
            AppConfig::default(),
            provider,
            Arc::new(ToolRegistry::new()),
        );
        build_router(state)
    }

    fn direct(content: &str) -> Result<Completion, AgentError> {
        Ok(Completion {
            content: content.into(),
            tool_calls: Vec::new(),
        })
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn chat_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/v1/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_router(Vec::new());
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_chat_rejects_empty_message() {
        let app = test_router(Vec::new());
        let resp = app
            .oneshot(chat_request(r#"{"message": "  "}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_chat_round_trip() {
        let app = test_router(vec![direct("Paris is the capital of France.")]);
        let resp = app
            .oneshot(chat_request(r#"{"message": "Capital of France?"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["reply"], "Paris is the capital of France.");
        assert_eq!(json["tool_rounds"], 0);
    }

    #[tokio::test]
    async fn test_chat_unknown_session_is_404() {
        let app = test_router(vec![direct("hi")]);
        let resp = app
            .oneshot(chat_request(
                r#"{"message": "hi", "session_id": "no-such-session"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_provider_timeout_maps_to_504() {
        let app = test_router(vec![Err(AgentError::Timeout(30))]);
        let resp = app
            .oneshot(chat_request(r#"{"message": "hello"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn test_runaway_tool_loop_maps_to_502() {
        // The model keeps requesting an unknown tool; each round feeds an
        // error observation back until the bound trips.
        let endless = (0..6)
            .map(|_| {
                Ok(Completion {
                    content: String::new(),
                    tool_calls: vec![ToolCall {
                        id: "call_1".into(),
                        name: "web_search".into(),
                        arguments: "{}".into(),
                    }],
                })
            })
            .collect();
        let app = test_router(endless);
        let resp = app
            .oneshot(chat_request(r#"{"message": "loop"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_chat_streaming_emits_events_and_persists_reply() {
        let script = vec![
            Ok(Completion {
                content: String::new(),
                tool_calls: vec![ToolCall {
                    id: "call_1".into(),
                    name: "web_search".into(),
                    arguments: r#"{"query":"weather Paris"}"#.into(),
                }],
            }),
            direct("Sunny in Paris today."),
        ];
        let app = test_router(script);

        // Create a session so we can inspect its history afterwards.
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/sessions")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"name": "stream"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        let id = body_json(resp).await["id"].as_str().unwrap().to_string();

        let resp = app
            .clone()
            .oneshot(chat_request(&format!(
                r#"{{"message": "Weather in Paris?", "session_id": "{id}", "stream": true}}"#
            )))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/event-stream"));

        // Drain the SSE body: tool events, then the content, then [DONE].
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("event: tool_call"), "missing tool_call: {body}");
        assert!(body.contains("event: tool_result"), "missing tool_result: {body}");
        assert!(body.contains("Sunny in Paris today."), "missing content: {body}");
        assert!(body.contains("[DONE]"), "missing terminal event: {body}");

        // The reply was persisted no later than [DONE], so a fetch right
        // after the stream ends must see it.
        let resp = app
            .oneshot(
                Request::builder()
                    .uri(format!("/v1/sessions/{id}/messages"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let messages = body_json(resp).await;
        let messages = messages.as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2]["role"], "assistant");
        assert_eq!(messages[2]["content"], "Sunny in Paris today.");
    }

    #[tokio::test]
    async fn test_session_create_list_and_messages() {
        let app = test_router(vec![direct("four")]);

        // Create a session.
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/sessions")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"name": "math"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let created = body_json(resp).await;
        let id = created["id"].as_str().unwrap().to_string();

        // Chat into it.
        let resp = app
            .clone()
            .oneshot(chat_request(&format!(
                r#"{{"message": "What is 2+2?", "session_id": "{id}"}}"#
            )))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        // Display history: greeting + user + assistant.
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/v1/sessions/{id}/messages"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let messages = body_json(resp).await;
        let messages = messages.as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["role"], "assistant");
        assert_eq!(messages[1]["content"], "What is 2+2?");
        assert_eq!(messages[2]["content"], "four");

        // Both sessions are listed.
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/v1/sessions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let list = body_json(resp).await;
        assert_eq!(list.as_array().unwrap().len(), 2);
    }
}
