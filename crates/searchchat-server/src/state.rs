use searchchat_core::agent_loop::AgentLoop;
use searchchat_core::config::AppConfig;
use searchchat_core::provider::ChatProvider;
use searchchat_core::session::SessionManager;
use searchchat_core::tool_registry::ToolRegistry;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state for the server.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub agent_loop: Arc<AgentLoop>,
    pub sessions: Arc<RwLock<SessionManager>>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        provider: Arc<dyn ChatProvider>,
        tool_registry: Arc<ToolRegistry>,
    ) -> Self {
        let sessions = SessionManager::new(&config);
        let agent_loop = AgentLoop::new(&config, provider, tool_registry);
        Self {
            config,
            agent_loop: Arc::new(agent_loop),
            sessions: Arc::new(RwLock::new(sessions)),
        }
    }
}
