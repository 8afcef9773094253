pub mod web_search;

use searchchat_core::config::AppConfig;
use searchchat_core::error::AgentError;
use searchchat_core::tool_registry::ToolRegistry;
use searchchat_core::Secrets;
use std::sync::Arc;

/// Register all built-in tools into the registry.
pub fn register_all(
    registry: &mut ToolRegistry,
    config: &AppConfig,
    secrets: &Secrets,
) -> Result<(), AgentError> {
    registry.register(Arc::new(web_search::WebSearchTool::new(
        &config.search,
        secrets,
    )?));
    Ok(())
}
