pub mod agent_loop;
pub mod config;
pub mod error;
pub mod prompt;
pub mod provider;
pub mod session;
pub mod tool_registry;
pub mod types;

pub use agent_loop::AgentLoop;
pub use config::{AppConfig, Secrets};
pub use error::AgentError;
pub use prompt::PromptTemplate;
pub use provider::{ChatProvider, OpenAiProvider};
pub use session::{SessionContext, SessionManager};
pub use tool_registry::ToolRegistry;
