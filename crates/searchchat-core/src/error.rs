use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Missing secret '{0}' — set the environment variable or add it under [secrets] in config.toml")]
    MissingSecret(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider call timed out after {0}s")]
    Timeout(u64),

    #[error("Turn exceeded {rounds} tool rounds without a final answer")]
    TurnExceeded { rounds: usize },

    #[error("Tool execution error: {tool_name}: {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Schema build error: {0}")]
    Schema(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AgentError>;
