use crate::error::AgentError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level application configuration, loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub search: SearchConfig,
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub agent: AgentConfig,
    pub secrets: SecretsConfig,
    pub system_prompt: String,
    /// Assistant message shown when a session opens.
    pub greeting: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            search: SearchConfig::default(),
            server: ServerConfig::default(),
            session: SessionConfig::default(),
            agent: AgentConfig::default(),
            secrets: SecretsConfig::default(),
            system_prompt: "You are a friendly and helpful language agent. \
                 Answer every question as well as you can. \
                 If you are asked about information you do not know, use the available tools. \
                 Your goal is to be as useful as possible to the user."
                .into(),
            greeting: "Hi, I'm an agent. How can I help you?".into(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.config/searchchat/config.toml),
    /// falling back to defaults if the file doesn't exist.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Write current configuration to the default path.
    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;
        Ok(())
    }

    /// Default config file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("searchchat")
            .join("config.toml")
    }

    /// Data directory (REPL history, etc.).
    pub fn data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("searchchat")
    }
}

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL for the OpenAI-compatible API.
    pub api_base: String,
    /// Model name.
    pub model: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature. Zero keeps answers deterministic.
    pub temperature: f32,
    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.groq.com/openai/v1".into(),
            model: "llama3-8b-8192".into(),
            max_tokens: 1024,
            temperature: 0.0,
            timeout_secs: 30,
        }
    }
}

/// Web search (Google Custom Search JSON API) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Search endpoint URL.
    pub endpoint: String,
    /// Default number of results per query.
    pub num_results: u8,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://www.googleapis.com/customsearch/v1".into(),
            num_results: 5,
            timeout_secs: 15,
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Port.
    pub port: u16,
    /// Enable CORS.
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            cors: true,
        }
    }
}

/// Session configuration. Sessions live in memory only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum messages to keep in the model context window.
    pub max_history: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { max_history: 100 }
    }
}

/// Agent loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum tool rounds per turn before the turn fails.
    pub max_tool_rounds: usize,
    /// Whether the opening greeting is also fed to the model context.
    pub greeting_in_context: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: 5,
            greeting_in_context: false,
        }
    }
}

/// Config-file fallbacks for the three required secrets. Environment
/// variables take precedence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
    pub model_api_key: Option<String>,
    pub search_api_key: Option<String>,
    pub search_engine_id: Option<String>,
}

/// The three resolved credentials. Resolution happens once at startup,
/// before any other component is constructed, so a missing key halts the
/// process with a message naming it.
#[derive(Debug, Clone)]
pub struct Secrets {
    pub model_api_key: String,
    pub search_api_key: String,
    pub search_engine_id: String,
}

impl Secrets {
    pub const MODEL_API_KEY: &'static str = "GROQ_API_KEY";
    pub const SEARCH_API_KEY: &'static str = "GOOGLE_API_KEY";
    pub const SEARCH_ENGINE_ID: &'static str = "GOOGLE_CSE_ID";

    /// Resolve all three secrets from the environment, with config-file
    /// fallback. Fails on the first missing key.
    pub fn resolve(config: &AppConfig) -> Result<Self, AgentError> {
        Self::resolve_with(config, |key| std::env::var(key).ok())
    }

    fn resolve_with(
        config: &AppConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AgentError> {
        let get = |env_key: &'static str, fallback: &Option<String>| {
            lookup(env_key)
                .filter(|v| !v.is_empty())
                .or_else(|| fallback.clone())
                .ok_or(AgentError::MissingSecret(env_key))
        };

        Ok(Self {
            model_api_key: get(Self::MODEL_API_KEY, &config.secrets.model_api_key)?,
            search_api_key: get(Self::SEARCH_API_KEY, &config.secrets.search_api_key)?,
            search_engine_id: get(Self::SEARCH_ENGINE_ID, &config.secrets.search_engine_id)?,
        })
    }
}
