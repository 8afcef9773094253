mod repl;

use searchchat_core::config::AppConfig;
use searchchat_core::provider::OpenAiProvider;
use searchchat_core::tool_registry::ToolRegistry;
use searchchat_core::Secrets;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "searchchat",
    about = "A conversational agent with web search over an OpenAI-compatible endpoint",
    version,
    author
)]
struct Cli {
    /// Path to config file (default: ~/.config/searchchat/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the model name
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Override the API base URL
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start interactive chat (default)
    Chat,

    /// Start the HTTP server
    Serve {
        /// Bind host
        #[arg(long)]
        host: Option<String>,
        /// Bind port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Show or manage configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Initialize default configuration file
    Init,
    /// Print config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up tracing.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| "searchchat=info,warn".into()))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Load config.
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    // Apply CLI overrides.
    if let Some(model) = &cli.model {
        config.provider.model = model.clone();
    }
    if let Some(api_base) = &cli.api_base {
        config.provider.api_base = api_base.clone();
    }

    // Config subcommand works without secrets.
    if let Some(Commands::Config { action }) = &cli.command {
        return handle_config_command(action, &config);
    }

    // Resolve the three credentials up front — nothing else is constructed
    // until all of them are present.
    let secrets = Secrets::resolve(&config)?;

    let mut registry = ToolRegistry::new();
    searchchat_tools::register_all(&mut registry, &config, &secrets)?;
    let registry = Arc::new(registry);

    let provider = Arc::new(OpenAiProvider::new(
        &config.provider,
        &secrets.model_api_key,
    ));

    tracing::info!(
        "Loaded {} tools, model: {}, endpoint: {}",
        registry.len(),
        config.provider.model,
        config.provider.api_base,
    );

    match cli.command {
        Some(Commands::Serve { host, port }) => {
            if let Some(h) = host {
                config.server.host = h;
            }
            if let Some(p) = port {
                config.server.port = p;
            }
            searchchat_server::serve(config, provider, registry).await?;
        }
        Some(Commands::Chat) | None => {
            repl::run(config, provider, registry).await?;
        }
        Some(Commands::Config { .. }) => unreachable!("handled above"),
    }

    Ok(())
}

fn handle_config_command(action: &Option<ConfigAction>, config: &AppConfig) -> Result<()> {
    match action {
        Some(ConfigAction::Show) | None => {
            let toml_str = toml::to_string_pretty(config)?;
            println!("{}", toml_str);
        }
        Some(ConfigAction::Init) => {
            let path = AppConfig::default_path();
            if path.exists() {
                println!("Config already exists at: {}", path.display());
            } else {
                config.save()?;
                println!("Created default config at: {}", path.display());
            }
        }
        Some(ConfigAction::Path) => {
            println!("{}", AppConfig::default_path().display());
        }
    }
    Ok(())
}
