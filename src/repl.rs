use searchchat_core::agent_loop::AgentLoop;
use searchchat_core::config::AppConfig;
use searchchat_core::provider::ChatProvider;
use searchchat_core::session::SessionManager;
use searchchat_core::tool_registry::ToolRegistry;
use searchchat_core::types::AgentEvent;
use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::{Config as RlConfig, DefaultEditor};
use std::sync::Arc;
use tokio::sync::mpsc;

const BANNER: &str = r#"
  searchchat — ask me anything; I can search the web.

  Commands:
    /new [name]    — Create a new session
    /sessions      — List all sessions
    /switch <id>   — Switch to a session
    /tools         — List available tools
    /config        — Show current config
    /clear         — Clear current session history
    /help          — Show this help
    /exit          — Quit
"#;

/// Run the interactive REPL.
pub async fn run(
    config: AppConfig,
    provider: Arc<dyn ChatProvider>,
    tool_registry: Arc<ToolRegistry>,
) -> Result<()> {
    println!("{}", BANNER);
    println!(
        "  Model: {}  |  Endpoint: {}\n",
        config.provider.model, config.provider.api_base
    );

    let mut sessions = SessionManager::new(&config);
    let agent_loop = Arc::new(AgentLoop::new(&config, provider, tool_registry.clone()));

    // The greeting is in display history from the start; show it.
    println!("\x1b[1;33massistant\x1b[0m: {}\n", config.greeting);

    let rl_config = RlConfig::builder().auto_add_history(true).build();
    let history_path = AppConfig::data_dir().join("repl_history.txt");
    let mut rl = DefaultEditor::with_config(rl_config)?;
    let _ = rl.load_history(&history_path);

    loop {
        let session_name = sessions.active().name.clone();
        let prompt = format!("\x1b[1;36m{}\x1b[0m \x1b[1;32m❯\x1b[0m ", session_name);

        match rl.readline(&prompt) {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }

                if input.starts_with('/') {
                    let keep_going =
                        handle_command(input, &mut sessions, &tool_registry, &config);
                    if !keep_going {
                        break;
                    }
                    continue;
                }

                sessions.active_mut().push_user(input);
                let context = sessions.recent_context();

                let (tx, mut rx) = mpsc::unbounded_channel::<AgentEvent>();
                let agent_handle = {
                    let agent_loop = agent_loop.clone();
                    tokio::spawn(async move { agent_loop.run(&context, tx).await })
                };

                // Print events as they arrive.
                print!("\x1b[1;33massistant\x1b[0m: ");
                while let Some(event) = rx.recv().await {
                    match event {
                        AgentEvent::ContentChunk(chunk) => {
                            print!("{}", chunk);
                        }
                        AgentEvent::ToolCallStart { name, .. } => {
                            println!("\n  \x1b[0;35m⚡ Calling tool: {}\x1b[0m", name);
                        }
                        AgentEvent::ToolResult(output) => {
                            let status = if output.is_error {
                                "\x1b[0;31m✗\x1b[0m"
                            } else {
                                "\x1b[0;32m✓\x1b[0m"
                            };
                            let preview: String = output.content.chars().take(200).collect();
                            println!("  {} {}", status, preview.replace('\n', "\n    "));
                            print!("\x1b[1;33massistant\x1b[0m: ");
                        }
                        AgentEvent::Done(_) => {}
                        AgentEvent::Error(e) => {
                            println!("\n\x1b[0;31mError: {}\x1b[0m", e);
                        }
                    }
                }
                println!();

                match agent_handle.await {
                    Ok(Ok(result)) => {
                        sessions.active_mut().push_assistant(&result.message.content);
                    }
                    Ok(Err(e)) => {
                        eprintln!("\x1b[0;31mAgent error: {}\x1b[0m", e);
                    }
                    Err(e) => {
                        eprintln!("\x1b[0;31mTask error: {}\x1b[0m", e);
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(e) => {
                eprintln!("Readline error: {}", e);
                break;
            }
        }
    }

    if let Some(parent) = history_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = rl.save_history(&history_path);
    Ok(())
}

/// Handle a slash command. Returns false when the REPL should exit.
fn handle_command(
    input: &str,
    sessions: &mut SessionManager,
    tool_registry: &ToolRegistry,
    config: &AppConfig,
) -> bool {
    let mut parts = input.splitn(2, ' ');
    let command = parts.next().unwrap_or("");
    let arg = parts.next().map(str::trim).unwrap_or("");

    match command {
        "/exit" | "/quit" => {
            println!("Goodbye!");
            return false;
        }
        "/help" => println!("{}", BANNER),
        "/new" => {
            let name = if arg.is_empty() { "unnamed" } else { arg };
            let id = sessions.create(name);
            println!("Created session '{}' ({})", name, id);
            println!("\x1b[1;33massistant\x1b[0m: {}", config.greeting);
        }
        "/sessions" => {
            for (id, name, updated, count) in sessions.list() {
                let marker = if id == sessions.active_id() { "*" } else { " " };
                println!("{} {}  {}  ({} messages, {})", marker, id, name, count, updated);
            }
        }
        "/switch" => match sessions.switch(arg) {
            Ok(()) => println!("Switched to session {}", arg),
            Err(e) => println!("\x1b[0;31m{}\x1b[0m", e),
        },
        "/tools" => {
            for name in tool_registry.list_names() {
                println!("  {}", name);
            }
        }
        "/config" => match toml::to_string_pretty(config) {
            Ok(s) => println!("{}", s),
            Err(e) => println!("\x1b[0;31m{}\x1b[0m", e),
        },
        "/clear" => {
            sessions.active_mut().clear();
            println!("Session history cleared.");
        }
        other => println!("Unknown command: {} (try /help)", other),
    }
    true
}
