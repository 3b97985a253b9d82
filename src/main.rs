use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use handoff::{gateway, Config};

/// `handoff` - route customer chats between an automated agent and human operators.
#[derive(Parser, Debug)]
#[command(name = "handoff")]
#[command(version)]
#[command(about = "Customer chat router with one-way escalation to human operators.", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    config_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the chat gateway (customer and operator websockets)
    #[command(long_about = "\
Start the chat gateway.

Serves the customer endpoint (GET /customer), the operator endpoint \
(GET /operator) and a health check (GET /health). Bind address \
defaults to the values in your config file (gateway.host / gateway.port).

Examples:
  handoff serve                  # use config defaults
  handoff serve -p 9000          # listen on port 9000
  handoff serve --host 0.0.0.0   # bind to all interfaces
  handoff serve -p 0             # random available port")]
    Serve {
        /// Port to listen on (use 0 for random available port); defaults to config gateway.port
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to; defaults to config gateway.host
        #[arg(long)]
        host: Option<String>,
    },

    /// Show the resolved configuration
    Status,

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        config_command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the path of the active config file
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(config_dir) = &cli.config_dir {
        if config_dir.trim().is_empty() {
            bail!("--config-dir cannot be empty");
        }
        std::env::set_var("HANDOFF_CONFIG_DIR", config_dir);
    }

    // Initialize logging - respects RUST_LOG env var, defaults to INFO
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = Config::load_or_init().await?;

    match cli.command {
        Commands::Serve { port, host } => {
            let port = port.unwrap_or(config.gateway.port);
            let host = host.unwrap_or_else(|| config.gateway.host.clone());
            if port == 0 {
                info!("Starting handoff gateway on {host} (random port)");
            } else {
                info!("Starting handoff gateway on {host}:{port}");
            }
            gateway::run_gateway(&host, port, config).await
        }

        Commands::Status => {
            print_status(&config);
            Ok(())
        }

        Commands::Config { config_command } => match config_command {
            ConfigCommands::Path => {
                println!("{}", config.config_path.display());
                Ok(())
            }
        },
    }
}

fn print_status(config: &Config) {
    println!("handoff status");
    println!();
    println!("Version:     {}", env!("CARGO_PKG_VERSION"));
    println!("Config:      {}", config.config_path.display());
    println!();
    println!(
        "Gateway:     {}:{}",
        config.gateway.host, config.gateway.port
    );
    println!("Agent:       {}", config.agent.backend);
    println!(
        "  Project:   {}",
        config.agent.project_id.as_deref().unwrap_or("(none)")
    );
    println!(
        "  API key:   {}",
        if config.agent.api_key.is_some() {
            "set"
        } else {
            "not set"
        }
    );
    println!("  Timeout:   {}s", config.agent.timeout_secs);
    println!("Store:       {}", config.store.kind);
    println!();
    println!("Conversation:");
    println!("  Welcome event:      {}", config.conversation.welcome_event);
    println!(
        "  Escalation context: {}",
        config.conversation.escalation_context
    );
    println!("  Language:           {}", config.conversation.language_code);
    println!(
        "  Operator greeting:  {}",
        config.conversation.operator_greeting
    );
}
