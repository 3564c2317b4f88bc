use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lector::claude::{ApiKeyManager, ClaudeClient, ClaudeModel};
use lector::{App, ClaudeTutor, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lector")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Use this config file instead of the default location
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured model (haiku, sonnet, opus, ...)
    #[arg(short, long, global = true)]
    model: Option<ClaudeModel>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Store your Anthropic API key in the system keyring
    Key {
        /// API key (starts with sk-ant-)
        #[arg(required_unless_present = "clear")]
        key: Option<String>,
        /// Remove the stored key instead
        #[arg(long, conflicts_with = "key")]
        clear: bool,
        /// Send a minimal request to check the key works
        #[arg(long, conflicts_with = "clear")]
        verify: bool,
    },
    /// Show the active configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never interleave with the quiz on stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lector=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(model) = cli.model {
        config.model = model;
    }

    match cli.command {
        Some(Commands::Key { clear: true, .. }) => {
            ApiKeyManager::clear()?;
            println!("API key removed.");
        }
        Some(Commands::Key { key, verify, .. }) => {
            let key = ApiKeyManager::store(&key.context("an API key is required")?)?;
            println!("Stored API key {}", ApiKeyManager::mask_key(&key));
            if verify {
                ClaudeClient::new(key)?.test_connection(config.model).await?;
                println!("Key verified.");
            }
        }
        Some(Commands::Config) => {
            let path = match cli.config {
                Some(path) => path,
                None => Config::config_path()?,
            };
            println!("# {}", path.display());
            println!("{}", serde_json::to_string_pretty(&config)?);
            let key = match ApiKeyManager::resolve() {
                Ok(key) => ApiKeyManager::mask_key(&key),
                Err(_) => "not set".to_string(),
            };
            println!("Model: {}", config.model.display_name());
            println!("API key: {key}");
        }
        None => {
            let client = ClaudeClient::new(ApiKeyManager::resolve()?)?;
            let tutor = ClaudeTutor::new(client, config.model).with_prioritizer(config.prioritizer());
            let tutor = Arc::new(tutor);
            let mut app = App::new(config, tutor)?;
            app.run().await?;
        }
    }

    Ok(())
}
