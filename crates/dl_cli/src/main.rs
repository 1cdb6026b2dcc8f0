use anyhow::Context;
use clap::Parser;
use dl_fetcher::{handle_command, FetchArgs};
use dl_web::{create_app, AppState};
use tracing::info;

mod config;
mod logging;

use config::Config;

/// DevLook news API: ingest provider articles and serve them over HTTP.
#[derive(Parser, Debug)]
#[command(name = "devlook", author, version, about, long_about = None)]
struct Cli {
    /// Path to .env file (optional).
    #[arg(long, env = "DOTENV_PATH", default_value = ".env")]
    dotenv: String,
    /// Storage backend, overrides DEVLOOK_STORAGE (sqlite, memory)
    #[arg(long)]
    storage: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Bind address, overrides DEVLOOK_BIND_ADDR
        #[arg(long)]
        bind: Option<String>,
    },
    /// Fetch the latest articles once and store them
    Fetch(FetchArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loaded_dotenv = std::path::Path::new(&cli.dotenv).exists();
    if loaded_dotenv {
        dotenvy::from_path(&cli.dotenv)
            .with_context(|| format!("Failed to load {}", cli.dotenv))?;
    }

    logging::init_logging();
    if loaded_dotenv {
        info!("📄 Loaded environment from {}", cli.dotenv);
    }

    let mut config = Config::from_env()?;
    if let Some(storage) = cli.storage {
        config.storage = storage;
    }

    let provider = config.provider()?;
    info!("💾 Checking storage connection...");
    let state = AppState::bootstrap(&config.storage, &config.backend, provider)
        .await
        .with_context(|| {
            format!("Failed to connect {} storage at {}", config.storage, config.backend.url)
        })?;

    match cli.command {
        Commands::Serve { bind } => {
            let bind_addr = bind.unwrap_or_else(|| config.bind_addr.clone());
            dl_web::serve(create_app(state), &bind_addr).await?;
        }
        Commands::Fetch(args) => {
            handle_command(args, &state.ingestor).await?;
        }
    }

    Ok(())
}
