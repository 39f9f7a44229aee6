use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use session_weaver::{
    config::{Config, LogFormat, StorageBackend},
    server::{AppState, RpcServer},
    snapshot::SessionSnapshot,
    storage::{MemoryStorage, SqliteStorage, Storage},
    tree::Forest,
};

/// Browser navigation session tree service.
#[derive(Parser, Debug)]
#[command(name = "session-weaver", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Run the stdio JSON-RPC service (default)
    Serve,

    /// Print the stored session as an outline
    Show {
        /// Mark nodes with this URL as the current page
        #[arg(long)]
        active_url: Option<String>,

        /// Print the raw snapshot JSON instead of an outline
        #[arg(long)]
        json: bool,
    },

    /// Clear the stored session
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(&config);

    let storage = match open_storage(&config).await {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "Failed to initialize storage");
            return Err(e);
        }
    };

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, storage).await,
        Command::Show { active_url, json } => {
            let forest = storage.load_forest_or_empty().await?;
            let snapshot = SessionSnapshot::from_forest(&forest, active_url.as_deref());
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                print!("{}", snapshot.render_outline());
            }
            Ok(())
        }
        Command::Reset => {
            storage.save_forest(&Forest::new()).await?;
            info!("Stored session cleared");
            Ok(())
        }
    }
}

async fn serve(config: Config, storage: Arc<dyn Storage>) -> anyhow::Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Session Weaver starting..."
    );

    let (state, host_commands, _worker) = AppState::new(config, storage);

    // Every start begins a fresh session
    state.coordinator().reset().await?;

    let server = RpcServer::new(Arc::new(state), host_commands);

    info!("Server ready, waiting for messages on stdin...");

    if let Err(e) = server.run().await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}

async fn open_storage(config: &Config) -> anyhow::Result<Arc<dyn Storage>> {
    match config.storage.backend {
        StorageBackend::Sqlite => {
            let storage = SqliteStorage::new(&config.storage.database).await?;
            info!(path = %config.storage.database.path.display(), "Database initialized");
            Ok(Arc::new(storage))
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage");
            Ok(Arc::new(MemoryStorage::new()))
        }
    }
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
