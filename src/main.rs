use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use idea_war_room::{
    config::{Config, DatabaseConfig, LogFormat, LoggingConfig},
    create_router,
    llm::LlmClient,
    search::SearchClient,
    storage::SqliteStorage,
    AppState,
};

/// Idea War Room backend
#[derive(Parser, Debug)]
#[command(name = "idea-war-room", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Run the HTTP API (default)
    Serve {
        /// Address to listen on; overrides BIND_ADDR
        #[arg(long)]
        bind: Option<String>,
    },

    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => serve(bind).await,
        Command::Migrate => migrate().await,
    }
}

async fn serve(bind: Option<String>) -> anyhow::Result<()> {
    // Load configuration
    let mut config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(addr) = bind {
        config.server.bind_addr = addr;
    }

    init_logging(&config.logging);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Idea War Room server starting..."
    );

    // Initialize storage
    let storage = match SqliteStorage::new(&config.database).await {
        Ok(s) => {
            info!(path = %config.database.path.display(), "Database initialized");
            s
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize database");
            return Err(e.into());
        }
    };

    // Initialize provider clients
    let llm = match LlmClient::new(&config.llm, config.request.clone()) {
        Ok(c) => {
            info!(base_url = %config.llm.base_url, model = %config.llm.model, "LLM client initialized");
            c
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize LLM client");
            return Err(e.into());
        }
    };

    let search = match SearchClient::new(&config.search, config.request.clone()) {
        Ok(c) => {
            info!(base_url = %config.search.base_url, "Search client initialized");
            c
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize search client");
            return Err(e.into());
        }
    };

    let bind_addr = config.server.bind_addr.clone();
    let app = create_router(AppState::new(config, storage, llm, search));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "Server ready, listening for HTTP requests");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn migrate() -> anyhow::Result<()> {
    init_logging(&LoggingConfig::from_env());

    let database = DatabaseConfig::from_env();
    SqliteStorage::new(&database).await?;
    info!(path = %database.path.display(), "Migrations applied");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Initialize tracing/logging
fn init_logging(logging: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    match logging.format {
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
