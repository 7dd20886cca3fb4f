//! PromptCanvas - password-gated text-to-image generator

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use promptcanvas::{
    api::{self, AppState},
    config::Config,
    services::hash_secret,
};

#[derive(Parser, Debug)]
#[command(name = "promptcanvas", version, about = "Password-gated text-to-image generator")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, env = "PROMPTCANVAS_CONFIG", default_value = "config.yml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the SHA-256 hex digest to use as APP_PASSWORD
    HashPassword {
        /// The access password
        secret: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let cli = Cli::parse();
    if let Some(Command::HashPassword { secret }) = cli.command {
        println!("{}", hash_secret(&secret));
        return Ok(());
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "promptcanvas=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting PromptCanvas...");
    if dotenv_loaded {
        tracing::info!("Loaded environment from .env");
    }

    // Load configuration
    let config = Config::load_with_env(&cli.config)?;
    tracing::info!("Configuration loaded from {}", cli.config.display());

    let state = AppState::from_config(&config)?;
    let app = api::build_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
