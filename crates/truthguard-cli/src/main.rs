//! TruthGuard CLI
//!
//! Runs the claim-verification pipeline as an HTTP server or as one-shot
//! commands against the same store.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use truthguard_core::Scope;
use truthguard_runtime::{
    PipelineOrchestrator, ProviderRegistry, RecordStore, RuntimeConfig, SqliteRecordStore,
};

mod error;
mod server;

/// Default log filter when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "truthguard=info,tower_http=info";

#[derive(Debug, Parser)]
#[command(name = "truthguard", version, about = "News claim verification pipeline")]
struct Cli {
    /// YAML configuration file
    #[arg(long, short, env = "TRUTHGUARD_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Record store connection string
    #[arg(long, env = "DATABASE_URL", global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API
    Serve {
        #[arg(long, env = "PORT", default_value_t = 3000)]
        port: u16,
    },

    /// Run one pipeline cycle and print the resulting records
    Verify {
        #[arg(value_parser = parse_scope, default_value = "local")]
        scope: Scope,
    },

    /// Ask the assistant a question
    Chat { message: String },

    /// Print stored records without running the pipeline
    Records {
        #[arg(value_parser = parse_scope, default_value = "local")]
        scope: Scope,

        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

fn parse_scope(value: &str) -> Result<Scope, String> {
    value.parse().map_err(|e: truthguard_core::ScopeParseError| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Command::Serve { port } => serve(config, port).await,
        Command::Verify { scope } => {
            let orchestrator = build_orchestrator(config).await?;
            let records = orchestrator.run(scope).await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
            Ok(())
        }
        Command::Chat { message } => {
            let orchestrator = build_orchestrator(config).await?;
            println!("{}", orchestrator.chat(&message).await);
            Ok(())
        }
        Command::Records { scope, limit } => {
            let store = SqliteRecordStore::connect(&config.database_url).await?;
            let records = store.recent(scope, limit).await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> Result<RuntimeConfig> {
    let mut config = match &cli.config {
        Some(path) => RuntimeConfig::from_yaml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => RuntimeConfig::default(),
    };

    if let Some(url) = &cli.database_url {
        config.database_url = url.clone();
    }

    config.validate()?;
    Ok(config)
}

async fn build_orchestrator(config: RuntimeConfig) -> Result<PipelineOrchestrator> {
    let registry = ProviderRegistry::with_defaults();
    info!(provider = %config.llm.provider, model = %config.llm.model, "Initializing pipeline");

    PipelineOrchestrator::from_config(config, &registry)
        .await
        .context("building pipeline")
}

async fn serve(config: RuntimeConfig, port: u16) -> Result<()> {
    let orchestrator = Arc::new(build_orchestrator(config).await?);
    let app = server::router(orchestrator);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting TruthGuard on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
