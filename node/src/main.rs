use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use projrec_api::logging::{init_logging, LogConfig};
use projrec_api::RecommendationServer;
use projrec_engine::RecommendationEngine;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

mod config;

use config::{ServiceConfig, StoreKind};

#[derive(Parser)]
#[command(name = "projrec")]
#[command(about = "Hybrid project recommendation service")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Snapshot file with users and projects
    #[arg(short, long, value_name = "FILE")]
    data_file: Option<PathBuf>,

    /// Serve the snapshot from memory instead of re-reading it per request
    #[arg(long)]
    in_memory: bool,

    /// HTTP listen address (e.g., 0.0.0.0:5001)
    #[arg(long, value_name = "ADDR")]
    listen_addr: Option<String>,

    /// Number of titles per recommendation
    #[arg(long)]
    top_n: Option<usize>,

    /// Collaborative weight in [0, 1]
    #[arg(long)]
    alpha: Option<f64>,

    /// Use JSON log output
    #[arg(long)]
    json_logs: bool,

    /// Verbose human-readable logs for local development
    #[arg(long, conflicts_with = "json_logs")]
    dev_logs: bool,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API (default)
    Serve,

    /// Compute recommendations for one user and print them as JSON
    Recommend {
        /// User identifier
        user_id: String,
    },

    /// Write a default configuration file
    InitConfig {
        /// Destination path
        #[arg(default_value = "projrec.toml")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env();
    if cli.json_logs {
        log_config = LogConfig::production();
    } else if cli.dev_logs {
        log_config = LogConfig::development();
    }
    init_logging(&log_config)?;

    let mut config = match &cli.config {
        Some(path) => ServiceConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ServiceConfig::default(),
    };
    apply_overrides(&mut config, &cli)?;

    match cli.command {
        Some(Commands::InitConfig { path }) => {
            config.save(&path)?;
            info!("Wrote default configuration to {}", path.display());
            Ok(())
        }
        Some(Commands::Recommend { user_id }) => {
            let engine = build_engine(&config).await?;
            let result = engine.get_recommendations(&user_id).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Some(Commands::Serve) | None => {
            let engine = build_engine(&config).await?;
            let server = RecommendationServer::new(Arc::new(engine));
            tokio::select! {
                res = server.start(config.server.listen_addr) => res,
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received");
                    Ok(())
                }
            }
        }
    }
}

fn apply_overrides(config: &mut ServiceConfig, cli: &Cli) -> Result<()> {
    if let Some(path) = &cli.data_file {
        config.store.path = Some(path.clone());
    }
    if cli.in_memory {
        config.store.kind = StoreKind::Memory;
    }
    if let Some(addr) = &cli.listen_addr {
        config.server.listen_addr = addr
            .parse()
            .with_context(|| format!("invalid listen address {}", addr))?;
    }
    if let Some(top_n) = cli.top_n {
        config.engine.top_n = top_n;
    }
    if let Some(alpha) = cli.alpha {
        config.engine.alpha = alpha;
    }
    Ok(())
}

async fn build_engine(config: &ServiceConfig) -> Result<RecommendationEngine> {
    config.validate().map_err(anyhow::Error::msg)?;

    // Store client lifecycle is owned here and injected into the engine
    let store = config.open_store().await?;
    info!(
        store = store.name(),
        listen_addr = %config.server.listen_addr,
        "Store client ready"
    );

    Ok(RecommendationEngine::new(store, config.engine.ranker())?)
}
