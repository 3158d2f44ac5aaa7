//! Fulcra Context MCP Server - Entry Point

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use fulcra_context_mcp::{config::Config, server::McpServer};

#[derive(Parser, Debug)]
#[command(name = "fulcra-context-mcp")]
#[command(about = "MCP server for Fulcra personal data, with an OAuth token relay")]
#[command(version)]
struct Cli {
    /// HTTP server port
    #[arg(long, default_value = "4449", env = "PORT")]
    port: u16,

    /// Public base URL of this server (OAuth issuer and callback host)
    #[arg(long, env = "BASE_URL")]
    base_url: Option<String>,

    /// Seconds between sweeps of expired OAuth state (0 disables)
    #[arg(long, default_value = "300")]
    sweep_interval: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before clap reads env-backed arguments.
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Fulcra Context MCP server");

    let mut config = Config::from_env()?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    config.sweep_interval =
        (cli.sweep_interval > 0).then(|| Duration::from_secs(cli.sweep_interval));

    tracing::debug!(?config, "Loaded configuration");

    let server = McpServer::new(config)?;
    server.run_http(cli.port).await
}
