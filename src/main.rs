use clap::Parser;
use llm_gateway::config::GatewayConfig;
use llm_gateway::server::{self, GatewayState};
use std::error::Error;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(
    name = "llm-gateway",
    version,
    about = "HTTP gateway routing LLM requests across configured providers"
)]
struct Cli {
    /// Path to the gateway configuration file.
    #[arg(long)]
    config: Option<String>,
    /// Listen address, overriding the configured bind address.
    #[arg(long)]
    addr: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    info!("Starting llm-gateway");
    let cli = Cli::parse();

    let config_path = cli.config.as_deref().map(Path::new);
    let config = GatewayConfig::load(config_path)?;
    if let Some(path) = config_path {
        info!(path = %path.display(), "Loaded configuration from file");
    } else {
        info!("Loaded configuration from default path");
    }

    let addr = cli.addr.unwrap_or(config.bind);
    let state = Arc::new(GatewayState::new(config));

    server::serve(state, addr).await?;
    info!("Gateway shut down");
    Ok(())
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(true)
            .init();
    });
}
