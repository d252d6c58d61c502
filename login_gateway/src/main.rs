// Login Gateway Server
//
// Server-side Google login for the front-end web client.
// Usage: login_gateway [host] [port]

use login_gateway::{start_server, GatewayConfig};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse command-line arguments
    let args: Vec<String> = env::args().collect();
    let host = args.get(1).map(|s| s.as_str()).unwrap_or("0.0.0.0");
    let port = args
        .get(2)
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(5000);

    if dotenvy::dotenv().is_ok() {
        tracing::info!("[OK] Loaded .env");
    }

    let config = GatewayConfig::from_env()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    tracing::info!("[OK] Google OAuth configured: {}", config.credentials.client_id);
    tracing::info!("[OK] Discovery document: {}", config.discovery_url);

    start_server(host, port, config).await?;

    Ok(())
}
