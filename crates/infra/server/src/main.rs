//! RPC Register Server binary.

use rpc_register_server::{load_config, Config, RegistryServer};
use tracing_subscriber::filter::LevelFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from the path given as the first argument, if any
    let config = match std::env::args().nth(1) {
        Some(path) => load_config(&path)?,
        None => Config::default(),
    };

    // Initialize tracing
    let level: LevelFilter = config.server.log_level.parse().unwrap_or(LevelFilter::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    // Create and run server
    let server = RegistryServer::new(config);
    server.run().await?;

    Ok(())
}
