//! Vision Assistant API - Main Entry Point
//!
//! Usage: vision-api [config.toml]

use api::run_server;
use pipeline::{init_logging, AssistConfig};
use std::path::Path;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args().nth(1);
    let config = AssistConfig::load(config_path.as_deref().map(Path::new))?;
    init_logging(&config.logging)?;

    info!("=== Vision Assistant API v{} ===", env!("CARGO_PKG_VERSION"));

    run_server(config).await?;

    Ok(())
}
