//! Traffic Signal Pipeline - Main Entry Point

use anyhow::Result;
use api::config::ServerConfig;
use api::{init_logging, run_server};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    info!("=== Traffic Signal Pipeline v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Starting traffic snapshot service...");

    let config = ServerConfig::load()?;
    run_server(config).await?;

    Ok(())
}
