//! Vani Gateway - Main entry point.

use anyhow::Result;
use vani_common::config::Config;
use vani_common::logging::init_from_config;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration; a missing API key aborts startup here
    let config = Config::load_and_validate()?;

    init_from_config(&config.observability);

    tracing::info!("Vani Gateway v{}", env!("CARGO_PKG_VERSION"));

    vani_gateway::start_server(&config).await
}
