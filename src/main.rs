// src/main.rs

use std::sync::Arc;

use color_eyre::eyre::Result;
use tracing::info;

mod api;
mod config;
mod core;
mod logging;

use crate::config::Config;
use crate::core::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    logging::initialize_logging()?;

    let config = Config::from_env()?;
    let orchestrator = Arc::new(Orchestrator::new(&config)?);

    let router = api::router(orchestrator);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "Listening for scan requests.");
    axum::serve(listener, router).await?;

    Ok(())
}
