// src/main.rs

use std::sync::Arc;

use color_eyre::eyre::Result;
use tracing::info;

use reconkit::app::AppState;
use reconkit::config::ServerConfig;
use reconkit::{api, logging};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    logging::initialize_logging()?;

    let config = ServerConfig::from_env()?;
    info!(
        cache = %config.cache_file.display(),
        workers = config.workers,
        "Starting with configuration."
    );

    let state = Arc::new(AppState::from_config(config)?);
    api::serve(state).await
}
