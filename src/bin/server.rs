//! Spotprice Server - electricity price prediction API
//!
//! Loads the stored model (training one first when none exists) and serves
//! `/health`, `/model-info` and `/predict`.
//!
//! # Usage
//! ```sh
//! PORT=5000 MODEL_PATH=model/electricity_price_model.json cargo run --bin server
//! ```
//!
//! # Environment Variables
//! - `BIND_ADDRESS` / `PORT` - Listen address (default: 0.0.0.0:5000)
//! - `MODEL_PATH` - Model artifact location
//! - `TRAIN_IF_MISSING` - Train a model at startup when none is stored (default: true)
//! - `GRID_SEARCH` - Grid-search hyperparameters during startup training instead of
//!   using `N_TREES` / `MAX_DEPTH` directly (default: false)

use anyhow::{Context, Result};
use spotprice::application::bootstrap;
use spotprice::config::Config;
use spotprice::infrastructure::ModelStore;
use spotprice::interfaces::http::{AppState, router};
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("Spotprice Server {} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env();
    info!(
        "Configuration loaded: model={:?}, data={:?}, train_if_missing={}",
        config.training.model_path,
        config.training.historical_data_path,
        config.server.train_if_missing
    );

    // Resolve the model before accepting connections
    let training = config.training.clone();
    let train_if_missing = config.server.train_if_missing;
    let model = tokio::task::spawn_blocking(move || {
        let store = ModelStore::new(training.model_path.clone());
        let provider = training.data_provider();
        bootstrap::load_or_train(
            &store,
            &provider,
            &training.training_config(None),
            train_if_missing,
        )
    })
    .await
    .context("Model bootstrap task panicked")?;

    if model.is_none() {
        warn!("No model available. Serving in degraded mode.");
    }

    let app = router(AppState::new(model));
    let address = config.server.socket_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received. Exiting...");
        })
        .await
        .context("Server error")?;

    Ok(())
}
