use crate::application::data::provider::DataProvider;
use crate::application::ml::model::TrainedModel;
use crate::application::ml::trainer::{self, TrainingConfig};
use crate::infrastructure::model_store::ModelStore;
use anyhow::{Context, Result};
use tracing::{error, info, warn};

/// Trains a model from the provider's data and persists it through `store`.
pub fn train_and_save(
    store: &ModelStore,
    provider: &DataProvider,
    config: &TrainingConfig,
) -> Result<TrainedModel> {
    let (dataset, origin) = provider
        .load_or_synthesize()
        .context("Failed to obtain training data")?;
    info!("Training on {} rows ({:?})", dataset.len(), origin);
    info!("Dataset summary:\n{}", dataset.summary());

    let (model, report) = trainer::train(&dataset, config).context("Training failed")?;
    info!(
        rmse = report.metrics.rmse,
        mae = report.metrics.mae,
        r2 = report.metrics.r2,
        train = report.train_samples,
        test = report.test_samples,
        "Model trained"
    );

    store.save(&model)?;
    Ok(model)
}

/// Resolves the model to serve at startup.
///
/// A stored artifact is used as-is. When none exists and `train_if_missing` is
/// set, a fresh model is trained and saved. Any failure leaves the service
/// without a model; an unreadable artifact is never overwritten.
pub fn load_or_train(
    store: &ModelStore,
    provider: &DataProvider,
    config: &TrainingConfig,
    train_if_missing: bool,
) -> Option<TrainedModel> {
    match store.load() {
        Ok(Some(model)) => {
            info!("Model loaded successfully from {:?}", store.path());
            return Some(model);
        }
        Ok(None) => {
            warn!("Model file not found at {:?}", store.path());
        }
        Err(e) => {
            error!("Error loading model: {:#}", e);
            return None;
        }
    }

    if !train_if_missing {
        warn!("Startup training disabled. Serving without a model.");
        return None;
    }

    info!("Training a new model before serving...");
    match train_and_save(store, provider, config) {
        Ok(model) => Some(model),
        Err(e) => {
            error!("Startup training failed: {:#}", e);
            None
        }
    }
}
