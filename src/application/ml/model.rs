use super::metrics::RegressionMetrics;
use super::pipeline::{ForestParams, PricePipeline};
use crate::domain::errors::ModelError;
use crate::domain::ml::feature_registry::{FEATURE_NAMES, FeatureVector};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// A fitted pipeline plus the metadata needed to serve and describe it.
///
/// This is the unit persisted by the model store: the scaler, the forest and
/// the feature order always travel together.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainedModel {
    pub pipeline: PricePipeline,
    pub feature_names: Vec<String>,
    pub feature_importance: Vec<FeatureImportance>,
    pub metrics: RegressionMetrics,
    pub trained_at: DateTime<Utc>,
}

impl TrainedModel {
    pub fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        self.pipeline.predict(features)
    }

    pub fn hyperparameters(&self) -> &ForestParams {
        self.pipeline.params()
    }

    /// Fails when the stored feature order differs from the one requests are
    /// assembled in.
    pub fn check_contract(&self) -> Result<(), ModelError> {
        if self.feature_names.iter().map(String::as_str).eq(FEATURE_NAMES) {
            Ok(())
        } else {
            Err(ModelError::FeatureContract {
                expected: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
                found: self.feature_names.clone(),
            })
        }
    }
}
