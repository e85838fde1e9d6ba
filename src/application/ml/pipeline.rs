use super::scaler::StandardScaler;
use crate::domain::errors::ModelError;
use crate::domain::ml::feature_registry::{FeatureVector, N_FEATURES};
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::fmt;

pub type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Random forest hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    /// Number of trees in the forest
    pub n_trees: usize,
    /// Maximum depth of trees (`None` grows until leaves are pure)
    pub max_depth: Option<u16>,
    /// Minimum samples required to split an internal node
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features tried at each split (`None` leaves smartcore's `sqrt(n)` default)
    #[serde(default)]
    pub m: Option<usize>,
    /// Seed for bootstrap sampling and feature bagging
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: Some(20),
            min_samples_split: 2,
            min_samples_leaf: 1,
            m: Some(N_FEATURES),
            seed: 42,
        }
    }
}

impl ForestParams {
    pub fn to_smartcore(&self) -> RandomForestRegressorParameters {
        let params = RandomForestRegressorParameters::default()
            .with_n_trees(self.n_trees)
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_seed(self.seed);
        let params = match self.m {
            Some(m) => params.with_m(m),
            None => params,
        };
        match self.max_depth {
            Some(depth) => params.with_max_depth(depth),
            None => params,
        }
    }
}

/// Scaler followed by a random forest regressor. Both stages are column-order
/// sensitive and are always persisted together.
#[derive(Serialize, Deserialize)]
pub struct PricePipeline {
    scaler: StandardScaler,
    forest: Forest,
    params: ForestParams,
}

impl fmt::Debug for PricePipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PricePipeline")
            .field("scaler", &self.scaler)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl PricePipeline {
    /// Fits the scaler on `x`, then the forest on the scaled rows.
    pub fn fit(x: &[Vec<f64>], y: &[f64], params: ForestParams) -> Result<Self, ModelError> {
        if x.len() != y.len() {
            return Err(ModelError::Training(format!(
                "{} feature rows but {} targets",
                x.len(),
                y.len()
            )));
        }

        let scaler = StandardScaler::fit(x)?;
        let scaled = scaler.transform(x)?;
        let x_matrix = DenseMatrix::from_2d_vec(&scaled)
            .map_err(|e| ModelError::Training(format!("Matrix error: {}", e)))?;

        let forest = RandomForestRegressor::fit(&x_matrix, &y.to_vec(), params.to_smartcore())
            .map_err(|e| ModelError::Training(e.to_string()))?;

        Ok(Self {
            scaler,
            forest,
            params,
        })
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn predict_rows(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let scaled = self.scaler.transform(rows)?;
        let input_matrix = DenseMatrix::from_2d_vec(&scaled)
            .map_err(|e| ModelError::Inference(format!("Matrix creation failed: {}", e)))?;

        self.forest
            .predict(&input_matrix)
            .map_err(|e| ModelError::Inference(e.to_string()))
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let predictions = self.predict_rows(&[features.to_row()])?;
        match predictions.first() {
            Some(pred) if pred.is_finite() => Ok(*pred),
            Some(pred) => Err(ModelError::Inference(format!(
                "non-finite prediction {}",
                pred
            ))),
            None => Err(ModelError::Inference("No prediction returned".to_string())),
        }
    }
}
