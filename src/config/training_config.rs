//! Training configuration parsing from environment variables.
//!
//! This module covers the data source, the synthetic fallback and the forest
//! hyperparameters used by both the `train` CLI and startup training.

use crate::application::data::provider::DataProvider;
use crate::application::data::synthetic::SyntheticConfig;
use crate::application::ml::pipeline::ForestParams;
use crate::application::ml::trainer::{HyperparameterGrid, SearchMode, TrainingConfig};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_DATA_PATH: &str = "data/historical_electricity_data.csv";
pub const DEFAULT_MODEL_PATH: &str = "model/electricity_price_model.json";

/// Training environment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingEnvConfig {
    pub historical_data_path: PathBuf,
    pub model_path: PathBuf,
    /// Synthetic rows generated when no historical file is present
    pub training_samples: usize,
    /// Rows written by the `generate` command
    pub generation_samples: usize,
    pub random_seed: u64,
    pub price_floor: f64,
    pub n_trees: usize,
    /// 0 disables the depth limit
    pub max_depth: u16,
    pub grid_search: bool,
    pub cv_folds: usize,
    pub test_fraction: f64,
}

impl Default for TrainingEnvConfig {
    fn default() -> Self {
        Self {
            historical_data_path: PathBuf::from(DEFAULT_DATA_PATH),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            training_samples: 10_000,
            generation_samples: 1_000,
            random_seed: 42,
            price_floor: 10.0,
            n_trees: 100,
            max_depth: 20,
            grid_search: false,
            cv_folds: 3,
            test_fraction: 0.2,
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl TrainingEnvConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Unparseable values fall back to
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        Self {
            historical_data_path: lookup("HISTORICAL_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(d.historical_data_path),
            model_path: lookup("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(d.model_path),
            training_samples: parse_or(&lookup, "TRAINING_SAMPLES", d.training_samples),
            generation_samples: parse_or(&lookup, "GENERATION_SAMPLES", d.generation_samples),
            random_seed: parse_or(&lookup, "RANDOM_SEED", d.random_seed),
            price_floor: parse_or(&lookup, "PRICE_FLOOR", d.price_floor),
            n_trees: parse_or(&lookup, "N_TREES", d.n_trees),
            max_depth: parse_or(&lookup, "MAX_DEPTH", d.max_depth),
            grid_search: parse_or(&lookup, "GRID_SEARCH", d.grid_search),
            cv_folds: parse_or(&lookup, "CV_FOLDS", d.cv_folds),
            test_fraction: parse_or(&lookup, "TEST_FRACTION", d.test_fraction),
        }
    }

    pub fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_trees: self.n_trees,
            max_depth: (self.max_depth > 0).then_some(self.max_depth),
            seed: self.random_seed,
            ..ForestParams::default()
        }
    }

    pub fn training_config(&self, grid: Option<HyperparameterGrid>) -> TrainingConfig {
        let search = if self.grid_search || grid.is_some() {
            SearchMode::Grid {
                grid: grid.unwrap_or_default(),
                folds: self.cv_folds,
            }
        } else {
            SearchMode::Fixed
        };
        TrainingConfig {
            test_fraction: self.test_fraction,
            seed: self.random_seed,
            forest: self.forest_params(),
            search,
        }
    }

    pub fn synthetic(&self, n_samples: usize) -> SyntheticConfig {
        SyntheticConfig {
            n_samples,
            seed: self.random_seed,
            price_floor: self.price_floor,
        }
    }

    pub fn data_provider(&self) -> DataProvider {
        DataProvider::new(
            self.historical_data_path.clone(),
            self.synthetic(self.training_samples),
        )
    }
}
