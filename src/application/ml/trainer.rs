//! Training pipeline: seeded split, optional k-fold grid search over forest
//! hyperparameters, held-out evaluation and permutation importances.

use super::metrics::{RegressionMetrics, mean_squared_error};
use super::model::{FeatureImportance, TrainedModel};
use super::pipeline::{ForestParams, PricePipeline};
use crate::domain::errors::{DataError, TrainingError};
use crate::domain::ml::feature_registry::{FEATURE_NAMES, N_FEATURES, feature_names};
use crate::domain::types::Dataset;
use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Candidate values for grid search. A `max_depth` of 0 means unbounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HyperparameterGrid {
    pub n_trees: Vec<usize>,
    pub max_depth: Vec<u16>,
}

impl Default for HyperparameterGrid {
    fn default() -> Self {
        Self {
            n_trees: vec![50, 100, 200],
            max_depth: vec![0, 10, 20, 30],
        }
    }
}

impl HyperparameterGrid {
    pub fn len(&self) -> usize {
        self.n_trees.len() * self.max_depth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Expands the grid with `max_depth` as the outer loop. Fields not covered
    /// by the grid are taken from `base`.
    pub fn combinations(&self, base: &ForestParams) -> Vec<ForestParams> {
        let mut combos = Vec::with_capacity(self.len());
        for &depth in &self.max_depth {
            for &n_trees in &self.n_trees {
                combos.push(ForestParams {
                    n_trees,
                    max_depth: (depth > 0).then_some(depth),
                    ..*base
                });
            }
        }
        combos
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchMode {
    Fixed,
    Grid { grid: HyperparameterGrid, folds: usize },
}

#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// Share of rows held out for evaluation
    pub test_fraction: f64,
    /// Seed for the split and the importance shuffles
    pub seed: u64,
    /// Fixed-mode parameters, also the base for every grid candidate
    pub forest: ForestParams,
    pub search: SearchMode,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
            forest: ForestParams::default(),
            search: SearchMode::Fixed,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<(), TrainingError> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(TrainingError::InvalidConfig(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.forest.n_trees == 0 {
            return Err(TrainingError::InvalidConfig(
                "n_trees must be at least 1".to_string(),
            ));
        }
        if self.forest.min_samples_split < 2 || self.forest.min_samples_leaf < 1 {
            return Err(TrainingError::InvalidConfig(
                "min_samples_split must be >= 2 and min_samples_leaf >= 1".to_string(),
            ));
        }
        if let SearchMode::Grid { grid, folds } = &self.search {
            if *folds < 2 {
                return Err(TrainingError::InvalidConfig(format!(
                    "cross-validation needs at least 2 folds, got {}",
                    folds
                )));
            }
            if grid.is_empty() {
                return Err(TrainingError::InvalidConfig(
                    "hyperparameter grid is empty".to_string(),
                ));
            }
            if grid.n_trees.contains(&0) {
                return Err(TrainingError::InvalidConfig(
                    "grid n_trees values must be at least 1".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn min_train_rows(&self) -> usize {
        match &self.search {
            SearchMode::Fixed => 2,
            SearchMode::Grid { folds, .. } => (*folds).max(2),
        }
    }
}

/// Cross-validation outcome of one grid candidate.
#[derive(Debug, Clone, Serialize)]
pub struct CvResult {
    pub params: ForestParams,
    /// Mean negative MSE across folds (higher is better)
    pub mean_score: f64,
    pub fold_scores: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub metrics: RegressionMetrics,
    pub params: ForestParams,
    pub cv_results: Vec<CvResult>,
    pub feature_importance: Vec<FeatureImportance>,
    pub train_samples: usize,
    pub test_samples: usize,
}

struct Partition {
    x: Vec<Vec<f64>>,
    y: Vec<f64>,
}

impl Partition {
    fn select(x: &[Vec<f64>], y: &[f64], indices: &[usize]) -> Self {
        Self {
            x: indices.iter().map(|&i| x[i].clone()).collect(),
            y: indices.iter().map(|&i| y[i]).collect(),
        }
    }
}

/// Splits indices `0..n` into `n_test` held-out and `n - n_test` training
/// positions after a seeded shuffle.
fn split_indices(n: usize, n_test: usize, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    let train = indices.split_off(n_test);
    (train, indices)
}

/// Contiguous k-fold ranges; the first `n % k` folds get one extra row.
fn fold_bounds(n: usize, k: usize) -> Vec<(usize, usize)> {
    let base = n / k;
    let extra = n % k;
    let mut bounds = Vec::with_capacity(k);
    let mut start = 0;
    for fold in 0..k {
        let size = base + usize::from(fold < extra);
        bounds.push((start, start + size));
        start += size;
    }
    bounds
}

fn cross_validate(
    x: &[Vec<f64>],
    y: &[f64],
    params: ForestParams,
    folds: usize,
) -> Result<CvResult, TrainingError> {
    let mut fold_scores = Vec::with_capacity(folds);
    for (start, end) in fold_bounds(x.len(), folds) {
        let train_idx: Vec<usize> = (0..start).chain(end..x.len()).collect();
        let valid_idx: Vec<usize> = (start..end).collect();
        let train = Partition::select(x, y, &train_idx);
        let valid = Partition::select(x, y, &valid_idx);

        // Scaler is refitted on each fold's training rows inside fit()
        let pipeline = PricePipeline::fit(&train.x, &train.y, params)?;
        let preds = pipeline.predict_rows(&valid.x)?;
        fold_scores.push(-mean_squared_error(&preds, &valid.y));
    }

    let mean_score = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
    Ok(CvResult {
        params,
        mean_score,
        fold_scores,
    })
}

/// Highest mean score wins. Strict comparison keeps the earliest candidate
/// in grid order on ties.
fn select_best(results: &[CvResult]) -> Option<ForestParams> {
    let mut best: Option<&CvResult> = None;
    for result in results {
        if best.is_none_or(|b| result.mean_score > b.mean_score) {
            best = Some(result);
        }
    }
    best.map(|b| b.params)
}

fn grid_search(
    x: &[Vec<f64>],
    y: &[f64],
    grid: &HyperparameterGrid,
    base: &ForestParams,
    folds: usize,
) -> Result<(ForestParams, Vec<CvResult>), TrainingError> {
    let candidates = grid.combinations(base);
    info!(
        candidates = candidates.len(),
        folds, "Starting hyperparameter grid search"
    );

    let results = candidates
        .into_par_iter()
        .map(|params| cross_validate(x, y, params, folds))
        .collect::<Result<Vec<_>, _>>()?;

    let best = select_best(&results)
        .ok_or_else(|| TrainingError::InvalidConfig("hyperparameter grid is empty".to_string()))?;

    info!(
        n_trees = best.n_trees,
        max_depth = ?best.max_depth,
        "Best parameters found"
    );
    Ok((best, results))
}

/// Mean increase in held-out MSE when one column is shuffled, clipped at zero
/// and normalized to sum to one.
fn permutation_importance(
    pipeline: &PricePipeline,
    x: &[Vec<f64>],
    y: &[f64],
    seed: u64,
) -> Result<Vec<FeatureImportance>, TrainingError> {
    let baseline = mean_squared_error(&pipeline.predict_rows(x)?, y);

    let mut raw = Vec::with_capacity(N_FEATURES);
    for column in 0..N_FEATURES {
        let mut values: Vec<f64> = x.iter().map(|row| row[column]).collect();
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(column as u64));
        values.shuffle(&mut rng);

        let permuted: Vec<Vec<f64>> = x
            .iter()
            .zip(&values)
            .map(|(row, &v)| {
                let mut row = row.clone();
                row[column] = v;
                row
            })
            .collect();
        let mse = mean_squared_error(&pipeline.predict_rows(&permuted)?, y);
        raw.push((mse - baseline).max(0.0));
    }

    let total: f64 = raw.iter().sum();
    Ok(FEATURE_NAMES
        .iter()
        .zip(raw)
        .map(|(name, r)| FeatureImportance {
            feature: name.to_string(),
            importance: if total > 0.0 { r / total } else { 0.0 },
        })
        .collect())
}

/// Fits the scaler + forest pipeline on `dataset` and evaluates it on a
/// seeded held-out partition.
pub fn train(
    dataset: &Dataset,
    config: &TrainingConfig,
) -> Result<(TrainedModel, TrainingReport), TrainingError> {
    config.validate()?;
    if dataset.is_empty() {
        return Err(DataError::EmptyDataset.into());
    }

    let n = dataset.len();
    let n_test = (n as f64 * config.test_fraction).ceil() as usize;
    let required = config.min_train_rows();
    if n_test < 1 || n_test >= n || n - n_test < required {
        return Err(DataError::TooFewSamples { rows: n, required }.into());
    }

    let x = dataset.feature_matrix();
    let y = dataset.targets();
    let (train_idx, test_idx) = split_indices(n, n_test, config.seed);
    let train_part = Partition::select(&x, &y, &train_idx);
    let test_part = Partition::select(&x, &y, &test_idx);
    info!(
        train = train_part.y.len(),
        test = test_part.y.len(),
        "Split dataset"
    );

    let (params, cv_results) = match &config.search {
        SearchMode::Fixed => (config.forest, Vec::new()),
        SearchMode::Grid { grid, folds } => {
            grid_search(&train_part.x, &train_part.y, grid, &config.forest, *folds)?
        }
    };

    info!(
        n_trees = params.n_trees,
        max_depth = ?params.max_depth,
        "Fitting final pipeline"
    );
    let pipeline = PricePipeline::fit(&train_part.x, &train_part.y, params)?;

    let predictions = pipeline.predict_rows(&test_part.x)?;
    let metrics = RegressionMetrics::evaluate(&predictions, &test_part.y);
    info!(
        rmse = metrics.rmse,
        mae = metrics.mae,
        r2 = metrics.r2,
        "Held-out evaluation"
    );

    let feature_importance =
        permutation_importance(&pipeline, &test_part.x, &test_part.y, config.seed)?;
    let mut ranked = feature_importance.clone();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    for fi in &ranked {
        info!("  {}: {:.4}", fi.feature, fi.importance);
    }

    let report = TrainingReport {
        metrics,
        params,
        cv_results,
        feature_importance: feature_importance.clone(),
        train_samples: train_part.y.len(),
        test_samples: test_part.y.len(),
    };
    let model = TrainedModel {
        pipeline,
        feature_names: feature_names(),
        feature_importance,
        metrics,
        trained_at: Utc::now(),
    };
    Ok((model, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::data::synthetic::{SyntheticConfig, generate};

    fn dataset(n: usize) -> Dataset {
        generate(&SyntheticConfig {
            n_samples: n,
            seed: 7,
            price_floor: 10.0,
        })
        .expect("generate")
    }

    fn fast_config() -> TrainingConfig {
        TrainingConfig {
            forest: ForestParams {
                n_trees: 10,
                max_depth: Some(8),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_default_grid_order() {
        let grid = HyperparameterGrid::default();
        let combos = grid.combinations(&ForestParams::default());
        assert_eq!(combos.len(), 12);
        assert_eq!((combos[0].max_depth, combos[0].n_trees), (None, 50));
        assert_eq!((combos[1].max_depth, combos[1].n_trees), (None, 100));
        assert_eq!((combos[3].max_depth, combos[3].n_trees), (Some(10), 50));
        assert_eq!(combos[11].max_depth, Some(30));
    }

    #[test]
    fn test_fold_bounds_cover_all_rows() {
        assert_eq!(fold_bounds(10, 3), vec![(0, 4), (4, 7), (7, 10)]);
        assert_eq!(fold_bounds(6, 3), vec![(0, 2), (2, 4), (4, 6)]);
    }

    #[test]
    fn test_split_sizes_and_disjointness() {
        let (train, test) = split_indices(10, 2, 42);
        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 2);
        assert!(test.iter().all(|i| !train.contains(i)));
        assert_eq!(split_indices(10, 2, 42), (train, test));
    }

    #[test]
    fn test_train_fixed_mode() {
        let (model, report) = train(&dataset(400), &fast_config()).expect("train");

        assert_eq!(report.train_samples, 320);
        assert_eq!(report.test_samples, 80);
        assert!(report.cv_results.is_empty());
        assert!(report.metrics.rmse.is_finite());
        assert!(report.metrics.r2 > 0.0, "r2 = {}", report.metrics.r2);
        assert_eq!(model.feature_names, feature_names());

        let total: f64 = model.feature_importance.iter().map(|f| f.importance).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(model.feature_importance.iter().all(|f| f.importance >= 0.0));
    }

    #[test]
    fn test_train_is_deterministic() {
        let ds = dataset(200);
        let (_, a) = train(&ds, &fast_config()).expect("train");
        let (_, b) = train(&ds, &fast_config()).expect("train");
        assert_eq!(a.metrics, b.metrics);
    }

    #[test]
    fn test_grid_search_picks_a_candidate() {
        let config = TrainingConfig {
            search: SearchMode::Grid {
                grid: HyperparameterGrid {
                    n_trees: vec![5, 10],
                    max_depth: vec![3, 0],
                },
                folds: 3,
            },
            ..fast_config()
        };
        let (model, report) = train(&dataset(150), &config).expect("train");

        assert_eq!(report.cv_results.len(), 4);
        assert!(report.cv_results.iter().all(|r| r.fold_scores.len() == 3));
        assert!(report.cv_results.iter().all(|r| r.mean_score <= 0.0));
        let best = report
            .cv_results
            .iter()
            .map(|r| r.mean_score)
            .fold(f64::NEG_INFINITY, f64::max);
        let chosen = report
            .cv_results
            .iter()
            .find(|r| r.params == report.params)
            .expect("chosen params were evaluated");
        assert_eq!(chosen.mean_score, best);
        assert_eq!(*model.hyperparameters(), report.params);
    }

    fn grid_config(n_trees: Vec<usize>, max_depth: Vec<u16>) -> TrainingConfig {
        TrainingConfig {
            search: SearchMode::Grid {
                grid: HyperparameterGrid { n_trees, max_depth },
                folds: 3,
            },
            ..fast_config()
        }
    }

    #[test]
    fn test_grid_search_is_deterministic() {
        let ds = dataset(150);
        let config = grid_config(vec![5, 10], vec![0, 3, 6]);

        let (model_a, a) = train(&ds, &config).expect("train");
        let (model_b, b) = train(&ds, &config).expect("train");

        assert_eq!(a.metrics, b.metrics);
        assert_eq!(a.params, b.params);
        assert_eq!(model_a.feature_importance, model_b.feature_importance);
        let scores_a: Vec<f64> = a.cv_results.iter().map(|r| r.mean_score).collect();
        let scores_b: Vec<f64> = b.cv_results.iter().map(|r| r.mean_score).collect();
        assert_eq!(scores_a, scores_b);
        // Results keep grid order despite parallel evaluation
        let order: Vec<ForestParams> = a.cv_results.iter().map(|r| r.params).collect();
        assert_eq!(order, config_combinations(&config));
    }

    fn config_combinations(config: &TrainingConfig) -> Vec<ForestParams> {
        match &config.search {
            SearchMode::Grid { grid, .. } => grid.combinations(&config.forest),
            SearchMode::Fixed => Vec::new(),
        }
    }

    #[test]
    fn test_select_best_prefers_earliest_on_ties() {
        let base = ForestParams::default();
        let candidate = |n_trees: usize, mean_score: f64| CvResult {
            params: ForestParams { n_trees, ..base },
            mean_score,
            fold_scores: vec![mean_score],
        };

        let results = vec![candidate(50, -4.0), candidate(100, -2.0), candidate(200, -2.0)];
        assert_eq!(select_best(&results).map(|p| p.n_trees), Some(100));

        let results = vec![candidate(50, -1.0), candidate(100, -1.0)];
        assert_eq!(select_best(&results).map(|p| p.n_trees), Some(50));

        assert_eq!(select_best(&[]), None);
    }

    #[test]
    fn test_grid_tie_keeps_first_depth() {
        // 30 rows cannot grow trees 30 levels deep, so both depths build the
        // same forest and score identically
        let ds = dataset(30);

        let (_, report) = train(&ds, &grid_config(vec![5], vec![0, 30])).expect("train");
        assert_eq!(report.cv_results.len(), 2);
        assert_eq!(
            report.cv_results[0].mean_score,
            report.cv_results[1].mean_score
        );
        assert_eq!(report.params.max_depth, None);

        let (_, report) = train(&ds, &grid_config(vec![5], vec![30, 0])).expect("train");
        assert_eq!(report.params.max_depth, Some(30));
    }

    #[test]
    fn test_empty_dataset_fails_before_fitting() {
        let err = train(&Dataset::new(Vec::new()), &fast_config()).unwrap_err();
        assert!(matches!(err, TrainingError::Data(DataError::EmptyDataset)));
    }

    #[test]
    fn test_too_few_rows() {
        let err = train(&dataset(2), &fast_config()).unwrap_err();
        assert!(matches!(
            err,
            TrainingError::Data(DataError::TooFewSamples { rows: 2, .. })
        ));

        let grid = TrainingConfig {
            search: SearchMode::Grid {
                grid: HyperparameterGrid::default(),
                folds: 3,
            },
            ..fast_config()
        };
        assert!(train(&dataset(3), &grid).is_err());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = TrainingConfig {
            test_fraction: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TrainingError::InvalidConfig(_))
        ));

        let config = TrainingConfig {
            search: SearchMode::Grid {
                grid: HyperparameterGrid::default(),
                folds: 1,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_grid_from_toml() {
        let grid: HyperparameterGrid =
            toml::from_str("n_trees = [20, 40]\nmax_depth = [0, 5]").expect("parse");
        assert_eq!(grid.len(), 4);

        let partial: HyperparameterGrid = toml::from_str("n_trees = [7]").expect("parse");
        assert_eq!(partial.max_depth, HyperparameterGrid::default().max_depth);
    }
}
