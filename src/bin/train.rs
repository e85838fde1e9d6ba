//! Model training CLI
//!
//! Trains and saves the price model, generates synthetic datasets and
//! summarizes CSV files. Defaults come from the same environment variables the
//! server reads.

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use spotprice::application::bootstrap;
use spotprice::application::data::synthetic;
use spotprice::application::ml::trainer::{HyperparameterGrid, SearchMode};
use spotprice::config::TrainingEnvConfig;
use spotprice::infrastructure::{ModelStore, historical_csv};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about = "Electricity price model training", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model and write the artifact
    Train {
        /// Historical CSV (falls back to synthetic data when absent)
        #[arg(long)]
        data: Option<PathBuf>,

        /// Output model file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Select hyperparameters by k-fold grid search
        #[arg(long)]
        grid_search: bool,

        /// TOML file with the hyperparameter grid (implies --grid-search)
        #[arg(long)]
        grid_config: Option<PathBuf>,

        /// Number of trees in the random forest
        #[arg(long)]
        n_trees: Option<usize>,

        /// Maximum depth of trees (0 = unbounded)
        #[arg(long)]
        max_depth: Option<u16>,

        /// Random seed for data generation, split and forest
        #[arg(long)]
        seed: Option<u64>,

        /// Synthetic rows to generate when no historical file exists
        #[arg(long)]
        samples: Option<usize>,
    },
    /// Write a synthetic dataset in the historical CSV schema
    Generate {
        #[arg(long)]
        samples: Option<usize>,

        #[arg(long)]
        seed: Option<u64>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print per-column statistics of a CSV dataset
    Describe {
        #[arg(long)]
        data: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Setup logging
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let cli = Cli::parse();
    let mut env_config = TrainingEnvConfig::from_env();

    match cli.command {
        Commands::Train {
            data,
            output,
            grid_search,
            grid_config,
            n_trees,
            max_depth,
            seed,
            samples,
        } => {
            if let Some(data) = data {
                env_config.historical_data_path = data;
            }
            if let Some(output) = output {
                env_config.model_path = output;
            }
            if let Some(n_trees) = n_trees {
                env_config.n_trees = n_trees;
            }
            if let Some(max_depth) = max_depth {
                env_config.max_depth = max_depth;
            }
            if let Some(seed) = seed {
                env_config.random_seed = seed;
            }
            if let Some(samples) = samples {
                env_config.training_samples = samples;
            }
            env_config.grid_search |= grid_search;

            let grid = match grid_config {
                Some(path) => {
                    info!("Loading hyperparameter grid from: {:?}", path);
                    Some(load_grid_from_toml(&path)?)
                }
                None => None,
            };
            let training = env_config.training_config(grid);
            if let SearchMode::Grid { grid, folds } = &training.search {
                info!(
                    "Grid search: n_trees={:?}, max_depth={:?}, folds={}",
                    grid.n_trees, grid.max_depth, folds
                );
            }

            let store = ModelStore::new(env_config.model_path.clone());
            let model = bootstrap::train_and_save(&store, &env_config.data_provider(), &training)?;

            println!("{}", "=".repeat(60));
            println!("Model saved to {:?}", store.path());
            println!("Hyperparameters: {:?}", model.hyperparameters());
            println!(
                "RMSE {:.4}  MAE {:.4}  R2 {:.4}  (n={})",
                model.metrics.rmse, model.metrics.mae, model.metrics.r2, model.metrics.n_samples
            );
            println!("Feature importance:");
            for fi in &model.feature_importance {
                println!("  {:<12} {:.4}", fi.feature, fi.importance);
            }
            println!("{}", "=".repeat(60));
        }
        Commands::Generate {
            samples,
            seed,
            output,
        } => {
            if let Some(seed) = seed {
                env_config.random_seed = seed;
            }
            let n_samples = samples.unwrap_or(env_config.generation_samples);
            let output = output.unwrap_or_else(|| env_config.historical_data_path.clone());

            let dataset = synthetic::generate(&env_config.synthetic(n_samples))?;
            historical_csv::write_dataset(&output, &dataset, series_start()?)?;
            println!("{}", dataset.summary());
        }
        Commands::Describe { data } => {
            let path = data.unwrap_or_else(|| env_config.historical_data_path.clone());
            if !path.exists() {
                bail!("Dataset not found: {:?}", path);
            }
            let dataset = historical_csv::read_dataset(&path)
                .with_context(|| format!("Failed to read dataset {:?}", path))?;
            println!("{}", dataset.summary());
        }
    }

    Ok(())
}

/// First timestamp written by `generate`.
fn series_start() -> Result<NaiveDateTime> {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("Invalid series start date")
}

/// Loads a hyperparameter grid from a TOML file.
fn load_grid_from_toml(path: &Path) -> Result<HyperparameterGrid> {
    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read grid config file: {:?}", path))?;
    let grid: HyperparameterGrid = toml::from_str(&content)
        .context(format!("Failed to parse grid config TOML: {:?}", path))?;
    Ok(grid)
}
