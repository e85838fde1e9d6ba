use super::synthetic::{self, SyntheticConfig};
use crate::domain::errors::DataError;
use crate::domain::types::Dataset;
use crate::infrastructure::historical_csv;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Outcome of looking for the historical dataset.
#[derive(Debug)]
pub enum DatasetLookup {
    Found(Dataset),
    Missing,
}

/// Where the training data came from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataOrigin {
    Historical(PathBuf),
    Synthetic { n_samples: usize, seed: u64 },
}

pub struct DataProvider {
    historical_path: PathBuf,
    synthetic: SyntheticConfig,
}

impl DataProvider {
    pub fn new(historical_path: PathBuf, synthetic: SyntheticConfig) -> Self {
        Self {
            historical_path,
            synthetic,
        }
    }

    pub fn historical_path(&self) -> &Path {
        &self.historical_path
    }

    /// Reads the historical file if it exists. An absent file is `Missing`,
    /// a present but unreadable one is an error.
    pub fn lookup(&self) -> Result<DatasetLookup, DataError> {
        if !self.historical_path.exists() {
            return Ok(DatasetLookup::Missing);
        }
        historical_csv::read_dataset(&self.historical_path).map(DatasetLookup::Found)
    }

    /// Historical data when available, otherwise a seeded synthetic dataset.
    pub fn load_or_synthesize(&self) -> Result<(Dataset, DataOrigin), DataError> {
        match self.lookup() {
            Ok(DatasetLookup::Found(dataset)) => {
                info!(
                    "Loaded historical data with {} records from {:?}",
                    dataset.len(),
                    self.historical_path
                );
                return Ok((dataset, DataOrigin::Historical(self.historical_path.clone())));
            }
            Ok(DatasetLookup::Missing) => {
                warn!(
                    "Historical data file not found at {:?}. Generating synthetic data instead.",
                    self.historical_path
                );
            }
            Err(e) => {
                error!(
                    "Error loading historical data from {:?}: {}. Generating synthetic data instead.",
                    self.historical_path, e
                );
            }
        }

        let dataset = synthetic::generate(&self.synthetic)?;
        info!(
            n_samples = dataset.len(),
            seed = self.synthetic.seed,
            "Generated synthetic dataset"
        );
        Ok((
            dataset,
            DataOrigin::Synthetic {
                n_samples: self.synthetic.n_samples,
                seed: self.synthetic.seed,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_dir() -> PathBuf {
        let unique_id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "spotprice_test_{}_{}_{}_provider",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0),
            unique_id
        ));
        fs::create_dir_all(&dir).expect("Failed to create test temp dir");
        dir
    }

    fn small_synthetic() -> SyntheticConfig {
        SyntheticConfig {
            n_samples: 50,
            seed: 11,
            price_floor: 10.0,
        }
    }

    #[test]
    fn test_missing_file_falls_back_to_synthetic() {
        let dir = temp_dir();
        let provider = DataProvider::new(dir.join("absent.csv"), small_synthetic());

        assert!(matches!(provider.lookup(), Ok(DatasetLookup::Missing)));

        let (ds, origin) = provider.load_or_synthesize().expect("fallback");
        assert_eq!(ds.len(), 50);
        assert_eq!(
            origin,
            DataOrigin::Synthetic {
                n_samples: 50,
                seed: 11
            }
        );

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_historical_file_is_preferred() {
        let dir = temp_dir();
        let path = dir.join("history.csv");
        fs::write(
            &path,
            "timestamp,hour,load,temperature,is_weekend,is_holiday,price\n\
             2024-01-01 08:00:00,8,16500,12.0,0,0,44.0\n\
             2024-01-01 09:00:00,9,17000,13.5,0,0,47.5\n",
        )
        .expect("write");

        let provider = DataProvider::new(path.clone(), small_synthetic());
        let (ds, origin) = provider.load_or_synthesize().expect("load");
        assert_eq!(ds.len(), 2);
        assert_eq!(origin, DataOrigin::Historical(path));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_unreadable_file_falls_back_to_synthetic() {
        let dir = temp_dir();
        let path = dir.join("broken.csv");
        fs::write(&path, "hour,load\n1,2\n").expect("write");

        let provider = DataProvider::new(path, small_synthetic());
        assert!(matches!(
            provider.lookup(),
            Err(DataError::MissingColumn { .. })
        ));

        let (ds, origin) = provider.load_or_synthesize().expect("fallback");
        assert_eq!(ds.len(), 50);
        assert!(matches!(origin, DataOrigin::Synthetic { .. }));

        let _ = fs::remove_dir_all(&dir);
    }
}
