use crate::domain::ml::feature_registry::{FEATURE_NAMES, FeatureVector, TARGET_NAME, indicator};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single observation: operational features plus the settled spot price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub hour: u8,
    /// Grid load in MW
    pub load: f64,
    /// Temperature in °C
    pub temperature: f64,
    pub is_weekend: bool,
    pub is_holiday: bool,
    /// Price in $/MWh
    pub price: f64,
}

impl Sample {
    pub fn features(&self) -> FeatureVector {
        FeatureVector {
            hour: f64::from(self.hour),
            load: self.load,
            temperature: self.temperature,
            is_weekend: self.is_weekend,
            is_holiday: self.is_holiday,
        }
    }
}

/// Ordered, immutable collection of samples used for one training run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    samples: Vec<Sample>,
}

impl Dataset {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Feature rows in `FEATURE_NAMES` order.
    pub fn feature_matrix(&self) -> Vec<Vec<f64>> {
        self.samples.iter().map(|s| s.features().to_row()).collect()
    }

    pub fn targets(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.price).collect()
    }

    /// Per-column descriptive statistics, features first and target last.
    pub fn summary(&self) -> DatasetSummary {
        let mut columns: Vec<ColumnSummary> = FEATURE_NAMES
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let values: Vec<f64> = self
                    .samples
                    .iter()
                    .map(|s| match idx {
                        0 => f64::from(s.hour),
                        1 => s.load,
                        2 => s.temperature,
                        3 => indicator(s.is_weekend),
                        _ => indicator(s.is_holiday),
                    })
                    .collect();
                ColumnSummary::from_values(name, &values)
            })
            .collect();
        columns.push(ColumnSummary::from_values(TARGET_NAME, &self.targets()));

        DatasetSummary {
            rows: self.len(),
            columns,
        }
    }
}

/// Descriptive statistics of a single column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl ColumnSummary {
    fn from_values(name: &str, values: &[f64]) -> Self {
        let n = values.len();
        if n == 0 {
            return Self {
                name: name.to_string(),
                mean: 0.0,
                std: 0.0,
                min: 0.0,
                max: 0.0,
            };
        }

        let mean = values.iter().sum::<f64>() / n as f64;
        // Sample standard deviation (n - 1)
        let std_dev = if n > 1 {
            (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0)).sqrt()
        } else {
            0.0
        };
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        Self {
            name: name.to_string(),
            mean,
            std: std_dev,
            min,
            max,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "rows: {}", self.rows)?;
        writeln!(
            f,
            "{:<12} {:>12} {:>12} {:>12} {:>12}",
            "column", "mean", "std", "min", "max"
        )?;
        for c in &self.columns {
            writeln!(
                f,
                "{:<12} {:>12.3} {:>12.3} {:>12.3} {:>12.3}",
                c.name, c.mean, c.std, c.min, c.max
            )?;
        }
        Ok(())
    }
}
