//! Seeded synthetic electricity price data.
//!
//! Load, temperature and price all follow a 24h sinusoid peaking around
//! midday. Price additionally reacts linearly to the load and temperature
//! deviations and is discounted on weekends and holidays.

use crate::domain::errors::DataError;
use crate::domain::ml::feature_registry::indicator;
use crate::domain::types::{Dataset, Sample};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;

const PEAK_HOUR: f64 = 12.0;

const WEEKEND_PROBABILITY: f64 = 0.286; // 2/7 days
const HOLIDAY_PROBABILITY: f64 = 0.05;

const LOAD_NOISE_STD: f64 = 1000.0;
const TEMPERATURE_NOISE_STD: f64 = 5.0;
const PRICE_NOISE_STD: f64 = 5.0;

const LOAD_PRICE_SLOPE: f64 = 0.001;
const TEMPERATURE_PRICE_SLOPE: f64 = 0.5;
const REFERENCE_TEMPERATURE: f64 = 20.0;
const WEEKEND_DISCOUNT: f64 = 5.0;
const HOLIDAY_DISCOUNT: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticConfig {
    pub n_samples: usize,
    pub seed: u64,
    /// Generated prices never fall below this value
    pub price_floor: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            n_samples: 1000,
            seed: 42,
            price_floor: 10.0,
        }
    }
}

/// Position of `hour` on the daily curve: +1 at noon, -1 at midnight.
fn daily_cycle(hour: u8) -> f64 {
    (PI * (f64::from(hour) - PEAK_HOUR + 6.0) / 12.0).sin()
}

pub fn base_load(hour: u8) -> f64 {
    15000.0 + 5000.0 * daily_cycle(hour)
}

pub fn base_temperature(hour: u8) -> f64 {
    15.0 + 10.0 * daily_cycle(hour)
}

pub fn base_price(hour: u8) -> f64 {
    40.0 + 20.0 * daily_cycle(hour)
}

pub struct SyntheticGenerator {
    rng: StdRng,
    load_noise: Normal<f64>,
    temperature_noise: Normal<f64>,
    price_noise: Normal<f64>,
    price_floor: f64,
}

impl SyntheticGenerator {
    pub fn new(config: &SyntheticConfig) -> Result<Self, DataError> {
        if !(config.price_floor.is_finite() && config.price_floor > 0.0) {
            return Err(DataError::InvalidParameter {
                name: "price_floor",
                reason: format!("must be a positive number, got {}", config.price_floor),
            });
        }

        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            load_noise: normal(LOAD_NOISE_STD)?,
            temperature_noise: normal(TEMPERATURE_NOISE_STD)?,
            price_noise: normal(PRICE_NOISE_STD)?,
            price_floor: config.price_floor,
        })
    }

    pub fn next_sample(&mut self) -> Sample {
        let hour: u8 = self.rng.random_range(0..24);

        let expected_load = base_load(hour);
        let load = expected_load + self.load_noise.sample(&mut self.rng);
        let temperature = base_temperature(hour) + self.temperature_noise.sample(&mut self.rng);

        let is_weekend = self.rng.random_bool(WEEKEND_PROBABILITY);
        let is_holiday = self.rng.random_bool(HOLIDAY_PROBABILITY);

        let price = base_price(hour)
            + LOAD_PRICE_SLOPE * (load - expected_load)
            + TEMPERATURE_PRICE_SLOPE * (temperature - REFERENCE_TEMPERATURE)
            - WEEKEND_DISCOUNT * indicator(is_weekend)
            - HOLIDAY_DISCOUNT * indicator(is_holiday)
            + self.price_noise.sample(&mut self.rng);

        Sample {
            hour,
            load,
            temperature,
            is_weekend,
            is_holiday,
            price: price.max(self.price_floor),
        }
    }

    pub fn take(mut self, n_samples: usize) -> Dataset {
        Dataset::new((0..n_samples).map(|_| self.next_sample()).collect())
    }
}

fn normal(std_dev: f64) -> Result<Normal<f64>, DataError> {
    Normal::new(0.0, std_dev).map_err(|e| DataError::InvalidParameter {
        name: "noise_std",
        reason: e.to_string(),
    })
}

/// Generates `config.n_samples` samples from a fresh generator seeded with `config.seed`.
pub fn generate(config: &SyntheticConfig) -> Result<Dataset, DataError> {
    Ok(SyntheticGenerator::new(config)?.take(config.n_samples))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_dataset() {
        let config = SyntheticConfig {
            n_samples: 500,
            ..Default::default()
        };

        let a = generate(&config).expect("generate");
        let b = generate(&config).expect("generate");
        assert_eq!(a, b);
        assert_eq!(a.len(), 500);
    }

    #[test]
    fn test_different_seed_different_dataset() {
        let a = generate(&SyntheticConfig::default()).expect("generate");
        let b = generate(&SyntheticConfig {
            seed: 7,
            ..Default::default()
        })
        .expect("generate");
        assert_ne!(a, b);
    }

    #[test]
    fn test_price_respects_floor() {
        // A floor far above the curve clamps every sample
        let config = SyntheticConfig {
            n_samples: 200,
            seed: 3,
            price_floor: 75.0,
        };
        let ds = generate(&config).expect("generate");
        assert!(ds.samples().iter().all(|s| s.price >= 75.0));

        let ds = generate(&SyntheticConfig::default()).expect("generate");
        assert!(ds.samples().iter().all(|s| s.price >= 10.0));
    }

    #[test]
    fn test_feature_ranges() {
        let ds = generate(&SyntheticConfig {
            n_samples: 2000,
            ..Default::default()
        })
        .expect("generate");

        assert!(ds.samples().iter().all(|s| s.hour < 24));
        assert!(ds.samples().iter().all(|s| s.load > 0.0));

        let weekends = ds.samples().iter().filter(|s| s.is_weekend).count();
        let holidays = ds.samples().iter().filter(|s| s.is_holiday).count();
        let weekend_share = weekends as f64 / ds.len() as f64;
        let holiday_share = holidays as f64 / ds.len() as f64;
        assert!((0.2..0.37).contains(&weekend_share), "weekend share {}", weekend_share);
        assert!(holiday_share < 0.1, "holiday share {}", holiday_share);
    }

    #[test]
    fn test_rejects_non_positive_floor() {
        let config = SyntheticConfig {
            price_floor: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            generate(&config),
            Err(DataError::InvalidParameter {
                name: "price_floor",
                ..
            })
        ));
    }

    #[test]
    fn test_daily_curve_shape() {
        assert!((base_price(12) - 60.0).abs() < 1e-9);
        assert!((base_price(6) - 40.0).abs() < 1e-9);
        assert!((base_load(0) - 10000.0).abs() < 1e-9);
        assert!((base_temperature(12) - 25.0).abs() < 1e-9);
    }
}
