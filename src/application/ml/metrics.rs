use serde::{Deserialize, Serialize};

/// Held-out regression quality.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
    pub n_samples: usize,
}

pub fn mean_squared_error(predictions: &[f64], actuals: &[f64]) -> f64 {
    let n = predictions.len().min(actuals.len());
    if n == 0 {
        return 0.0;
    }
    predictions
        .iter()
        .zip(actuals)
        .map(|(p, t)| (p - t).powi(2))
        .sum::<f64>()
        / n as f64
}

impl RegressionMetrics {
    pub fn evaluate(predictions: &[f64], actuals: &[f64]) -> Self {
        let n = predictions.len().min(actuals.len());
        if n == 0 {
            return Self {
                rmse: 0.0,
                mae: 0.0,
                r2: 0.0,
                n_samples: 0,
            };
        }

        let mse = mean_squared_error(predictions, actuals);
        let mae: f64 = predictions
            .iter()
            .zip(actuals)
            .map(|(p, t)| (p - t).abs())
            .sum::<f64>()
            / n as f64;
        let mean_y = actuals.iter().take(n).sum::<f64>() / n as f64;
        let var_y: f64 = actuals.iter().take(n).map(|t| (t - mean_y).powi(2)).sum::<f64>() / n as f64;
        let r2 = if var_y > 0.0 { 1.0 - mse / var_y } else { 0.0 };

        Self {
            rmse: mse.sqrt(),
            mae,
            r2,
            n_samples: n,
        }
    }
}
