use serde::{Deserialize, Serialize};

/// Ordered list of feature names.
/// The scaler and the forest are both column-order sensitive: any change here
/// is a breaking change for persisted models.
pub const FEATURE_NAMES: [&str; 5] = ["hour", "load", "temperature", "is_weekend", "is_holiday"];

/// Number of model inputs.
pub const N_FEATURES: usize = FEATURE_NAMES.len();

/// Regression target column.
pub const TARGET_NAME: &str = "price";

/// One row of model inputs, already coerced to their numeric/boolean types.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub hour: f64,
    pub load: f64,
    pub temperature: f64,
    pub is_weekend: bool,
    pub is_holiday: bool,
}

impl FeatureVector {
    /// Converts features into a vector of f64 in `FEATURE_NAMES` order.
    pub fn to_row(&self) -> Vec<f64> {
        vec![
            self.hour,
            self.load,
            self.temperature,
            indicator(self.is_weekend),
            indicator(self.is_holiday),
        ]
    }
}

/// Encodes a boolean flag the way the model was trained on it.
pub fn indicator(flag: bool) -> f64 {
    if flag { 1.0 } else { 0.0 }
}

/// Feature names as owned strings, used when stamping an artifact.
pub fn feature_names() -> Vec<String> {
    FEATURE_NAMES.iter().map(|name| (*name).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_vector_length() {
        let fv = FeatureVector {
            hour: 0.0,
            load: 0.0,
            temperature: 0.0,
            is_weekend: false,
            is_holiday: false,
        };
        assert_eq!(fv.to_row().len(), N_FEATURES);
    }

    #[test]
    fn test_feature_consistency() {
        let fv = FeatureVector {
            hour: 14.0,
            load: 18000.0,
            temperature: 25.0,
            is_weekend: true,
            is_holiday: false,
        };

        let row = fv.to_row();
        // hour is index 0
        assert_eq!(row[0], 14.0);
        assert_eq!(row[1], 18000.0);
        assert_eq!(row[2], 25.0);
        // flags are last
        assert_eq!(row[3], 1.0);
        assert_eq!(row[4], 0.0);
    }

    #[test]
    fn test_feature_names_match_constant() {
        assert_eq!(feature_names(), FEATURE_NAMES);
    }
}
