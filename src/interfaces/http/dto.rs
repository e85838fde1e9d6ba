//! Request and response bodies of the prediction API.

use crate::application::ml::metrics::RegressionMetrics;
use crate::application::ml::pipeline::ForestParams;
use crate::domain::errors::{DataError, ServiceError};
use crate::domain::ml::feature_registry::FeatureVector;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A numeric field as sent by clients: a JSON number, a boolean or a numeric
/// string. Anything else is kept so the failure surfaces at coercion.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Number(f64),
    Bool(bool),
    Text(String),
    Other(Value),
}

impl NumericInput {
    fn coerce(&self, field: &str) -> Result<f64, ServiceError> {
        let value = match self {
            NumericInput::Number(n) => *n,
            NumericInput::Bool(b) => f64::from(u8::from(*b)),
            NumericInput::Text(s) => s.trim().parse::<f64>().map_err(|_| {
                ServiceError::Inference(format!(
                    "could not convert string to float for {}: '{}'",
                    field, s
                ))
            })?,
            NumericInput::Other(v) => {
                return Err(ServiceError::Inference(format!(
                    "{} must be a number, got {}",
                    field, v
                )));
            }
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(ServiceError::Inference(format!(
                "{} must be finite, got {}",
                field, value
            )))
        }
    }
}

/// A 0/1 indicator field: boolean, number (non-zero is true) or one of
/// `"true"`, `"false"`, `"1"`, `"0"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FlagInput {
    Bool(bool),
    Number(f64),
    Text(String),
    Other(Value),
}

impl FlagInput {
    fn coerce(&self, field: &str) -> Result<bool, ServiceError> {
        match self {
            FlagInput::Bool(b) => Ok(*b),
            FlagInput::Number(n) => Ok(*n != 0.0),
            FlagInput::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(ServiceError::Inference(format!(
                    "{} must be a boolean, got '{}'",
                    field, s
                ))),
            },
            FlagInput::Other(v) => Err(ServiceError::Inference(format!(
                "{} must be a boolean, got {}",
                field, v
            ))),
        }
    }
}

/// `POST /predict` body. `null` counts as absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PredictionRequest {
    pub hour: Option<NumericInput>,
    pub load: Option<NumericInput>,
    pub temperature: Option<NumericInput>,
    pub is_weekend: Option<FlagInput>,
    pub is_holiday: Option<FlagInput>,
}

fn required<'a, T>(value: &'a Option<T>, field: &'static str) -> Result<&'a T, ServiceError> {
    value
        .as_ref()
        .ok_or(ServiceError::BadRequest(DataError::MissingField { field }))
}

impl PredictionRequest {
    pub fn from_json(body: Value) -> Result<Self, ServiceError> {
        serde_json::from_value(body).map_err(|e| {
            ServiceError::BadRequest(DataError::InvalidBody {
                reason: e.to_string(),
            })
        })
    }

    /// Checks presence in feature order, then coerces and range-checks.
    pub fn to_features(&self) -> Result<FeatureVector, ServiceError> {
        let hour = required(&self.hour, "hour")?;
        let load = required(&self.load, "load")?;
        let temperature = required(&self.temperature, "temperature")?;
        let is_weekend = required(&self.is_weekend, "is_weekend")?;
        let is_holiday = required(&self.is_holiday, "is_holiday")?;

        let features = FeatureVector {
            hour: hour.coerce("hour")?,
            load: load.coerce("load")?,
            temperature: temperature.coerce("temperature")?,
            is_weekend: is_weekend.coerce("is_weekend")?,
            is_holiday: is_holiday.coerce("is_holiday")?,
        };

        if !(0.0..=23.0).contains(&features.hour) {
            return Err(ServiceError::BadRequest(DataError::InvalidField {
                field: "hour",
                reason: format!("must be between 0 and 23, got {}", features.hour),
            }));
        }
        Ok(features)
    }
}

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub status: &'static str,
    pub prediction: f64,
    pub input: Value,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub model_loaded: bool,
}

#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub model_type: &'static str,
    pub features: Vec<String>,
    pub preprocessing: &'static str,
    pub feature_importance: BTreeMap<String, f64>,
    pub hyperparameters: ForestParams,
    pub metrics: RegressionMetrics,
    pub trained_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ModelInfoResponse {
    pub status: &'static str,
    pub model_info: ModelInfo,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(err: ServiceError) -> String {
        err.to_string()
    }

    #[test]
    fn test_valid_request() {
        let req = PredictionRequest::from_json(json!({
            "hour": 14, "load": 18000, "temperature": 25,
            "is_weekend": false, "is_holiday": false
        }))
        .expect("parse");
        let f = req.to_features().expect("features");
        assert_eq!(f.to_row(), vec![14.0, 18000.0, 25.0, 0.0, 0.0]);
    }

    #[test]
    fn test_missing_fields_reported_in_order() {
        let req = PredictionRequest::from_json(json!({"load": 1, "is_holiday": 0})).expect("parse");
        assert_eq!(
            message(req.to_features().unwrap_err()),
            "Missing required field: hour"
        );

        let req = PredictionRequest::from_json(json!({
            "hour": 1, "load": 1, "temperature": null, "is_weekend": 0, "is_holiday": 0
        }))
        .expect("parse");
        assert_eq!(
            message(req.to_features().unwrap_err()),
            "Missing required field: temperature"
        );
    }

    #[test]
    fn test_unknown_field_and_non_object_rejected() {
        assert!(matches!(
            PredictionRequest::from_json(json!({"hour": 1, "price": 3})),
            Err(ServiceError::BadRequest(DataError::InvalidBody { .. }))
        ));
        assert!(matches!(
            PredictionRequest::from_json(json!([1, 2, 3])),
            Err(ServiceError::BadRequest(_))
        ));
    }

    #[test]
    fn test_coercion_rules() {
        let req = PredictionRequest::from_json(json!({
            "hour": "7", "load": true, "temperature": " -3.5 ",
            "is_weekend": "TRUE", "is_holiday": 2
        }))
        .expect("parse");
        let f = req.to_features().expect("features");
        assert_eq!(f.hour, 7.0);
        assert_eq!(f.load, 1.0);
        assert_eq!(f.temperature, -3.5);
        assert!(f.is_weekend);
        assert!(f.is_holiday);
    }

    #[test]
    fn test_uncoercible_values_are_inference_errors() {
        let req = PredictionRequest::from_json(json!({
            "hour": 3, "load": "lots", "temperature": 1, "is_weekend": 0, "is_holiday": 0
        }))
        .expect("parse");
        assert!(matches!(
            req.to_features(),
            Err(ServiceError::Inference(_))
        ));

        let req = PredictionRequest::from_json(json!({
            "hour": 3, "load": 1, "temperature": [1], "is_weekend": 0, "is_holiday": 0
        }))
        .expect("parse");
        assert!(matches!(
            req.to_features(),
            Err(ServiceError::Inference(_))
        ));

        let req = PredictionRequest::from_json(json!({
            "hour": 3, "load": 1, "temperature": 1, "is_weekend": "maybe", "is_holiday": 0
        }))
        .expect("parse");
        assert!(matches!(
            req.to_features(),
            Err(ServiceError::Inference(_))
        ));
    }

    #[test]
    fn test_hour_out_of_range() {
        let req = PredictionRequest::from_json(json!({
            "hour": 24, "load": 1, "temperature": 1, "is_weekend": 0, "is_holiday": 0
        }))
        .expect("parse");
        assert!(matches!(
            req.to_features(),
            Err(ServiceError::BadRequest(DataError::InvalidField { field: "hour", .. }))
        ));
    }
}
