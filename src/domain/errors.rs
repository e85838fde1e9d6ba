use thiserror::Error;

/// Errors caused by missing or malformed input data, either a training dataset
/// or a prediction request.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Dataset is empty")]
    EmptyDataset,

    #[error("Dataset has {rows} rows: need at least {required} training rows and one test row")]
    TooFewSamples { rows: usize, required: usize },

    #[error("Missing required column: {column}")]
    MissingColumn { column: String },

    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    #[error("I/O error on {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Invalid request body: {reason}")]
    InvalidBody { reason: String },

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Errors raised while fitting or evaluating the pipeline.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Feature row has {actual} columns, expected {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Cannot fit on an empty matrix")]
    EmptyInput,

    #[error("Model training failed: {0}")]
    Training(String),

    #[error("Prediction failed: {0}")]
    Inference(String),

    #[error("Artifact feature order {found:?} does not match {expected:?}")]
    FeatureContract {
        expected: Vec<String>,
        found: Vec<String>,
    },
}

/// Errors from a full training run.
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Invalid training configuration: {0}")]
    InvalidConfig(String),
}

/// Errors surfaced at the prediction service boundary.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    BadRequest(DataError),

    #[error("No model is loaded")]
    ModelUnavailable,

    #[error("Error making prediction: {0}")]
    Inference(String),
}
