use super::dto::{
    ErrorResponse, HealthResponse, ModelInfo, ModelInfoResponse, PredictionRequest,
    PredictionResponse,
};
use super::state::AppState;
use crate::domain::errors::{DataError, ServiceError};
use crate::domain::ml::feature_registry::feature_names;
use axum::extract::rejection::JsonRejection;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::{debug, error, warn};

const MODEL_TYPE: &str = "Random Forest Regressor";
const PREPROCESSING: &str = "StandardScaler";

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::ModelUnavailable | ServiceError::Inference(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (
            status,
            Json(ErrorResponse {
                status: "error",
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let model_loaded = state.model_loaded();
    Json(HealthResponse {
        status: if model_loaded { "healthy" } else { "unhealthy" },
        message: "ML service is running",
        model_loaded,
    })
}

/// GET /model-info
pub async fn model_info_handler(
    State(state): State<AppState>,
) -> Result<Json<ModelInfoResponse>, ServiceError> {
    let model = state.model.as_ref().ok_or(ServiceError::ModelUnavailable)?;

    Ok(Json(ModelInfoResponse {
        status: "success",
        model_info: ModelInfo {
            model_type: MODEL_TYPE,
            features: feature_names(),
            preprocessing: PREPROCESSING,
            feature_importance: model
                .feature_importance
                .iter()
                .map(|fi| (fi.feature.clone(), fi.importance))
                .collect(),
            hyperparameters: *model.hyperparameters(),
            metrics: model.metrics,
            trained_at: model.trained_at,
        },
    }))
}

/// POST /predict
///
/// The body is echoed back verbatim as `input` on success.
pub async fn predict_handler(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ServiceError> {
    let model = state.model.as_ref().ok_or(ServiceError::ModelUnavailable)?;

    let Json(body) = payload.map_err(|rejection| {
        warn!("Rejected prediction body: {}", rejection.body_text());
        ServiceError::BadRequest(DataError::InvalidBody {
            reason: rejection.body_text(),
        })
    })?;

    let request = PredictionRequest::from_json(body.clone())?;
    let features = request.to_features()?;

    let prediction = model.predict(&features).map_err(|e| {
        error!("Error making prediction: {}", e);
        ServiceError::Inference(e.to_string())
    })?;
    debug!(prediction, ?features, "Prediction served");

    Ok(Json(PredictionResponse {
        status: "success",
        prediction,
        input: body,
    }))
}
