use crate::application::ml::model::TrainedModel;
use std::sync::Arc;

/// Shared handler state. The model is fixed for the lifetime of the server.
#[derive(Clone, Default)]
pub struct AppState {
    pub model: Option<Arc<TrainedModel>>,
}

impl AppState {
    pub fn new(model: Option<TrainedModel>) -> Self {
        Self {
            model: model.map(Arc::new),
        }
    }

    pub fn model_loaded(&self) -> bool {
        self.model.is_some()
    }
}
