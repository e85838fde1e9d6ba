//! Configuration module for spotprice.
//!
//! Structured configuration loaded from environment variables, split into the
//! training side and the HTTP server side.

mod server_config;
mod training_config;

pub use server_config::ServerEnvConfig;
pub use training_config::{DEFAULT_DATA_PATH, DEFAULT_MODEL_PATH, TrainingEnvConfig};

/// Main application configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub training: TrainingEnvConfig,
    pub server: ServerEnvConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Call `dotenvy::dotenv().ok()` first to pick up a local `.env` file.
    pub fn from_env() -> Self {
        Self {
            training: TrainingEnvConfig::from_env(),
            server: ServerEnvConfig::from_env(),
        }
    }
}
