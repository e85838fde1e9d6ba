//! HTTP server configuration parsing from environment variables.

use std::env;

/// Server environment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServerEnvConfig {
    pub bind_address: String,
    pub port: u16,
    /// Train and save a model at startup when none is stored
    pub train_if_missing: bool,
}

impl Default for ServerEnvConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 5000,
            train_if_missing: true,
        }
    }
}

impl ServerEnvConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        Self {
            bind_address: lookup("BIND_ADDRESS").unwrap_or(d.bind_address),
            port: lookup("PORT")
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(d.port),
            train_if_missing: lookup("TRAIN_IF_MISSING")
                .and_then(|v| v.parse::<bool>().ok())
                .unwrap_or(d.train_if_missing),
        }
    }

    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
