// Startup model resolution
pub mod bootstrap;

// Historical and synthetic training data
pub mod data;

// Scaler, forest pipeline and training
pub mod ml;
