// Domain-specific error types
pub mod errors;

// Feature contract shared by training and serving
pub mod ml;

// Dataset and sample types
pub mod types;
