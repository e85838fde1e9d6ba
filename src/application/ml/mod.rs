pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod scaler;
pub mod trainer;
