//! Feature engineering: column transforms and the pipeline that applies them.

pub mod pipeline;
pub mod transforms;

pub use pipeline::{prepare_features, run_pipeline, FeatureTable};
