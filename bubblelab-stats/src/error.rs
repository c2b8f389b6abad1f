//! Error taxonomy for model fitting.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatsError {
    #[error("not enough observations: got {got}, need at least {need}")]
    TooFewObservations { need: usize, got: usize },

    #[error("design matrix is singular")]
    SingularDesign,

    #[error("column '{0}' is missing from the table")]
    MissingColumn(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}
