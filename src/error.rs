use std::error::Error;
use std::fmt;

/// Custom error type for estimator and conversion failures
#[derive(Debug, Clone, PartialEq)]
pub enum EstimatorError {
    /// A length or index disagrees with the expected shape (label/weight
    /// vector vs. row count, or a feature index vs. the declared width)
    ShapeMismatch { expected: usize, actual: usize },
    /// A feature value could not be coerced to a number
    UnsupportedType(String),
    /// predict/score called before a successful fit
    NotFitted,
    /// The engine rejected an option value
    InvalidConfiguration(String),
    /// Operation attempted on a finalized model handle without rebinding
    HandleFinished(String),
}

impl fmt::Display for EstimatorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EstimatorError::ShapeMismatch { expected, actual } => {
                write!(f, "Shape mismatch: expected {} but got {}", expected, actual)
            }
            EstimatorError::UnsupportedType(what) => {
                write!(f, "Cannot coerce feature value to a number: {}", what)
            }
            EstimatorError::NotFitted => {
                write!(f, "This estimator is not fitted yet; call fit first")
            }
            EstimatorError::InvalidConfiguration(msg) => {
                write!(f, "Engine rejected configuration: {}", msg)
            }
            EstimatorError::HandleFinished(op) => {
                write!(f, "Model handle is finished; cannot {} without rebinding", op)
            }
        }
    }
}

impl Error for EstimatorError {}
