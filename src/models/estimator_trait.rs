use ndarray::Array1;

use crate::error::EstimatorError;
use crate::format::VwInput;

/// A small trait abstraction for the fit/predict/score capability shared
/// by the base adapter and its classifier/regressor variants. This
/// centralizes the contract in the `models` module so the variants can be
/// used interchangeably behind `Box<dyn Estimator>`.
pub trait Estimator {
    /// Fit the model. Labels and sample weights are optional; absent
    /// entries default to 1 during conversion.
    fn fit(
        &mut self,
        x: &VwInput,
        y: Option<&[f64]>,
        sample_weight: Option<&[f64]>,
    ) -> Result<(), EstimatorError>;

    /// Predict one value per row (raw scores or class labels depending on
    /// the variant).
    fn predict(&mut self, x: &VwInput) -> Result<Array1<f64>, EstimatorError>;

    /// Exact-match accuracy of predictions against `y`.
    fn score(&mut self, x: &VwInput, y: &[f64]) -> Result<f64, EstimatorError>;

    /// Optional human readable name for the estimator
    fn name(&self) -> &str {
        "estimator"
    }
}
