//! Binary classifier over the base adapter.
//!
//! The raw scalar prediction is read as a signed distance from the
//! hyperplane; a [`DecisionRule`] turns it into a class label. Defaults
//! the loss to logistic when not set. Do not combine with
//! `link = "logistic"`: the link would transform the raw score the
//! threshold depends on, and the adapter does not check for this.
use ndarray::{Array1, Array2};

use crate::config::{self, VwConfig};
use crate::engine::Engine;
use crate::error::EstimatorError;
use crate::format::{self, VwInput};
use crate::models::estimator_trait::Estimator;
use crate::models::vw::{SparseWeights, Vw};

/// Class labels, in threshold order: below the cutoff, at-or-above it.
pub const CLASSES: [f64; 2] = [-1.0, 1.0];

/// Threshold strategy mapping decision scores to class labels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionRule {
    pub pos_threshold: f64,
}

impl DecisionRule {
    pub fn new(pos_threshold: f64) -> Self {
        DecisionRule { pos_threshold }
    }

    /// Binary assignment: score at or above the cutoff picks the positive
    /// class.
    pub fn assign(&self, scores: &Array1<f64>, classes: &[f64; 2]) -> Array1<f64> {
        scores.mapv(|score| classes[(score >= self.pos_threshold) as usize])
    }

    /// Multi-output assignment: the arg-max column per row selects the
    /// class, first maximum winning ties.
    pub fn assign_multi(&self, scores: &Array2<f64>, classes: &[f64]) -> Array1<f64> {
        let labels = scores
            .rows()
            .into_iter()
            .map(|row| {
                let mut best = 0;
                for (idx, &value) in row.iter().enumerate() {
                    if value > row[best] {
                        best = idx;
                    }
                }
                classes[best]
            })
            .collect::<Vec<f64>>();
        Array1::from_vec(labels)
    }
}

impl Default for DecisionRule {
    fn default() -> Self {
        DecisionRule::new(0.0)
    }
}

/// Binary online-learner classifier.
pub struct VwClassifier<E: Engine> {
    inner: Vw<E>,
    rule: DecisionRule,
}

impl<E: Engine> VwClassifier<E> {
    /// Construct a classifier from a configuration map.
    ///
    /// Strips the classifier-only `pos_threshold` (default 0.0) and
    /// defaults `loss_function` to logistic when not explicitly set.
    pub fn new(mut config: VwConfig) -> Result<Self, EstimatorError> {
        let pos_threshold = config.take_f64(config::POS_THRESHOLD, 0.0)?;
        if !config.contains("loss_function") {
            config.insert("loss_function", "logistic");
        }

        Ok(VwClassifier {
            inner: Vw::new(config)?,
            rule: DecisionRule::new(pos_threshold),
        })
    }

    pub fn classes(&self) -> [f64; 2] {
        CLASSES
    }

    pub fn pos_threshold(&self) -> f64 {
        self.rule.pos_threshold
    }

    pub fn fit(
        &mut self,
        x: &VwInput,
        y: Option<&[f64]>,
        sample_weight: Option<&[f64]>,
    ) -> Result<&mut Self, EstimatorError> {
        self.inner.fit(x, y, sample_weight)?;
        Ok(self)
    }

    /// Confidence scores: the signed distance of each sample to the
    /// hyperplane (the base adapter's raw prediction).
    pub fn decision_function(&mut self, x: &VwInput) -> Result<Array1<f64>, EstimatorError> {
        self.inner.predict(x)
    }

    /// Predict class labels for samples in `x`.
    pub fn predict(&mut self, x: &VwInput) -> Result<Array1<f64>, EstimatorError> {
        let scores = self.decision_function(x)?;
        Ok(self.rule.assign(&scores, &CLASSES))
    }

    /// Exact-match accuracy of predicted class labels against `y`, always
    /// in [0, 1]. An empty batch cannot be scored.
    pub fn score(&mut self, x: &VwInput, y: &[f64]) -> Result<f64, EstimatorError> {
        if x.n_rows() == 0 {
            return Err(EstimatorError::ShapeMismatch { expected: 1, actual: 0 });
        }
        let predictions = self.predict(x)?;
        format::check_len(Some(y), predictions.len())?;
        let hits = predictions
            .iter()
            .zip(y.iter())
            .filter(|(pred, truth)| pred == truth)
            .count();
        Ok(hits as f64 / predictions.len() as f64)
    }

    pub fn transform<'a>(&mut self, x: &'a VwInput) -> Result<&'a VwInput, EstimatorError> {
        self.inner.transform(x)
    }

    /// Effective configuration including `pos_threshold`.
    pub fn get_params(&self) -> VwConfig {
        let mut out = self.inner.get_params();
        out.insert(config::POS_THRESHOLD, self.rule.pos_threshold);
        out
    }

    /// Merge `updates` and reconstruct, discarding the bound handle and
    /// fitted flag; `pos_threshold` is preserved unless overridden.
    pub fn set_params(&mut self, updates: VwConfig) -> Result<&mut Self, EstimatorError> {
        let mut merged = self.get_params();
        merged.merge(updates);
        self.inner.release_handle();
        *self = VwClassifier::new(merged)?;
        Ok(self)
    }

    pub fn get_coefs(&mut self) -> Result<SparseWeights, EstimatorError> {
        self.inner.get_coefs()
    }

    pub fn get_intercept(&mut self) -> Result<f64, EstimatorError> {
        self.inner.get_intercept()
    }

    pub fn is_fitted(&self) -> bool {
        self.inner.is_fitted()
    }
}

impl<E: Engine> Estimator for VwClassifier<E> {
    fn fit(
        &mut self,
        x: &VwInput,
        y: Option<&[f64]>,
        sample_weight: Option<&[f64]>,
    ) -> Result<(), EstimatorError> {
        VwClassifier::fit(self, x, y, sample_weight).map(|_| ())
    }

    fn predict(&mut self, x: &VwInput) -> Result<Array1<f64>, EstimatorError> {
        VwClassifier::predict(self, x)
    }

    fn score(&mut self, x: &VwInput, y: &[f64]) -> Result<f64, EstimatorError> {
        VwClassifier::score(self, x, y)
    }

    fn name(&self) -> &str {
        "classifier"
    }
}
