//! Regressor over the base adapter.
//!
//! A thin delegation layer: predictions are the engine's raw scalar
//! output, and scoring follows the base adapter's exact-match accuracy.
use ndarray::Array1;

use crate::config::VwConfig;
use crate::engine::Engine;
use crate::error::EstimatorError;
use crate::format::VwInput;
use crate::models::estimator_trait::Estimator;
use crate::models::vw::{SparseWeights, Vw};

/// Online-learner regressor.
pub struct VwRegressor<E: Engine> {
    inner: Vw<E>,
}

impl<E: Engine> VwRegressor<E> {
    pub fn new(config: VwConfig) -> Result<Self, EstimatorError> {
        Ok(VwRegressor {
            inner: Vw::new(config)?,
        })
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

    pub fn predict(&mut self, x: &VwInput) -> Result<Array1<f64>, EstimatorError> {
        self.inner.predict(x)
    }

    pub fn score(&mut self, x: &VwInput, y: &[f64]) -> Result<f64, EstimatorError> {
        self.inner.score(x, y)
    }

    pub fn transform<'a>(&mut self, x: &'a VwInput) -> Result<&'a VwInput, EstimatorError> {
        self.inner.transform(x)
    }

    pub fn get_params(&self) -> VwConfig {
        self.inner.get_params()
    }

    pub fn set_params(&mut self, updates: VwConfig) -> Result<&mut Self, EstimatorError> {
        self.inner.set_params(updates)?;
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

impl<E: Engine> Estimator for VwRegressor<E> {
    fn fit(
        &mut self,
        x: &VwInput,
        y: Option<&[f64]>,
        sample_weight: Option<&[f64]>,
    ) -> Result<(), EstimatorError> {
        VwRegressor::fit(self, x, y, sample_weight).map(|_| ())
    }

    fn predict(&mut self, x: &VwInput) -> Result<Array1<f64>, EstimatorError> {
        VwRegressor::predict(self, x)
    }

    fn score(&mut self, x: &VwInput, y: &[f64]) -> Result<f64, EstimatorError> {
        VwRegressor::score(self, x, y)
    }

    fn name(&self) -> &str {
        "regressor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::vw::test_engine::StubEngine;

    fn column(values: &[f64]) -> VwInput {
        VwInput::from_rows(values.iter().map(|&v| vec![v]).collect()).unwrap()
    }

    #[test]
    fn test_regressor_predicts_raw_scalars() {
        let mut model: VwRegressor<StubEngine> = VwRegressor::new(VwConfig::new()).unwrap();
        let x = column(&[0.5, 2.5]);
        model.fit(&x, Some(&[0.5, 2.5]), None).unwrap();
        let predictions = model.predict(&x).unwrap();
        assert_eq!(predictions.to_vec(), vec![0.5, 2.5]);
    }

    #[test]
    fn test_estimators_share_capability_trait() {
        let mut models: Vec<Box<dyn Estimator>> = vec![
            Box::new(VwRegressor::<StubEngine>::new(VwConfig::new()).unwrap()),
            Box::new(crate::models::classifier::VwClassifier::<StubEngine>::new(VwConfig::new()).unwrap()),
        ];

        let x = column(&[1.0, -1.0]);
        for model in models.iter_mut() {
            model.fit(&x, Some(&[1.0, -1.0]), None).unwrap();
            let predictions = model.predict(&x).unwrap();
            assert_eq!(predictions.to_vec(), vec![1.0, -1.0]);
        }
    }
}
