//! Base estimator adapter over an external online-learning engine.
//!
//! The adapter owns at most one engine handle at a time. The handle is
//! bound lazily on first use so that configuration can still change via
//! `set_params` beforehand; any configuration change finalizes and
//! discards the bound handle, because the engine does not support
//! in-place reconfiguration once weights exist.
use std::fmt;

use log::{debug, trace, warn};
use ndarray::Array1;

use crate::config::{self, VwConfig};
use crate::engine::{Engine, EngineExample, CONSTANT_HASH};
use crate::error::EstimatorError;
use crate::format::{self, VwInput};
use crate::models::estimator_trait::Estimator;

/// Sparse view of the engine's weight table.
///
/// Logical length equals the engine's reported table size; only non-zero
/// slots are stored.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseWeights {
    len: usize,
    entries: Vec<(usize, f64)>,
}

impl SparseWeights {
    /// Logical length of the weight table.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Weight at hash slot `index`, zero when not stored.
    pub fn get(&self, index: usize) -> f64 {
        match self.entries.binary_search_by_key(&index, |&(slot, _)| slot) {
            Ok(pos) => self.entries[pos].1,
            Err(_) => 0.0,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.entries.iter().copied()
    }
}

/// Online-learner base estimator.
///
/// Holds the engine configuration, the adapter-only `passes` and
/// `convert_to_vw` settings, a lazily-bound engine handle and the fitted
/// flag required by `predict`/`score`.
pub struct Vw<E: Engine> {
    params: VwConfig,
    passes: u32,
    convert_to_vw: bool,
    handle: Option<E>,
    fitted: bool,
}

impl<E: Engine> Vw<E> {
    /// Construct an estimator from a configuration map.
    ///
    /// `passes` and `convert_to_vw` are stripped into adapter state;
    /// quiet mode defaults on unless overridden. All other options are
    /// forwarded verbatim to the engine when the handle binds — the
    /// adapter does not validate engine-specific option semantics.
    pub fn new(mut config: VwConfig) -> Result<Self, EstimatorError> {
        let passes = config.take_passes()?;
        let convert_to_vw = config.take_bool(config::CONVERT_TO_VW, true)?;
        if !config.contains("quiet") {
            config.insert("quiet", true);
        }

        Ok(Vw {
            params: config,
            passes,
            convert_to_vw,
            handle: None,
            fitted: false,
        })
    }

    /// Get the bound engine handle, binding it on demand from the
    /// current configuration. Idempotent once bound.
    pub fn vw(&mut self) -> Result<&mut E, EstimatorError> {
        if self.handle.is_none() {
            debug!("binding engine handle with params {}", self.params);
            self.handle = Some(E::create(&self.params)?);
        }
        Ok(self.handle.as_mut().expect("handle was just bound"))
    }

    /// Fit the model on the given rows.
    ///
    /// Runs `passes` full passes over the rows in input order, converting
    /// each row (with its label and weight) to a labeled line unless
    /// `convert_to_vw` is off, in which case `x` must carry pre-formatted
    /// lines. Repeated calls continue training the same handle; rebuild
    /// via `set_params` to start a fresh model.
    ///
    /// Rows submitted before a mid-batch conversion or engine failure are
    /// not rolled back.
    pub fn fit(
        &mut self,
        x: &VwInput,
        y: Option<&[f64]>,
        sample_weight: Option<&[f64]>,
    ) -> Result<&mut Self, EstimatorError> {
        let n_rows = x.n_rows();
        format::check_len(y, n_rows)?;
        format::check_len(sample_weight, n_rows)?;

        debug!("fitting {} rows for {} passes", n_rows, self.passes);
        for pass in 0..self.passes {
            trace!("training pass {}", pass);
            for idx in 0..n_rows {
                let line = if self.convert_to_vw {
                    format::convert_row(x, idx, y.map(|l| l[idx]), sample_weight.map(|w| w[idx]))?
                } else {
                    raw_line(x, idx)?
                };
                self.vw()?.learn(&line)?;
            }
        }

        self.fitted = true;
        Ok(self)
    }

    /// Finalize the handle (binding first if needed) and return the input
    /// unchanged. Exists only so the estimator can sit in a non-terminal
    /// pipeline position.
    pub fn transform<'a>(&mut self, x: &'a VwInput) -> Result<&'a VwInput, EstimatorError> {
        if !self.vw()?.is_finished() {
            self.vw()?.finish()?;
        }
        Ok(x)
    }

    /// Predict one value per row, in input order.
    ///
    /// Each row is submitted as a test-only example; the multiclass
    /// prediction is read when `oaa` is configured, the scalar prediction
    /// otherwise. Finalizes the handle afterwards: a second `predict`
    /// without rebinding fails at the handle layer with
    /// [`EstimatorError::HandleFinished`].
    pub fn predict(&mut self, x: &VwInput) -> Result<Array1<f64>, EstimatorError> {
        if !self.fitted {
            return Err(EstimatorError::NotFitted);
        }

        let n_rows = x.n_rows();
        let multiclass = self.params.contains("oaa");
        let convert = self.convert_to_vw;
        debug!("predicting {} rows (multiclass: {})", n_rows, multiclass);

        let mut predictions = Vec::with_capacity(n_rows);
        for idx in 0..n_rows {
            let line = if convert {
                format::convert_row(x, idx, None, None)?
            } else {
                raw_line(x, idx)?
            };
            let mut example = self.vw()?.make_example(&line)?;
            example.set_test_only(true);
            example.learn()?;
            let value = if multiclass {
                example.multiclass_prediction() as f64
            } else {
                example.scalar_prediction()
            };
            predictions.push(value);
            example.release();
        }

        self.vw()?.finish()?;
        Ok(Array1::from_vec(predictions))
    }

    /// Exact-match accuracy of `predict` output against `y`, always in
    /// [0, 1]. An empty batch cannot be scored.
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

    /// Full effective configuration, including the adapter-only
    /// `passes` and `convert_to_vw` entries.
    pub fn get_params(&self) -> VwConfig {
        let mut out = self.params.clone();
        out.insert(config::PASSES, self.passes);
        out.insert(config::CONVERT_TO_VW, self.convert_to_vw);
        out
    }

    /// Merge `updates` into the effective configuration and reconstruct.
    ///
    /// Discards the bound handle (finalizing it first) and the fitted
    /// flag; `passes` and `convert_to_vw` are preserved unless present in
    /// `updates`.
    pub fn set_params(&mut self, updates: VwConfig) -> Result<&mut Self, EstimatorError> {
        let mut merged = self.get_params();
        merged.merge(updates);
        self.release_handle();
        *self = Vw::new(merged)?;
        Ok(self)
    }

    /// Coefficient weights as a sparse vector over the engine's weight
    /// table. Binds an empty model first when no handle is bound yet.
    pub fn get_coefs(&mut self) -> Result<SparseWeights, EstimatorError> {
        let engine = self.vw()?;
        let len = engine.num_weights();
        let mut entries = Vec::new();
        for index in 0..len {
            let weight = engine.get_weight(index);
            if weight != 0.0 {
                entries.push((index, weight));
            }
        }
        Ok(SparseWeights { len, entries })
    }

    /// Weight at the engine's reserved constant/bias slot; the engine
    /// default (zero) under `noconstant`.
    pub fn get_intercept(&mut self) -> Result<f64, EstimatorError> {
        Ok(self.vw()?.get_weight(CONSTANT_HASH))
    }

    pub fn passes(&self) -> u32 {
        self.passes
    }

    pub fn convert_to_vw(&self) -> bool {
        self.convert_to_vw
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    /// Finalize and drop the bound handle, if any. Engine resources must
    /// be released before the reference is discarded.
    pub(crate) fn release_handle(&mut self) {
        if let Some(mut engine) = self.handle.take() {
            if !engine.is_finished() {
                if let Err(e) = engine.finish() {
                    warn!("failed to finalize engine handle during rebind: {}", e);
                }
            }
        }
    }
}

impl<E: Engine> fmt::Display for Vw<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.get_params())
    }
}

impl<E: Engine> fmt::Debug for Vw<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.get_params())
    }
}

impl<E: Engine> Estimator for Vw<E> {
    fn fit(
        &mut self,
        x: &VwInput,
        y: Option<&[f64]>,
        sample_weight: Option<&[f64]>,
    ) -> Result<(), EstimatorError> {
        Vw::fit(self, x, y, sample_weight).map(|_| ())
    }

    fn predict(&mut self, x: &VwInput) -> Result<Array1<f64>, EstimatorError> {
        Vw::predict(self, x)
    }

    fn score(&mut self, x: &VwInput, y: &[f64]) -> Result<f64, EstimatorError> {
        Vw::score(self, x, y)
    }
}

/// When `convert_to_vw` is off the input must carry pre-formatted lines.
fn raw_line(x: &VwInput, idx: usize) -> Result<String, EstimatorError> {
    match x {
        VwInput::Lines(lines) => Ok(lines[idx].clone()),
        _ => Err(EstimatorError::UnsupportedType(
            "convert_to_vw is off; input must be pre-formatted lines".to_string(),
        )),
    }
}


#[cfg(test)]
mod tests {
    use super::test_engine::StubEngine;
    use super::*;
    use ndarray::arr2;

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn column(values: &[f64]) -> VwInput {
        VwInput::from_rows(values.iter().map(|&v| vec![v]).collect()).unwrap()
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let mut model: Vw<StubEngine> = Vw::new(VwConfig::new()).unwrap();
        let err = model.predict(&column(&[1.0])).unwrap_err();
        assert_eq!(err, EstimatorError::NotFitted);
    }

    #[test]
    fn test_fit_submits_passes_times_rows_in_order() {
        init_logs();
        let mut model: Vw<StubEngine> = Vw::new(VwConfig::new().passes(2)).unwrap();
        let x = column(&[1.0, 2.0, 3.0]);
        model.fit(&x, Some(&[1.0, -1.0, 1.0]), None).unwrap();

        let learned = &model.vw().unwrap().learned;
        assert_eq!(learned.len(), 6);
        assert_eq!(learned[0], "1 1 | 1:1");
        assert_eq!(learned[1], "-1 1 | 1:2");
        assert_eq!(learned[2], "1 1 | 1:3");
        // second pass repeats the same row order
        assert_eq!(learned[..3], learned[3..]);
    }

    #[test]
    fn test_fit_applies_sample_weights() {
        let mut model: Vw<StubEngine> = Vw::new(VwConfig::new()).unwrap();
        let x = column(&[1.0, 2.0]);
        model
            .fit(&x, Some(&[1.0, -1.0]), Some(&[0.5, 2.0]))
            .unwrap();
        let learned = &model.vw().unwrap().learned;
        assert_eq!(learned[0], "1 0.5 | 1:1");
        assert_eq!(learned[1], "-1 2 | 1:2");
    }

    #[test]
    fn test_fit_without_convert_requires_lines() {
        let mut model: Vw<StubEngine> =
            Vw::new(VwConfig::new().convert_to_vw(false)).unwrap();

        let dense = VwInput::from(arr2(&[[1.0]]));
        assert!(matches!(
            model.fit(&dense, None, None),
            Err(EstimatorError::UnsupportedType(_))
        ));

        let lines = VwInput::from_lines(vec!["-1 1 | 1:7".to_string()]);
        model.fit(&lines, None, None).unwrap();
        assert_eq!(model.vw().unwrap().learned, vec!["-1 1 | 1:7".to_string()]);
    }

    #[test]
    fn test_refit_continues_training_same_handle() {
        let mut model: Vw<StubEngine> = Vw::new(VwConfig::new()).unwrap();
        let x = column(&[1.0, 2.0]);
        model.fit(&x, None, None).unwrap();
        model.fit(&x, None, None).unwrap();
        assert_eq!(model.vw().unwrap().learned.len(), 4);
    }

    #[test]
    fn test_fit_label_shape_mismatch() {
        let mut model: Vw<StubEngine> = Vw::new(VwConfig::new()).unwrap();
        let err = model
            .fit(&column(&[1.0, 2.0]), Some(&[1.0]), None)
            .unwrap_err();
        assert_eq!(err, EstimatorError::ShapeMismatch { expected: 2, actual: 1 });
    }

    #[test]
    fn test_mid_batch_failure_keeps_earlier_submissions() {
        let mut model: Vw<StubEngine> =
            Vw::new(VwConfig::new().convert_to_vw(false)).unwrap();
        let lines = VwInput::from_lines(vec![
            "1 1 | 1:1".to_string(),
            "1 1 | poison".to_string(),
            "1 1 | 1:3".to_string(),
        ]);
        assert!(model.fit(&lines, None, None).is_err());
        // the row before the failing one was already submitted; no rollback
        assert_eq!(model.vw().unwrap().learned.len(), 1);
        assert!(!model.is_fitted());
    }

    #[test]
    fn test_predict_echoes_scalar_and_finalizes_handle() {
        init_logs();
        let mut model: Vw<StubEngine> = Vw::new(VwConfig::new()).unwrap();
        let x = column(&[1.0, -1.0, 0.5]);
        model.fit(&x, Some(&[1.0, -1.0, 1.0]), None).unwrap();

        let predictions = model.predict(&x).unwrap();
        assert_eq!(predictions.to_vec(), vec![1.0, -1.0, 0.5]);
        assert!(model.vw().unwrap().is_finished());

        // second predict fails at the handle layer, by contract
        let err = model.predict(&x).unwrap_err();
        assert!(matches!(err, EstimatorError::HandleFinished(_)));
    }

    #[test]
    fn test_predict_multiclass_when_oaa_configured() {
        let mut model: Vw<StubEngine> = Vw::new(VwConfig::new().oaa(3)).unwrap();
        let x = column(&[2.0, 3.0]);
        model.fit(&x, Some(&[2.0, 3.0]), None).unwrap();
        let predictions = model.predict(&x).unwrap();
        assert_eq!(predictions.to_vec(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_score_is_exact_match_accuracy() {
        let mut model: Vw<StubEngine> = Vw::new(VwConfig::new()).unwrap();
        let x = column(&[1.0, -1.0, 1.0]);
        model.fit(&x, Some(&[1.0, 1.0, 1.0]), None).unwrap();
        // echo engine predicts [1, -1, 1] against truths [1, 1, 1]
        let score = model.score(&x, &[1.0, 1.0, 1.0]).unwrap();
        assert_eq!(score, 2.0 / 3.0);
    }

    #[test]
    fn test_score_rejects_empty_batch() {
        let mut model: Vw<StubEngine> = Vw::new(VwConfig::new()).unwrap();
        let x = column(&[1.0]);
        model.fit(&x, Some(&[1.0]), None).unwrap();

        let err = model
            .score(&VwInput::from_lines(Vec::new()), &[])
            .unwrap_err();
        assert_eq!(err, EstimatorError::ShapeMismatch { expected: 1, actual: 0 });

        // the guard fires before predict, so the handle stays usable
        assert_eq!(model.score(&x, &[1.0]).unwrap(), 1.0);
    }

    #[test]
    fn test_transform_returns_input_unchanged_and_finishes() {
        let mut model: Vw<StubEngine> = Vw::new(VwConfig::new()).unwrap();
        let x = column(&[1.0]);
        let out = model.transform(&x).unwrap();
        assert_eq!(out, &x);
        assert!(model.vw().unwrap().is_finished());
        // already finished: transform is a no-op, not an error
        model.transform(&x).unwrap();
    }

    #[test]
    fn test_adapter_keys_stripped_from_engine_config() {
        let mut model: Vw<StubEngine> =
            Vw::new(VwConfig::new().passes(2).convert_to_vw(true).l1(0.1)).unwrap();
        let engine = model.vw().unwrap();
        assert!(!engine.config.contains("passes"));
        assert!(!engine.config.contains("convert_to_vw"));
        assert_eq!(engine.config.get("l1").and_then(|v| v.as_f64()), Some(0.1));
    }

    #[test]
    fn test_quiet_defaults_on_unless_overridden() {
        let model: Vw<StubEngine> = Vw::new(VwConfig::new()).unwrap();
        assert_eq!(model.get_params().get("quiet").and_then(|v| v.as_bool()), Some(true));

        let loud: Vw<StubEngine> = Vw::new(VwConfig::new().quiet(false)).unwrap();
        assert_eq!(loud.get_params().get("quiet").and_then(|v| v.as_bool()), Some(false));
    }

    #[test]
    fn test_get_params_after_set_params_is_merged_map() {
        let mut model: Vw<StubEngine> =
            Vw::new(VwConfig::new().l1(0.1).passes(2)).unwrap();
        let before = model.get_params();

        model.set_params(VwConfig::new().l2(0.5)).unwrap();

        let mut expected = before;
        expected.merge(VwConfig::new().l2(0.5));
        assert_eq!(model.get_params(), expected);
        assert_eq!(model.passes(), 2);
        assert!(model.convert_to_vw());
    }

    #[test]
    fn test_set_params_discards_handle_and_fitted_flag() {
        let mut model: Vw<StubEngine> = Vw::new(VwConfig::new()).unwrap();
        let x = column(&[1.0]);
        model.fit(&x, None, None).unwrap();
        assert!(model.is_fitted());

        model.set_params(VwConfig::new().learning_rate(0.5)).unwrap();
        assert!(!model.is_fitted());
        assert_eq!(model.predict(&x).unwrap_err(), EstimatorError::NotFitted);

        // the fresh handle starts with an empty training history
        model.fit(&x, None, None).unwrap();
        assert_eq!(model.vw().unwrap().learned.len(), 1);
    }

    #[test]
    fn test_invalid_configuration_surfaces_from_create() {
        let mut model: Vw<StubEngine> =
            Vw::new(VwConfig::new().loss_function("bogus")).unwrap();
        let err = model.fit(&column(&[1.0]), None, None).unwrap_err();
        assert!(matches!(err, EstimatorError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_get_coefs_reads_weight_table() {
        let mut model: Vw<StubEngine> = Vw::new(VwConfig::new()).unwrap();
        let coefs = model.get_coefs().unwrap();
        assert_eq!(coefs.len(), 4);
        assert_eq!(coefs.nnz(), 1);
        assert_eq!(coefs.get(1), 0.25);
        assert_eq!(coefs.get(0), 0.0);
    }

    #[test]
    fn test_get_intercept_at_constant_slot() {
        let mut model: Vw<StubEngine> = Vw::new(VwConfig::new()).unwrap();
        assert_eq!(model.get_intercept().unwrap(), 0.5);

        let mut bare: Vw<StubEngine> = Vw::new(VwConfig::new().noconstant(true)).unwrap();
        assert_eq!(bare.get_intercept().unwrap(), 0.0);
    }

    #[test]
    fn test_display_and_debug_print_effective_params() {
        let model: Vw<StubEngine> = Vw::new(VwConfig::new().l1(0.5)).unwrap();
        assert_eq!(
            model.to_string(),
            "{convert_to_vw: true, l1: 0.5, passes: 1, quiet: true}"
        );
        // debug formatting mirrors display, as the parameter map is the
        // whole observable state
        assert_eq!(format!("{:?}", model), model.to_string());
    }
}
