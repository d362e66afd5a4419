//! Configuration map for the online-learning engine.
//!
//! Options are collected into a uniform string-keyed map for transport to
//! the engine boundary: an absent option means "use the engine default",
//! a present option is forwarded verbatim. A small number of keys are
//! adapter-only and are stripped from the map before it reaches the
//! engine (`passes`, `convert_to_vw`, `pos_threshold`).
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EstimatorError;

/// Key for the adapter-only training pass count (positive int, default 1).
pub const PASSES: &str = "passes";
/// Key for the adapter-only input conversion flag (bool, default true).
pub const CONVERT_TO_VW: &str = "convert_to_vw";
/// Key for the classifier-only positive-class cutoff (float, default 0.0).
pub const POS_THRESHOLD: &str = "pos_threshold";

/// A single option value, forwarded to the engine as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ConfigValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            ConfigValue::Int(i) if *i >= 0 => u32::try_from(*i).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Float(v) => Some(*v),
            ConfigValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Int(i) => write!(f, "{}", i),
            ConfigValue::Float(v) => write!(f, "{}", v),
            ConfigValue::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(v: bool) -> Self {
        ConfigValue::Bool(v)
    }
}

impl From<i64> for ConfigValue {
    fn from(v: i64) -> Self {
        ConfigValue::Int(v)
    }
}

impl From<u32> for ConfigValue {
    fn from(v: u32) -> Self {
        ConfigValue::Int(v as i64)
    }
}

impl From<f64> for ConfigValue {
    fn from(v: f64) -> Self {
        ConfigValue::Float(v)
    }
}

impl From<&str> for ConfigValue {
    fn from(v: &str) -> Self {
        ConfigValue::Str(v.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(v: String) -> Self {
        ConfigValue::Str(v)
    }
}

/// Ordered map of engine option name to value.
///
/// Built with the typed setters below or the generic [`VwConfig::set`],
/// which accepts any option name and forwards it verbatim; the adapter
/// does not validate engine-specific option semantics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VwConfig {
    #[serde(flatten)]
    options: BTreeMap<String, ConfigValue>,
}

impl VwConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set any named option, recognized or not.
    pub fn set(mut self, name: &str, value: impl Into<ConfigValue>) -> Self {
        self.options.insert(name.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<ConfigValue>) {
        self.options.insert(name.to_string(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<ConfigValue> {
        self.options.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&ConfigValue> {
        self.options.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    /// Merge `updates` into this map, overwriting existing entries.
    pub fn merge(&mut self, updates: VwConfig) {
        self.options.extend(updates.options);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfigValue)> {
        self.options.iter()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Remove and coerce a boolean option, falling back to `default`.
    pub(crate) fn take_bool(&mut self, name: &str, default: bool) -> Result<bool, EstimatorError> {
        match self.options.remove(name) {
            None => Ok(default),
            Some(v) => v.as_bool().ok_or_else(|| {
                EstimatorError::InvalidConfiguration(format!("'{}' must be a boolean, got {}", name, v))
            }),
        }
    }

    /// Remove and coerce a float option, falling back to `default`.
    pub(crate) fn take_f64(&mut self, name: &str, default: f64) -> Result<f64, EstimatorError> {
        match self.options.remove(name) {
            None => Ok(default),
            Some(v) => v.as_f64().ok_or_else(|| {
                EstimatorError::InvalidConfiguration(format!("'{}' must be a number, got {}", name, v))
            }),
        }
    }

    /// Remove and validate the pass count: a positive integer, default 1.
    pub(crate) fn take_passes(&mut self) -> Result<u32, EstimatorError> {
        match self.options.remove(PASSES) {
            None => Ok(1),
            Some(v) => match v.as_u32() {
                Some(n) if n >= 1 => Ok(n),
                _ => Err(EstimatorError::InvalidConfiguration(format!(
                    "'{}' must be a positive integer, got {}",
                    PASSES, v
                ))),
            },
        }
    }

    // General options

    pub fn probabilities(self, v: bool) -> Self {
        self.set("probabilities", v)
    }

    pub fn random_seed(self, v: i64) -> Self {
        self.set("random_seed", v)
    }

    pub fn ring_size(self, v: u32) -> Self {
        self.set("ring_size", v)
    }

    /// Adapter-only: convert X input to engine format (default true).
    pub fn convert_to_vw(self, v: bool) -> Self {
        self.set(CONVERT_TO_VW, v)
    }

    // Update options

    pub fn bfgs(self, v: bool) -> Self {
        self.set("bfgs", v)
    }

    pub fn mem(self, v: u32) -> Self {
        self.set("mem", v)
    }

    pub fn learning_rate(self, v: f64) -> Self {
        self.set("learning_rate", v)
    }

    pub fn power_t(self, v: f64) -> Self {
        self.set("power_t", v)
    }

    pub fn decay_learning_rate(self, v: f64) -> Self {
        self.set("decay_learning_rate", v)
    }

    pub fn initial_t(self, v: f64) -> Self {
        self.set("initial_t", v)
    }

    /// Use an existing regressor to determine which parameters may update.
    pub fn feature_mask(self, v: &str) -> Self {
        self.set("feature_mask", v)
    }

    // Weight options

    pub fn initial_regressor(self, v: &str) -> Self {
        self.set("initial_regressor", v)
    }

    pub fn initial_weight(self, v: f64) -> Self {
        self.set("initial_weight", v)
    }

    pub fn random_weights(self, v: bool) -> Self {
        self.set("random_weights", v)
    }

    pub fn input_feature_regularizer(self, v: &str) -> Self {
        self.set("input_feature_regularizer", v)
    }

    // Diagnostic options

    pub fn audit(self, v: bool) -> Self {
        self.set("audit", v)
    }

    /// Progress update frequency. int: additive, float: multiplicative.
    pub fn progress(self, v: &str) -> Self {
        self.set("progress", v)
    }

    pub fn quiet(self, v: bool) -> Self {
        self.set("quiet", v)
    }

    // Feature options

    /// How to hash the features: "strings" or "all".
    pub fn hash(self, v: &str) -> Self {
        self.set("hash", v)
    }

    pub fn ignore(self, v: &str) -> Self {
        self.set("ignore", v)
    }

    pub fn keep(self, v: &str) -> Self {
        self.set("keep", v)
    }

    pub fn redefine(self, v: &str) -> Self {
        self.set("redefine", v)
    }

    /// Number of bits in the feature table.
    pub fn bit_precision(self, v: u32) -> Self {
        self.set("bit_precision", v)
    }

    /// Don't add a constant feature.
    pub fn noconstant(self, v: bool) -> Self {
        self.set("noconstant", v)
    }

    /// Set the initial value of the constant.
    pub fn constant(self, v: f64) -> Self {
        self.set("constant", v)
    }

    pub fn ngram(self, v: &str) -> Self {
        self.set("ngram", v)
    }

    pub fn skips(self, v: &str) -> Self {
        self.set("skips", v)
    }

    pub fn feature_limit(self, v: &str) -> Self {
        self.set("feature_limit", v)
    }

    pub fn affix(self, v: &str) -> Self {
        self.set("affix", v)
    }

    pub fn spelling(self, v: &str) -> Self {
        self.set("spelling", v)
    }

    pub fn dictionary(self, v: &str) -> Self {
        self.set("dictionary", v)
    }

    pub fn dictionary_path(self, v: &str) -> Self {
        self.set("dictionary_path", v)
    }

    pub fn interactions(self, v: &str) -> Self {
        self.set("interactions", v)
    }

    pub fn permutations(self, v: bool) -> Self {
        self.set("permutations", v)
    }

    pub fn leave_duplicate_interactions(self, v: bool) -> Self {
        self.set("leave_duplicate_interactions", v)
    }

    pub fn quadratic(self, v: &str) -> Self {
        self.set("quadratic", v)
    }

    pub fn cubic(self, v: &str) -> Self {
        self.set("cubic", v)
    }

    // Example options

    /// Ignore label information and just test.
    pub fn testonly(self, v: bool) -> Self {
        self.set("testonly", v)
    }

    pub fn min_prediction(self, v: f64) -> Self {
        self.set("min_prediction", v)
    }

    pub fn max_prediction(self, v: f64) -> Self {
        self.set("max_prediction", v)
    }

    pub fn sort_features(self, v: bool) -> Self {
        self.set("sort_features", v)
    }

    /// Loss function: squared, classic, hinge, logistic or quantile.
    pub fn loss_function(self, v: &str) -> Self {
        self.set("loss_function", v)
    }

    /// Apply a link function to convert output, e.g. "logistic".
    pub fn link(self, v: &str) -> Self {
        self.set("link", v)
    }

    pub fn quantile_tau(self, v: f64) -> Self {
        self.set("quantile_tau", v)
    }

    pub fn l1(self, v: f64) -> Self {
        self.set("l1", v)
    }

    pub fn l2(self, v: f64) -> Self {
        self.set("l2", v)
    }

    pub fn named_labels(self, v: &str) -> Self {
        self.set("named_labels", v)
    }

    // Output model options

    pub fn final_regressor(self, v: &str) -> Self {
        self.set("final_regressor", v)
    }

    pub fn readable_model(self, v: &str) -> Self {
        self.set("readable_model", v)
    }

    pub fn invert_hash(self, v: &str) -> Self {
        self.set("invert_hash", v)
    }

    /// Adapter-only: number of training passes (default 1).
    pub fn passes(self, v: u32) -> Self {
        self.set(PASSES, v)
    }

    pub fn save_resume(self, v: bool) -> Self {
        self.set("save_resume", v)
    }

    pub fn output_feature_regularizer_binary(self, v: &str) -> Self {
        self.set("output_feature_regularizer_binary", v)
    }

    pub fn output_feature_regularizer_text(self, v: &str) -> Self {
        self.set("output_feature_regularizer_text", v)
    }

    // Multiclass options

    /// One-against-all multiclass learning with `v` labels.
    pub fn oaa(self, v: u32) -> Self {
        self.set("oaa", v)
    }

    // Classifier options

    /// Classifier-only: positive-class score cutoff (default 0.0).
    pub fn pos_threshold(self, v: f64) -> Self {
        self.set(POS_THRESHOLD, v)
    }
}

impl fmt::Display for VwConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.options.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, value)?;
        }
        write!(f, "}}")
    }
}
