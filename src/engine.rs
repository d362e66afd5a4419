//! Narrow boundary to the external online-learning engine.
//!
//! The crate ships no engine of its own: training and inference math,
//! weight storage and hashing all live behind these traits. Persisted
//! model paths and every other engine option travel as plain string
//! values inside the [`VwConfig`](crate::config::VwConfig) handed to
//! [`Engine::create`].
use crate::config::VwConfig;
use crate::error::EstimatorError;

/// Hash slot reserved for the model's constant/bias term.
pub const CONSTANT_HASH: usize = 116060;

/// One bound instance of the external engine.
///
/// A handle moves through three states: created (`create`), possibly
/// mid-training or mid-inference, and finished (`finish`). Once finished,
/// learn and example calls fail with
/// [`EstimatorError::HandleFinished`] until the owner rebinds a fresh
/// handle.
pub trait Engine: Sized {
    type Example: EngineExample;

    /// Instantiate the engine from a configuration map.
    ///
    /// Fails with [`EstimatorError::InvalidConfiguration`] when an option
    /// value is malformed for the engine.
    fn create(config: &VwConfig) -> Result<Self, EstimatorError>;

    /// Train on one formatted example line.
    fn learn(&mut self, line: &str) -> Result<(), EstimatorError>;

    /// Parse a line into an example for test-only scoring.
    fn make_example(&mut self, line: &str) -> Result<Self::Example, EstimatorError>;

    /// Weight at a hashed slot of the weight table.
    fn get_weight(&self, index: usize) -> f64;

    /// Size of the engine's weight table.
    fn num_weights(&self) -> usize;

    /// Finalize the handle. Checked, not silently idempotent: finishing
    /// an already-finished handle fails with
    /// [`EstimatorError::HandleFinished`].
    fn finish(&mut self) -> Result<(), EstimatorError>;

    fn is_finished(&self) -> bool;
}

/// A parsed example owned by a bound engine handle.
pub trait EngineExample {
    /// Disable weight updates for this example.
    fn set_test_only(&mut self, test_only: bool);

    /// Run the example through the engine; scores without updating
    /// weights when test-only.
    fn learn(&mut self) -> Result<(), EstimatorError>;

    fn multiclass_prediction(&self) -> u32;

    fn scalar_prediction(&self) -> f64;

    /// Release per-example engine resources.
    fn release(self);
}
