pub mod classifier;
pub mod regressor;
pub mod vw;

pub mod estimator_trait;
