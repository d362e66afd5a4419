//! vw-estimators: fit/predict/score adapters for an online learner.
//!
//! This crate adapts a Vowpal Wabbit style online-learning engine to a
//! generic estimator protocol so it can sit inside pipelines built around
//! fit/transform/predict/score. It provides the text-format converter,
//! the configuration map, the lazily-bound model handle state machine,
//! and classifier/regressor variants over a shared capability trait.
//!
//! The engine itself (learning math, weight storage, hashing) is an
//! external collaborator behind the traits in [`engine`].
pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod models;
