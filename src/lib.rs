//! Fairhire - fairness evaluation pipeline for hiring data
//!
//! This library cleans raw hiring exports, engineers candidate/job match
//! features and measures how bias-mitigation techniques trade predictive
//! performance for group fairness.

pub mod config;
pub mod core;
pub mod models;
pub mod services;
pub mod synthetic;

// Re-export commonly used types
pub use config::Settings;
pub use core::{Cleaner, FairnessExperiment, FeatureEngineer};
pub use models::{Dataset, ExperimentResults, FoldMetrics, SummaryRow, Technique};
