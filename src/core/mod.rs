// Core algorithm exports
pub mod cleaning;
pub mod distance;
pub mod experience;
pub mod experiment;
pub mod fairness;
pub mod features;
pub mod mitigation;
pub mod model;
pub mod report;
pub mod resampling;
pub mod scoring;
pub mod similarity;
pub mod text;

pub use cleaning::{normalize_column_name, normalize_column_names, Cleaner, CleaningError, CleaningReport};
pub use distance::{geodesic_distance, haversine_distance, HqDistance};
pub use experience::parse_experience;
pub use experiment::{ExperimentError, FairnessExperiment};
pub use fairness::{fairness_metrics, FairnessMetrics, GroupIndex};
pub use features::{FeatureEngineer, FeatureReport};
pub use model::{performance_metrics, LogisticRegression, PerformanceMetrics, Standardizer};
pub use report::{axis_limits, mean_std, render_metric, render_table, summarize, AxisLimits};
pub use similarity::{cosine_similarity, Analyzer, TextSimilarity};
