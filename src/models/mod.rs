// Model exports
pub mod columns;
pub mod dataset;
pub mod location;
pub mod results;

pub use dataset::{Cell, Dataset, DatasetError, Row};
pub use location::Coordinates;
pub use results::{
    ExperimentResults, FoldMetrics, MetricKind, ResamplingStrategy, SummaryRow, Technique,
};
