use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Bias-mitigation technique applied during an experiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Technique {
    /// Baseline, no mitigation
    None,
    /// Pre-processing: instance weights that decouple label and group
    Reweighing,
    /// Pre-processing: per-group quantile repair of feature distributions
    DisparateImpactRemover,
    /// In-processing: fairness-regularized logistic regression
    PrejudiceRemover,
}

impl Technique {
    pub fn as_str(&self) -> &'static str {
        match self {
            Technique::None => "none",
            Technique::Reweighing => "reweighing",
            Technique::DisparateImpactRemover => "disparate_impact_remover",
            Technique::PrejudiceRemover => "prejudice_remover",
        }
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Technique {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "none" | "baseline" => Ok(Technique::None),
            "reweighing" => Ok(Technique::Reweighing),
            "disparate_impact_remover" | "dir" => Ok(Technique::DisparateImpactRemover),
            "prejudice_remover" | "pr" => Ok(Technique::PrejudiceRemover),
            other => Err(format!("unknown technique '{}'", other)),
        }
    }
}

/// How the training fold is rebalanced before fitting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResamplingStrategy {
    #[default]
    None,
    Oversample,
    Undersample,
}

/// Whether a metric measures predictive quality or group fairness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Performance,
    Fairness,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricKind::Performance => f.write_str("Performance"),
            MetricKind::Fairness => f.write_str("Fairness"),
        }
    }
}

/// Performance metrics in display order, with labels
pub const PERFORMANCE_METRICS: [(&str, &str); 5] = [
    ("accuracy", "Accuracy"),
    ("precision", "Precision"),
    ("recall", "Recall"),
    ("f1", "F1 Score"),
    ("roc_auc", "ROC AUC"),
];

/// Fairness metrics in display order, with labels
pub const FAIRNESS_METRICS: [(&str, &str); 4] = [
    ("demographic_parity_ratio", "Dem. Parity Ratio"),
    ("equalized_odds_ratio", "Equal. Odds Ratio"),
    ("demographic_parity_difference", "Dem. Parity Diff"),
    ("equalized_odds_difference", "Equal. Odds Diff"),
];

/// Kind of a metric by name, `None` for unknown names
pub fn metric_kind(name: &str) -> Option<MetricKind> {
    if PERFORMANCE_METRICS.iter().any(|(n, _)| *n == name) {
        Some(MetricKind::Performance)
    } else if FAIRNESS_METRICS.iter().any(|(n, _)| *n == name) {
        Some(MetricKind::Fairness)
    } else {
        None
    }
}

/// Metrics measured on one cross-validation test fold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoldMetrics {
    pub fold: usize,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub roc_auc: f64,
    pub demographic_parity_ratio: f64,
    pub equalized_odds_ratio: f64,
    pub demographic_parity_difference: f64,
    pub equalized_odds_difference: f64,
}

impl FoldMetrics {
    /// Named metric values in display order
    pub fn metrics(&self) -> [(&'static str, f64); 9] {
        [
            ("accuracy", self.accuracy),
            ("precision", self.precision),
            ("recall", self.recall),
            ("f1", self.f1),
            ("roc_auc", self.roc_auc),
            ("demographic_parity_ratio", self.demographic_parity_ratio),
            ("equalized_odds_ratio", self.equalized_odds_ratio),
            ("demographic_parity_difference", self.demographic_parity_difference),
            ("equalized_odds_difference", self.equalized_odds_difference),
        ]
    }
}

/// Output of a fairness experiment, persisted as JSON between runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentResults {
    #[serde(rename = "runId")]
    pub run_id: uuid::Uuid,
    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub technique: Technique,
    #[serde(rename = "protectedAttributes")]
    pub protected_attributes: Vec<String>,
    pub levels: Vec<f64>,
    pub folds: usize,
    /// Fold metrics keyed by `"{attribute}_repair_{level}"`
    pub results: BTreeMap<String, Vec<FoldMetrics>>,
}

impl ExperimentResults {
    pub fn key(attribute: &str, level: f64) -> String {
        format!("{}_repair_{}", attribute, level)
    }

    /// Fold metrics of one (attribute, level) cell; empty when absent
    pub fn folds_for(&self, attribute: &str, level: f64) -> &[FoldMetrics] {
        self.results
            .get(&Self::key(attribute, level))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Aggregated value of one metric for one attribute and level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub attribute: String,
    pub level: f64,
    pub metric: String,
    pub kind: MetricKind,
    pub mean: f64,
    pub std: f64,
    pub folds: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_technique_parsing() {
        assert_eq!("reweighing".parse::<Technique>().unwrap(), Technique::Reweighing);
        assert_eq!("DIR".parse::<Technique>().unwrap(), Technique::DisparateImpactRemover);
        assert_eq!(
            "prejudice-remover".parse::<Technique>().unwrap(),
            Technique::PrejudiceRemover
        );
        assert!("magic".parse::<Technique>().is_err());
    }

    #[test]
    fn test_metric_kind() {
        assert_eq!(metric_kind("f1"), Some(MetricKind::Performance));
        assert_eq!(metric_kind("equalized_odds_ratio"), Some(MetricKind::Fairness));
        assert_eq!(metric_kind("fold"), None);
    }

    #[test]
    fn test_result_key() {
        assert_eq!(ExperimentResults::key("sex", 0.5), "sex_repair_0.5");
        assert_eq!(ExperimentResults::key("sex", 1.0), "sex_repair_1");
    }
}
