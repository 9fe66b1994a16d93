use chrono::Utc;
use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

use crate::config::ExperimentSettings;
use crate::core::{
    fairness::{fairness_metrics, GroupIndex},
    mitigation::{prejudice_eta, repair_matrix, reweighing_weights},
    model::{performance_metrics, FairnessPenalty, LogisticRegression, Matrix, Standardizer},
    resampling::{resample, stratified_folds, train_indices},
};
use crate::models::{Dataset, DatasetError, ExperimentResults, FoldMetrics, Technique};

/// Errors raised while running a fairness experiment
#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Dataset has no rows")]
    EmptyDataset,

    #[error("Label column '{0}' has a single class; cannot train a classifier")]
    SingleClass(String),

    #[error("None of the configured feature columns exist in the dataset")]
    NoFeatures,

    #[error("Invalid experiment configuration: {0}")]
    InvalidConfig(String),
}

/// Cross-validated sweep of a mitigation technique over repair levels
///
/// For every protected attribute and level, each stratified fold is
/// standardized on its training rows, resampled, mitigated, fitted with
/// logistic regression and scored on its test rows.
pub struct FairnessExperiment {
    settings: ExperimentSettings,
}

/// Training inputs of one fold after preprocessing
struct FoldData {
    x_train: Matrix,
    y_train: Vec<bool>,
    g_train: Vec<usize>,
    x_test: Matrix,
    y_test: Vec<bool>,
    g_test: Vec<usize>,
}

impl FairnessExperiment {
    pub fn new(settings: ExperimentSettings) -> Self {
        Self { settings }
    }

    /// Override the configured technique
    pub fn with_technique(mut self, technique: Technique) -> Self {
        self.settings.technique = technique;
        self
    }

    pub fn technique(&self) -> Technique {
        self.settings.technique
    }

    /// Run the sweep over `dataset`
    pub fn run(&self, dataset: &Dataset) -> Result<ExperimentResults, ExperimentError> {
        let s = &self.settings;
        if dataset.is_empty() {
            return Err(ExperimentError::EmptyDataset);
        }
        if s.folds < 2 || dataset.len() < s.folds {
            return Err(ExperimentError::InvalidConfig(format!(
                "{} folds requested for {} rows",
                s.folds,
                dataset.len()
            )));
        }
        if s.levels.iter().any(|l| !(0.0..=1.0).contains(l)) {
            return Err(ExperimentError::InvalidConfig(
                "repair levels must lie in [0, 1]".to_string(),
            ));
        }

        let features = self.feature_matrix(dataset)?;
        let labels = self.labels(dataset)?;
        let positives = labels.iter().filter(|&&y| y).count();
        if positives == 0 || positives == labels.len() {
            return Err(ExperimentError::SingleClass(s.label_column.clone()));
        }

        let folds = stratified_folds(&labels, s.folds, s.seed);
        let mut results = BTreeMap::new();

        tracing::info!(
            "Running {} on {} rows ({} positive), {} features, {} folds",
            s.technique,
            dataset.len(),
            positives,
            features.ncols(),
            s.folds
        );

        for attribute in &s.protected_attributes {
            dataset.require_column(attribute)?;
            let groups = GroupIndex::from_values(&dataset.text_column(attribute));
            tracing::debug!("Attribute '{}' groups: {:?}", attribute, groups.names());

            for &level in &s.levels {
                let mut fold_metrics = Vec::with_capacity(folds.len());
                for (fold, test) in folds.iter().enumerate() {
                    let train = train_indices(&folds, fold);
                    let data = self.prepare_fold(&features, &labels, &groups, &train, test, fold);
                    fold_metrics.push(self.evaluate_fold(fold, data, level));
                }

                let mean_accuracy = fold_metrics.iter().map(|m| m.accuracy).sum::<f64>()
                    / fold_metrics.len() as f64;
                let mean_dpr = fold_metrics.iter().map(|m| m.demographic_parity_ratio).sum::<f64>()
                    / fold_metrics.len() as f64;
                tracing::info!(
                    "{} @ {}: accuracy {:.3}, demographic parity ratio {:.3}",
                    attribute,
                    level,
                    mean_accuracy,
                    mean_dpr
                );

                results.insert(ExperimentResults::key(attribute, level), fold_metrics);
            }
        }

        Ok(ExperimentResults {
            run_id: Uuid::new_v4(),
            created_at: Utc::now(),
            technique: s.technique,
            protected_attributes: s.protected_attributes.clone(),
            levels: s.levels.clone(),
            folds: s.folds,
            results,
        })
    }

    /// Raw feature values, NaN where a cell is missing
    fn feature_matrix(&self, dataset: &Dataset) -> Result<Matrix, ExperimentError> {
        let mut columns = Vec::new();
        for name in &self.settings.feature_columns {
            if dataset.has_column(name) {
                columns.push(dataset.numeric_column(name)?);
            } else {
                tracing::warn!("Feature column '{}' not found, skipping", name);
            }
        }
        if columns.is_empty() {
            return Err(ExperimentError::NoFeatures);
        }

        Ok(Array2::from_shape_fn((dataset.len(), columns.len()), |(i, j)| {
            columns[j][i].unwrap_or(f64::NAN)
        }))
    }

    /// Positive when the label matches a configured value, case-insensitively
    fn labels(&self, dataset: &Dataset) -> Result<Vec<bool>, ExperimentError> {
        dataset.require_column(&self.settings.label_column)?;
        let positive: Vec<String> = self
            .settings
            .positive_labels
            .iter()
            .map(|l| l.trim().to_lowercase())
            .collect();

        Ok(dataset
            .text_column(&self.settings.label_column)
            .into_iter()
            .map(|v| v.is_some_and(|v| positive.contains(&v.trim().to_lowercase())))
            .collect())
    }

    fn prepare_fold(
        &self,
        features: &Matrix,
        labels: &[bool],
        groups: &GroupIndex,
        train: &[usize],
        test: &[usize],
        fold: usize,
    ) -> FoldData {
        let pick = |idx: &[usize]| features.select(Axis(0), idx);
        let standardizer = Standardizer::fit(&pick(train));

        let mut rng = StdRng::seed_from_u64(self.settings.seed.wrapping_add(fold as u64));
        let train = resample(train, labels, self.settings.resampling, &mut rng);

        FoldData {
            x_train: standardizer.transform(&pick(&train)),
            y_train: train.iter().map(|&i| labels[i]).collect(),
            g_train: groups.select(&train),
            x_test: standardizer.transform(&pick(test)),
            y_test: test.iter().map(|&i| labels[i]).collect(),
            g_test: groups.select(test),
        }
    }

    fn evaluate_fold(&self, fold: usize, mut data: FoldData, level: f64) -> FoldMetrics {
        let model_settings = &self.settings.model;
        let model = match self.settings.technique {
            Technique::None => {
                LogisticRegression::fit(&data.x_train, &data.y_train, None, None, model_settings)
            }
            Technique::Reweighing => {
                let weights = reweighing_weights(&data.g_train, &data.y_train, level);
                LogisticRegression::fit(
                    &data.x_train,
                    &data.y_train,
                    Some(&weights),
                    None,
                    model_settings,
                )
            }
            Technique::DisparateImpactRemover => {
                repair_matrix(&mut data.x_train, &data.g_train, level);
                repair_matrix(&mut data.x_test, &data.g_test, level);
                LogisticRegression::fit(&data.x_train, &data.y_train, None, None, model_settings)
            }
            Technique::PrejudiceRemover => {
                let penalty = FairnessPenalty {
                    groups: &data.g_train,
                    eta: prejudice_eta(level, model_settings.prejudice_eta),
                };
                LogisticRegression::fit(
                    &data.x_train,
                    &data.y_train,
                    None,
                    Some(penalty),
                    model_settings,
                )
            }
        };

        let scores = model.predict_proba(&data.x_test).to_vec();
        let predictions: Vec<bool> = scores.iter().map(|&p| p >= self.settings.threshold).collect();
        let performance = performance_metrics(&data.y_test, &predictions, &scores);
        let fairness = fairness_metrics(&data.y_test, &predictions, &data.g_test);

        FoldMetrics {
            fold,
            accuracy: performance.accuracy,
            precision: performance.precision,
            recall: performance.recall,
            f1: performance.f1,
            roc_auc: performance.roc_auc,
            demographic_parity_ratio: fairness.demographic_parity_ratio,
            equalized_odds_ratio: fairness.equalized_odds_ratio,
            demographic_parity_difference: fairness.demographic_parity_difference,
            equalized_odds_difference: fairness.equalized_odds_difference,
        }
    }
}
