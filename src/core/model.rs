use ndarray::{Array1, Array2};
use serde::Serialize;

use crate::config::ModelSettings;

/// Dense feature matrix, one row per sample; missing values are NaN
pub type Matrix = Array2<f64>;

/// Mean imputation followed by z-score standardization
///
/// Fitted on training rows only; a column with no values imputes 0.0 and a
/// constant column keeps unit scale.
#[derive(Debug, Clone)]
pub struct Standardizer {
    means: Array1<f64>,
    stds: Array1<f64>,
}

impl Standardizer {
    pub fn fit(x: &Matrix) -> Self {
        let mut means = Array1::zeros(x.ncols());
        let mut stds = Array1::ones(x.ncols());

        for (col, column) in x.columns().into_iter().enumerate() {
            let present: Array1<f64> = column.iter().copied().filter(|v| !v.is_nan()).collect();
            let Some(mean) = present.mean() else {
                continue;
            };
            let std = present.std(0.0);
            means[col] = mean;
            if std * std > 1e-12 {
                stds[col] = std;
            }
        }

        Self { means, stds }
    }

    pub fn transform(&self, x: &Matrix) -> Matrix {
        let mut imputed = x.to_owned();
        for mut row in imputed.rows_mut() {
            row.zip_mut_with(&self.means, |v, &mean| {
                if v.is_nan() {
                    *v = mean;
                }
            });
        }
        (imputed - &self.means) / &self.stds
    }
}

/// Group-parity regularizer used by the prejudice remover
///
/// Adds `eta * sum_g (mean_score_g - mean_score)^2` to the training loss.
#[derive(Debug, Clone, Copy)]
pub struct FairnessPenalty<'a> {
    pub groups: &'a [usize],
    pub eta: f64,
}

#[inline]
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Binary logistic regression trained by batch gradient descent
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegression {
    weights: Array1<f64>,
    bias: f64,
}

impl LogisticRegression {
    /// Train on `x`/`y` with optional per-sample weights and fairness penalty
    pub fn fit(
        x: &Matrix,
        y: &[bool],
        sample_weights: Option<&[f64]>,
        penalty: Option<FairnessPenalty<'_>>,
        settings: &ModelSettings,
    ) -> Self {
        let (n, width) = x.dim();
        let mut model = Self {
            weights: Array1::zeros(width),
            bias: 0.0,
        };
        if n == 0 {
            return model;
        }

        let targets: Array1<f64> = y.iter().map(|&t| if t { 1.0 } else { 0.0 }).collect();
        let weights = sample_weights.map_or_else(|| Array1::ones(n), |w| Array1::from(w.to_vec()));
        let total_weight = weights.sum().max(f64::EPSILON);
        let penalty = penalty.filter(|p| p.eta > 0.0 && p.groups.len() == n);

        for _ in 0..settings.epochs {
            let probs = model.predict_proba(x);

            let mut grad_z = &weights * &(&probs - &targets) / total_weight;
            if let Some(p) = penalty {
                add_parity_gradient(&mut grad_z, &probs, p);
            }

            let grad_w = x.t().dot(&grad_z) + settings.l2 * &model.weights;
            model.weights.scaled_add(-settings.learning_rate, &grad_w);
            model.bias -= settings.learning_rate * grad_z.sum();
        }

        model
    }

    pub fn predict_proba(&self, x: &Matrix) -> Array1<f64> {
        (x.dot(&self.weights) + self.bias).mapv(sigmoid)
    }

    pub fn predict(&self, x: &Matrix, threshold: f64) -> Vec<bool> {
        self.predict_proba(x).iter().map(|&p| p >= threshold).collect()
    }

    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }
}

/// Gradient of the parity penalty with respect to each logit
fn add_parity_gradient(grad_z: &mut Array1<f64>, probs: &Array1<f64>, penalty: FairnessPenalty<'_>) {
    let n = probs.len() as f64;
    let n_groups = penalty.groups.iter().copied().max().map_or(0, |g| g + 1);
    let mut sums = vec![0.0; n_groups];
    let mut counts = vec![0usize; n_groups];
    for (&g, &p) in penalty.groups.iter().zip(probs) {
        sums[g] += p;
        counts[g] += 1;
    }

    let overall = probs.sum() / n;
    let gaps: Vec<f64> = sums
        .iter()
        .zip(&counts)
        .map(|(s, &c)| if c > 0 { s / c as f64 - overall } else { 0.0 })
        .collect();
    let total_gap: f64 = gaps.iter().sum();

    for ((g, &group), &p) in grad_z.iter_mut().zip(penalty.groups).zip(probs) {
        let d_loss = 2.0 * penalty.eta * (gaps[group] / counts[group] as f64 - total_gap / n);
        *g += d_loss * p * (1.0 - p);
    }
}

/// Classification quality on one evaluation split
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub roc_auc: f64,
}

/// Accuracy, precision, recall, F1 and ROC AUC
///
/// Undefined ratios (no predicted or no actual positives) are 0.0.
pub fn performance_metrics(y_true: &[bool], y_pred: &[bool], scores: &[f64]) -> PerformanceMetrics {
    let (mut tp, mut fp, mut tn, mut fn_) = (0usize, 0usize, 0usize, 0usize);
    for (&t, &p) in y_true.iter().zip(y_pred) {
        match (t, p) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (false, false) => tn += 1,
            (true, false) => fn_ += 1,
        }
    }

    let ratio = |num: usize, den: usize| if den > 0 { num as f64 / den as f64 } else { 0.0 };
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    PerformanceMetrics {
        accuracy: ratio(tp + tn, y_true.len()),
        precision,
        recall,
        f1,
        roc_auc: roc_auc(y_true, scores),
    }
}

/// Area under the ROC curve by the rank-sum method, ties averaged
///
/// 0.5 when only one class is present.
pub fn roc_auc(y_true: &[bool], scores: &[f64]) -> f64 {
    let positives = y_true.iter().filter(|&&t| t).count();
    let negatives = y_true.len() - positives;
    if positives == 0 || negatives == 0 {
        return 0.5;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut ranks = vec![0.0; scores.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && scores[order[end + 1]] == scores[order[start]] {
            end += 1;
        }
        // 1-based average rank of the tie block
        let rank = (start + end) as f64 / 2.0 + 1.0;
        for &idx in &order[start..=end] {
            ranks[idx] = rank;
        }
        start = end + 1;
    }

    let positive_rank_sum: f64 = ranks
        .iter()
        .zip(y_true)
        .filter(|(_, &t)| t)
        .map(|(r, _)| r)
        .sum();
    let p = positives as f64;
    (positive_rank_sum - p * (p + 1.0) / 2.0) / (p * negatives as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn settings() -> ModelSettings {
        ModelSettings {
            learning_rate: 0.5,
            epochs: 300,
            l2: 0.0,
            prejudice_eta: 0.0,
        }
    }

    #[test]
    fn test_standardizer_imputes_and_scales() {
        let x = array![[1.0, f64::NAN], [3.0, f64::NAN], [f64::NAN, f64::NAN]];
        let st = Standardizer::fit(&x);
        let out = st.transform(&x);
        // Missing value imputed with the training mean
        assert_eq!(out, array![[-1.0, 0.0], [1.0, 0.0], [0.0, 0.0]]);
    }

    #[test]
    fn test_logistic_regression_separates_classes() {
        let x = Array2::from_shape_fn((20, 1), |(i, _)| (i as f64 - 9.5) / 10.0);
        let y: Vec<bool> = (0..20).map(|i| i >= 10).collect();
        let model = LogisticRegression::fit(&x, &y, None, None, &settings());

        assert!(model.weights()[0] > 0.0);
        assert_eq!(model.predict(&x, 0.5), y);
    }

    #[test]
    fn test_sample_weights_shift_decision() {
        let x = Array2::zeros((4, 1));
        let y = vec![true, false, false, false];
        let plain = LogisticRegression::fit(&x, &y, None, None, &settings());
        let weighted = LogisticRegression::fit(&x, &y, Some(&[9.0, 1.0, 1.0, 1.0]), None, &settings());
        assert!(plain.bias() < 0.0);
        assert!(weighted.bias() > 0.0);
    }

    #[test]
    fn test_parity_penalty_narrows_group_gap() {
        // Feature is a perfect proxy for the group
        let x = Array2::from_shape_fn((40, 1), |(i, _)| if i < 20 { -1.0 } else { 1.0 });
        let groups: Vec<usize> = (0..40).map(|i| usize::from(i >= 20)).collect();
        let y: Vec<bool> = (0..40).map(|i| if i < 20 { i % 4 == 0 } else { i % 4 != 0 }).collect();

        let gap = |m: &LogisticRegression| {
            let p = m.predict_proba(&x);
            let a: f64 = p.iter().take(20).sum::<f64>() / 20.0;
            let b: f64 = p.iter().skip(20).sum::<f64>() / 20.0;
            (a - b).abs()
        };

        let plain = LogisticRegression::fit(&x, &y, None, None, &settings());
        let fair = LogisticRegression::fit(
            &x,
            &y,
            None,
            Some(FairnessPenalty { groups: &groups, eta: 20.0 }),
            &settings(),
        );
        assert!(gap(&fair) < gap(&plain));
    }

    #[test]
    fn test_performance_metrics() {
        let y_true = vec![true, true, false, false];
        let y_pred = vec![true, false, true, false];
        let scores = vec![0.9, 0.4, 0.6, 0.1];
        let m = performance_metrics(&y_true, &y_pred, &scores);
        assert_eq!(m.accuracy, 0.5);
        assert_eq!(m.precision, 0.5);
        assert_eq!(m.recall, 0.5);
        assert_eq!(m.f1, 0.5);
        assert_eq!(m.roc_auc, 0.75);
    }

    #[test]
    fn test_no_predicted_positives() {
        let m = performance_metrics(&[true, false], &[false, false], &[0.2, 0.1]);
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.f1, 0.0);
        assert_eq!(m.roc_auc, 1.0);
    }

    #[test]
    fn test_roc_auc_ties_and_single_class() {
        assert_eq!(roc_auc(&[true, false], &[0.5, 0.5]), 0.5);
        assert_eq!(roc_auc(&[true, true], &[0.1, 0.9]), 0.5);
    }
}
