use serde::Serialize;
use std::collections::BTreeMap;

/// Group label used for rows with a missing protected attribute
pub const UNKNOWN_GROUP: &str = "unknown";

/// Protected-attribute values mapped to dense group ids
#[derive(Debug, Clone, PartialEq)]
pub struct GroupIndex {
    names: Vec<String>,
    ids: Vec<usize>,
}

impl GroupIndex {
    /// Build from raw column values; names are sorted, missing values form `unknown`
    pub fn from_values(values: &[Option<&str>]) -> Self {
        let labels: Vec<&str> = values
            .iter()
            .map(|v| v.map(str::trim).filter(|s| !s.is_empty()).unwrap_or(UNKNOWN_GROUP))
            .collect();

        let mut lookup: BTreeMap<&str, usize> = labels.iter().map(|l| (*l, 0)).collect();
        for (id, slot) in lookup.values_mut().enumerate() {
            *slot = id;
        }

        Self {
            names: lookup.keys().map(|k| k.to_string()).collect(),
            ids: labels.iter().map(|l| lookup[l]).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn ids(&self) -> &[usize] {
        &self.ids
    }

    /// Group ids of the given rows
    pub fn select(&self, indices: &[usize]) -> Vec<usize> {
        indices.iter().map(|&i| self.ids[i]).collect()
    }
}

/// Outcome rates of one group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRates {
    pub group: usize,
    pub count: usize,
    pub selection_rate: f64,
    /// `None` when the group has no actual positives
    pub true_positive_rate: Option<f64>,
    /// `None` when the group has no actual negatives
    pub false_positive_rate: Option<f64>,
}

/// Group fairness of a set of predictions
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FairnessMetrics {
    pub demographic_parity_difference: f64,
    pub demographic_parity_ratio: f64,
    pub equalized_odds_difference: f64,
    pub equalized_odds_ratio: f64,
}

/// Per-group selection, true positive and false positive rates
///
/// Groups with no rows are omitted.
pub fn group_rates(y_true: &[bool], y_pred: &[bool], groups: &[usize]) -> Vec<GroupRates> {
    let n_groups = groups.iter().copied().max().map_or(0, |g| g + 1);
    // [selected, positives, true positives, negatives, false positives, count]
    let mut tallies = vec![[0usize; 6]; n_groups];

    for ((&t, &p), &g) in y_true.iter().zip(y_pred).zip(groups) {
        let tally = &mut tallies[g];
        tally[5] += 1;
        if p {
            tally[0] += 1;
        }
        if t {
            tally[1] += 1;
            if p {
                tally[2] += 1;
            }
        } else {
            tally[3] += 1;
            if p {
                tally[4] += 1;
            }
        }
    }

    tallies
        .iter()
        .enumerate()
        .filter(|(_, t)| t[5] > 0)
        .map(|(group, t)| GroupRates {
            group,
            count: t[5],
            selection_rate: t[0] as f64 / t[5] as f64,
            true_positive_rate: (t[1] > 0).then(|| t[2] as f64 / t[1] as f64),
            false_positive_rate: (t[3] > 0).then(|| t[4] as f64 / t[3] as f64),
        })
        .collect()
}

fn spread(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 1.0);
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let ratio = if max > 0.0 { min / max } else { 1.0 };
    (max - min, ratio)
}

/// Demographic parity and equalized odds, as differences and ratios
///
/// Differences are max minus min across groups, ratios min over max (1.0
/// when every rate is 0). Equalized odds takes the worse of the TPR and FPR
/// spreads.
pub fn fairness_metrics(y_true: &[bool], y_pred: &[bool], groups: &[usize]) -> FairnessMetrics {
    let rates = group_rates(y_true, y_pred, groups);

    let selection: Vec<f64> = rates.iter().map(|r| r.selection_rate).collect();
    let tpr: Vec<f64> = rates.iter().filter_map(|r| r.true_positive_rate).collect();
    let fpr: Vec<f64> = rates.iter().filter_map(|r| r.false_positive_rate).collect();

    let (dp_diff, dp_ratio) = spread(&selection);
    let (tpr_diff, tpr_ratio) = spread(&tpr);
    let (fpr_diff, fpr_ratio) = spread(&fpr);

    FairnessMetrics {
        demographic_parity_difference: dp_diff,
        demographic_parity_ratio: dp_ratio,
        equalized_odds_difference: tpr_diff.max(fpr_diff),
        equalized_odds_ratio: tpr_ratio.min(fpr_ratio),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_index() {
        let index = GroupIndex::from_values(&[Some("M"), None, Some("F"), Some(" M "), Some("")]);
        assert_eq!(index.names(), &["F", "M", "unknown"]);
        assert_eq!(index.ids(), &[1, 2, 0, 1, 2]);
        assert_eq!(index.select(&[2, 3]), vec![0, 1]);
    }

    #[test]
    fn test_equal_selection_rates_have_zero_difference() {
        let y_true = [true, false, true, false];
        let y_pred = [true, false, false, true];
        let groups = [0, 0, 1, 1];
        let m = fairness_metrics(&y_true, &y_pred, &groups);
        assert_eq!(m.demographic_parity_difference, 0.0);
        assert_eq!(m.demographic_parity_ratio, 1.0);
        // TPR 1 vs 0, FPR 0 vs 1
        assert_eq!(m.equalized_odds_difference, 1.0);
        assert_eq!(m.equalized_odds_ratio, 0.0);
    }

    #[test]
    fn test_parity_ratio() {
        let y_true = [false; 6];
        let y_pred = [true, true, false, true, false, false];
        let groups = [0, 0, 0, 1, 1, 1];
        let m = fairness_metrics(&y_true, &y_pred, &groups);
        assert!((m.demographic_parity_ratio - 0.5).abs() < 1e-12);
        assert!((m.demographic_parity_difference - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_selections_is_fair_by_ratio() {
        let m = fairness_metrics(&[true, false], &[false, false], &[0, 1]);
        assert_eq!(m.demographic_parity_ratio, 1.0);
        assert_eq!(m.demographic_parity_difference, 0.0);
    }

    #[test]
    fn test_groups_without_positives_skip_tpr() {
        let rates = group_rates(&[false, true], &[true, true], &[0, 1]);
        assert_eq!(rates[0].true_positive_rate, None);
        assert_eq!(rates[0].false_positive_rate, Some(1.0));
        assert_eq!(rates[1].true_positive_rate, Some(1.0));
        assert_eq!(rates[1].false_positive_rate, None);

        let m = fairness_metrics(&[false, true], &[true, true], &[0, 1]);
        assert_eq!(m.equalized_odds_difference, 0.0);
        assert_eq!(m.equalized_odds_ratio, 1.0);
    }
}
