//! Pre-processing and in-processing bias mitigation.

use ndarray::{Array1, Array2};

/// Reweighing instance weights blended by repair level
///
/// Each (group, label) cell gets `P(group) * P(label) / P(group, label)`, so
/// that label and group are independent in the weighted data. The weight is
/// blended towards 1.0 as `1 + level * (w - 1)`.
pub fn reweighing_weights(groups: &[usize], labels: &[bool], level: f64) -> Vec<f64> {
    let n = labels.len();
    if n == 0 {
        return Vec::new();
    }
    let n_groups = groups.iter().copied().max().map_or(0, |g| g + 1);

    let mut group_counts = vec![0usize; n_groups];
    let mut cell_counts = vec![[0usize; 2]; n_groups];
    let mut label_counts = [0usize; 2];
    for (&g, &y) in groups.iter().zip(labels) {
        let y = usize::from(y);
        group_counts[g] += 1;
        cell_counts[g][y] += 1;
        label_counts[y] += 1;
    }

    let n = n as f64;
    groups
        .iter()
        .zip(labels)
        .map(|(&g, &y)| {
            let y = usize::from(y);
            let expected = group_counts[g] as f64 * label_counts[y] as f64 / n;
            let weight = expected / cell_counts[g][y] as f64;
            1.0 + level * (weight - 1.0)
        })
        .collect()
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Value at quantile `q` of sorted values, linearly interpolated
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

/// Quantile of `value` within its sorted group, ties share their mean position
fn rank_quantile(sorted: &[f64], value: f64) -> f64 {
    if sorted.len() <= 1 {
        return 0.5;
    }
    let lo = sorted.partition_point(|v| *v < value);
    let hi = sorted.partition_point(|v| *v <= value);
    let position = (lo + hi.saturating_sub(1)) as f64 / 2.0;
    position / (sorted.len() - 1) as f64
}

/// Disparate impact remover for one feature column
///
/// Each value is located at its quantile within its own group; the target is
/// the median, across groups, of every group's value at that quantile. The
/// repaired value moves towards the target by `level`, so level 0 leaves the
/// column untouched and level 1 aligns the group distributions.
pub fn repair_column(values: &[f64], groups: &[usize], level: f64) -> Vec<f64> {
    if level <= 0.0 || values.is_empty() {
        return values.to_vec();
    }
    let n_groups = groups.iter().copied().max().map_or(0, |g| g + 1);

    let mut sorted: Vec<Vec<f64>> = vec![Vec::new(); n_groups];
    for (&v, &g) in values.iter().zip(groups) {
        sorted[g].push(v);
    }
    for group in &mut sorted {
        group.sort_by(f64::total_cmp);
    }
    let present: Vec<&[f64]> = sorted
        .iter()
        .filter(|g| !g.is_empty())
        .map(Vec::as_slice)
        .collect();

    values
        .iter()
        .zip(groups)
        .map(|(&x, &g)| {
            let q = rank_quantile(&sorted[g], x);
            let mut at_q: Vec<f64> = present.iter().map(|s| quantile(s, q)).collect();
            let target = median(&mut at_q);
            x + level * (target - x)
        })
        .collect()
}

/// Repair every column of a feature matrix against the same groups
pub fn repair_matrix(matrix: &mut Array2<f64>, groups: &[usize], level: f64) {
    if level <= 0.0 {
        return;
    }
    for mut column in matrix.columns_mut() {
        let repaired = repair_column(&column.to_vec(), groups, level);
        column.assign(&Array1::from(repaired));
    }
}

/// Fairness penalty strength of the prejudice remover at a repair level
#[inline]
pub fn prejudice_eta(level: f64, max_eta: f64) -> f64 {
    level.clamp(0.0, 1.0) * max_eta
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_reweighing_decouples_label_and_group() {
        // Group 0: 3 of 4 positive, group 1: 1 of 4 positive
        let groups = [0, 0, 0, 0, 1, 1, 1, 1];
        let labels = [true, true, true, false, true, false, false, false];
        let w = reweighing_weights(&groups, &labels, 1.0);

        let weighted_rate = |group: usize| {
            let (mut pos, mut total) = (0.0, 0.0);
            for i in 0..8 {
                if groups[i] == group {
                    total += w[i];
                    if labels[i] {
                        pos += w[i];
                    }
                }
            }
            pos / total
        };
        assert!((weighted_rate(0) - 0.5).abs() < 1e-12);
        assert!((weighted_rate(1) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_reweighing_level_zero_is_uniform() {
        let w = reweighing_weights(&[0, 1, 1], &[true, false, true], 0.0);
        assert_eq!(w, vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_repair_level_zero_is_identity() {
        let values = [3.0, 1.0, 2.0, 10.0, 12.0];
        let groups = [0, 0, 0, 1, 1];
        assert_eq!(repair_column(&values, &groups, 0.0), values.to_vec());
    }

    #[test]
    fn test_full_repair_aligns_groups() {
        let values = [1.0, 2.0, 3.0, 11.0, 12.0, 13.0];
        let groups = [0, 0, 0, 1, 1, 1];
        let repaired = repair_column(&values, &groups, 1.0);

        let mut a = repaired[..3].to_vec();
        let mut b = repaired[3..].to_vec();
        a.sort_by(f64::total_cmp);
        b.sort_by(f64::total_cmp);
        assert_eq!(a, b);
        assert_eq!(a, vec![6.0, 7.0, 8.0]);
    }

    #[test]
    fn test_partial_repair_moves_halfway() {
        let values = [0.0, 10.0];
        let groups = [0, 1];
        assert_eq!(repair_column(&values, &groups, 0.5), vec![2.5, 7.5]);
    }

    #[test]
    fn test_repair_matrix_columns() {
        let mut m = array![[0.0, 1.0], [10.0, 1.0]];
        repair_matrix(&mut m, &[0, 1], 1.0);
        assert_eq!(m, array![[5.0, 1.0], [5.0, 1.0]]);
    }

    #[test]
    fn test_prejudice_eta() {
        assert_eq!(prejudice_eta(0.5, 20.0), 10.0);
        assert_eq!(prejudice_eta(2.0, 20.0), 20.0);
    }
}
