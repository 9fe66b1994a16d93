use serde::Serialize;

use crate::models::results::{metric_kind, FAIRNESS_METRICS, PERFORMANCE_METRICS};
use crate::models::{ExperimentResults, MetricKind, SummaryRow};

/// Padding added around the observed range of a metric group
const AXIS_MARGIN: f64 = 0.05;

/// Mean and population standard deviation, `None` for an empty slice
pub fn mean_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, var.sqrt()))
}

fn ordered_metrics() -> impl Iterator<Item = (&'static str, &'static str, MetricKind)> {
    PERFORMANCE_METRICS
        .iter()
        .map(|(n, l)| (*n, *l, MetricKind::Performance))
        .chain(FAIRNESS_METRICS.iter().map(|(n, l)| (*n, *l, MetricKind::Fairness)))
}

fn metric_values(results: &ExperimentResults, attribute: &str, level: f64, metric: &str) -> Vec<f64> {
    results
        .folds_for(attribute, level)
        .iter()
        .filter_map(|fold| {
            fold.metrics()
                .iter()
                .find(|(name, _)| *name == metric)
                .map(|(_, v)| *v)
        })
        .collect()
}

/// Aggregate fold metrics per attribute, level and metric
///
/// Rows follow attribute order, then level order, then the performance
/// metrics followed by the fairness metrics. Cells without folds are skipped.
pub fn summarize(results: &ExperimentResults) -> Vec<SummaryRow> {
    let mut rows = Vec::new();
    for attribute in &results.protected_attributes {
        for &level in &results.levels {
            for (metric, _, kind) in ordered_metrics() {
                let values = metric_values(results, attribute, level, metric);
                if let Some((mean, std)) = mean_std(&values) {
                    rows.push(SummaryRow {
                        attribute: attribute.clone(),
                        level,
                        metric: metric.to_string(),
                        kind,
                        mean,
                        std,
                        folds: values.len(),
                    });
                }
            }
        }
    }
    rows
}

/// Shared value range of one metric kind for one attribute
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisLimits {
    pub attribute: String,
    pub kind: MetricKind,
    pub min: f64,
    pub max: f64,
}

/// Synchronized limits per attribute and metric kind across every level
///
/// The range covers every fold value, widened by 0.05 on each side.
pub fn axis_limits(results: &ExperimentResults) -> Vec<AxisLimits> {
    let mut limits = Vec::new();
    for attribute in &results.protected_attributes {
        for kind in [MetricKind::Performance, MetricKind::Fairness] {
            let values: Vec<f64> = results
                .levels
                .iter()
                .flat_map(|&level| {
                    ordered_metrics()
                        .filter(move |(_, _, k)| *k == kind)
                        .flat_map(move |(metric, _, _)| metric_values(results, attribute, level, metric))
                })
                .collect();
            if values.is_empty() {
                continue;
            }
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            limits.push(AxisLimits {
                attribute: attribute.clone(),
                kind,
                min: min - AXIS_MARGIN,
                max: max + AXIS_MARGIN,
            });
        }
    }
    limits
}

fn format_cell(row: Option<&SummaryRow>) -> String {
    match row {
        Some(r) => format!("{:.2}±{:.2}", r.mean, r.std),
        None => "-".to_string(),
    }
}

fn push_table(out: &mut String, header: &[String], body: &[Vec<String>]) {
    let widths: Vec<usize> = (0..header.len())
        .map(|c| {
            body.iter()
                .map(|r| r[c].chars().count())
                .chain(std::iter::once(header[c].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (cell, &w))| {
                let pad = w.saturating_sub(cell.chars().count());
                if i == 0 {
                    format!("{}{}", cell, " ".repeat(pad))
                } else {
                    format!("{}{}", " ".repeat(pad), cell)
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
    };

    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    out.push_str(&line(header));
    out.push('\n');
    out.push_str(&rule.join("  "));
    out.push('\n');
    for row in body {
        out.push_str(&line(row));
        out.push('\n');
    }
}

fn push_limit(out: &mut String, limit: &AxisLimits) {
    out.push_str(&format!("{} range: [{:.2}, {:.2}]\n", limit.kind, limit.min, limit.max));
}

/// Text report: one table per attribute, metrics as rows, levels as columns
pub fn render_table(results: &ExperimentResults) -> String {
    let summary = summarize(results);
    let limits = axis_limits(results);
    let mut out = format!(
        "Technique: {}  |  run {}  |  {} folds\n",
        results.technique, results.run_id, results.folds
    );

    for attribute in &results.protected_attributes {
        out.push_str(&format!("\nProtected attribute: {}\n", attribute));

        let mut header = vec!["Metric".to_string()];
        header.extend(results.levels.iter().map(|l| format!("level {}", l)));

        let body: Vec<Vec<String>> = ordered_metrics()
            .map(|(metric, label, _)| {
                let mut cells = vec![label.to_string()];
                cells.extend(results.levels.iter().map(|&level| {
                    format_cell(summary.iter().find(|r| {
                        r.attribute == *attribute && r.level == level && r.metric == metric
                    }))
                }));
                cells
            })
            .collect();
        push_table(&mut out, &header, &body);

        for limit in limits.iter().filter(|l| l.attribute == *attribute) {
            push_limit(&mut out, limit);
        }
    }
    out
}

/// Text report of one metric: attributes as rows, levels as columns
///
/// Followed by the shared range of the metric's kind per attribute. `None`
/// when `metric` is not a known metric name.
pub fn render_metric(results: &ExperimentResults, metric: &str) -> Option<String> {
    let kind = metric_kind(metric)?;
    let summary = summarize(results);
    let mut header = vec![metric.to_string()];
    header.extend(results.levels.iter().map(|l| format!("level {}", l)));

    let body: Vec<Vec<String>> = results
        .protected_attributes
        .iter()
        .map(|attribute| {
            let mut cells = vec![attribute.clone()];
            cells.extend(results.levels.iter().map(|&level| {
                format_cell(summary.iter().find(|r| {
                    r.attribute == *attribute && r.level == level && r.metric == metric
                }))
            }));
            cells
        })
        .collect();

    let mut out = String::new();
    push_table(&mut out, &header, &body);
    for limit in axis_limits(results).iter().filter(|l| l.kind == kind) {
        out.push_str(&format!("{}: ", limit.attribute));
        push_limit(&mut out, limit);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FoldMetrics, Technique};
    use std::collections::BTreeMap;

    fn fold(fold: usize, accuracy: f64, dpr: f64) -> FoldMetrics {
        FoldMetrics {
            fold,
            accuracy,
            precision: 0.5,
            recall: 0.5,
            f1: 0.5,
            roc_auc: 0.5,
            demographic_parity_ratio: dpr,
            equalized_odds_ratio: 0.8,
            demographic_parity_difference: 0.1,
            equalized_odds_difference: 0.2,
        }
    }

    fn results() -> ExperimentResults {
        let mut map = BTreeMap::new();
        map.insert(
            ExperimentResults::key("sex", 0.0),
            vec![fold(0, 0.6, 0.5), fold(1, 0.8, 0.7)],
        );
        map.insert(
            ExperimentResults::key("sex", 1.0),
            vec![fold(0, 0.7, 0.9), fold(1, 0.7, 1.0)],
        );
        ExperimentResults {
            run_id: uuid::Uuid::nil(),
            created_at: chrono::Utc::now(),
            technique: Technique::DisparateImpactRemover,
            protected_attributes: vec!["sex".to_string()],
            levels: vec![0.0, 1.0],
            folds: 2,
            results: map,
        }
    }

    #[test]
    fn test_mean_std() {
        let (mean, std) = mean_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(mean, 5.0);
        assert_eq!(std, 2.0);
        assert_eq!(mean_std(&[]), None);
    }

    #[test]
    fn test_summary_order_and_values() {
        let summary = summarize(&results());
        assert_eq!(summary.len(), 18);
        assert_eq!(summary[0].metric, "accuracy");
        assert_eq!(summary[0].kind, MetricKind::Performance);
        assert!((summary[0].mean - 0.7).abs() < 1e-12);
        assert!((summary[0].std - 0.1).abs() < 1e-12);
        assert_eq!(summary[5].metric, "demographic_parity_ratio");
        assert_eq!(summary[5].kind, MetricKind::Fairness);
        assert_eq!(summary[9].level, 1.0);
    }

    #[test]
    fn test_axis_limits() {
        let limits = axis_limits(&results());
        assert_eq!(limits.len(), 2);
        assert_eq!(limits[0].kind, MetricKind::Performance);
        assert!((limits[0].min - 0.45).abs() < 1e-12);
        assert!((limits[0].max - 0.85).abs() < 1e-12);
        assert!((limits[1].min - 0.05).abs() < 1e-12);
        assert!((limits[1].max - 1.05).abs() < 1e-12);
    }

    #[test]
    fn test_render_table() {
        let text = render_table(&results());
        assert!(text.contains("Protected attribute: sex"));
        assert!(text.contains("0.70±0.10"));
        assert!(text.contains("Dem. Parity Ratio"));
        assert!(text.contains("Performance range: [0.45, 0.85]"));
    }

    #[test]
    fn test_render_metric_marks_missing_cells() {
        let mut r = results();
        r.levels.push(0.5);
        let text = render_metric(&r, "accuracy").unwrap();
        let row = text.lines().nth(2).unwrap();
        assert!(row.starts_with("sex"));
        assert!(row.trim_end().ends_with('-'));
        assert!(text.contains("sex: Performance range: [0.45, 0.85]"));
        assert!(!text.contains("Fairness range"));
    }

    #[test]
    fn test_render_metric_rejects_unknown_name() {
        assert_eq!(render_metric(&results(), "fold"), None);
        assert!(render_metric(&results(), "equalized_odds_ratio")
            .unwrap()
            .contains("Fairness range"));
    }
}
