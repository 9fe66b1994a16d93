use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::config::CleaningSettings;
use crate::models::columns;
use crate::models::{Cell, Dataset, DatasetError};

/// Errors raised by cleaning steps
#[derive(Debug, Error, PartialEq)]
pub enum CleaningError {
    #[error("At least one invariant column is required to split duplicate IDs")]
    NoInvariantColumns,

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// Normalize one column name: ASCII only, lowercase, `_`-separated words
///
/// `" Years Experience.1 "` becomes `"years_experience_1"`.
pub fn normalize_column_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_separator = false;

    for c in raw.trim().chars().filter(char::is_ascii) {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }
    out
}

/// Normalize every column name in place, resolving collisions with a numeric suffix
///
/// Returns the number of columns whose name changed.
pub fn normalize_column_names(dataset: &mut Dataset) -> Result<usize, CleaningError> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(dataset.columns().len());

    for (i, raw) in dataset.columns().iter().enumerate() {
        let mut base = normalize_column_name(raw);
        if base.is_empty() {
            base = format!("column_{}", i);
        }

        let mut name = base.clone();
        let mut suffix = 2;
        while taken.contains(&name) {
            name = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        taken.insert(name.clone());
        names.push(name);
    }

    let changed = dataset
        .columns()
        .iter()
        .zip(&names)
        .filter(|(old, new)| old != new)
        .count();
    dataset.rename_columns(names)?;
    Ok(changed)
}

/// Drop rows without a candidate ID; returns how many were removed
pub fn drop_missing_ids(dataset: &mut Dataset) -> Result<usize, CleaningError> {
    dataset.require_column(columns::ID)?;
    Ok(dataset.retain_rows(|row| row.get(columns::ID).is_some()))
}

/// Drop exact duplicate rows, keeping the first occurrence
pub fn drop_duplicate_rows(dataset: &mut Dataset) -> usize {
    let mut seen: HashSet<Vec<Cell>> = HashSet::with_capacity(dataset.len());
    dataset.retain_rows(|row| seen.insert(row.cells().to_vec()))
}

/// Unique-ID counts around a duplicate-ID split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SplitSummary {
    pub unique_ids_before: usize,
    pub unique_ids_after: usize,
}

impl SplitSummary {
    pub fn new_ids(&self) -> usize {
        self.unique_ids_after.saturating_sub(self.unique_ids_before)
    }
}

/// Split IDs whose rows disagree on the invariant columns
///
/// Rows sharing an ID are expected to describe one person. When they carry
/// different invariant values (birth year, sex, ...) they belong to different
/// people, and each distinct combination gets its own `"{id}_{k}"` ID, with
/// `k` following the sorted order of the combinations (missing values last).
/// A `k` whose ID already exists in the dataset is skipped. Row order is
/// preserved.
pub fn split_duplicate_ids(
    dataset: &mut Dataset,
    invariant_columns: &[String],
) -> Result<SplitSummary, CleaningError> {
    if invariant_columns.is_empty() {
        return Err(CleaningError::NoInvariantColumns);
    }
    dataset.require_column(columns::ID)?;
    for column in invariant_columns {
        dataset.require_column(column)?;
    }

    // ID -> row indices, in first-seen order
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for row in dataset.rows() {
        if let Some(id) = row.get(columns::ID) {
            groups
                .entry(id.to_string())
                .or_insert_with(|| {
                    order.push(id.to_string());
                    Vec::new()
                })
                .push(row.index());
        }
    }
    let unique_ids_before = order.len();

    let combo = |ds: &Dataset, index: usize| -> Vec<Option<String>> {
        invariant_columns
            .iter()
            .map(|c| ds.get(index, c).map(str::to_string))
            .collect()
    };

    // Generated IDs must not land on an ID already in use
    let mut taken: HashSet<String> = order.iter().cloned().collect();
    let mut new_ids: Vec<(usize, String)> = Vec::new();
    for id in &order {
        let indices = &groups[id];
        if indices.len() < 2 {
            continue;
        }

        let mut distinct: Vec<Vec<Option<String>>> =
            indices.iter().map(|&i| combo(dataset, i)).collect();
        distinct.sort_by(|a, b| compare_combos(a, b));
        distinct.dedup();
        if distinct.len() < 2 {
            continue;
        }

        let mut suffix = 0usize;
        let assigned: Vec<String> = distinct
            .iter()
            .map(|_| loop {
                suffix += 1;
                let candidate = format!("{}_{}", id, suffix);
                if taken.insert(candidate.clone()) {
                    break candidate;
                }
            })
            .collect();

        for &index in indices {
            let key = combo(dataset, index);
            let position = distinct.iter().position(|c| *c == key).unwrap_or(0);
            new_ids.push((index, assigned[position].clone()));
        }
    }

    for (index, id) in new_ids {
        dataset.set_cell(index, columns::ID, Some(id))?;
    }

    let unique_ids_after = dataset
        .text_column(columns::ID)
        .into_iter()
        .flatten()
        .collect::<HashSet<_>>()
        .len();

    let summary = SplitSummary {
        unique_ids_before,
        unique_ids_after,
    };
    tracing::info!(
        "Unique IDs before split: {}, after: {} ({} new IDs created)",
        summary.unique_ids_before,
        summary.unique_ids_after,
        summary.new_ids()
    );
    Ok(summary)
}

/// Order invariant combinations value by value, missing values last
fn compare_combos(a: &[Option<String>], b: &[Option<String>]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        let ord = match (x, y) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

/// Remove candidates seen only once, in an initial stage, with no sector
///
/// The candidate state column is lowercased and trimmed in place. Returns the
/// number of candidate IDs removed.
pub fn remove_initial_stage_candidates(
    dataset: &mut Dataset,
    initial_stages: &[String],
) -> Result<usize, CleaningError> {
    dataset.require_column(columns::ID)?;
    dataset.require_column(columns::CANDIDATE_STATE)?;
    dataset.require_column(columns::SECTOR)?;

    let normalized: Vec<Cell> = dataset
        .text_column(columns::CANDIDATE_STATE)
        .into_iter()
        .map(|s| s.map(|s| s.trim().to_lowercase()))
        .collect();
    dataset.set_column(columns::CANDIDATE_STATE, normalized)?;

    let stages: HashSet<String> = initial_stages.iter().map(|s| s.trim().to_lowercase()).collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for id in dataset.text_column(columns::ID).into_iter().flatten() {
        *counts.entry(id).or_insert(0) += 1;
    }

    let to_drop: HashSet<String> = dataset
        .rows()
        .filter(|row| {
            let single = row
                .get(columns::ID)
                .map(|id| counts.get(id).copied() == Some(1))
                .unwrap_or(false);
            let initial = row
                .get(columns::CANDIDATE_STATE)
                .map(|s| stages.contains(s))
                .unwrap_or(false);
            single && initial && row.get(columns::SECTOR).is_none()
        })
        .filter_map(|row| row.get(columns::ID).map(str::to_string))
        .collect();

    dataset.retain_rows(|row| {
        row.get(columns::ID)
            .map(|id| !to_drop.contains(id))
            .unwrap_or(true)
    });

    tracing::info!("Removed {} initial-stage only candidates", to_drop.len());
    Ok(to_drop.len())
}

/// Counts reported by a full cleaning pass
#[derive(Debug, Clone, Serialize)]
pub struct CleaningReport {
    pub rows_before: usize,
    pub rows_after: usize,
    pub renamed_columns: usize,
    pub missing_id_rows: usize,
    pub duplicate_rows: usize,
    pub id_split: SplitSummary,
    pub initial_stage_candidates: usize,
}

/// Runs the cleaning steps in order over a raw hiring dataset
#[derive(Debug, Clone)]
pub struct Cleaner {
    invariant_columns: Vec<String>,
    initial_stages: Vec<String>,
}

impl Cleaner {
    pub fn new(settings: &CleaningSettings) -> Self {
        Self {
            invariant_columns: settings
                .invariant_columns
                .iter()
                .map(|c| normalize_column_name(c))
                .collect(),
            initial_stages: settings.initial_stages.clone(),
        }
    }

    pub fn run(&self, dataset: &mut Dataset) -> Result<CleaningReport, CleaningError> {
        let rows_before = dataset.len();

        let renamed_columns = normalize_column_names(dataset)?;
        let missing_id_rows = drop_missing_ids(dataset)?;
        let duplicate_rows = drop_duplicate_rows(dataset);
        let id_split = split_duplicate_ids(dataset, &self.invariant_columns)?;
        let initial_stage_candidates =
            remove_initial_stage_candidates(dataset, &self.initial_stages)?;

        let report = CleaningReport {
            rows_before,
            rows_after: dataset.len(),
            renamed_columns,
            missing_id_rows,
            duplicate_rows,
            id_split,
            initial_stage_candidates,
        };
        tracing::info!(
            "Cleaning finished: {} -> {} rows ({} without ID, {} duplicates)",
            report.rows_before,
            report.rows_after,
            report.missing_id_rows,
            report.duplicate_rows
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(v: &str) -> Cell {
        if v.is_empty() {
            None
        } else {
            Some(v.to_string())
        }
    }

    fn dataset(columns: &[&str], rows: &[&[&str]]) -> Dataset {
        Dataset::from_rows(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter().map(|r| r.iter().map(|v| cell(v)).collect()).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_normalize_column_name() {
        assert_eq!(normalize_column_name(" Years Experience.1 "), "years_experience_1");
        assert_eq!(normalize_column_name("Città di residenza"), "citt_di_residenza");
        assert_eq!(normalize_column_name("Ral Maximum"), "ral_maximum");
        assert_eq!(normalize_column_name("__ID__"), "id");
    }

    #[test]
    fn test_normalize_resolves_collisions() {
        let mut ds = dataset(&["Study area", "Study Area", "€"], &[]);
        normalize_column_names(&mut ds).unwrap();
        assert_eq!(ds.columns(), &["study_area", "study_area_2", "column_2"]);
        assert!(ds
            .columns()
            .iter()
            .all(|c| !c.chars().any(|ch| ch.is_uppercase() || ch.is_whitespace())));
    }

    #[test]
    fn test_split_duplicate_ids() {
        let mut ds = dataset(
            &["id", "year_of_birth", "sex"],
            &[
                &["10", "1990", "F"],
                &["10", "1985", "M"],
                &["10", "1990", "F"],
                &["11", "1970", "M"],
                &["11", "1970", "M"],
                &["12", "", "F"],
                &["12", "1999", "F"],
            ],
        );
        let invariant = vec!["year_of_birth".to_string(), "sex".to_string()];
        let summary = split_duplicate_ids(&mut ds, &invariant).unwrap();

        let ids: Vec<_> = ds.text_column("id").into_iter().flatten().collect();
        assert_eq!(ids, vec!["10_2", "10_1", "10_2", "11", "11", "12_2", "12_1"]);
        assert_eq!(summary.unique_ids_before, 3);
        assert_eq!(summary.unique_ids_after, 5);
        assert_eq!(summary.new_ids(), 2);
    }

    #[test]
    fn test_split_skips_ids_already_in_use() {
        let mut ds = dataset(&["id", "sex"], &[&["5", "F"], &["5", "M"], &["5_1", "M"]]);
        let invariant = vec!["sex".to_string()];
        split_duplicate_ids(&mut ds, &invariant).unwrap();

        let pairs: Vec<(&str, &str)> = (0..ds.len())
            .map(|i| (ds.get(i, "id").unwrap(), ds.get(i, "sex").unwrap()))
            .collect();
        assert_eq!(pairs, vec![("5_2", "F"), ("5_3", "M"), ("5_1", "M")]);
    }

    #[test]
    fn test_split_requires_invariant_columns() {
        let mut ds = dataset(&["id"], &[&["1"]]);
        assert_eq!(
            split_duplicate_ids(&mut ds, &[]),
            Err(CleaningError::NoInvariantColumns)
        );
        assert_eq!(
            split_duplicate_ids(&mut ds, &["sex".to_string()]),
            Err(CleaningError::Dataset(DatasetError::MissingColumn("sex".to_string())))
        );
    }

    #[test]
    fn test_remove_initial_stage_candidates() {
        let mut ds = dataset(
            &["id", "candidate_state", "sector"],
            &[
                &["1", " Imported ", ""],     // dropped
                &["2", "first contact", "IT"], // has sector
                &["3", "in selection", ""],    // two rows
                &["3", "hired", ""],
                &["4", "hired", ""],           // not initial
            ],
        );
        let stages = CleaningSettings::default().initial_stages;
        let removed = remove_initial_stage_candidates(&mut ds, &stages).unwrap();

        assert_eq!(removed, 1);
        assert_eq!(ds.len(), 4);
        assert_eq!(ds.get(0, "id"), Some("2"));
        assert_eq!(ds.get(2, "candidate_state"), Some("hired"));
    }

    #[test]
    fn test_cleaner_runs_all_steps() {
        let mut ds = dataset(
            &["ID", "Candidate State", "Sector", "Year of Birth", "Sex"],
            &[
                &["1", "hired", "IT", "1990", "F"],
                &["1", "hired", "IT", "1990", "F"],
                &["", "hired", "IT", "1990", "F"],
                &["2", "Imported", "", "1980", "M"],
                &["3", "in selection", "Retail", "1970", "M"],
            ],
        );
        let report = Cleaner::new(&CleaningSettings::default()).run(&mut ds).unwrap();

        assert_eq!(report.rows_before, 5);
        assert_eq!(report.missing_id_rows, 1);
        assert_eq!(report.duplicate_rows, 1);
        assert_eq!(report.initial_stage_candidates, 1);
        assert_eq!(report.rows_after, 2);
        assert_eq!(report.renamed_columns, 5);
    }
}
