use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::models::dataset::parse_cell;
use crate::models::{Dataset, DatasetError, ExperimentResults, SummaryRow};

/// Errors that can occur while reading or writing pipeline files
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("File '{0}' has no header row")]
    MissingHeader(String),
}

/// Load a CSV file into a dataset
///
/// Repeated header names get a `.1`, `.2`, ... suffix, so a file carrying both
/// a candidate and a job "Years Experience" column keeps them apart.
pub fn load_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset, StorageError> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() {
        return Err(StorageError::MissingHeader(path.display().to_string()));
    }
    let headers = dedupe_headers(headers);
    let width = headers.len();

    let mut dataset = Dataset::new(headers)?;
    let mut padded = 0usize;

    for (index, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() > width {
            // Header is line 1
            tracing::warn!(
                "Row {} of '{}' has {} fields, dropping {} beyond the header",
                index + 2,
                path.display(),
                record.len(),
                record.len() - width
            );
        }
        let mut row: Vec<_> = record.iter().take(width).map(parse_cell).collect();
        if row.len() < width {
            padded += 1;
            row.resize(width, None);
        }
        dataset.push_row(row)?;
    }

    if padded > 0 {
        tracing::warn!("{} short rows in '{}' padded with missing values", padded, path.display());
    }
    tracing::info!(
        "Loaded {} rows x {} columns from '{}'",
        dataset.len(),
        dataset.columns().len(),
        path.display()
    );
    Ok(dataset)
}

/// Write a dataset as CSV; missing cells become empty fields
pub fn save_dataset<P: AsRef<Path>>(dataset: &Dataset, path: P) -> Result<(), StorageError> {
    let path = path.as_ref();
    ensure_parent(path)?;

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(dataset.columns())?;
    for row in dataset.rows() {
        writer.write_record(row.cells().iter().map(|c| c.as_deref().unwrap_or("")))?;
    }
    writer.flush()?;

    tracing::info!("Saved {} rows to '{}'", dataset.len(), path.display());
    Ok(())
}

pub fn save_results<P: AsRef<Path>>(results: &ExperimentResults, path: P) -> Result<(), StorageError> {
    let path = path.as_ref();
    ensure_parent(path)?;
    fs::write(path, serde_json::to_string_pretty(results)?)?;
    tracing::info!("Saved experiment {} to '{}'", results.run_id, path.display());
    Ok(())
}

pub fn load_results<P: AsRef<Path>>(path: P) -> Result<ExperimentResults, StorageError> {
    let json = fs::read_to_string(path.as_ref())?;
    Ok(serde_json::from_str(&json)?)
}

/// Write aggregated metric rows as CSV
pub fn save_summary<P: AsRef<Path>>(rows: &[SummaryRow], path: P) -> Result<(), StorageError> {
    let path = path.as_ref();
    ensure_parent(path)?;

    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let original: HashSet<String> = headers.iter().cloned().collect();
    let mut used: HashSet<String> = HashSet::with_capacity(headers.len());
    let mut suffixes: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(headers.len());

    for header in headers {
        let name = if used.contains(&header) {
            // Skip suffixes taken earlier or present elsewhere in the header
            let counter = suffixes.entry(header.clone()).or_insert(0);
            loop {
                *counter += 1;
                let candidate = format!("{}.{}", header, counter);
                if !used.contains(&candidate) && !original.contains(&candidate) {
                    break candidate;
                }
            }
        } else {
            header
        };
        used.insert(name.clone());
        out.push(name);
    }
    out
}
