use std::collections::HashSet;
use thiserror::Error;

/// Tokens treated as a missing cell when data is loaded
const MISSING_TOKENS: &[&str] = &["nan", "na", "n/a", "null", "none"];

/// Errors raised by structural dataset operations
#[derive(Debug, Error, PartialEq)]
pub enum DatasetError {
    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Row has {found} cells, expected {expected}")]
    RowLength { expected: usize, found: usize },

    #[error("Column '{name}' has {found} values, dataset has {expected} rows")]
    ColumnLength {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),
}

/// One cell of a dataset. `None` means the value is missing.
pub type Cell = Option<String>;

/// Normalize a raw text cell: trimmed, with empty strings and NaN-like tokens
/// mapped to a missing value.
pub fn parse_cell(raw: &str) -> Cell {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lowered = trimmed.to_ascii_lowercase();
    if MISSING_TOKENS.contains(&lowered.as_str()) {
        return None;
    }
    Some(trimmed.to_string())
}

/// Format a numeric value for storage in a text cell
pub fn format_number(value: f64) -> Cell {
    if value.is_finite() {
        Some(value.to_string())
    } else {
        None
    }
}

/// In-memory table of hiring records: ordered columns, rows of optional cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Dataset {
    /// Create an empty dataset with the given columns
    pub fn new(columns: Vec<String>) -> Result<Self, DatasetError> {
        check_unique(&columns)?;
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    /// Create a dataset from columns and rows, checking every row's width
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self, DatasetError> {
        let mut dataset = Self::new(columns)?;
        for row in rows {
            dataset.push_row(row)?;
        }
        Ok(dataset)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn require_column(&self, name: &str) -> Result<usize, DatasetError> {
        self.column_index(name)
            .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
    }

    /// Append a row; its width must match the column count
    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<(), DatasetError> {
        if row.len() != self.columns.len() {
            return Err(DatasetError::RowLength {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Borrow a row view by index
    pub fn row(&self, index: usize) -> Row<'_> {
        Row {
            dataset: self,
            index,
        }
    }

    /// Iterate over row views
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        (0..self.rows.len()).map(move |index| self.row(index))
    }

    /// Value of a cell, `None` if the column is absent or the value missing
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }

    /// Numeric value of a cell; unparseable values read as missing
    pub fn get_f64(&self, row: usize, column: &str) -> Option<f64> {
        self.get(row, column)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }

    /// All values of a text column; an absent column reads as all missing
    pub fn text_column(&self, column: &str) -> Vec<Option<&str>> {
        match self.column_index(column) {
            Some(idx) => self.rows.iter().map(|r| r[idx].as_deref()).collect(),
            None => vec![None; self.rows.len()],
        }
    }

    /// All values of a numeric column; the column must exist
    pub fn numeric_column(&self, column: &str) -> Result<Vec<Option<f64>>, DatasetError> {
        let idx = self.require_column(column)?;
        Ok(self
            .rows
            .iter()
            .map(|r| {
                r[idx]
                    .as_deref()
                    .and_then(|v| v.trim().parse::<f64>().ok())
                    .filter(|v| v.is_finite())
            })
            .collect())
    }

    /// Overwrite a single cell of an existing column
    pub fn set_cell(&mut self, row: usize, column: &str, value: Cell) -> Result<(), DatasetError> {
        let idx = self.require_column(column)?;
        if let Some(r) = self.rows.get_mut(row) {
            r[idx] = value;
        }
        Ok(())
    }

    /// Add a column, or replace it if a column with that name exists
    pub fn set_column(&mut self, name: &str, values: Vec<Cell>) -> Result<(), DatasetError> {
        if values.len() != self.rows.len() {
            return Err(DatasetError::ColumnLength {
                name: name.to_string(),
                expected: self.rows.len(),
                found: values.len(),
            });
        }

        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    /// Add or replace a numeric column; non-finite values are stored as missing
    pub fn set_numeric_column(
        &mut self,
        name: &str,
        values: Vec<Option<f64>>,
    ) -> Result<(), DatasetError> {
        let cells = values
            .into_iter()
            .map(|v| v.and_then(format_number))
            .collect();
        self.set_column(name, cells)
    }

    /// Replace every column name at once
    pub fn rename_columns(&mut self, names: Vec<String>) -> Result<(), DatasetError> {
        if names.len() != self.columns.len() {
            return Err(DatasetError::RowLength {
                expected: self.columns.len(),
                found: names.len(),
            });
        }
        check_unique(&names)?;
        self.columns = names;
        Ok(())
    }

    /// Keep only rows for which the predicate holds; returns how many were dropped
    pub fn retain_rows<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(Row<'_>) -> bool,
    {
        let flags: Vec<bool> = self.rows().map(|row| keep(row)).collect();
        let before = self.rows.len();
        let mut flags = flags.into_iter();
        self.rows.retain(|_| flags.next().unwrap_or(true));
        before - self.rows.len()
    }

    /// New dataset holding only the named columns that exist, in the given order
    pub fn select_columns(&self, keep: &[&str]) -> Dataset {
        let mut seen = HashSet::new();
        let indices: Vec<usize> = keep
            .iter()
            .filter_map(|name| self.column_index(name))
            .filter(|idx| seen.insert(*idx))
            .collect();

        Dataset {
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        }
    }
}

fn check_unique(columns: &[String]) -> Result<(), DatasetError> {
    let mut seen = HashSet::with_capacity(columns.len());
    for name in columns {
        if !seen.insert(name.as_str()) {
            return Err(DatasetError::DuplicateColumn(name.clone()));
        }
    }
    Ok(())
}

/// Borrowed view of one dataset row
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    dataset: &'a Dataset,
    index: usize,
}

impl<'a> Row<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self.dataset.column_index(column)?;
        self.dataset.rows[self.index][idx].as_deref()
    }

    pub fn get_f64(&self, column: &str) -> Option<f64> {
        self.dataset.get_f64(self.index, column)
    }

    pub fn cells(&self) -> &'a [Cell] {
        &self.dataset.rows[self.index]
    }
}
