use std::collections::HashSet;

use serde::Serialize;

use crate::dataset::Dataset;
use crate::error::{MatchError, Side};
use crate::value::{MatchKey, Value};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyTransform {
    /// Compare coerced values exactly.
    #[default]
    None,
    /// Strip surrounding whitespace from text before comparing.
    /// Padded numbers (`" 42 "`) compare as numbers once trimmed.
    Trim,
}

impl KeyTransform {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyTransform::None => "none",
            KeyTransform::Trim => "trim",
        }
    }

    /// Membership key for a cell under this transform.
    pub fn key(&self, value: &Value) -> Option<MatchKey> {
        match (self, value) {
            (KeyTransform::Trim, Value::Text(s)) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(MatchKey::from_trimmed(trimmed))
                }
            }
            _ => value.key(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MatchOptions {
    pub key_transform: KeyTransform,
}

// ---------------------------------------------------------------------------
// MatchSet
// ---------------------------------------------------------------------------

/// Distinct non-null keys of the first dataset's designated column.
#[derive(Debug, Clone, Default)]
pub struct MatchSet {
    keys: HashSet<MatchKey>,
    transform: KeyTransform,
    cells_seen: usize,
    nulls_skipped: usize,
}

impl MatchSet {
    pub fn new(transform: KeyTransform) -> Self {
        Self { transform, ..Self::default() }
    }

    pub fn from_column(dataset: &Dataset, col: usize, transform: KeyTransform) -> Self {
        let mut set = Self::new(transform);
        for value in dataset.column_values(col) {
            set.insert(value);
        }
        set
    }

    /// Add one cell. Returns false when the cell has no key (null).
    pub fn insert(&mut self, value: &Value) -> bool {
        self.cells_seen += 1;
        match self.transform.key(value) {
            Some(key) => {
                self.keys.insert(key);
                true
            }
            None => {
                self.nulls_skipped += 1;
                false
            }
        }
    }

    pub fn contains(&self, value: &Value) -> bool {
        match self.transform.key(value) {
            Some(key) => self.keys.contains(&key),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn cells_seen(&self) -> usize {
        self.cells_seen
    }

    pub fn nulls_skipped(&self) -> usize {
        self.nulls_skipped
    }
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Output column order: key column first, then the rest in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    key_col: usize,
    order: Vec<usize>,
    columns: Vec<String>,
}

impl Projection {
    pub fn new(columns: &[String], key_col: usize) -> Self {
        let order: Vec<usize> = std::iter::once(key_col)
            .chain((0..columns.len()).filter(|&i| i != key_col))
            .collect();
        let columns = order.iter().map(|&i| columns[i].clone()).collect();
        Self { key_col, order, columns }
    }

    pub fn key_col(&self) -> usize {
        self.key_col
    }

    /// Source column indices in output order.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Output header.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn apply<T: Clone>(&self, row: &[T]) -> Vec<T> {
        self.order.iter().map(|&i| row[i].clone()).collect()
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    pub first_rows: usize,
    pub first_nulls: usize,
    pub distinct_keys: usize,
    pub second_rows: usize,
    pub second_nulls: usize,
    pub matched_rows: usize,
}

#[derive(Debug, Clone)]
pub struct MatchOutput {
    pub result: Dataset,
    pub summary: MatchSummary,
}

// ---------------------------------------------------------------------------
// Core
// ---------------------------------------------------------------------------

/// Index of `column` in `dataset`, or `ColumnNotFound` for `side`.
pub fn resolve_column(dataset: &Dataset, column: &str, side: Side) -> Result<usize, MatchError> {
    if dataset.column_count() == 0 {
        return Err(MatchError::invalid(dataset.name(), "no columns"));
    }
    dataset.column_index(column).ok_or_else(|| MatchError::ColumnNotFound {
        side,
        column: column.to_string(),
        available: dataset.columns().to_vec(),
    })
}

/// Rows of `second` whose `second_column` value appears in `first[first_column]`.
pub fn match_merge(
    first: &Dataset,
    first_column: &str,
    second: &Dataset,
    second_column: &str,
) -> Result<MatchOutput, MatchError> {
    match_merge_with(first, first_column, second, second_column, &MatchOptions::default())
}

pub fn match_merge_with(
    first: &Dataset,
    first_column: &str,
    second: &Dataset,
    second_column: &str,
    options: &MatchOptions,
) -> Result<MatchOutput, MatchError> {
    let first_col = resolve_column(first, first_column, Side::First)?;
    let second_col = resolve_column(second, second_column, Side::Second)?;

    let set = MatchSet::from_column(first, first_col, options.key_transform);
    log::debug!(
        "match set from {}[{}]: {} distinct keys, {} nulls skipped",
        first.name(),
        first_column,
        set.len(),
        set.nulls_skipped()
    );

    let projection = Projection::new(second.columns(), second_col);
    let mut second_nulls = 0;
    let mut rows = Vec::new();

    for row in second.rows() {
        let value = &row[second_col];
        if options.key_transform.key(value).is_none() {
            second_nulls += 1;
            continue;
        }
        if set.contains(value) {
            rows.push(projection.apply(row));
        }
    }

    let summary = MatchSummary {
        first_rows: first.row_count(),
        first_nulls: set.nulls_skipped(),
        distinct_keys: set.len(),
        second_rows: second.row_count(),
        second_nulls,
        matched_rows: rows.len(),
    };
    log::debug!("{} of {} rows in {} matched", summary.matched_rows, summary.second_rows, second.name());

    let result = Dataset::from_rows("matched", projection.columns().to_vec(), rows)?;
    Ok(MatchOutput { result, summary })
}
