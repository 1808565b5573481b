use std::collections::HashSet;

use crate::error::MatchError;
use crate::value::Value;

/// Named columns plus row-major cells. Every row has one cell per column.
///
/// `name` is a label for messages (usually the file path or "stdin"); it
/// plays no part in matching.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    name: String,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Build a dataset, rejecting duplicate column names and ragged rows.
    pub fn from_rows(
        name: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    ) -> Result<Self, MatchError> {
        let name = name.into();

        let mut seen = HashSet::with_capacity(columns.len());
        for col in &columns {
            if !seen.insert(col.as_str()) {
                return Err(MatchError::invalid(name, format!("duplicate column name {col:?}")));
            }
        }

        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(MatchError::invalid(
                    name,
                    format!("row {} has {} cells, expected {}", i + 1, row.len(), columns.len()),
                ));
            }
        }

        Ok(Self { name, columns, rows })
    }

    /// A dataset with columns but no rows.
    pub fn empty(name: impl Into<String>, columns: Vec<String>) -> Result<Self, MatchError> {
        Self::from_rows(name, columns, Vec::new())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// All cells of one column, top to bottom.
    pub fn column_values(&self, col: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().filter_map(move |r| r.get(col))
    }

    pub fn into_parts(self) -> (String, Vec<String>, Vec<Vec<Value>>) {
        (self.name, self.columns, self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn column_lookup_by_name() {
        let ds = Dataset::empty("t", cols(&["email", "name"])).unwrap();
        assert_eq!(ds.column_index("name"), Some(1));
        assert_eq!(ds.column_index("Name"), None);
        assert!(ds.is_empty());
    }

    #[test]
    fn rejects_duplicate_columns() {
        let err = Dataset::empty("t", cols(&["a", "a"])).unwrap_err();
        assert!(matches!(err, MatchError::EmptyOrInvalidInput { .. }));
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = Dataset::from_rows(
            "t",
            cols(&["a", "b"]),
            vec![vec![Value::text("x")]],
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "t: empty or invalid input: row 1 has 1 cells, expected 2");
    }

    #[test]
    fn column_values_in_row_order() {
        let ds = Dataset::from_rows(
            "t",
            cols(&["a", "b"]),
            vec![
                vec![Value::text("1"), Value::text("x")],
                vec![Value::Null, Value::text("y")],
            ],
        )
        .unwrap();
        let b: Vec<&str> = ds.column_values(1).map(|v| v.as_field()).collect();
        assert_eq!(b, vec!["x", "y"]);
        assert_eq!(ds.cell(1, 0), Some(&Value::Null));
        assert_eq!(ds.cell(2, 0), None);
    }
}
