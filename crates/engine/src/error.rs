use std::fmt;

/// Which of the two inputs an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The dataset whose column supplies the email set.
    First,
    /// The dataset whose rows are filtered.
    Second,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::First => "first",
            Side::Second => "second",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// Input has no header, no columns, or a row that cannot be parsed.
    EmptyOrInvalidInput { source: String, reason: String },
    /// Selected column is not in the dataset.
    ColumnNotFound { side: Side, column: String, available: Vec<String> },
    /// Source could not be read at all.
    Io(String),
}

impl MatchError {
    pub fn invalid(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EmptyOrInvalidInput { source: source.into(), reason: reason.into() }
    }
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyOrInvalidInput { source, reason } => {
                write!(f, "{source}: empty or invalid input: {reason}")
            }
            Self::ColumnNotFound { side, column, .. } => {
                write!(f, "{side} file: column {column:?} not found")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for MatchError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_not_found_names_side_and_column() {
        let e = MatchError::ColumnNotFound {
            side: Side::Second,
            column: "mail".into(),
            available: vec!["email".into()],
        };
        assert_eq!(e.to_string(), "second file: column \"mail\" not found");
    }

    #[test]
    fn invalid_input_message() {
        let e = MatchError::invalid("a.csv", "no header row");
        assert_eq!(e.to_string(), "a.csv: empty or invalid input: no header row");
    }
}
