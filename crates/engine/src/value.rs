use std::fmt;

use ordered_float::OrderedFloat;

/// Tokens the loader treats as missing values by default.
///
/// Mirrors the usual spreadsheet/dataframe conventions so that files
/// exported from those tools round-trip without surprise matches on "N/A".
pub const DEFAULT_NULL_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A single cell after loader coercion.
///
/// Numbers keep their source text so that writing a dataset back out
/// reproduces the input field exactly (`007` stays `007`).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Number { value: f64, raw: String },
    Text(String),
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl Value {
    /// Coerce a raw CSV field.
    pub fn from_field(field: &str, null_tokens: &[String], infer_numbers: bool) -> Self {
        if null_tokens.iter().any(|t| t == field) {
            return Value::Null;
        }

        if infer_numbers {
            if let Some(value) = parse_number(field) {
                return Value::Number { value, raw: field.to_string() };
            }
        }

        Value::Text(field.to_string())
    }

    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn number(value: f64) -> Self {
        Value::Number { value, raw: format_number(value) }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Field text as it should appear in CSV output.
    pub fn as_field(&self) -> &str {
        match self {
            Value::Null => "",
            Value::Number { raw, .. } => raw,
            Value::Text(s) => s,
        }
    }

    /// Membership key. `None` for nulls, which never match anything.
    pub fn key(&self) -> Option<MatchKey> {
        match self {
            Value::Null => None,
            Value::Number { value, .. } => Some(MatchKey::number(*value)),
            Value::Text(s) => Some(MatchKey::Text(s.clone())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_field())
    }
}

/// Hashable identity of a non-null value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MatchKey {
    Number(OrderedFloat<f64>),
    Text(String),
}

impl MatchKey {
    pub(crate) fn number(value: f64) -> Self {
        // -0.0 and 0.0 must land in the same bucket
        MatchKey::Number(OrderedFloat(value + 0.0))
    }

    /// Key of already-trimmed text, re-coerced the way the loader would.
    pub(crate) fn from_trimmed(text: &str) -> Self {
        match parse_number(text) {
            Some(n) => MatchKey::number(n),
            None => MatchKey::Text(text.to_string()),
        }
    }
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchKey::Number(n) => write!(f, "{}", format_number(n.into_inner())),
            MatchKey::Text(s) => f.write_str(s),
        }
    }
}

/// Finite numbers only; "inf" and friends stay text.
fn parse_number(field: &str) -> Option<f64> {
    // Rust accepts "infinity"/"nan" spellings that no CSV producer means as numbers
    if !field.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
