// CSV import/export for match datasets

use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use mailmatch_engine::{Dataset, MatchError, Value, DEFAULT_NULL_TOKENS};

/// How raw CSV fields become typed values.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub delimiter: u8,
    pub null_tokens: Vec<String>,
    pub infer_numbers: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            null_tokens: DEFAULT_NULL_TOKENS.iter().map(|s| s.to_string()).collect(),
            infer_numbers: true,
        }
    }
}

/// Row-at-a-time reader over a CSV source with a header row.
///
/// The header is consumed on construction; `next_row` yields coerced rows
/// padded to the header width.
pub struct TableReader<R> {
    name: String,
    reader: csv::Reader<R>,
    columns: Vec<String>,
    options: LoadOptions,
    record: csv::ByteRecord,
}

impl<R: Read> TableReader<R> {
    pub fn new(name: impl Into<String>, source: R, options: &LoadOptions) -> Result<Self, MatchError> {
        let name = name.into();
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(source);

        let mut record = csv::ByteRecord::new();
        let mut at_start = true;
        let header = loop {
            let more = reader
                .read_byte_record(&mut record)
                .map_err(|e| csv_error(&name, e))?;
            if !more {
                return Err(MatchError::invalid(name, "file is empty (no header row)"));
            }
            // A BOM can only open the very first field of the source.
            let fields: Vec<String> = record
                .iter()
                .enumerate()
                .map(|(i, f)| if at_start && i == 0 { decode_field(strip_bom(f)) } else { decode_field(f) })
                .collect();
            at_start = false;
            // A line of only delimiters is a header of empty names, not a blank line.
            if !is_blank_header(&fields) {
                break fields;
            }
        };

        let columns = unique_headers(header.clone());
        for (raw, renamed) in header.iter().zip(&columns) {
            if raw != renamed {
                log::warn!("{name}: column {raw:?} renamed to {renamed:?}");
            }
        }
        log::debug!("{name}: {} columns", columns.len());

        Ok(Self {
            name,
            reader,
            columns,
            options: options.clone(),
            record,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Next data row, or `None` at end of input. Blank lines are skipped.
    pub fn next_row(&mut self) -> Result<Option<Vec<Value>>, MatchError> {
        loop {
            let more = self
                .reader
                .read_byte_record(&mut self.record)
                .map_err(|e| csv_error(&self.name, e))?;
            if !more {
                return Ok(None);
            }
            if is_blank_line(&self.record) {
                continue;
            }

            let width = self.columns.len();
            if self.record.len() > width {
                let line = self.record.position().map(|p| p.line()).unwrap_or(0);
                return Err(MatchError::invalid(
                    &self.name,
                    format!("line {line}: expected {width} fields, found {}", self.record.len()),
                ));
            }

            let mut row: Vec<Value> = self
                .record
                .iter()
                .map(|f| {
                    Value::from_field(&decode_field(f), &self.options.null_tokens, self.options.infer_numbers)
                })
                .collect();
            // Short rows are padded, as spreadsheet exports often drop trailing empties
            row.resize(width, Value::Null);
            return Ok(Some(row));
        }
    }

    /// Drain the remaining rows into a dataset.
    pub fn into_dataset(mut self) -> Result<Dataset, MatchError> {
        let mut rows = Vec::new();
        while let Some(row) = self.next_row()? {
            rows.push(row);
        }
        log::debug!("{}: loaded {} rows", self.name, rows.len());
        Dataset::from_rows(self.name, self.columns, rows)
    }
}

pub fn import_reader<R: Read>(
    name: impl Into<String>,
    source: R,
    options: &LoadOptions,
) -> Result<Dataset, MatchError> {
    TableReader::new(name, source, options)?.into_dataset()
}

pub fn import(path: &Path, options: &LoadOptions) -> Result<Dataset, MatchError> {
    let file = open(path)?;
    import_reader(path.display().to_string(), file, options)
}

pub fn import_str(name: &str, content: &str, options: &LoadOptions) -> Result<Dataset, MatchError> {
    import_reader(name, content.as_bytes(), options)
}

/// Column names of a source, reading only up to its header row.
pub fn read_headers<R: Read>(
    name: impl Into<String>,
    source: R,
    options: &LoadOptions,
) -> Result<Vec<String>, MatchError> {
    Ok(TableReader::new(name, source, options)?.columns().to_vec())
}

pub fn read_headers_path(path: &Path, options: &LoadOptions) -> Result<Vec<String>, MatchError> {
    let file = open(path)?;
    read_headers(path.display().to_string(), file, options)
}

pub fn export_writer<W: Write>(dataset: &Dataset, sink: W, delimiter: u8) -> Result<(), MatchError> {
    let mut writer = csv::WriterBuilder::new().delimiter(delimiter).from_writer(sink);

    writer
        .write_record(dataset.columns())
        .map_err(|e| MatchError::Io(e.to_string()))?;
    for row in dataset.rows() {
        writer
            .write_record(row.iter().map(|v| v.as_field()))
            .map_err(|e| MatchError::Io(e.to_string()))?;
    }

    writer.flush().map_err(|e| MatchError::Io(e.to_string()))?;
    Ok(())
}

pub fn export(dataset: &Dataset, path: &Path, delimiter: u8) -> Result<(), MatchError> {
    let file = File::create(path).map_err(|e| MatchError::Io(format!("{}: {e}", path.display())))?;
    export_writer(dataset, file, delimiter)
}

pub(crate) fn open(path: &Path) -> Result<File, MatchError> {
    File::open(path).map_err(|e| MatchError::Io(format!("{}: {e}", path.display())))
}

pub(crate) fn csv_error(name: &str, err: csv::Error) -> MatchError {
    match err.kind() {
        csv::ErrorKind::Io(e) => MatchError::Io(format!("{name}: {e}")),
        _ => MatchError::invalid(name, err.to_string()),
    }
}

/// Decode one field: UTF-8 first, Windows-1252 as fallback (common for Excel-exported CSVs).
pub(crate) fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

fn is_blank_line(record: &csv::ByteRecord) -> bool {
    record.len() == 0 || (record.len() == 1 && record[0].is_empty())
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes)
}

fn is_blank_header(fields: &[String]) -> bool {
    match fields {
        [] => true,
        [only] => only.trim().is_empty(),
        _ => false,
    }
}

/// Name empty headers `Unnamed: <i>` and suffix repeats with `.1`, `.2`, ...
fn unique_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(raw.len());
    let mut out = Vec::with_capacity(raw.len());

    for (i, name) in raw.into_iter().enumerate() {
        let base = if name.is_empty() { format!("Unnamed: {i}") } else { name };
        let mut candidate = base.clone();
        let mut n = 1;
        while seen.contains(&candidate) {
            candidate = format!("{base}.{n}");
            n += 1;
        }
        seen.insert(candidate.clone());
        out.push(candidate);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn load(content: &str) -> Result<Dataset, MatchError> {
        import_str("test.csv", content, &LoadOptions::default())
    }

    fn fields(d: &Dataset) -> Vec<Vec<&str>> {
        d.rows().iter().map(|r| r.iter().map(|v| v.as_field()).collect()).collect()
    }

    #[test]
    fn test_basic_import() {
        let d = load("email,name\nx@y.com,Alice\nz@z.com,Bob\n").unwrap();
        assert_eq!(d.columns(), &["email", "name"].map(String::from));
        assert_eq!(fields(&d), vec![vec!["x@y.com", "Alice"], vec!["z@z.com", "Bob"]]);
        assert_eq!(d.name(), "test.csv");
    }

    #[test]
    fn test_empty_file_is_invalid() {
        for content in ["", "\n\n", "  \n"] {
            let err = load(content).unwrap_err();
            assert!(
                matches!(err, MatchError::EmptyOrInvalidInput { .. }),
                "{content:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_header_only_is_empty_dataset() {
        let d = load("email,name\n").unwrap();
        assert_eq!(d.column_count(), 2);
        assert!(d.is_empty());
    }

    #[test]
    fn test_quoted_fields() {
        let d = load("email,note\n\"x@y.com\",\"Doe, Jane \"\"JD\"\"\"\n").unwrap();
        assert_eq!(fields(&d), vec![vec!["x@y.com", "Doe, Jane \"JD\""]]);
    }

    #[test]
    fn test_null_tokens_and_numbers() {
        let d = load("email,score\nNA,1.5\nx@y.com,\n").unwrap();
        assert_eq!(d.cell(0, 0), Some(&Value::Null));
        assert_eq!(d.cell(0, 1), Some(&Value::Number { value: 1.5, raw: "1.5".into() }));
        assert_eq!(d.cell(1, 1), Some(&Value::Null));
    }

    #[test]
    fn test_custom_null_tokens() {
        let opts = LoadOptions { null_tokens: vec!["-".into()], ..LoadOptions::default() };
        let d = import_str("t", "email\n-\nNA\n", &opts).unwrap();
        assert_eq!(d.cell(0, 0), Some(&Value::Null));
        assert_eq!(d.cell(1, 0), Some(&Value::text("NA")));
    }

    #[test]
    fn test_short_rows_are_padded() {
        let d = load("a,b,c\n1\n1,2\n").unwrap();
        assert_eq!(d.cell(0, 1), Some(&Value::Null));
        assert_eq!(d.cell(0, 2), Some(&Value::Null));
        assert_eq!(d.cell(1, 2), Some(&Value::Null));
    }

    #[test]
    fn test_long_rows_are_rejected() {
        let err = load("a,b\n1,2\n1,2,3\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "test.csv: empty or invalid input: line 3: expected 2 fields, found 3"
        );
    }

    #[test]
    fn test_blank_lines_skipped() {
        let d = load("\nemail\n\nx@y.com\n\n").unwrap();
        assert_eq!(d.columns(), &["email".to_string()]);
        assert_eq!(d.row_count(), 1);
    }

    #[test]
    fn test_duplicate_headers_mangled() {
        let d = load("email,email,,email.1\n1,2,3,4\n").unwrap();
        assert_eq!(d.columns(), &["email", "email.1", "Unnamed: 2", "email.1.1"].map(String::from));
    }

    #[test]
    fn test_bom_stripped() {
        let d = load("\u{feff}email,name\nx@y.com,A\n").unwrap();
        assert_eq!(d.columns()[0], "email");
    }

    #[test]
    fn test_bom_kept_inside_data() {
        let d = load("\u{feff}email\n\u{feff}x@y.com\n").unwrap();
        assert_eq!(d.columns()[0], "email");
        assert_eq!(d.cell(0, 0), Some(&Value::text("\u{feff}x@y.com")));
    }

    #[test]
    fn test_bom_only_on_first_header_field() {
        let d = load("email,\u{feff}name\nx@y.com,A\n").unwrap();
        assert_eq!(d.columns(), &["email", "\u{feff}name"].map(String::from));
    }

    #[test]
    fn test_delimiter_only_header_names_columns() {
        let d = load(",\nx@y.com,1\n").unwrap();
        assert_eq!(d.columns(), &["Unnamed: 0", "Unnamed: 1"].map(String::from));
        assert_eq!(d.row_count(), 1);
        assert_eq!(d.cell(0, 0), Some(&Value::text("x@y.com")));

        let d = load(",,\n").unwrap();
        assert_eq!(d.column_count(), 3);
        assert!(d.is_empty());
    }

    #[test]
    fn test_windows_1252_fallback() {
        // "café" in Windows-1252
        let bytes: &[u8] = b"name\ncaf\xe9\n";
        let d = import_reader("t", bytes, &LoadOptions::default()).unwrap();
        assert_eq!(d.cell(0, 0), Some(&Value::text("café")));
    }

    #[test]
    fn test_semicolon_delimiter() {
        let opts = LoadOptions { delimiter: b';', ..LoadOptions::default() };
        let d = import_str("t", "email;name\nx@y.com;A\n", &opts).unwrap();
        assert_eq!(d.column_count(), 2);
    }

    #[test]
    fn test_read_headers_ignores_bad_rows() {
        let cols = read_headers("t", "email,name\n1,2,3,4\n".as_bytes(), &LoadOptions::default()).unwrap();
        assert_eq!(cols, vec!["email", "name"]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = import(&dir.path().join("nope.csv"), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, MatchError::Io(_)));
    }

    #[test]
    fn test_export_keeps_source_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let d = load("zip,email,note\n007,x@y.com,\"a,b\"\n1.50,NA,\n").unwrap();
        export(&d, &path, b',').unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "zip,email,note\n007,x@y.com,\"a,b\"\n1.50,,\n");
    }
}
