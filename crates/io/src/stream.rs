// Bounded-memory matching: the first source is held as a key set, the
// second is filtered record by record straight into the output.

use std::io::{Read, Write};

use mailmatch_engine::{MatchError, MatchOptions, MatchSet, MatchSummary, Projection, Side};

use crate::csv::{LoadOptions, TableReader};

/// One side of a streaming match.
pub struct StreamInput<'a, R> {
    pub name: &'a str,
    pub source: R,
    pub column: &'a str,
}

/// A streaming match whose inputs are resolved and whose key set is built.
///
/// Nothing has been written yet: the sink is only needed by [`StreamMatcher::run`],
/// so callers can hold off creating the output until every column check passed.
pub struct StreamMatcher<B> {
    second: TableReader<B>,
    second_col: usize,
    set: MatchSet,
    first_rows: usize,
    options: MatchOptions,
    delimiter: u8,
}

impl<B: Read> StreamMatcher<B> {
    pub fn open<A: Read>(
        first: StreamInput<'_, A>,
        second: StreamInput<'_, B>,
        load: &LoadOptions,
        options: &MatchOptions,
    ) -> Result<Self, MatchError> {
        let mut first_reader = TableReader::new(first.name, first.source, load)?;
        let first_col = column_index(first_reader.columns(), first.column, Side::First)?;

        // Open the second header before consuming the first body so a bad
        // column name fails fast.
        let second_reader = TableReader::new(second.name, second.source, load)?;
        let second_col = column_index(second_reader.columns(), second.column, Side::Second)?;

        let mut set = MatchSet::new(options.key_transform);
        let mut first_rows = 0;
        while let Some(row) = first_reader.next_row()? {
            set.insert(&row[first_col]);
            first_rows += 1;
        }
        log::debug!("match set from {}: {} distinct keys", first.name, set.len());

        Ok(Self {
            second: second_reader,
            second_col,
            set,
            first_rows,
            options: *options,
            delimiter: load.delimiter,
        })
    }

    /// Output column order: the key column, then the rest of the second source.
    pub fn columns(&self) -> Vec<String> {
        Projection::new(self.second.columns(), self.second_col).columns().to_vec()
    }

    /// Filter the second source into `sink`.
    pub fn run<W: Write>(mut self, sink: W) -> Result<MatchSummary, MatchError> {
        let projection = Projection::new(self.second.columns(), self.second_col);
        let mut writer = csv::WriterBuilder::new().delimiter(self.delimiter).from_writer(sink);
        writer
            .write_record(projection.columns())
            .map_err(|e| MatchError::Io(e.to_string()))?;

        let mut summary = MatchSummary {
            first_rows: self.first_rows,
            first_nulls: self.set.nulls_skipped(),
            distinct_keys: self.set.len(),
            ..MatchSummary::default()
        };

        while let Some(row) = self.second.next_row()? {
            summary.second_rows += 1;
            let value = &row[self.second_col];
            if self.options.key_transform.key(value).is_none() {
                summary.second_nulls += 1;
                continue;
            }
            if self.set.contains(value) {
                summary.matched_rows += 1;
                writer
                    .write_record(projection.order().iter().map(|&i| row[i].as_field()))
                    .map_err(|e| MatchError::Io(e.to_string()))?;
            }
        }

        writer.flush().map_err(|e| MatchError::Io(e.to_string()))?;
        log::debug!("streamed {} of {} rows", summary.matched_rows, summary.second_rows);
        Ok(summary)
    }
}

pub fn stream_match<A: Read, B: Read, W: Write>(
    first: StreamInput<'_, A>,
    second: StreamInput<'_, B>,
    sink: W,
    load: &LoadOptions,
    options: &MatchOptions,
) -> Result<MatchSummary, MatchError> {
    StreamMatcher::open(first, second, load, options)?.run(sink)
}

fn column_index(columns: &[String], column: &str, side: Side) -> Result<usize, MatchError> {
    columns.iter().position(|c| c == column).ok_or_else(|| MatchError::ColumnNotFound {
        side,
        column: column.to_string(),
        available: columns.to_vec(),
    })
}
