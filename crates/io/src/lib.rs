// File I/O for mailmatch: CSV datasets in and out, plus the streaming filter

pub mod csv;
pub mod stream;

pub use crate::csv::{
    export, export_writer, import, import_reader, import_str, read_headers, read_headers_path,
    LoadOptions, TableReader,
};
pub use crate::stream::{stream_match, StreamInput, StreamMatcher};
