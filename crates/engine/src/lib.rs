//! `mailmatch-engine`: email membership matching over tabular data.
//!
//! Pure engine crate: receives loaded datasets, returns the filtered and
//! re-projected result. No CLI or IO dependencies.

pub mod dataset;
pub mod error;
pub mod matcher;
pub mod value;

pub use dataset::Dataset;
pub use error::{MatchError, Side};
pub use matcher::{
    match_merge, match_merge_with, resolve_column, KeyTransform, MatchOptions, MatchOutput,
    MatchSet, MatchSummary, Projection,
};
pub use value::{MatchKey, Value, DEFAULT_NULL_TOKENS};
