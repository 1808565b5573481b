//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract — scripts rely on them.
//!
//! # Exit Codes
//!
//! | Code | Domain    | Description                                   |
//! |------|-----------|-----------------------------------------------|
//! | 0    | Universal | Success (zero matches is still success)       |
//! | 1    | Universal | General error (unspecified)                   |
//! | 2    | Universal | CLI usage error (bad args, conflicting flags) |
//! | 3    | input     | Source unreadable / output unwritable         |
//! | 4    | input     | Empty or invalid CSV                          |
//! | 5    | input     | Selected column not found                     |
//! | 6    | config    | Settings file unreadable or invalid           |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use mailmatch_config::SettingsError;
use mailmatch_engine::MatchError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, conflicting options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Input (3-5)
// =============================================================================

/// A source could not be read, or the output could not be written.
pub const EXIT_IO: u8 = 3;

/// A source is empty, has no header row, or has a malformed row.
pub const EXIT_INVALID_INPUT: u8 = 4;

/// The selected column does not exist in its file.
pub const EXIT_COLUMN_NOT_FOUND: u8 = 5;

// =============================================================================
// Config (6)
// =============================================================================

/// Settings file could not be read or failed validation.
pub const EXIT_CONFIG: u8 = 6;

/// Map an engine/IO error to its exit code.
pub fn match_exit_code(err: &MatchError) -> u8 {
    match err {
        MatchError::EmptyOrInvalidInput { .. } => EXIT_INVALID_INPUT,
        MatchError::ColumnNotFound { .. } => EXIT_COLUMN_NOT_FOUND,
        MatchError::Io(_) => EXIT_IO,
    }
}

/// Map a settings error to its exit code.
pub fn settings_exit_code(err: &SettingsError) -> u8 {
    match err {
        SettingsError::Write { .. } => EXIT_IO,
        SettingsError::AlreadyExists(_) => EXIT_USAGE,
        SettingsError::Read { .. } | SettingsError::Parse { .. } | SettingsError::Invalid(_) => {
            EXIT_CONFIG
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailmatch_engine::Side;

    #[test]
    fn match_errors_map_to_distinct_codes() {
        let codes = [
            match_exit_code(&MatchError::invalid("a", "b")),
            match_exit_code(&MatchError::ColumnNotFound {
                side: Side::First,
                column: "x".into(),
                available: vec![],
            }),
            match_exit_code(&MatchError::Io("gone".into())),
        ];
        assert_eq!(codes, [EXIT_INVALID_INPUT, EXIT_COLUMN_NOT_FOUND, EXIT_IO]);
        assert!(!codes.contains(&EXIT_SUCCESS));
        assert!(!codes.contains(&EXIT_ERROR));
    }
}
