// mailmatch CLI - keep the rows of one CSV whose email appears in another

mod config_cmd;
mod exit_codes;
mod run;
mod util;

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use exit_codes::{match_exit_code, settings_exit_code, EXIT_ERROR, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};
use mailmatch_config::{Settings, SettingsError};
use mailmatch_engine::{KeyTransform, MatchError, Side};
use mailmatch_io::LoadOptions;

#[derive(Parser)]
#[command(name = "mailmatch")]
#[command(about = "Keep the rows of one CSV whose email appears in another")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Settings file (default: $MAILMATCH_CONFIG or the platform config dir)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the columns of a CSV file
    #[command(after_help = "\
Examples:
  mailmatch columns customers.csv
  mailmatch columns export.csv --json
  cat export.csv | mailmatch columns -")]
    Columns {
        /// CSV file (or - for stdin)
        file: String,

        /// Print a JSON array instead of one name per line
        #[arg(long)]
        json: bool,

        /// CSV delimiter
        #[arg(long)]
        delimiter: Option<char>,
    },

    /// Write the rows of SECOND whose email appears in FIRST
    #[command(after_help = "\
The output keeps every column of SECOND, with the email column moved first.
Each row of SECOND appears at most once, however often its email occurs in FIRST.
Empty and NA-like cells never match.

Examples:
  mailmatch run subscribers.csv orders.csv --first-column email --second-column mail
  mailmatch run a.csv b.csv -1 email -2 Email -o matched.csv
  mailmatch run a.csv b.csv -1 email -2 email -o - > matched.csv
  mailmatch run a.csv huge.csv -1 email -2 email --stream --json
  cat a.csv | mailmatch run - b.csv -1 email -2 email")]
    Run(RunArgs),

    /// Settings file management
    #[command(subcommand)]
    Config(config_cmd::ConfigCommands),
}

#[derive(clap::Args)]
pub(crate) struct RunArgs {
    /// First CSV: supplies the emails to look for (or - for stdin)
    first: String,

    /// Second CSV: rows are kept when their email is found (or - for stdin)
    second: String,

    /// Email column in FIRST (name, case-insensitive name, or 1-based index)
    #[arg(long, short = '1', value_name = "COL")]
    first_column: String,

    /// Email column in SECOND (name, case-insensitive name, or 1-based index)
    #[arg(long, short = '2', value_name = "COL")]
    second_column: String,

    /// Output file, or - for stdout [default: output.fileName setting]
    #[arg(long, short = 'o', value_name = "PATH")]
    output: Option<String>,

    /// Rows of the result to preview on stderr (0 disables) [default: output.previewRows setting]
    #[arg(long, value_name = "N")]
    preview: Option<usize>,

    /// Key normalization before comparing
    #[arg(long)]
    key_transform: Option<KeyTransformArg>,

    /// CSV delimiter for both inputs and the output
    #[arg(long)]
    delimiter: Option<char>,

    /// Treat every non-null cell as text (no numeric coercion)
    #[arg(long)]
    no_infer_numbers: bool,

    /// Filter the second file row by row instead of loading it whole
    #[arg(long)]
    stream: bool,

    /// Print a JSON summary to stdout
    #[arg(long)]
    json: bool,

    /// Suppress the stderr summary and preview
    #[arg(long, short = 'q')]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub(crate) enum KeyTransformArg {
    None,
    Trim,
}

impl From<KeyTransformArg> for KeyTransform {
    fn from(k: KeyTransformArg) -> Self {
        match k {
            KeyTransformArg::None => KeyTransform::None,
            KeyTransformArg::Trim => KeyTransform::Trim,
        }
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  mailmatch-engine ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
    )
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Columns { file, json, delimiter } => {
            load_settings(cli.config.as_deref()).and_then(|s| cmd_columns(&s, file, json, delimiter))
        }
        Commands::Run(args) => load_settings(cli.config.as_deref()).and_then(|s| run::cmd_run(&s, args)),
        Commands::Config(cmd) => config_cmd::cmd_config(cli.config.as_deref(), cmd),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn json(err: serde_json::Error) -> Self {
        Self { code: EXIT_ERROR, message: format!("JSON serialization error: {err}"), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<MatchError> for CliError {
    fn from(err: MatchError) -> Self {
        let code = match_exit_code(&err);
        let hint = match &err {
            MatchError::ColumnNotFound { available, .. } => {
                Some(format!("available columns: {}", available.join(", ")))
            }
            MatchError::EmptyOrInvalidInput { .. } => {
                Some("expected a CSV file with a header row".to_string())
            }
            MatchError::Io(_) => None,
        };
        Self { code, message: err.to_string(), hint }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        let code = settings_exit_code(&err);
        let hint = match &err {
            SettingsError::AlreadyExists(_) => Some("use --force to overwrite".to_string()),
            SettingsError::Write { .. } => None,
            _ => Some("fix the file or regenerate it with `mailmatch config init --force`".to_string()),
        };
        Self { code, message: err.to_string(), hint }
    }
}

pub(crate) fn load_settings(explicit: Option<&Path>) -> Result<Settings, CliError> {
    let settings = match explicit {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    Ok(settings)
}

pub(crate) fn load_options(settings: &Settings, delimiter: Option<char>, no_infer_numbers: bool) -> Result<LoadOptions, CliError> {
    let mut options = settings.load_options();
    if let Some(d) = delimiter {
        if !d.is_ascii() || d == '"' || d == '\n' {
            return Err(CliError::args(format!("invalid delimiter {d:?}"))
                .with_hint("use a single ASCII character such as ',' ';' '|' or a tab"));
        }
        options.delimiter = d as u8;
    }
    if no_infer_numbers {
        options.infer_numbers = false;
    }
    Ok(options)
}

// ============================================================================
// Inputs
// ============================================================================

/// A CSV source named on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Input {
    Stdin,
    Path(PathBuf),
}

impl Input {
    pub(crate) fn parse(arg: &str) -> Self {
        if arg == "-" {
            Input::Stdin
        } else {
            Input::Path(PathBuf::from(arg))
        }
    }

    pub(crate) fn label(&self) -> String {
        match self {
            Input::Stdin => "stdin".to_string(),
            Input::Path(p) => p.display().to_string(),
        }
    }

    /// Fresh reader over the source. Paths are reopened on every call.
    pub(crate) fn open(&self) -> Result<Box<dyn Read>, CliError> {
        match self {
            Input::Stdin => Ok(Box::new(io::stdin().lock())),
            Input::Path(p) => {
                let file = std::fs::File::open(p)
                    .map_err(|e| CliError::io(format!("{}: {}", p.display(), e)))?;
                Ok(Box::new(io::BufReader::new(file)))
            }
        }
    }
}

/// Resolve a user-supplied column against a header: exact name, then
/// case-insensitive name (if unambiguous), then 1-based index.
pub(crate) fn resolve_column(spec: &str, headers: &[String], side: Side) -> Result<String, CliError> {
    if headers.iter().any(|h| h == spec) {
        return Ok(spec.to_string());
    }

    let spec_lower = spec.to_lowercase();
    let folded: Vec<&String> = headers.iter().filter(|h| h.to_lowercase() == spec_lower).collect();
    match folded.len() {
        1 => return Ok(folded[0].clone()),
        0 => {}
        _ => {
            let names: Vec<&str> = folded.iter().map(|s| s.as_str()).collect();
            return Err(CliError::args(format!(
                "{side} file: column {spec:?} is ambiguous ({})",
                names.join(", ")
            ))
            .with_hint("spell the column exactly as it appears in the header"));
        }
    }

    if let Ok(n) = spec.parse::<usize>() {
        if n >= 1 && n <= headers.len() {
            return Ok(headers[n - 1].clone());
        }
    }

    Err(CliError::from(MatchError::ColumnNotFound {
        side,
        column: spec.to_string(),
        available: headers.to_vec(),
    }))
}

// ============================================================================
// columns
// ============================================================================

fn cmd_columns(settings: &Settings, file: String, json: bool, delimiter: Option<char>) -> Result<(), CliError> {
    let options = load_options(settings, delimiter, false)?;
    let input = Input::parse(&file);
    let headers = mailmatch_io::read_headers(input.label(), input.open()?, &options)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    if json {
        let out = serde_json::to_string(&headers).map_err(CliError::json)?;
        writeln!(handle, "{}", out).map_err(|e| CliError::io(e.to_string()))?;
    } else {
        for name in &headers {
            writeln!(handle, "{}", name).map_err(|e| CliError::io(e.to_string()))?;
        }
    }

    Ok(())
}
