//! `mailmatch run`: filter the second file by the first file's emails.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use mailmatch_config::Settings;
use mailmatch_engine::{match_merge_with, MatchOptions, MatchSummary, Side};
use mailmatch_io::{LoadOptions, StreamInput, StreamMatcher};

use crate::util::render_preview;
use crate::{load_options, resolve_column, CliError, Input, RunArgs};

/// Where the result CSV goes.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Output {
    Stdout,
    File(PathBuf),
}

impl Output {
    fn label(&self) -> String {
        match self {
            Output::Stdout => "-".to_string(),
            Output::File(p) => p.display().to_string(),
        }
    }

    fn open(&self) -> Result<Box<dyn Write>, CliError> {
        match self {
            Output::Stdout => Ok(Box::new(io::stdout().lock())),
            Output::File(p) => {
                let file = std::fs::File::create(p)
                    .map_err(|e| CliError::io(format!("{}: {}", p.display(), e)))?;
                Ok(Box::new(io::BufWriter::new(file)))
            }
        }
    }
}

#[derive(Serialize)]
struct RunReport {
    meta: RunMeta,
    summary: MatchSummary,
}

#[derive(Serialize)]
struct RunMeta {
    tool_version: String,
    run_at: String,
    first: String,
    first_column: String,
    second: String,
    second_column: String,
    key_transform: String,
    mode: String,
    output: String,
}

pub(crate) fn cmd_run(settings: &Settings, args: RunArgs) -> Result<(), CliError> {
    let first = Input::parse(&args.first);
    let second = Input::parse(&args.second);

    if first == Input::Stdin && second == Input::Stdin {
        return Err(CliError::args("cannot read both files from stdin")
            .with_hint("provide at least one file path: mailmatch run - second.csv -1 email -2 email"));
    }

    let output = match args.output.as_deref() {
        Some("-") => Output::Stdout,
        Some(p) => Output::File(PathBuf::from(p)),
        None => Output::File(PathBuf::from(&settings.output_file)),
    };

    if args.json && output == Output::Stdout {
        return Err(CliError::args("--json and -o - both write to stdout")
            .with_hint("write the CSV to a file with -o <PATH>"));
    }
    if let Output::File(ref out) = output {
        for input in [&first, &second] {
            if let Input::Path(p) = input {
                if same_file(p, out) {
                    return Err(CliError::args(format!(
                        "output {} would overwrite input {}",
                        out.display(),
                        p.display()
                    )));
                }
            }
        }
    }

    let load = load_options(settings, args.delimiter, args.no_infer_numbers)?;
    let match_options = MatchOptions {
        key_transform: args.key_transform.map(Into::into).unwrap_or_else(|| settings.key_transform.into()),
    };
    let preview_rows = if args.quiet { 0 } else { args.preview.unwrap_or(settings.preview_rows) };

    let (summary, first_column, second_column) = if args.stream {
        run_streaming(&first, &second, &args, &output, &load, &match_options)?
    } else {
        run_in_memory(&first, &second, &args, &output, &load, &match_options, preview_rows, settings.preview_width)?
    };

    log::info!(
        "{} of {} rows matched ({} distinct emails)",
        summary.matched_rows,
        summary.second_rows,
        summary.distinct_keys
    );

    if args.json {
        let report = RunReport {
            meta: RunMeta {
                tool_version: env!("CARGO_PKG_VERSION").to_string(),
                run_at: chrono::Utc::now().to_rfc3339(),
                first: first.label(),
                first_column,
                second: second.label(),
                second_column,
                key_transform: match_options.key_transform.as_str().to_string(),
                mode: if args.stream { "stream" } else { "memory" }.to_string(),
                output: output.label(),
            },
            summary: summary.clone(),
        };
        let json = serde_json::to_string_pretty(&report).map_err(CliError::json)?;
        println!("{json}");
    }

    if !args.quiet {
        eprintln!(
            "first:   {} rows ({}), {} distinct emails, {} empty",
            summary.first_rows,
            first.label(),
            summary.distinct_keys,
            summary.first_nulls
        );
        eprintln!("second:  {} rows ({}), {} empty", summary.second_rows, second.label(), summary.second_nulls);
        eprintln!("matched: {} rows", summary.matched_rows);
        if let Output::File(ref p) = output {
            eprintln!("wrote {}", p.display());
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_in_memory(
    first: &Input,
    second: &Input,
    args: &RunArgs,
    output: &Output,
    load: &LoadOptions,
    match_options: &MatchOptions,
    preview_rows: usize,
    preview_width: usize,
) -> Result<(MatchSummary, String, String), CliError> {
    let a = mailmatch_io::import_reader(first.label(), first.open()?, load)?;
    let b = mailmatch_io::import_reader(second.label(), second.open()?, load)?;

    let first_column = resolve_column(&args.first_column, a.columns(), Side::First)?;
    let second_column = resolve_column(&args.second_column, b.columns(), Side::Second)?;

    let merged = match_merge_with(&a, &first_column, &b, &second_column, match_options)?;

    if preview_rows > 0 {
        eprint!("{}", render_preview(&merged.result, preview_rows, preview_width));
    }

    mailmatch_io::export_writer(&merged.result, output.open()?, load.delimiter)?;
    Ok((merged.summary, first_column, second_column))
}

fn run_streaming(
    first: &Input,
    second: &Input,
    args: &RunArgs,
    output: &Output,
    load: &LoadOptions,
    match_options: &MatchOptions,
) -> Result<(MatchSummary, String, String), CliError> {
    // Header probes reopen the file, so only paths get flexible column names.
    let first_column = probe_column(first, &args.first_column, load, Side::First)?;
    let second_column = probe_column(second, &args.second_column, load, Side::Second)?;

    let matcher = StreamMatcher::open(
        StreamInput { name: &first.label(), source: first.open()?, column: &first_column },
        StreamInput { name: &second.label(), source: second.open()?, column: &second_column },
        load,
        match_options,
    )?;
    // The output is created only once both headers and the key set are in hand.
    let summary = matcher.run(output.open()?)?;
    Ok((summary, first_column, second_column))
}

fn probe_column(input: &Input, spec: &str, load: &LoadOptions, side: Side) -> Result<String, CliError> {
    match input {
        Input::Stdin => Ok(spec.to_string()),
        Input::Path(p) => {
            let headers = mailmatch_io::read_headers_path(p, load)?;
            resolve_column(spec, &headers, side)
        }
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
