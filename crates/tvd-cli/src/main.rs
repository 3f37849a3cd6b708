// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use serde::Serialize;
use serde_json::{Value, json};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tvd_cli::{check_columns, filter_columns, split_columns};
use tvd_core::{FilterDiagnostics, TvdError};
use tvd_eval::{DEFAULT_TOLERANCE, OptimalityReport};
use tvd_filter::{EdgeOffset, TvFilterConfig};

enum Command {
    Filter(FilterArgs),
    Check(CheckArgs),
}

#[derive(Debug)]
struct FilterArgs {
    config: TvFilterConfig,
    input: PathBuf,
    output: Option<PathBuf>,
}

#[derive(Debug)]
struct CheckArgs {
    lambda: f64,
    tolerance: f64,
    input: PathBuf,
    filtered: PathBuf,
    output: Option<PathBuf>,
}

#[derive(Debug)]
enum CliError {
    Tvd(TvdError),
    Io {
        context: String,
        source: std::io::Error,
    },
    Json {
        context: String,
        source: serde_json::Error,
    },
    InvalidInput(String),
    NotSupported(String),
    CheckFailed(String),
}

impl CliError {
    fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Tvd(TvdError::InvalidInput(_)) | Self::InvalidInput(_) => "invalid_input",
            Self::Tvd(TvdError::NumericalIssue(_)) => "numerical_issue",
            Self::Tvd(TvdError::NotSupported(_)) | Self::NotSupported(_) => "not_supported",
            Self::Io { .. } => "io_error",
            Self::Json { .. } => "json_error",
            Self::CheckFailed(_) => "check_failed",
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tvd(err) => write!(f, "{err}"),
            Self::Io { context, source } => write!(f, "{context}: {source}"),
            Self::Json { context, source } => write!(f, "{context}: {source}"),
            Self::InvalidInput(msg) | Self::NotSupported(msg) | Self::CheckFailed(msg) => {
                write!(f, "{msg}")
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Tvd(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::InvalidInput(_) | Self::NotSupported(_) | Self::CheckFailed(_) => None,
        }
    }
}

impl From<TvdError> for CliError {
    fn from(value: TvdError) -> Self {
        Self::Tvd(value)
    }
}

/// Column-major numeric table read from a CSV file or a `tvd filter` report.
#[derive(Clone, Debug)]
struct LoadedTable {
    path: PathBuf,
    format: &'static str,
    columns: Vec<Vec<f64>>,
    n: usize,
}

impl LoadedTable {
    fn summary(&self) -> InputSummary {
        InputSummary {
            path: self.path.display().to_string(),
            format: self.format,
            n: self.n,
            d: self.columns.len(),
        }
    }
}

#[derive(Serialize)]
struct InputSummary {
    path: String,
    format: &'static str,
    n: usize,
    d: usize,
}

#[derive(Serialize)]
struct FilterOutput {
    input: InputSummary,
    config: TvFilterConfig,
    columns: Vec<FilteredColumnOutput>,
}

#[derive(Serialize)]
struct FilteredColumnOutput {
    column: usize,
    values: Vec<f64>,
    diagnostics: FilterDiagnostics,
}

#[derive(Serialize)]
struct CheckOutput {
    input: InputSummary,
    filtered: InputSummary,
    lambda: f64,
    tolerance: f64,
    optimal: bool,
    columns: Vec<CheckedColumnOutput>,
}

#[derive(Serialize)]
struct CheckedColumnOutput {
    column: usize,
    /// NaN (serialized as `null`) when the column lengths differ.
    objective: f64,
    report: OptimalityReport,
}

fn main() {
    if let Err(err) = run() {
        emit_structured_error(&err);
        process::exit(1);
    }
}

fn run() -> Result<(), CliError> {
    match parse_cli(env::args().skip(1).collect())? {
        Some(Command::Filter(args)) => handle_filter(args),
        Some(Command::Check(args)) => handle_check(args),
        None => Ok(()),
    }
}

fn parse_cli(args: Vec<String>) -> Result<Option<Command>, CliError> {
    let Some((command_name, rest)) = args.split_first() else {
        print_root_help();
        return Ok(None);
    };
    match command_name.as_str() {
        "-h" | "--help" => {
            print_root_help();
            return Ok(None);
        }
        "-V" | "--version" => {
            print_version();
            return Ok(None);
        }
        _ => {}
    }

    if rest
        .iter()
        .any(|arg| matches!(arg.as_str(), "-h" | "--help"))
    {
        print_command_help(command_name)?;
        return Ok(None);
    }

    let command = match command_name.as_str() {
        "filter" => Command::Filter(parse_filter_args(rest)?),
        "check" => Command::Check(parse_check_args(rest)?),
        _ => {
            return Err(CliError::invalid_input(format!(
                "unknown command '{command_name}'; expected one of: filter, check"
            )));
        }
    };
    Ok(Some(command))
}

/// Reads `--flag value` and `--flag=value` pairs; every option takes a value.
struct FlagReader<'a> {
    tokens: std::slice::Iter<'a, String>,
}

impl<'a> FlagReader<'a> {
    fn new(tokens: &'a [String]) -> Self {
        Self {
            tokens: tokens.iter(),
        }
    }

    fn next_pair(&mut self) -> Result<Option<(&'a str, String)>, CliError> {
        let Some(token) = self.tokens.next() else {
            return Ok(None);
        };
        if !token.starts_with("--") {
            return Err(CliError::invalid_input(format!(
                "unexpected positional argument '{token}'; expected --flag value"
            )));
        }
        if let Some((flag, value)) = token.split_once('=') {
            return Ok(Some((flag, value.to_string())));
        }

        match self.tokens.next() {
            Some(value) if !value.starts_with("--") => Ok(Some((token.as_str(), value.clone()))),
            Some(value) => Err(CliError::invalid_input(format!(
                "{token} requires a value, but got option '{value}'"
            ))),
            None => Err(CliError::invalid_input(format!("{token} requires a value"))),
        }
    }
}

fn parse_filter_args(tokens: &[String]) -> Result<FilterArgs, CliError> {
    let mut lambda = None;
    let mut edge_offset = EdgeOffset::default();
    let mut input = None;
    let mut output = None;

    let mut flags = FlagReader::new(tokens);
    while let Some((flag, value)) = flags.next_pair()? {
        match flag {
            "--lambda" => lambda = Some(parse_f64_arg(&value, flag)?),
            "--edge-offset" => edge_offset = EdgeOffset::parse(&value)?,
            "--input" => input = Some(PathBuf::from(value)),
            "--output" => output = Some(PathBuf::from(value)),
            other => {
                return Err(CliError::invalid_input(format!(
                    "unknown filter option '{other}'"
                )));
            }
        }
    }

    let Some(lambda) = lambda else {
        return Err(CliError::invalid_input("filter requires --lambda <float>"));
    };
    let input = input.ok_or_else(|| CliError::invalid_input("filter requires --input <path>"))?;
    Ok(FilterArgs {
        config: TvFilterConfig {
            lambda,
            edge_offset,
            ..TvFilterConfig::default()
        },
        input,
        output,
    })
}

fn parse_check_args(tokens: &[String]) -> Result<CheckArgs, CliError> {
    let mut lambda = None;
    let mut tolerance = DEFAULT_TOLERANCE;
    let mut input = None;
    let mut filtered = None;
    let mut output = None;

    let mut flags = FlagReader::new(tokens);
    while let Some((flag, value)) = flags.next_pair()? {
        match flag {
            "--lambda" => lambda = Some(parse_f64_arg(&value, flag)?),
            "--tolerance" => tolerance = parse_f64_arg(&value, flag)?,
            "--input" => input = Some(PathBuf::from(value)),
            "--filtered" => filtered = Some(PathBuf::from(value)),
            "--output" => output = Some(PathBuf::from(value)),
            other => {
                return Err(CliError::invalid_input(format!(
                    "unknown check option '{other}'"
                )));
            }
        }
    }

    Ok(CheckArgs {
        lambda: lambda.ok_or_else(|| CliError::invalid_input("check requires --lambda <float>"))?,
        tolerance,
        input: input.ok_or_else(|| CliError::invalid_input("check requires --input <path>"))?,
        filtered: filtered
            .ok_or_else(|| CliError::invalid_input("check requires --filtered <path>"))?,
        output,
    })
}

fn parse_f64_arg(raw: &str, flag: &str) -> Result<f64, CliError> {
    raw.parse::<f64>()
        .map_err(|_| CliError::invalid_input(format!("{flag} expects a number, got '{raw}'")))
}

fn print_version() {
    println!("tvd {}", env!("CARGO_PKG_VERSION"));
}

fn print_root_help() {
    println!(
        "tvd {}\n\nUSAGE:\n  tvd <COMMAND> [OPTIONS]\n\nCOMMANDS:\n  filter   Denoise each CSV column with a total-variation penalty\n  check    Verify filtered output against the optimality conditions\n\nGLOBAL OPTIONS:\n  -h, --help      Show help\n  -V, --version   Show version\n\nRun 'tvd <COMMAND> --help' for subcommand options.",
        env!("CARGO_PKG_VERSION")
    );
}

fn print_command_help(command: &str) -> Result<(), CliError> {
    match command {
        "filter" => {
            println!(
                "USAGE:\n  tvd filter --lambda <float> --input <path> [OPTIONS]\n\nOPTIONS:\n  --lambda <float>              Required penalty, finite and >= 0\n  --edge-offset <full|half>     Default: full\n  --input <path>                Required input (.csv)\n  --output <path>               Write JSON output to file"
            );
            Ok(())
        }
        "check" => {
            println!(
                "USAGE:\n  tvd check --lambda <float> --input <path> --filtered <path> [OPTIONS]\n\nOPTIONS:\n  --lambda <float>              Required penalty used for filtering\n  --tolerance <float>           Default: 1e-5\n  --input <path>                Required samples (.csv or tvd filter .json)\n  --filtered <path>             Required filtered samples (.csv or tvd filter .json)\n  --output <path>               Write JSON report to file"
            );
            Ok(())
        }
        _ => Err(CliError::invalid_input(format!(
            "unknown command '{command}'; expected one of: filter, check"
        ))),
    }
}

fn handle_filter(args: FilterArgs) -> Result<(), CliError> {
    let table = load_table(args.input.as_path())?;
    let results = filter_columns(&table.columns, &args.config)?;
    let output = FilterOutput {
        input: table.summary(),
        config: args.config,
        columns: results
            .into_iter()
            .enumerate()
            .map(|(idx, result)| FilteredColumnOutput {
                column: idx + 1,
                values: result.values,
                diagnostics: result.diagnostics,
            })
            .collect(),
    };

    write_json_output(&output, args.output.as_deref())
}

/// Writes the report first, then fails with `CheckFailed` if any column is
/// not optimal.
fn handle_check(args: CheckArgs) -> Result<(), CliError> {
    let input = load_table(args.input.as_path())?;
    let filtered = load_table(args.filtered.as_path())?;
    let reports = check_columns(
        &input.columns,
        &filtered.columns,
        args.lambda,
        args.tolerance,
    )?;

    let mut columns = Vec::with_capacity(reports.len());
    let pairs = input.columns.iter().zip(&filtered.columns);
    for (idx, ((x, y), report)) in pairs.zip(reports).enumerate() {
        let objective = if x.len() == y.len() {
            tvd_eval::objective(x, y, args.lambda)?
        } else {
            f64::NAN
        };
        columns.push(CheckedColumnOutput {
            column: idx + 1,
            objective,
            report,
        });
    }

    let failed = columns
        .iter()
        .filter(|column| !column.report.is_optimal())
        .map(|column| column.column)
        .collect::<Vec<_>>();
    let output = CheckOutput {
        input: input.summary(),
        filtered: filtered.summary(),
        lambda: args.lambda,
        tolerance: args.tolerance,
        optimal: failed.is_empty(),
        columns,
    };
    write_json_output(&output, args.output.as_deref())?;

    if failed.is_empty() {
        Ok(())
    } else {
        Err(CliError::CheckFailed(format!(
            "optimality check failed for column(s) {failed:?}"
        )))
    }
}

fn load_table(path: &Path) -> Result<LoadedTable, CliError> {
    let format = match path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .as_deref()
    {
        Some("csv") => "csv",
        Some("json") => "json",
        _ => {
            return Err(CliError::NotSupported(format!(
                "unsupported input '{}'; expected .csv or .json",
                path.display()
            )));
        }
    };

    let raw = fs::read_to_string(path)
        .map_err(|source| CliError::io(format!("failed to read '{}'", path.display()), source))?;
    let (columns, n) = if format == "csv" {
        let (values, n, d) = parse_csv_table(raw.as_str())?;
        (split_columns(&values, n, d)?, n)
    } else {
        parse_filter_report(raw.as_str())?
    };

    Ok(LoadedTable {
        path: path.to_path_buf(),
        format,
        columns,
        n,
    })
}

/// Parses comma-separated numeric rows into row-major values. A first row
/// without any numeric cell is treated as a header.
fn parse_csv_table(raw: &str) -> Result<(Vec<f64>, usize, usize), CliError> {
    let mut rows = raw
        .lines()
        .map(str::trim)
        .enumerate()
        .filter(|(_, line)| !line.is_empty())
        .peekable();
    if rows.peek().is_some_and(|(_, row)| is_header_row(row)) {
        rows.next();
    }

    let mut values = Vec::new();
    let mut width = None;
    let mut n = 0usize;
    for (line_idx, row) in rows {
        let line = line_idx + 1;
        let before = values.len();
        for (col_idx, cell) in row.split(',').map(str::trim).enumerate() {
            let value = cell.parse::<f64>().map_err(|_| {
                CliError::invalid_input(format!(
                    "CSV line {line} column {}: expected a number, got '{cell}'",
                    col_idx + 1
                ))
            })?;
            values.push(value);
        }

        let cols = values.len() - before;
        match width {
            None => width = Some(cols),
            Some(expected) if expected != cols => {
                return Err(CliError::invalid_input(format!(
                    "CSV line {line} has {cols} columns, expected {expected}"
                )));
            }
            Some(_) => {}
        }
        n += 1;
    }

    let d = width.ok_or_else(|| CliError::invalid_input("CSV input has no data rows"))?;
    Ok((values, n, d))
}

fn is_header_row(row: &str) -> bool {
    row.split(',')
        .all(|cell| cell.trim().parse::<f64>().is_err())
}

/// Extracts `columns[*].values` from a `tvd filter` JSON report.
fn parse_filter_report(raw: &str) -> Result<(Vec<Vec<f64>>, usize), CliError> {
    let report: Value = serde_json::from_str(raw)
        .map_err(|source| CliError::json("invalid filter report JSON", source))?;
    let entries = report
        .get("columns")
        .and_then(Value::as_array)
        .ok_or_else(|| CliError::invalid_input("filter report must contain a 'columns' array"))?;

    let mut columns = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.iter().enumerate() {
        let values = entry
            .get("values")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                CliError::invalid_input(format!("report column {} has no 'values' array", idx + 1))
            })?;
        let column = values
            .iter()
            .map(|value| {
                value.as_f64().ok_or_else(|| {
                    CliError::invalid_input(format!(
                        "report column {} holds a non-numeric value: {value}",
                        idx + 1
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        columns.push(column);
    }

    let n = columns.first().map_or(0, Vec::len);
    if columns.iter().any(|column| column.len() != n) {
        return Err(CliError::invalid_input(
            "filter report columns have different lengths",
        ));
    }
    Ok((columns, n))
}

fn write_json_output<T: Serialize>(
    payload: &T,
    output_path: Option<&Path>,
) -> Result<(), CliError> {
    let mut encoded = serde_json::to_string_pretty(payload)
        .map_err(|source| CliError::json("failed to serialize JSON output", source))?;
    encoded.push('\n');

    match output_path {
        Some(path) => {
            let context = format!("failed to write '{}'", path.display());
            fs::write(path, encoded).map_err(|source| CliError::io(context, source))
        }
        None => {
            print!("{encoded}");
            Ok(())
        }
    }
}

fn error_envelope(err: &CliError) -> Value {
    json!({
        "error": {
            "code": err.code(),
            "message": err.to_string(),
        }
    })
}

fn emit_structured_error(err: &CliError) {
    let envelope = error_envelope(err);
    let rendered = serde_json::to_string_pretty(&envelope).unwrap_or_else(|_| envelope.to_string());
    eprintln!("{rendered}");
}
