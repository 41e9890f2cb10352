// crates/sm_cli/src/main.rs
//
// `statmerge` entry point: CLI parsing, logging init, subcommand dispatch,
// and the typed error → exit-code mapping.

mod args;

mod exitcodes {
    pub const OK: i32 = 0;
    pub const USAGE: i32 = 2;
    pub const CONFLICT: i32 = 3;
    pub const IO: i32 = 4;
    pub const SCHEMA: i32 = 5;
    pub const RENDER: i32 = 6;
}

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use serde_json::{json, Value};

use args::{parse_and_validate as parse_cli, AggregateArgs, Args, Command, FilterArgs, RenderManyArgs, RenderOneArgs};
use sm_core::{CoreError, DenominatorRule, ExplicitTable, LastSegment};
use sm_io::{
    discover_reports, load_reports, read_json, read_object, render_document, sha256_hex,
    write_atomic, write_document, IoError, ReportKind, WriteOptions,
};
use sm_pipeline::{
    aggregate_performance, aggregate_statistics, failing_projects, filter_failing_programs,
    PipelineError, StatisticsOptions,
};
use sm_report::{render_failing_table, render_outcome_table, render_performance_table, Column, ReportError};

const PERFORMANCE_OUTPUT: &str = "aggregated_performance.json";

/// Central error type for CLI → exit-code mapping.
#[derive(Debug)]
enum MainError {
    /// Two inputs disagree on a non-numeric field.
    Conflict(String),
    /// Read/write/path failures and unparseable JSON.
    Io(String),
    /// Well-formed JSON with the wrong shape.
    Schema(String),
    /// Table rendering.
    Render(String),
}

impl std::fmt::Display for MainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MainError::Conflict(m) | MainError::Io(m) | MainError::Schema(m) | MainError::Render(m) => {
                f.write_str(m)
            }
        }
    }
}

impl From<IoError> for MainError {
    fn from(e: IoError) -> Self {
        match e {
            IoError::Schema { .. } => MainError::Schema(e.to_string()),
            IoError::Path { .. } | IoError::Json { .. } | IoError::Invalid(_) => MainError::Io(e.to_string()),
        }
    }
}

impl From<PipelineError> for MainError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Conflict { .. } => MainError::Conflict(e.to_string()),
            PipelineError::Schema { .. } => MainError::Schema(e.to_string()),
        }
    }
}

impl From<ReportError> for MainError {
    fn from(e: ReportError) -> Self {
        MainError::Render(e.to_string())
    }
}

fn map_core_err(path: &Path, e: CoreError) -> MainError {
    MainError::Schema(format!("{}: {e}", path.display()))
}

fn map_error(e: &MainError) -> i32 {
    match e {
        MainError::Conflict(_) => exitcodes::CONFLICT,
        MainError::Io(_) => exitcodes::IO,
        MainError::Schema(_) => exitcodes::SCHEMA,
        MainError::Render(_) => exitcodes::RENDER,
    }
}

fn main() -> ExitCode {
    let args = match parse_cli() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("statmerge: error: {e}");
            return ExitCode::from(exitcodes::USAGE as u8);
        }
    };
    init_logging(&args);

    let res = match &args.command {
        Command::Aggregate(a) => run_aggregate(a),
        Command::FilterFailing(f) => run_filter(f),
        Command::RenderPerformance(r) => {
            run_render_many(r, "performance_table.tex", render_performance_table)
        }
        Command::RenderFailing(r) => run_render_many(r, "failing_table.tex", render_failing_table),
        Command::RenderOutcome(r) => run_render_outcome(r),
    };

    let rc = match res {
        Ok(()) => exitcodes::OK,
        Err(e) => {
            eprintln!("statmerge: error: {e}");
            map_error(&e)
        }
    };
    ExitCode::from(rc as u8)
}

fn init_logging(args: &Args) {
    let level = if args.verbose {
        "debug"
    } else if args.quiet {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

// ----------------------------------------------------------------------------
// aggregate
// ----------------------------------------------------------------------------

fn run_aggregate(a: &AggregateArgs) -> Result<(), MainError> {
    let opts = WriteOptions { indent: a.indent, sort_keys: a.sort_keys };
    let jobs = a.jobs.map(usize::from);

    let table = match &a.denominators {
        Some(path) => {
            let t = ExplicitTable::from_json(&read_json(path)?).map_err(|e| map_core_err(path, e))?;
            log::info!("loaded {} explicit denominator(s) from {}", t.len(), path.display());
            Some(t)
        }
        None => None,
    };
    let rule: &dyn DenominatorRule = match &table {
        Some(t) => t,
        None => &LastSegment,
    };

    // Performance first: a statistics conflict must not suppress it.
    let perf_paths = discover_reports(&a.search_root, ReportKind::Performance, &a.dir_prefix)?;
    log::info!("found {} performance file(s) under {}", perf_paths.len(), a.search_root.display());
    let perf_records = load_reports(&perf_paths, jobs)?;
    let perf = aggregate_performance(&perf_records)?;
    let perf_out = performance_output_path(&a.output);
    let bytes = write_document(&perf_out, &perf.to_value(), &opts)?;
    log::info!("wrote {} (sha256 {})", perf_out.display(), sha256_hex(&bytes));

    let stat_paths = discover_reports(&a.search_root, ReportKind::Statistics, &a.dir_prefix)?;
    if stat_paths.is_empty() {
        log::warn!(
            "no statistics.json found under {} in {}* directories",
            a.search_root.display(),
            a.dir_prefix
        );
        return echo(&render_document(&json!({ "count": 0 }), &opts)?);
    }
    log::info!("found {} statistics file(s) under {}", stat_paths.len(), a.search_root.display());

    let records = load_reports(&stat_paths, jobs)?;
    let outcome = aggregate_statistics(
        &records,
        &StatisticsOptions { denominators: rule, failing: Default::default() },
    )?;
    let bytes = write_document(&a.output, &outcome.into_value(), &opts)?;
    log::info!("wrote {} (sha256 {})", a.output.display(), sha256_hex(&bytes));
    echo(&bytes)
}

fn performance_output_path(stats_output: &Path) -> PathBuf {
    stats_output.with_file_name(PERFORMANCE_OUTPUT)
}

fn echo(bytes: &[u8]) -> Result<(), MainError> {
    let mut out = std::io::stdout().lock();
    out.write_all(bytes)
        .and_then(|()| out.flush())
        .map_err(|e| MainError::Io(format!("stdout: {e}")))
}

// ----------------------------------------------------------------------------
// filter-failing
// ----------------------------------------------------------------------------

fn run_filter(f: &FilterArgs) -> Result<(), MainError> {
    let summary = read_json(&f.summary)?;
    let source = f.summary.display().to_string();
    let failing = failing_projects(&summary, &source)?;
    log::debug!("{} project(s) did not pass", failing.len());

    let metadata = read_object(&f.metadata)?;
    let (filtered, removed) = filter_failing_programs(metadata, &failing, &f.metadata.display().to_string())?;
    let bytes = write_document(&f.output, &Value::Object(filtered), &WriteOptions::default())?;
    log::info!("wrote {} (sha256 {})", f.output.display(), sha256_hex(&bytes));
    println!("Removed {removed} failing program(s).");
    Ok(())
}

// ----------------------------------------------------------------------------
// render-*
// ----------------------------------------------------------------------------

fn run_render_many<F>(r: &RenderManyArgs, default_out: &str, render: F) -> Result<(), MainError>
where
    F: FnOnce(&[Column]) -> Result<String, ReportError>,
{
    let docs = r.inputs.iter().map(|p| read_json(p)).collect::<Result<Vec<_>, _>>()?;
    let mut columns = Column::placeholders(docs);
    for (column, title) in columns.iter_mut().zip(&r.titles) {
        column.title.clone_from(title);
    }
    let tex = render(&columns)?;
    write_tex(r.output.as_deref(), default_out, &tex)
}

fn run_render_outcome(r: &RenderOneArgs) -> Result<(), MainError> {
    let column = Column::new(r.title.clone(), read_json(&r.input)?);
    let tex = render_outcome_table(&column)?;
    write_tex(r.output.as_deref(), "outcome_table.tex", &tex)
}

fn write_tex(output: Option<&Path>, default_out: &str, tex: &str) -> Result<(), MainError> {
    let path = output.unwrap_or_else(|| Path::new(default_out));
    write_atomic(path, tex.as_bytes())?;
    log::info!("wrote {}", path.display());
    Ok(())
}
