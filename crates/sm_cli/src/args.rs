// crates/sm_cli/src/args.rs
//
// Command-line surface for `statmerge`. Parsing is clap derive; the checks
// clap cannot express (input paths that must already exist) live in
// `parse_and_validate` so they share the usage exit code.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::{Path, PathBuf};

use sm_io::DEFAULT_DIR_PREFIX;

/// Parsed CLI arguments.
#[derive(Debug, Parser, Clone)]
#[command(
    name = "statmerge",
    version,
    disable_help_subcommand = true,
    about = "Merge per-project statistics and performance reports; render LaTeX tables"
)]
pub struct Args {
    /// Debug-level logging (RUST_LOG still wins).
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only warnings and errors on stderr.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Merge every statistics.json / performance.json under the search root.
    Aggregate(AggregateArgs),
    /// Drop programs that did not pass the benchmark from a metadata document.
    FilterFailing(FilterArgs),
    /// Per-stage runtime table (one column per aggregated performance file).
    RenderPerformance(RenderManyArgs),
    /// Failing-reasons table (one column per aggregated statistics file).
    RenderFailing(RenderManyArgs),
    /// Macro outcome table for one aggregated statistics file.
    RenderOutcome(RenderOneArgs),
}

#[derive(Debug, ClapArgs, Clone)]
pub struct AggregateArgs {
    /// Directory searched recursively for report files.
    #[arg(long, default_value = "CBench")]
    pub search_root: PathBuf,

    /// Aggregated statistics output; aggregated_performance.json goes next to it.
    #[arg(long, default_value = "aggregated_statistics.json")]
    pub output: PathBuf,

    /// Indentation for JSON output.
    #[arg(long, default_value_t = 2)]
    pub indent: usize,

    /// Sort object keys alphabetically instead of first-seen order.
    #[arg(long)]
    pub sort_keys: bool,

    /// Reports count only inside directories whose name starts with this.
    #[arg(long, default_value = DEFAULT_DIR_PREFIX)]
    pub dir_prefix: String,

    /// JSON object mapping numerator keys to denominator keys.
    #[arg(long)]
    pub denominators: Option<PathBuf>,

    /// Reader threads (default: one per core).
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: Option<u16>,
}

#[derive(Debug, ClapArgs, Clone)]
pub struct FilterArgs {
    /// Benchmark summary: project name → {status, failed_stage, ...}.
    #[arg(long, default_value = "benchmark_summary.json")]
    pub summary: PathBuf,

    /// Metadata document with a `programs` array.
    #[arg(long, default_value = "metadata.json")]
    pub metadata: PathBuf,

    #[arg(long, default_value = "metadata-filtered.json")]
    pub output: PathBuf,
}

#[derive(Debug, ClapArgs, Clone)]
pub struct RenderManyArgs {
    /// Aggregated documents, one per column.
    #[arg(required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    /// Output .tex path (default depends on the table).
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Column heading, repeated per input; missing ones become "Placeholder N".
    #[arg(long = "title")]
    pub titles: Vec<String>,
}

#[derive(Debug, ClapArgs, Clone)]
pub struct RenderOneArgs {
    /// Aggregated statistics document.
    pub input: PathBuf,

    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Benchmark name used in the caption.
    #[arg(long, default_value = "PLACEHOLDER")]
    pub title: String,
}

/// Errors surfaced by argument validation.
/// Keep messages short/stable (handy for scripts/tests).
#[derive(Debug)]
pub enum CliError {
    NotFound(String),
    NotADirectory(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use CliError::*;
        match self {
            NotFound(p) => write!(f, "file not found: {p}"),
            NotADirectory(p) => write!(f, "search root {p} does not exist"),
        }
    }
}
impl std::error::Error for CliError {}

/// Entry point used by main.rs. clap itself exits on malformed flags.
pub fn parse_and_validate() -> Result<Args, CliError> {
    let args = Args::parse();
    validate(&args)?;
    Ok(args)
}

fn validate(args: &Args) -> Result<(), CliError> {
    match &args.command {
        Command::Aggregate(a) => {
            if !a.search_root.is_dir() {
                return Err(CliError::NotADirectory(a.search_root.display().to_string()));
            }
            if let Some(p) = &a.denominators {
                ensure_file(p)?;
            }
        }
        Command::FilterFailing(f) => {
            ensure_file(&f.summary)?;
            ensure_file(&f.metadata)?;
        }
        Command::RenderPerformance(r) | Command::RenderFailing(r) => {
            for p in &r.inputs {
                ensure_file(p)?;
            }
        }
        Command::RenderOutcome(r) => ensure_file(&r.input)?,
    }
    Ok(())
}

fn ensure_file(p: &Path) -> Result<(), CliError> {
    if p.is_file() {
        Ok(())
    } else {
        Err(CliError::NotFound(p.display().to_string()))
    }
}
