//! CLI argument parsing using clap

use crate::config::OutputFormat;
use crate::engine::StrategyKind;
use clap::Parser;
use std::path::PathBuf;

/// gridcheck - concurrent validator for completed 9x9 puzzles
#[derive(Parser, Debug)]
#[command(name = "gridcheck")]
#[command(version, about, long_about = None)]
#[command(allow_negative_numbers = true)]
pub struct Cli {
    /// File with one or more puzzles: 9 lines of 9 digits, blank line between puzzles
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Number of processes to split the puzzles across
    #[arg(value_name = "PROCESSES")]
    pub processes: i64,

    /// Number of worker threads per process
    #[arg(value_name = "THREADS")]
    pub threads: i64,

    /// Execution strategy (default: pipeline)
    #[arg(value_name = "STRATEGY", value_enum)]
    pub strategy: Option<StrategyKind>,

    /// TOML file with tuning defaults (strategy, batch_size, format)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Checks per pool job in the pipeline strategy
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Enable debug logging on stderr
    #[arg(long, env = "GRIDCHECK_DEBUG")]
    pub debug: bool,

    /// 1-based process number (set by the parent for child processes)
    #[arg(long, hide = true)]
    pub process_index: Option<usize>,

    /// First puzzle of this child's slice, 0-based
    #[arg(long, hide = true)]
    pub slice_start: Option<usize>,

    /// End of this child's slice, exclusive
    #[arg(long, hide = true)]
    pub slice_end: Option<usize>,
}

impl Cli {
    /// Parse CLI arguments
    ///
    /// Returns clap's error instead of exiting, so the caller controls the
    /// exit code.
    pub fn try_parse_args() -> Result<Self, clap::Error> {
        Self::try_parse()
    }
}
