//! Configuration module
//!
//! Handles CLI argument parsing, the optional TOML tuning file, and
//! validation. Precedence, highest first: command line, TOML file, defaults.

pub mod cli;
pub mod toml;
pub mod validator;

use crate::checker::CHECKS_PER_PUZZLE;
use crate::engine::StrategyKind;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::path::PathBuf;

/// Console output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Progress and summary lines for humans
    Text,
    /// One JSON object per puzzle summary
    Json,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Text
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Settings that may come from the TOML tuning file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TuningConfig {
    /// Strategy used when none is named on the command line
    #[serde(default)]
    pub strategy: StrategyKind,
    /// Checks per pool job in the pipeline strategy
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Output format
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_batch_size() -> usize {
    10
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            batch_size: default_batch_size(),
            format: OutputFormat::default(),
        }
    }
}

/// The part of the input a child process is responsible for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildAssignment {
    /// 1-based process number
    pub process: usize,
    /// Puzzle positions, 0-based, end exclusive
    pub slice: Range<usize>,
}

/// Complete run configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Input file with one or more puzzles
    pub input: PathBuf,
    /// Number of OS processes to fan out to
    pub processes: usize,
    /// Worker threads per process
    pub threads: usize,
    pub strategy: StrategyKind,
    pub batch_size: usize,
    pub format: OutputFormat,
    /// Raise log verbosity to debug
    pub debug: bool,
    /// Set when running as a child of a fan-out
    pub child: Option<ChildAssignment>,
}

impl Config {
    /// Build the run configuration from parsed command-line arguments
    ///
    /// Loads the TOML tuning file if one was given; explicit flags override it.
    pub fn from_cli(cli: &cli::Cli) -> Result<Self> {
        validator::validate_cli(cli)?;

        let tuning = match &cli.config {
            Some(path) => toml::parse_toml_file(path)?,
            None => TuningConfig::default(),
        };
        let tuning = toml::merge_cli_with_tuning(cli, tuning);

        let child = match (cli.process_index, cli.slice_start, cli.slice_end) {
            (Some(process), Some(start), Some(end)) => Some(ChildAssignment {
                process,
                slice: start..end,
            }),
            (None, None, None) => None,
            _ => anyhow::bail!("--process-index, --slice-start and --slice-end must be given together"),
        };

        let config = Self {
            input: cli.input.clone(),
            processes: cli.processes as usize,
            threads: cli.threads as usize,
            strategy: tuning.strategy,
            batch_size: tuning.batch_size,
            format: tuning.format,
            debug: cli.debug,
            child,
        };
        validator::validate_config(&config)?;
        Ok(config)
    }

    /// Clamp counts to what the input can use
    ///
    /// There is no point in more processes than puzzles, nor in more threads
    /// than the 27 checks of a puzzle.
    pub fn clamp_to(&mut self, puzzles: usize) {
        if self.processes > puzzles {
            tracing::debug!(requested = self.processes, puzzles, "Clamping process count");
            self.processes = puzzles;
        }
        if self.threads > CHECKS_PER_PUZZLE {
            tracing::debug!(requested = self.threads, "Clamping thread count to {}", CHECKS_PER_PUZZLE);
            self.threads = CHECKS_PER_PUZZLE;
        }
    }
}

#[cfg(test)]
pub(crate) fn test_config(processes: usize, threads: usize) -> Config {
    Config {
        input: PathBuf::from("puzzles.txt"),
        processes,
        threads,
        strategy: StrategyKind::default(),
        batch_size: default_batch_size(),
        format: OutputFormat::Text,
        debug: false,
        child: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuning_defaults() {
        let tuning = TuningConfig::default();
        assert_eq!(tuning.strategy, StrategyKind::Pipeline);
        assert_eq!(tuning.batch_size, 10);
        assert_eq!(tuning.format, OutputFormat::Text);
    }

    #[test]
    fn test_clamp_processes_to_puzzles() {
        let mut config = test_config(8, 4);
        config.clamp_to(3);
        assert_eq!(config.processes, 3);
        assert_eq!(config.threads, 4);
    }

    #[test]
    fn test_clamp_threads_to_checks() {
        let mut config = test_config(1, 100);
        config.clamp_to(10);
        assert_eq!(config.processes, 1);
        assert_eq!(config.threads, 27);
    }

    #[test]
    fn test_clamp_keeps_small_counts() {
        let mut config = test_config(2, 27);
        config.clamp_to(2);
        assert_eq!((config.processes, config.threads), (2, 27));
    }
}
