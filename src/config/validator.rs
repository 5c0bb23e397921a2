//! Configuration validation

use super::*;
use crate::config::cli::Cli;
use anyhow::Result;

/// Validate raw command-line values before they are converted
pub fn validate_cli(cli: &Cli) -> Result<()> {
    validate_counts(cli.processes, cli.threads)?;

    if !cli.input.exists() {
        anyhow::bail!("Input file does not exist: {}", cli.input.display());
    }

    Ok(())
}

/// Process and thread counts must both be at least 1
pub fn validate_counts(processes: i64, threads: i64) -> Result<()> {
    if processes < 1 || threads < 1 {
        anyhow::bail!(
            "process and thread counts must be at least 1 (got {} processes, {} threads)",
            processes,
            threads
        );
    }
    Ok(())
}

/// Validate a complete configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.batch_size == 0 {
        anyhow::bail!("batch_size must be at least 1");
    }

    if let Some(child) = &config.child {
        validate_child(child)?;
    }

    Ok(())
}

/// Validate a child process assignment
pub fn validate_child(child: &ChildAssignment) -> Result<()> {
    if child.process == 0 {
        anyhow::bail!("process index is 1-based, got 0");
    }
    if child.slice.start > child.slice.end {
        anyhow::bail!(
            "slice start ({}) is past slice end ({})",
            child.slice.start,
            child.slice.end
        );
    }
    Ok(())
}

/// Validate the loaded input against the configuration
pub fn validate_input(config: &Config, puzzles: usize) -> Result<()> {
    if puzzles == 0 {
        anyhow::bail!("Input file contains no puzzles: {}", config.input.display());
    }

    if let Some(child) = &config.child {
        if child.slice.end > puzzles {
            anyhow::bail!(
                "slice {}..{} exceeds the {} puzzle(s) in {}",
                child.slice.start,
                child.slice.end,
                puzzles,
                config.input.display()
            );
        }
    }

    Ok(())
}
