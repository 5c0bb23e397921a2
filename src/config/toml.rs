//! TOML tuning file parsing
//!
//! ```toml
//! strategy = "handshake"
//! batch_size = 16
//! format = "json"
//! ```

use super::*;
use crate::config::cli::Cli;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML tuning file
pub fn parse_toml_file(path: &Path) -> Result<TuningConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML tuning configuration from string
pub fn parse_toml_string(contents: &str) -> Result<TuningConfig> {
    let tuning: TuningConfig = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(tuning)
}

/// Merge CLI arguments with the tuning file (CLI takes precedence)
pub fn merge_cli_with_tuning(cli: &Cli, mut tuning: TuningConfig) -> TuningConfig {
    if let Some(strategy) = cli.strategy {
        tuning.strategy = strategy;
    }
    if let Some(batch_size) = cli.batch_size {
        tuning.batch_size = batch_size;
    }
    if let Some(format) = cli.format {
        tuning.format = format;
    }
    tuning
}
