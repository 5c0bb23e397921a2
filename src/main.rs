//! gridcheck CLI entry point

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use gridcheck::config::{cli::Cli, validator, Config};
use gridcheck::coordinator;
use gridcheck::grid::parser::load_puzzles;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

fn main() -> Result<()> {
    let cli = match Cli::try_parse_args() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version go to stdout and succeed; every usage error exits 1.
            let _ = e.print();
            match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => std::process::exit(0),
                _ => std::process::exit(1),
            }
        }
    };

    init_tracing(cli.debug);

    let mut config = Config::from_cli(&cli).context("Invalid arguments")?;
    let puzzles = load_puzzles(&config.input)?;
    validator::validate_input(&config, puzzles.len())?;
    config.clamp_to(puzzles.len());

    tracing::debug!(
        puzzles = puzzles.len(),
        processes = config.processes,
        threads = config.threads,
        strategy = %config.strategy,
        child = config.child.is_some(),
        "Starting validation"
    );

    coordinator::run(&config, &puzzles)
}

/// Log to stderr so stdout carries reports only
///
/// Filter: `--debug` > `RUST_LOG` > default `warn`.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(filter);

    tracing_subscriber::registry().with(layer).init();
}
