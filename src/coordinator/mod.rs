//! Coordinator module
//!
//! Splits the puzzle list into contiguous shares, one per process, and runs
//! them. With a single process the share runs in this process. Otherwise
//! every share runs in a child process: the binary re-launches itself with
//! the hidden `--process-index`, `--slice-start` and `--slice-end` arguments,
//! re-reads the input and validates only its slice. Children write straight
//! to the inherited stdout; there is no coordination between them.

use crate::config::Config;
use crate::engine::{create_strategy, PuzzleShare};
use crate::grid::Grid;
use crate::output::ReportPrinter;
use crate::Result;
use anyhow::Context;
use std::ops::Range;
use std::process::{Child, Command};
use std::sync::Arc;

/// Split `total` puzzles into `n` contiguous slices
///
/// The first `total % n` slices get one puzzle more than the rest. Slices
/// are empty only when `n > total`.
pub fn partition(total: usize, n: usize) -> Vec<Range<usize>> {
    let n = n.max(1);
    let base = total / n;
    let extra = total % n;

    let mut start = 0;
    (0..n)
        .map(|i| {
            let len = base + usize::from(i < extra);
            let slice = start..start + len;
            start += len;
            slice
        })
        .collect()
}

/// Validate one slice of `puzzles` as process `process` (1-based)
pub fn run_share(config: &Config, puzzles: &[Grid], process: usize, slice: Range<usize>) -> Result<()> {
    let grids = puzzles
        .get(slice.clone())
        .with_context(|| format!("slice {:?} is outside the {} loaded puzzles", slice, puzzles.len()))?
        .iter()
        .copied()
        .map(Arc::new)
        .collect();
    let share = PuzzleShare::new(slice.start, grids);

    tracing::debug!(
        process,
        first = slice.start,
        count = share.len(),
        strategy = %config.strategy,
        threads = config.threads,
        "Validating share"
    );

    let printer = ReportPrinter::stdout(process, config.format);
    let mut strategy = create_strategy(config.strategy, config.threads, config.batch_size)?;
    strategy
        .run(&share, &printer)
        .with_context(|| format!("Process {} failed", process))
}

/// Validate every puzzle, fanning out to child processes when asked to
pub fn run(config: &Config, puzzles: &[Grid]) -> Result<()> {
    if let Some(child) = &config.child {
        return run_share(config, puzzles, child.process, child.slice.clone());
    }

    let slices = partition(puzzles.len(), config.processes);
    if slices.len() == 1 {
        return run_share(config, puzzles, 1, 0..puzzles.len());
    }

    let children = launch_all(&slices, |process, slice| launch_child(config, process, slice))?;
    wait_all(children)
}

/// Launch one child per slice, numbered from 1
///
/// If a launch fails, the children already running are waited on and the
/// launch error is returned.
fn launch_all<F>(slices: &[Range<usize>], mut launch: F) -> Result<Vec<(usize, Child)>>
where
    F: FnMut(usize, &Range<usize>) -> Result<Child>,
{
    let mut children = Vec::with_capacity(slices.len());
    for (i, slice) in slices.iter().enumerate() {
        let process = i + 1;
        match launch(process, slice) {
            Ok(child) => children.push((process, child)),
            Err(e) => {
                if let Err(wait_err) = wait_all(children) {
                    tracing::warn!(error = %wait_err, "Earlier child processes did not finish cleanly");
                }
                return Err(e);
            }
        }
    }
    Ok(children)
}

/// Re-launch this executable to validate `slice`
fn launch_child(config: &Config, process: usize, slice: &Range<usize>) -> Result<Child> {
    let exe_path = std::env::current_exe().context("Failed to get current executable path")?;

    let mut cmd = Command::new(&exe_path);
    cmd.arg(&config.input)
        .arg(config.processes.to_string())
        .arg(config.threads.to_string())
        .arg(config.strategy.to_string())
        .arg("--batch-size")
        .arg(config.batch_size.to_string())
        .arg("--format")
        .arg(config.format.to_string())
        .arg("--process-index")
        .arg(process.to_string())
        .arg("--slice-start")
        .arg(slice.start.to_string())
        .arg("--slice-end")
        .arg(slice.end.to_string());

    if config.debug {
        cmd.arg("--debug");
    }

    let child = cmd
        .spawn()
        .with_context(|| format!("Failed to spawn process {}", process))?;

    tracing::debug!(process, pid = child.id(), slice = ?slice, "Launched child process");
    Ok(child)
}

/// Wait for every child, failing if any of them failed
fn wait_all(children: Vec<(usize, Child)>) -> Result<()> {
    let mut failed = Vec::new();

    for (process, mut child) in children {
        let status = child
            .wait()
            .with_context(|| format!("Failed to wait for process {}", process))?;
        if status.success() {
            tracing::debug!(process, "Child process finished");
        } else {
            tracing::warn!(process, %status, "Child process failed");
            failed.push(process);
        }
    }

    if !failed.is_empty() {
        anyhow::bail!("{} of the child processes failed: {:?}", failed.len(), failed);
    }
    Ok(())
}
