//! Pool-per-puzzle strategies
//!
//! Each puzzle's 27 checks are submitted to a rayon pool as single-check
//! jobs and all 27 results are collected before the next puzzle starts.
//! The `shared` variant builds the pool once; the `per_puzzle` variant
//! builds and tears down a pool for every puzzle.

use super::{build_pool, emit_ready, ExecutionStrategy, PuzzleShare, ReportSink, StrategyKind};
use crate::checker::{puzzle_tasks, CheckResult, CHECKS_PER_PUZZLE};
use crate::grid::Grid;
use crate::Result;
use crossbeam::channel::bounded;
use std::sync::Arc;

#[derive(Debug)]
enum PoolMode {
    Shared(rayon::ThreadPool),
    PerPuzzle,
}

/// Checks one puzzle at a time on a thread pool
#[derive(Debug)]
pub struct PooledStrategy {
    mode: PoolMode,
    threads: usize,
}

impl PooledStrategy {
    /// One pool reused for every puzzle
    pub fn shared(threads: usize) -> Result<Self> {
        let threads = threads.max(1);
        Ok(Self {
            mode: PoolMode::Shared(build_pool(threads)?),
            threads,
        })
    }

    /// A fresh pool for every puzzle
    pub fn per_puzzle(threads: usize) -> Self {
        Self {
            mode: PoolMode::PerPuzzle,
            threads: threads.max(1),
        }
    }

    fn check_puzzle(&self, pool: &rayon::ThreadPool, puzzle: usize, grid: &Arc<Grid>) -> Result<Vec<CheckResult>> {
        let (done_tx, done_rx) = bounded(CHECKS_PER_PUZZLE);

        for (i, task) in puzzle_tasks(puzzle, grid).enumerate() {
            let worker = i % self.threads;
            let done_tx = done_tx.clone();
            pool.spawn(move || {
                let _ = done_tx.send(task.run(worker));
            });
        }
        drop(done_tx);

        let results: Vec<CheckResult> = done_rx.iter().collect();
        if results.len() != CHECKS_PER_PUZZLE {
            anyhow::bail!(
                "puzzle {} finished with {} of {} checks",
                puzzle + 1,
                results.len(),
                CHECKS_PER_PUZZLE
            );
        }
        Ok(results)
    }
}

impl ExecutionStrategy for PooledStrategy {
    fn kind(&self) -> StrategyKind {
        match self.mode {
            PoolMode::Shared(_) => StrategyKind::Pooled,
            PoolMode::PerPuzzle => StrategyKind::FreshPool,
        }
    }

    fn run(&mut self, share: &PuzzleShare, sink: &dyn ReportSink) -> Result<()> {
        let mut aggregator = share.aggregator();

        for (puzzle, grid) in share.iter() {
            sink.progress(puzzle)?;

            let results = match &self.mode {
                PoolMode::Shared(pool) => self.check_puzzle(pool, puzzle, grid)?,
                PoolMode::PerPuzzle => {
                    let pool = build_pool(self.threads)?;
                    self.check_puzzle(&pool, puzzle, grid)?
                }
            };

            aggregator.accept_batch(&results)?;
            emit_ready(&mut aggregator, sink)?;
        }

        Ok(())
    }
}
