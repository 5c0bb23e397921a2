//! Execution strategies
//!
//! This module defines how the checks of a process's puzzles are executed.
//! Every strategy runs the same checks from [`crate::checker`] and feeds the
//! same [`OrderedAggregator`](crate::stats::aggregator::OrderedAggregator),
//! so strategies differ only in dispatch mechanics, never in the reports
//! they produce.
//!
//! # Strategies
//!
//! - **pipeline** (default): checks from all puzzles are grouped into
//!   fixed-size batches and submitted to a reusable thread pool; batches
//!   complete in any order and an aggregator thread restores puzzle order
//! - **handshake**: persistent workers receive one check at a time through a
//!   two-signal handshake, in synchronous rounds
//! - **pooled**: one reusable pool; each puzzle's 27 checks are submitted
//!   and awaited before moving on
//! - **fresh-pool**: like `pooled`, but a new pool is built for every puzzle
//! - **sequential**: all checks run inline on the calling thread
//!
//! # Worker identity
//!
//! Every check result carries the id of the worker it is attributed to.
//! Ids are always assigned explicitly by the dispatching code and are in
//! `0..threads`.
//!
//! # Example
//!
//! ```
//! use gridcheck::engine::{create_strategy, PuzzleShare, StrategyKind};
//! use gridcheck::grid::Grid;
//! use gridcheck::output::ReportPrinter;
//! use gridcheck::config::OutputFormat;
//! use std::sync::Arc;
//!
//! let grid = Grid::parse_rows(&[
//!     "534678912", "672195348", "198342567",
//!     "859761423", "426853791", "713924856",
//!     "961537284", "287419635", "345286179",
//! ])?;
//! let share = PuzzleShare::new(0, vec![Arc::new(grid)]);
//! let printer = ReportPrinter::new(1, OutputFormat::Text, Box::new(std::io::sink()));
//!
//! let mut strategy = create_strategy(StrategyKind::Handshake, 4, 10)?;
//! strategy.run(&share, &printer)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::grid::Grid;
use crate::output::ReportPrinter;
use crate::stats::aggregator::OrderedAggregator;
use crate::stats::PuzzleReport;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Available execution strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Batched pool jobs with an ordering aggregator thread
    Pipeline,
    /// Persistent workers driven by a task-ready/task-done handshake
    Handshake,
    /// One reusable pool, puzzles processed one after another
    Pooled,
    /// A new pool for every puzzle
    FreshPool,
    /// Everything on the calling thread
    Sequential,
}

impl Default for StrategyKind {
    fn default() -> Self {
        Self::Pipeline
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Pipeline => write!(f, "pipeline"),
            StrategyKind::Handshake => write!(f, "handshake"),
            StrategyKind::Pooled => write!(f, "pooled"),
            StrategyKind::FreshPool => write!(f, "fresh-pool"),
            StrategyKind::Sequential => write!(f, "sequential"),
        }
    }
}

/// The contiguous run of puzzles one process validates
#[derive(Debug, Clone)]
pub struct PuzzleShare {
    /// Position of the first puzzle in the input file
    pub first: usize,
    pub grids: Vec<Arc<Grid>>,
}

impl PuzzleShare {
    pub fn new(first: usize, grids: Vec<Arc<Grid>>) -> Self {
        Self { first, grids }
    }

    pub fn len(&self) -> usize {
        self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }

    /// `(puzzle position, grid)` pairs in input order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Arc<Grid>)> {
        self.grids
            .iter()
            .enumerate()
            .map(move |(offset, grid)| (self.first + offset, grid))
    }

    /// Fresh aggregator covering exactly this share
    pub fn aggregator(&self) -> OrderedAggregator {
        OrderedAggregator::new(self.first, self.len())
    }
}

/// Destination of progress notices and finished reports
///
/// Implementations must accept calls from several threads: the pipeline
/// strategy reports progress from its producer and reports from its
/// aggregator thread.
pub trait ReportSink: Sync {
    /// Work on `puzzle` has started
    fn progress(&self, puzzle: usize) -> Result<()>;

    /// `report` is final; called in ascending puzzle order
    fn report(&self, report: PuzzleReport) -> Result<()>;
}

impl ReportSink for ReportPrinter {
    fn progress(&self, puzzle: usize) -> Result<()> {
        ReportPrinter::progress(self, puzzle)
    }

    fn report(&self, report: PuzzleReport) -> Result<()> {
        self.summary(&report)
    }
}

/// One way of executing a share's checks
///
/// A strategy may be run more than once; persistent resources (pools,
/// workers) are reused across runs until the strategy is dropped.
pub trait ExecutionStrategy: Send {
    fn kind(&self) -> StrategyKind;

    /// Validate every puzzle in `share`, reporting to `sink` in puzzle order
    fn run(&mut self, share: &PuzzleShare, sink: &dyn ReportSink) -> Result<()>;
}

/// Build the strategy for `kind`
///
/// `threads` is the worker count (at least 1); `batch_size` only affects the
/// pipeline strategy.
pub fn create_strategy(
    kind: StrategyKind,
    threads: usize,
    batch_size: usize,
) -> Result<Box<dyn ExecutionStrategy>> {
    let threads = threads.max(1);
    let strategy: Box<dyn ExecutionStrategy> = match kind {
        StrategyKind::Pipeline => Box::new(pipeline::PipelineStrategy::new(threads, batch_size)?),
        StrategyKind::Handshake => Box::new(handshake::HandshakeDispatcher::new(threads)?),
        StrategyKind::Pooled => Box::new(pooled::PooledStrategy::shared(threads)?),
        StrategyKind::FreshPool => Box::new(pooled::PooledStrategy::per_puzzle(threads)),
        StrategyKind::Sequential => Box::new(sequential::SequentialStrategy),
    };
    tracing::debug!(strategy = %kind, threads, batch_size, "Created execution strategy");
    Ok(strategy)
}

/// Hand every report the aggregator can release to `sink`
pub(crate) fn emit_ready(aggregator: &mut OrderedAggregator, sink: &dyn ReportSink) -> Result<()> {
    for report in aggregator.drain_ready() {
        sink.report(report)?;
    }
    Ok(())
}

/// Thread pool with named threads, shared by the pool-based strategies
pub(crate) fn build_pool(threads: usize) -> Result<rayon::ThreadPool> {
    use anyhow::Context;

    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("check-pool-{i}"))
        .build()
        .context("Failed to build check thread pool")
}

pub mod handshake;
pub mod pipeline;
pub mod pooled;
pub mod sequential;

/// Sink that keeps everything it receives, for tests
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct CollectSink {
    pub progress: std::sync::Mutex<Vec<usize>>,
    pub reports: std::sync::Mutex<Vec<PuzzleReport>>,
}

#[cfg(test)]
impl CollectSink {
    pub fn reports(&self) -> Vec<PuzzleReport> {
        self.reports.lock().unwrap().clone()
    }

    pub fn puzzles(&self) -> Vec<usize> {
        self.reports().iter().map(PuzzleReport::puzzle).collect()
    }
}

#[cfg(test)]
impl ReportSink for CollectSink {
    fn progress(&self, puzzle: usize) -> Result<()> {
        self.progress.lock().unwrap().push(puzzle);
        Ok(())
    }

    fn report(&self, report: PuzzleReport) -> Result<()> {
        self.reports.lock().unwrap().push(report);
        Ok(())
    }
}

/// Mixed share: valid grids, row-duplicate grids and swapped grids
#[cfg(test)]
pub(crate) fn mixed_share(first: usize, count: usize) -> PuzzleShare {
    use crate::grid::fixtures;

    let grids = (0..count)
        .map(|i| {
            Arc::new(match i % 3 {
                0 => fixtures::solved(),
                1 => fixtures::row0_duplicate(),
                _ => fixtures::row_swap(),
            })
        })
        .collect();
    PuzzleShare::new(first, grids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::{ErrorToken, CHECKS_PER_PUZZLE};
    use std::collections::BTreeSet;

    const ALL: [StrategyKind; 5] = [
        StrategyKind::Pipeline,
        StrategyKind::Handshake,
        StrategyKind::Pooled,
        StrategyKind::FreshPool,
        StrategyKind::Sequential,
    ];

    fn token_sets(reports: &[PuzzleReport]) -> Vec<(usize, BTreeSet<ErrorToken>)> {
        reports.iter().map(|r| (r.puzzle(), r.tokens())).collect()
    }

    #[test]
    fn test_strategies_agree() {
        let share = mixed_share(5, 11);

        for threads in [1, 2, 4, 7, 27] {
            let mut baseline = None;
            for kind in ALL {
                let mut strategy = create_strategy(kind, threads, 10).unwrap();
                assert_eq!(strategy.kind(), kind);

                let sink = CollectSink::default();
                strategy.run(&share, &sink).unwrap();

                let reports = sink.reports();
                assert_eq!(sink.puzzles(), (5..16).collect::<Vec<_>>(), "{kind} with {threads} threads");
                assert!(reports.iter().all(|r| r.completed() == CHECKS_PER_PUZZLE));
                for r in &reports {
                    let effective = if kind == StrategyKind::Sequential { 1 } else { threads };
                    assert!(r.per_worker().keys().all(|&w| w < effective));
                }

                let sets = token_sets(&reports);
                match &baseline {
                    None => baseline = Some(sets),
                    Some(expected) => assert_eq!(&sets, expected, "{kind} with {threads} threads"),
                }
            }
        }
    }

    #[test]
    fn test_progress_reported_for_every_puzzle() {
        let share = mixed_share(0, 4);
        for kind in ALL {
            let sink = CollectSink::default();
            create_strategy(kind, 3, 10).unwrap().run(&share, &sink).unwrap();
            assert_eq!(*sink.progress.lock().unwrap(), vec![0, 1, 2, 3], "{kind}");
        }
    }

    #[test]
    fn test_strategy_reusable_across_runs() {
        let mut strategy = create_strategy(StrategyKind::Handshake, 3, 10).unwrap();
        for first in [0, 10] {
            let sink = CollectSink::default();
            strategy.run(&mixed_share(first, 3), &sink).unwrap();
            assert_eq!(sink.puzzles(), vec![first, first + 1, first + 2]);
        }
    }

    #[test]
    fn test_empty_share() {
        let share = PuzzleShare::new(3, Vec::new());
        for kind in ALL {
            let sink = CollectSink::default();
            create_strategy(kind, 2, 10).unwrap().run(&share, &sink).unwrap();
            assert!(sink.reports().is_empty());
        }
    }

    #[test]
    fn test_strategy_kind_display_matches_cli_names() {
        use clap::ValueEnum;
        for kind in ALL {
            let name = kind.to_possible_value().unwrap().get_name().to_string();
            assert_eq!(kind.to_string(), name);
        }
    }

    #[test]
    fn test_share_iter() {
        let share = mixed_share(7, 3);
        let positions: Vec<usize> = share.iter().map(|(p, _)| p).collect();
        assert_eq!(positions, vec![7, 8, 9]);
        assert_eq!(share.aggregator().cursor(), 7);
    }
}
