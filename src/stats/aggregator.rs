//! Ordered report aggregation
//!
//! Check results arrive in whatever order the execution strategy finishes
//! them. The [`OrderedAggregator`] is a reorder buffer: it keeps a
//! [`PuzzleReport`] per unfinished puzzle and releases reports strictly in
//! puzzle order.
//!
//! # Emission rule
//!
//! The aggregator tracks a cursor, the lowest puzzle not yet emitted. After
//! each batch it emits the cursor's report if (and only if) the cursor's
//! counter has reached 27, advances the cursor, and repeats. A puzzle that
//! finishes early waits in the buffer until every earlier puzzle has been
//! emitted.
//!
//! # Example
//!
//! ```
//! use gridcheck::checker::CheckResult;
//! use gridcheck::stats::aggregator::OrderedAggregator;
//!
//! let mut aggregator = OrderedAggregator::new(10, 2);
//!
//! // Puzzle 11 completes first...
//! let late: Vec<CheckResult> = (0..27)
//!     .map(|_| CheckResult { puzzle: 11, worker: 0, error: None })
//!     .collect();
//! aggregator.accept_batch(&late)?;
//! assert!(aggregator.drain_ready().is_empty());
//!
//! // ...but is only released after puzzle 10.
//! let early: Vec<CheckResult> = (0..27)
//!     .map(|_| CheckResult { puzzle: 10, worker: 1, error: None })
//!     .collect();
//! aggregator.accept_batch(&early)?;
//! let emitted: Vec<usize> = aggregator.drain_ready().iter().map(|r| r.puzzle()).collect();
//! assert_eq!(emitted, vec![10, 11]);
//! assert!(aggregator.is_finished());
//! # Ok::<(), gridcheck::stats::aggregator::AggregateError>(())
//! ```

use crate::checker::{CheckResult, CHECKS_PER_PUZZLE};
use crate::stats::PuzzleReport;
use crossbeam::channel::Receiver;
use std::collections::BTreeMap;
use std::ops::Range;
use thiserror::Error;

/// Results that break the aggregation invariants
///
/// These indicate a defect in an execution strategy, never a puzzle error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregateError {
    #[error("result for puzzle {puzzle} is outside this share ({start}..{end})")]
    OutOfShare {
        puzzle: usize,
        start: usize,
        end: usize,
    },

    #[error("result for puzzle {0} arrived after its report was emitted")]
    AlreadyEmitted(usize),

    #[error("puzzle {0} received more than 27 results")]
    TooManyResults(usize),

    #[error("result stream closed with {remaining} puzzle(s) unreported, next expected {next}")]
    Incomplete { next: usize, remaining: usize },
}

/// Reorder buffer that emits puzzle reports in input order
#[derive(Debug)]
pub struct OrderedAggregator {
    /// Puzzles this aggregator is responsible for
    share: Range<usize>,

    /// Next puzzle to emit
    cursor: usize,

    /// Unemitted reports, created on first result
    pending: BTreeMap<usize, PuzzleReport>,
}

impl OrderedAggregator {
    /// Create an aggregator for puzzles `first..first + count`
    pub fn new(first: usize, count: usize) -> Self {
        Self {
            share: first..first + count,
            cursor: first,
            pending: BTreeMap::new(),
        }
    }

    /// Record a single check result
    pub fn accept(&mut self, result: &CheckResult) -> Result<(), AggregateError> {
        let puzzle = result.puzzle;
        if !self.share.contains(&puzzle) {
            return Err(AggregateError::OutOfShare {
                puzzle,
                start: self.share.start,
                end: self.share.end,
            });
        }
        if puzzle < self.cursor {
            return Err(AggregateError::AlreadyEmitted(puzzle));
        }

        let report = self
            .pending
            .entry(puzzle)
            .or_insert_with(|| PuzzleReport::new(puzzle));
        if report.completed() == CHECKS_PER_PUZZLE {
            return Err(AggregateError::TooManyResults(puzzle));
        }
        report.record(result);
        Ok(())
    }

    /// Record every result in a batch
    pub fn accept_batch(&mut self, batch: &[CheckResult]) -> Result<(), AggregateError> {
        batch.iter().try_for_each(|r| self.accept(r))
    }

    /// Remove and return every report that may be emitted now
    ///
    /// Reports come out in ascending puzzle order, starting at the cursor.
    pub fn drain_ready(&mut self) -> Vec<PuzzleReport> {
        let mut ready = Vec::new();
        while self
            .pending
            .get(&self.cursor)
            .is_some_and(PuzzleReport::is_complete)
        {
            if let Some(report) = self.pending.remove(&self.cursor) {
                ready.push(report);
            }
            self.cursor += 1;
        }
        ready
    }

    /// True once every puzzle in the share has been emitted
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.share.end
    }

    /// Next puzzle waiting to be emitted
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of puzzles with buffered, unemitted results
    pub fn buffered(&self) -> usize {
        self.pending.len()
    }

    /// Consume batches from `batches` until every puzzle has been emitted
    ///
    /// `emit` is called once per puzzle, in puzzle order. Returns when the
    /// share is finished; fails if the channel closes first.
    pub fn run<F>(&mut self, batches: &Receiver<Vec<CheckResult>>, mut emit: F) -> anyhow::Result<()>
    where
        F: FnMut(PuzzleReport) -> anyhow::Result<()>,
    {
        while !self.is_finished() {
            let Ok(batch) = batches.recv() else {
                return Err(AggregateError::Incomplete {
                    next: self.cursor,
                    remaining: self.share.end - self.cursor,
                }
                .into());
            };

            self.accept_batch(&batch)?;
            for report in self.drain_ready() {
                tracing::trace!(puzzle = report.puzzle(), "Emitting report");
                emit(report)?;
            }
        }
        Ok(())
    }
}
