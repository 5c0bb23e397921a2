//! Per-puzzle result collection
//!
//! A [`PuzzleReport`] gathers the outcomes of one puzzle's 27 checks. Failed
//! groups are kept per worker, in the order reports print them: rows, then
//! columns, then boxes, each ascending by index.
//!
//! Reports are only ever mutated by one thread at a time (the aggregator),
//! so they carry no internal synchronization.
//!
//! # Example
//!
//! ```
//! use gridcheck::checker::{CheckKind, CheckResult, ErrorToken};
//! use gridcheck::stats::PuzzleReport;
//!
//! let mut report = PuzzleReport::new(0);
//! report.record(&CheckResult { puzzle: 0, worker: 1, error: None });
//! report.record(&CheckResult {
//!     puzzle: 0,
//!     worker: 2,
//!     error: Some(ErrorToken::new(CheckKind::Column, 3)),
//! });
//!
//! assert_eq!(report.completed(), 2);
//! assert_eq!(report.total_errors(), 1);
//! assert!(!report.is_complete());
//! ```

pub mod aggregator;

use crate::checker::{CheckResult, ErrorToken, WorkerId, CHECKS_PER_PUZZLE};
use std::collections::{BTreeMap, BTreeSet};

/// Accumulated outcome of one puzzle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PuzzleReport {
    /// 0-based position of the puzzle in the input file
    puzzle: usize,

    /// Checks received so far
    completed: usize,

    /// Failed groups, keyed by the worker that found them
    errors: BTreeMap<WorkerId, BTreeSet<ErrorToken>>,
}

impl PuzzleReport {
    pub fn new(puzzle: usize) -> Self {
        Self {
            puzzle,
            completed: 0,
            errors: BTreeMap::new(),
        }
    }

    /// Count one finished check and keep its error, if any
    pub fn record(&mut self, result: &CheckResult) {
        debug_assert_eq!(result.puzzle, self.puzzle);
        self.completed += 1;
        if let Some(token) = result.error {
            self.errors.entry(result.worker).or_default().insert(token);
        }
    }

    pub fn puzzle(&self) -> usize {
        self.puzzle
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    /// True once all 27 checks have been recorded
    pub fn is_complete(&self) -> bool {
        self.completed == CHECKS_PER_PUZZLE
    }

    pub fn total_errors(&self) -> usize {
        self.errors.values().map(BTreeSet::len).sum()
    }

    /// Failed groups per worker, workers ascending
    pub fn per_worker(&self) -> &BTreeMap<WorkerId, BTreeSet<ErrorToken>> {
        &self.errors
    }

    /// All failed groups regardless of which worker found them
    pub fn tokens(&self) -> BTreeSet<ErrorToken> {
        self.errors.values().flatten().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::CheckKind;

    fn failed(worker: WorkerId, kind: CheckKind, index: usize) -> CheckResult {
        CheckResult {
            puzzle: 0,
            worker,
            error: Some(ErrorToken::new(kind, index)),
        }
    }

    #[test]
    fn test_new_report_is_empty() {
        let report = PuzzleReport::new(4);
        assert_eq!(report.puzzle(), 4);
        assert_eq!(report.completed(), 0);
        assert_eq!(report.total_errors(), 0);
        assert!(report.per_worker().is_empty());
    }

    #[test]
    fn test_complete_after_27() {
        let mut report = PuzzleReport::new(0);
        let ok = CheckResult { puzzle: 0, worker: 0, error: None };
        for _ in 0..26 {
            report.record(&ok);
        }
        assert!(!report.is_complete());
        report.record(&ok);
        assert!(report.is_complete());
        assert_eq!(report.total_errors(), 0);
    }

    #[test]
    fn test_errors_grouped_and_sorted() {
        let mut report = PuzzleReport::new(0);
        report.record(&failed(2, CheckKind::Box, 8));
        report.record(&failed(0, CheckKind::Column, 3));
        report.record(&failed(2, CheckKind::Row, 4));
        report.record(&failed(0, CheckKind::Row, 0));

        let ids: Vec<WorkerId> = report.per_worker().keys().copied().collect();
        assert_eq!(ids, vec![0, 2]);

        let worker2: Vec<String> = report.per_worker()[&2].iter().map(ToString::to_string).collect();
        assert_eq!(worker2, ["L5", "R9"]);

        let all: Vec<String> = report.tokens().iter().map(ToString::to_string).collect();
        assert_eq!(all, ["L1", "L5", "C4", "R9"]);
        assert_eq!(report.total_errors(), 4);
    }
}
