//! Inline execution on the calling thread

use super::{emit_ready, ExecutionStrategy, PuzzleShare, ReportSink, StrategyKind};
use crate::checker::{puzzle_tasks, CheckResult};
use crate::Result;

/// Runs every check in order on the calling thread, as worker 0
#[derive(Debug, Default, Clone, Copy)]
pub struct SequentialStrategy;

impl ExecutionStrategy for SequentialStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Sequential
    }

    fn run(&mut self, share: &PuzzleShare, sink: &dyn ReportSink) -> Result<()> {
        let mut aggregator = share.aggregator();

        for (puzzle, grid) in share.iter() {
            sink.progress(puzzle)?;
            let results: Vec<CheckResult> = puzzle_tasks(puzzle, grid).map(|task| task.run(0)).collect();
            aggregator.accept_batch(&results)?;
            emit_ready(&mut aggregator, sink)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{mixed_share, CollectSink};

    #[test]
    fn test_everything_on_worker_zero() {
        let sink = CollectSink::default();
        SequentialStrategy.run(&mixed_share(0, 3), &sink).unwrap();

        let reports = sink.reports();
        assert_eq!(reports.len(), 3);
        assert!(reports[0].per_worker().is_empty());
        assert_eq!(reports[1].per_worker().keys().copied().collect::<Vec<_>>(), vec![0]);
        assert_eq!(reports[2].per_worker()[&0].len(), 4);
    }
}
