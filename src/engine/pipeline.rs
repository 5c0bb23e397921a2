//! Batched pool pipeline
//!
//! The producer walks the share in input order and groups checks into
//! batches of `batch_size` (the last batch may be smaller, and batches may
//! span puzzle boundaries). Each batch becomes one job on a reusable rayon
//! pool. When a job finishes it sends its results down a delivery channel,
//! so batches arrive in completion order, not submission order.
//!
//! A dedicated aggregator thread drains the delivery channel into an
//! [`OrderedAggregator`](crate::stats::aggregator::OrderedAggregator), which
//! buffers early finishers and releases reports in puzzle order.
//!
//! ```text
//! producer ──batch──▶ pool ──results──▶ delivery ──▶ aggregator ──▶ sink
//! ```
//!
//! Each batch is attributed to worker `batch_number % threads`, fixed at
//! submission.

use super::{build_pool, ExecutionStrategy, PuzzleShare, ReportSink, StrategyKind};
use crate::checker::{puzzle_tasks, CheckResult, CheckTask, WorkerId};
use crate::Result;
use anyhow::Context;
use crossbeam::channel::{unbounded, Sender};
use std::thread;

/// Producer/aggregator pipeline over a reusable pool
pub struct PipelineStrategy {
    pool: rayon::ThreadPool,
    threads: usize,
    batch_size: usize,
}

impl PipelineStrategy {
    /// `threads` and `batch_size` are raised to 1 if zero
    pub fn new(threads: usize, batch_size: usize) -> Result<Self> {
        let threads = threads.max(1);
        Ok(Self {
            pool: build_pool(threads)?,
            threads,
            batch_size: batch_size.max(1),
        })
    }

    /// Submit one batch as a pool job
    fn submit(&self, batch: Vec<CheckTask>, worker: WorkerId, delivery: &Sender<Vec<CheckResult>>) {
        let delivery = delivery.clone();
        self.pool.spawn(move || {
            let results: Vec<CheckResult> = batch.iter().map(|task| task.run(worker)).collect();
            // The aggregator only hangs up after an error it reports itself.
            let _ = delivery.send(results);
        });
    }

    /// Walk the share, submitting full batches as they fill up
    fn produce(
        &self,
        share: &PuzzleShare,
        sink: &dyn ReportSink,
        delivery: &Sender<Vec<CheckResult>>,
    ) -> Result<usize> {
        let mut batch = Vec::with_capacity(self.batch_size);
        let mut submitted = 0;

        for (puzzle, grid) in share.iter() {
            sink.progress(puzzle)?;

            for task in puzzle_tasks(puzzle, grid) {
                batch.push(task);
                if batch.len() == self.batch_size {
                    let full = std::mem::replace(&mut batch, Vec::with_capacity(self.batch_size));
                    self.submit(full, submitted % self.threads, delivery);
                    submitted += 1;
                }
            }
        }

        if !batch.is_empty() {
            self.submit(batch, submitted % self.threads, delivery);
            submitted += 1;
        }

        Ok(submitted)
    }
}

impl std::fmt::Debug for PipelineStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineStrategy")
            .field("threads", &self.threads)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl ExecutionStrategy for PipelineStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Pipeline
    }

    fn run(&mut self, share: &PuzzleShare, sink: &dyn ReportSink) -> Result<()> {
        let (delivery, batches) = unbounded::<Vec<CheckResult>>();

        thread::scope(|scope| {
            let aggregator = thread::Builder::new()
                .name("check-aggregator".to_string())
                .spawn_scoped(scope, move || {
                    let mut aggregator = share.aggregator();
                    aggregator.run(&batches, |report| sink.report(report))
                })
                .context("Failed to spawn aggregator thread")?;

            let produced = self.produce(share, sink, &delivery);
            // Once the jobs finish, the last sender is gone and a stalled
            // aggregator sees the channel close instead of waiting forever.
            drop(delivery);

            let aggregated = aggregator
                .join()
                .map_err(|_| anyhow::anyhow!("aggregator thread panicked"))?;

            let submitted = produced?;
            tracing::debug!(puzzles = share.len(), batches = submitted, "Pipeline finished");
            aggregated
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::{CheckKind, ErrorToken, CHECKS_PER_PUZZLE};
    use crate::engine::{mixed_share, CollectSink};
    use crate::grid::fixtures;
    use std::sync::Arc;

    #[test]
    fn test_reports_in_order() {
        for (threads, batch_size) in [(1, 10), (4, 10), (8, 1), (3, 27), (5, 100)] {
            let share = mixed_share(2, 9);
            let mut pipeline = PipelineStrategy::new(threads, batch_size).unwrap();
            let sink = CollectSink::default();
            pipeline.run(&share, &sink).unwrap();

            assert_eq!(sink.puzzles(), (2..11).collect::<Vec<_>>());
            assert!(sink.reports().iter().all(|r| r.completed() == CHECKS_PER_PUZZLE));
        }
    }

    #[test]
    fn test_batch_count() {
        let share = mixed_share(0, 3); // 81 checks
        let pipeline = PipelineStrategy::new(2, 10).unwrap();
        let (delivery, batches) = unbounded();
        let sink = CollectSink::default();

        let submitted = pipeline.produce(&share, &sink, &delivery).unwrap();
        assert_eq!(submitted, 9);
        drop(delivery);

        let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
        assert_eq!(sizes.len(), 9);
        assert_eq!(sizes.iter().sum::<usize>(), 81);
        assert_eq!(sizes.iter().filter(|&&n| n == 1).count(), 1);
    }

    #[test]
    fn test_batch_attribution() {
        // One broken puzzle, batch size 10: row 0 is in batch 0, column 8
        // (check 17) in batch 1, box 2 (check 20) in batch 2.
        let share = PuzzleShare::new(0, vec![Arc::new(fixtures::row0_duplicate())]);
        let mut pipeline = PipelineStrategy::new(3, 10).unwrap();
        let sink = CollectSink::default();
        pipeline.run(&share, &sink).unwrap();

        let report = sink.reports().remove(0);
        let owners: Vec<(usize, ErrorToken)> = report
            .per_worker()
            .iter()
            .flat_map(|(w, tokens)| tokens.iter().map(move |t| (*w, *t)))
            .collect();
        assert_eq!(
            owners,
            vec![
                (0, ErrorToken::new(CheckKind::Row, 0)),
                (1, ErrorToken::new(CheckKind::Column, 8)),
                (2, ErrorToken::new(CheckKind::Box, 2)),
            ]
        );
    }

    #[test]
    fn test_zero_threads_and_batch_size_raised_to_one() {
        let mut pipeline = PipelineStrategy::new(0, 0).unwrap();
        assert_eq!((pipeline.threads, pipeline.batch_size), (1, 1));

        let sink = CollectSink::default();
        pipeline.run(&mixed_share(0, 2), &sink).unwrap();
        assert_eq!(sink.puzzles(), vec![0, 1]);
    }

    #[test]
    fn test_sink_failure_propagates() {
        struct FailingSink;
        impl ReportSink for FailingSink {
            fn progress(&self, _puzzle: usize) -> Result<()> {
                Ok(())
            }
            fn report(&self, _report: crate::stats::PuzzleReport) -> Result<()> {
                anyhow::bail!("sink closed")
            }
        }

        let mut pipeline = PipelineStrategy::new(2, 5).unwrap();
        let err = pipeline.run(&mixed_share(0, 3), &FailingSink).unwrap_err();
        assert!(err.to_string().contains("sink closed"));
    }
}
