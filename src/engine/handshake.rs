//! Round-barrier dispatch over persistent workers
//!
//! The dispatcher owns `N` [`PersistentWorker`]s for its whole lifetime. For
//! each puzzle it hands out the 27 checks in `ceil(27 / N)` rounds: in round
//! `r`, worker `k` gets check `r * N + k`, or a no-op if that check does not
//! exist. After dispatching a round it waits for every worker's task-done
//! before starting the next one. There is no queue; the round is the
//! barrier.
//!
//! ```text
//! N = 4      round 0: w0=L1 w1=L2 w2=L3 w3=L4
//!            ...
//!            round 6: w0=R8 w1=R9 w2=park w3=park
//! ```

use super::{emit_ready, ExecutionStrategy, PuzzleShare, ReportSink, StrategyKind};
use crate::checker::{puzzle_tasks, CheckResult, CheckTask};
use crate::worker::{PendingCheck, PersistentWorker};
use crate::Result;
use anyhow::Context;

/// Dispatcher driving persistent workers in synchronous rounds
#[derive(Debug)]
pub struct HandshakeDispatcher {
    workers: Vec<PersistentWorker>,
}

impl HandshakeDispatcher {
    /// Spawn `threads` persistent workers with ids `0..threads`, at least one
    pub fn new(threads: usize) -> Result<Self> {
        let workers = (0..threads.max(1))
            .map(|id| {
                PersistentWorker::spawn(id)
                    .with_context(|| format!("Failed to spawn worker thread {}", id))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { workers })
    }

    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    /// Run one round: one check (or a park) per worker, then wait for all
    fn run_round(&mut self, round: &[CheckTask]) -> Result<Vec<CheckResult>> {
        let mut tasks = round.iter().cloned();

        // Any pending checks created before an error are drained on drop.
        let pending = self
            .workers
            .iter_mut()
            .map(|worker| match tasks.next() {
                Some(task) => worker.assign(task),
                None => worker.park(),
            })
            .collect::<std::result::Result<Vec<PendingCheck<'_>>, _>>()?;

        let mut results = Vec::with_capacity(round.len());
        for check in pending {
            if let Some(result) = check.wait()? {
                results.push(result);
            }
        }
        Ok(results)
    }

    /// Stop every worker, reporting the first failure
    pub fn shutdown(&mut self) -> Result<()> {
        let mut first_error = None;
        for worker in &mut self.workers {
            if let Err(e) = worker.stop() {
                tracing::warn!(worker = worker.id(), error = %e, "Worker failed during shutdown");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

impl ExecutionStrategy for HandshakeDispatcher {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Handshake
    }

    fn run(&mut self, share: &PuzzleShare, sink: &dyn ReportSink) -> Result<()> {
        let mut aggregator = share.aggregator();
        let round_size = self.workers.len();

        for (puzzle, grid) in share.iter() {
            sink.progress(puzzle)?;

            let tasks: Vec<CheckTask> = puzzle_tasks(puzzle, grid).collect();
            for (r, round) in tasks.chunks(round_size).enumerate() {
                tracing::trace!(puzzle, round = r, checks = round.len(), "Dispatching round");
                let results = self
                    .run_round(round)
                    .with_context(|| format!("Round {} of puzzle {} failed", r, puzzle + 1))?;
                aggregator.accept_batch(&results)?;
            }

            emit_ready(&mut aggregator, sink)?;
        }

        Ok(())
    }
}

impl Drop for HandshakeDispatcher {
    fn drop(&mut self) {
        // Errors were already logged by shutdown.
        let _ = self.shutdown();
    }
}
