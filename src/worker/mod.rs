//! Persistent check workers
//!
//! A [`PersistentWorker`] is a long-lived thread that runs one check at a
//! time on behalf of a dispatcher. Workers are created once per share and
//! reused for every puzzle in it, so thread creation is paid once rather
//! than once per check.
//!
//! # Handshake
//!
//! Each worker owns two single-slot channels:
//!
//! - **task-ready** (dispatcher → worker): carries the next [`Command`]
//! - **task-done** (worker → dispatcher): carries the check outcome
//!
//! The dispatcher must not hand out a new command until it has observed the
//! previous task-done. [`PersistentWorker::assign`] returns a
//! [`PendingCheck`] that mutably borrows the worker, so a second assignment
//! (or a stop) while a check is in flight does not compile. Dropping a
//! `PendingCheck` without calling [`PendingCheck::wait`] still consumes the
//! task-done signal before the borrow ends.
//!
//! # Lifecycle
//!
//! ```text
//! Idle --assign/park--> Busy --wait--> Idle
//! Idle --stop--> Stopped
//! ```
//!
//! `Stopped` is terminal. A stopped worker refuses new work with
//! [`HandshakeError::Stopped`] instead of blocking the caller.
//!
//! # Example
//!
//! ```
//! use gridcheck::checker::puzzle_tasks;
//! use gridcheck::grid::Grid;
//! use gridcheck::worker::PersistentWorker;
//! use std::sync::Arc;
//!
//! let grid = Arc::new(Grid::parse_rows(&[
//!     "534678912", "672195348", "198342567",
//!     "859761423", "426853791", "713924856",
//!     "961537284", "287419635", "345286179",
//! ])?);
//!
//! let mut worker = PersistentWorker::spawn(0)?;
//! for task in puzzle_tasks(0, &grid) {
//!     let outcome = worker.assign(task)?.wait()?;
//!     assert_eq!(outcome.unwrap().error, None);
//! }
//! worker.stop()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::checker::{CheckResult, CheckTask, WorkerId};
use crossbeam::channel::{bounded, Receiver, Sender};
use std::thread::{self, JoinHandle};
use thiserror::Error;

/// Handshake protocol violations and worker failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandshakeError {
    #[error("worker {0} is stopped")]
    Stopped(WorkerId),

    #[error("worker {0} exited before signalling task-done")]
    Disconnected(WorkerId),

    #[error("worker {0} panicked")]
    Panicked(WorkerId),
}

/// Instruction placed in a worker's task-ready slot
#[derive(Debug)]
pub enum Command {
    /// Run a check and report its result
    Run(CheckTask),
    /// Do nothing this round, but still signal task-done
    Park,
    /// Leave the loop and exit the thread
    Stop,
}

/// Dispatcher-side view of a worker's lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Busy,
    Stopped,
}

/// Handle to a long-lived check worker
pub struct PersistentWorker {
    id: WorkerId,
    task_ready: Sender<Command>,
    task_done: Receiver<Option<CheckResult>>,
    state: WorkerState,
    handle: Option<JoinHandle<()>>,
}

impl PersistentWorker {
    /// Spawn a worker thread with identity `id`
    ///
    /// The thread name is for debuggers only; the id travels with every
    /// result explicitly.
    pub fn spawn(id: WorkerId) -> std::io::Result<Self> {
        let (task_ready, requests) = bounded::<Command>(1);
        let (responses, task_done) = bounded::<Option<CheckResult>>(1);

        let handle = thread::Builder::new()
            .name(format!("check-worker-{id}"))
            .spawn(move || worker_loop(id, requests, responses))?;

        tracing::debug!(worker = id, "Spawned persistent worker");

        Ok(Self {
            id,
            task_ready,
            task_done,
            state: WorkerState::Idle,
            handle: Some(handle),
        })
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Hand `task` to the worker and signal task-ready
    pub fn assign(&mut self, task: CheckTask) -> Result<PendingCheck<'_>, HandshakeError> {
        self.dispatch(Command::Run(task))
    }

    /// Give the worker a no-op for this round
    pub fn park(&mut self) -> Result<PendingCheck<'_>, HandshakeError> {
        self.dispatch(Command::Park)
    }

    fn dispatch(&mut self, command: Command) -> Result<PendingCheck<'_>, HandshakeError> {
        if self.state == WorkerState::Stopped {
            return Err(HandshakeError::Stopped(self.id));
        }
        debug_assert_eq!(self.state, WorkerState::Idle);

        self.task_ready
            .send(command)
            .map_err(|_| HandshakeError::Disconnected(self.id))?;
        self.state = WorkerState::Busy;

        Ok(PendingCheck { worker: self })
    }

    /// Block until task-done, returning the outcome of the last command
    fn observe_done(&mut self) -> Result<Option<CheckResult>, HandshakeError> {
        let outcome = self.task_done.recv();
        self.state = WorkerState::Idle;
        outcome.map_err(|_| HandshakeError::Disconnected(self.id))
    }

    /// Stop the worker and join its thread
    ///
    /// Marks the worker stopped, then releases task-ready once more so the
    /// thread wakes up, sees the stop command and exits. Stopping an already
    /// stopped worker is a no-op.
    pub fn stop(&mut self) -> Result<(), HandshakeError> {
        if self.state == WorkerState::Stopped {
            return Ok(());
        }
        self.state = WorkerState::Stopped;

        // The thread may already be gone; joining below reports why.
        let _ = self.task_ready.send(Command::Stop);

        if let Some(handle) = self.handle.take() {
            handle.join().map_err(|_| HandshakeError::Panicked(self.id))?;
        }

        tracing::debug!(worker = self.id, "Stopped persistent worker");
        Ok(())
    }
}

impl Drop for PersistentWorker {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!(worker = self.id, error = %e, "Worker did not stop cleanly");
        }
    }
}

impl std::fmt::Debug for PersistentWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentWorker")
            .field("id", &self.id)
            .field("state", &self.state)
            .finish()
    }
}

/// A command in flight on one worker
///
/// Holds the worker's mutable borrow until task-done has been observed.
#[must_use = "a pending check must be waited on before the worker can be reused"]
pub struct PendingCheck<'a> {
    worker: &'a mut PersistentWorker,
}

impl PendingCheck<'_> {
    pub fn worker_id(&self) -> WorkerId {
        self.worker.id
    }

    /// Wait for task-done
    ///
    /// Returns `None` for a parked round, or the check's result.
    pub fn wait(self) -> Result<Option<CheckResult>, HandshakeError> {
        self.worker.observe_done()
    }
}

impl Drop for PendingCheck<'_> {
    fn drop(&mut self) {
        if self.worker.state == WorkerState::Busy {
            let _ = self.worker.observe_done();
        }
    }
}

fn worker_loop(id: WorkerId, requests: Receiver<Command>, responses: Sender<Option<CheckResult>>) {
    while let Ok(command) = requests.recv() {
        let outcome = match command {
            Command::Stop => break,
            Command::Park => None,
            Command::Run(task) => Some(task.run(id)),
        };
        if responses.send(outcome).is_err() {
            break;
        }
    }
    tracing::trace!(worker = id, "Worker loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::{puzzle_tasks, CheckKind, ErrorToken};
    use crate::grid::fixtures;
    use std::sync::Arc;

    #[test]
    fn test_runs_all_checks_of_a_puzzle() {
        let grid = Arc::new(fixtures::row0_duplicate());
        let mut worker = PersistentWorker::spawn(4).unwrap();

        let mut errors = Vec::new();
        for task in puzzle_tasks(2, &grid) {
            let result = worker.assign(task).unwrap().wait().unwrap().unwrap();
            assert_eq!(result.worker, 4);
            assert_eq!(result.puzzle, 2);
            errors.extend(result.error);
        }

        assert_eq!(errors[0], ErrorToken::new(CheckKind::Row, 0));
        assert_eq!(errors.len(), 3);
        worker.stop().unwrap();
    }

    #[test]
    fn test_park_returns_nothing() {
        let mut worker = PersistentWorker::spawn(0).unwrap();
        assert_eq!(worker.park().unwrap().wait().unwrap(), None);
        assert_eq!(worker.state(), WorkerState::Idle);
    }

    #[test]
    fn test_state_transitions() {
        let grid = Arc::new(fixtures::solved());
        let mut worker = PersistentWorker::spawn(1).unwrap();
        assert_eq!(worker.state(), WorkerState::Idle);

        let task = puzzle_tasks(0, &grid).next().unwrap();
        let pending = worker.assign(task).unwrap();
        assert_eq!(pending.worker.state(), WorkerState::Busy);
        assert_eq!(pending.worker_id(), 1);
        pending.wait().unwrap();

        assert_eq!(worker.state(), WorkerState::Idle);
        worker.stop().unwrap();
        assert_eq!(worker.state(), WorkerState::Stopped);
    }

    #[test]
    fn test_stopped_worker_refuses_work() {
        let grid = Arc::new(fixtures::solved());
        let mut worker = PersistentWorker::spawn(0).unwrap();
        worker.stop().unwrap();

        let task = puzzle_tasks(0, &grid).next().unwrap();
        assert_eq!(worker.assign(task).err(), Some(HandshakeError::Stopped(0)));
        assert_eq!(worker.park().err(), Some(HandshakeError::Stopped(0)));

        // Idempotent.
        assert!(worker.stop().is_ok());
    }

    #[test]
    fn test_dropped_pending_check_is_drained() {
        let grid = Arc::new(fixtures::row0_duplicate());
        let mut worker = PersistentWorker::spawn(0).unwrap();

        let mut tasks = puzzle_tasks(0, &grid);
        drop(worker.assign(tasks.next().unwrap()).unwrap());
        assert_eq!(worker.state(), WorkerState::Idle);

        // The next result is for the next task, not the dropped one.
        let result = worker.assign(tasks.next().unwrap()).unwrap().wait().unwrap();
        assert_eq!(result.unwrap().error, None);
    }

    #[test]
    fn test_many_workers_in_one_round() {
        let grid = Arc::new(fixtures::solved());
        let mut workers: Vec<PersistentWorker> =
            (0..5).map(|id| PersistentWorker::spawn(id).unwrap()).collect();

        let mut tasks = puzzle_tasks(0, &grid);
        let pending: Vec<PendingCheck<'_>> = workers
            .iter_mut()
            .map(|w| w.assign(tasks.next().unwrap()).unwrap())
            .collect();

        let ids: Vec<WorkerId> = pending
            .into_iter()
            .map(|p| p.wait().unwrap().unwrap().worker)
            .collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);

        for w in workers.iter_mut() {
            w.stop().unwrap();
        }
    }

    #[test]
    fn test_drop_stops_thread() {
        let worker = PersistentWorker::spawn(9).unwrap();
        drop(worker);
    }
}
