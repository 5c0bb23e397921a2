//! gridcheck - concurrent validator for completed 9x9 puzzles
//!
//! Every puzzle is checked as 27 independent groups (9 rows, 9 columns,
//! 9 boxes). The checks are spread over worker threads and, optionally,
//! over several processes, and the results are reported per puzzle in input
//! order.
//!
//! # Architecture
//!
//! - **Grid input**: parsing of multi-puzzle input files ([`grid`])
//! - **Checks**: the row/column/box rules and the task/result types ([`checker`])
//! - **Persistent workers**: threads driven by a two-signal handshake ([`worker`])
//! - **Strategies**: handshake rounds, batched pool pipeline, pooled and sequential ([`engine`])
//! - **Ordering**: reorder buffer that releases reports in puzzle order ([`stats`])
//! - **Fan-out**: contiguous partition over child processes ([`coordinator`])

pub mod checker;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod grid;
pub mod output;
pub mod stats;
pub mod worker;

// Re-export commonly used types
pub use config::Config;
pub use engine::{ExecutionStrategy, StrategyKind};
pub use grid::Grid;

/// Result type used throughout gridcheck
pub type Result<T> = anyhow::Result<T>;
