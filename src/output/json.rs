//! JSON-lines output
//!
//! One object per finished puzzle, e.g.
//!
//! ```text
//! {"process":1,"puzzle":3,"errors":3,"workers":{"1":["L1","R3"],"2":["C9"]}}
//! ```
//!
//! Worker keys are 1-based, matching the text output.

use crate::stats::PuzzleReport;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Serialized form of one puzzle summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonSummary {
    pub process: usize,
    /// 1-based position in the input file
    pub puzzle: usize,
    pub errors: usize,
    pub workers: BTreeMap<usize, Vec<String>>,
}

impl JsonSummary {
    pub fn from_report(process: usize, report: &PuzzleReport) -> Self {
        let workers = report
            .per_worker()
            .iter()
            .map(|(worker, tokens)| {
                (worker + 1, tokens.iter().map(ToString::to_string).collect())
            })
            .collect();

        Self {
            process,
            puzzle: report.puzzle() + 1,
            errors: report.total_errors(),
            workers,
        }
    }
}

/// Summary line for a finished puzzle, without trailing newline
pub fn format_summary(process: usize, report: &PuzzleReport) -> Result<String> {
    Ok(serde_json::to_string(&JsonSummary::from_report(process, report))?)
}
