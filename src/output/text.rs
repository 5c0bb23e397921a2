//! Human-readable text output
//!
//! ```text
//! Process 1: validating puzzle 3
//! Process 1: 3 errors found (T1: L1, R3; T2: C9)
//! Process 1: validating puzzle 4
//! Process 1: 0 errors found
//! ```
//!
//! Worker and process numbers are printed 1-based.

use crate::stats::PuzzleReport;

/// Line announcing that a process has started on a puzzle
///
/// `puzzle` is the 0-based position in the input file.
pub fn format_progress(process: usize, puzzle: usize) -> String {
    format!("Process {}: validating puzzle {}", process, puzzle + 1)
}

/// Summary line for a finished puzzle
pub fn format_summary(process: usize, report: &PuzzleReport) -> String {
    let total = report.total_errors();
    if total == 0 {
        return format!("Process {}: 0 errors found", process);
    }

    let per_worker: Vec<String> = report
        .per_worker()
        .iter()
        .map(|(worker, tokens)| {
            let tokens: Vec<String> = tokens.iter().map(ToString::to_string).collect();
            format!("T{}: {}", worker + 1, tokens.join(", "))
        })
        .collect();

    format!(
        "Process {}: {} errors found ({})",
        process,
        total,
        per_worker.join("; ")
    )
}
