//! Group checks
//!
//! A puzzle is correct when each of its 27 groups (9 rows, 9 columns,
//! 9 boxes) holds every value from 1 to 9 exactly once. Each check is a pure
//! function over one group; the execution strategies only decide *where*
//! the checks run.
//!
//! # Task order
//!
//! [`puzzle_tasks`] always yields the 27 checks of a puzzle in the same
//! order: rows 0-8, then columns 0-8, then boxes 0-8. Strategies that
//! assign checks to workers by position rely on this order, which makes
//! worker attribution reproducible.

use crate::grid::{Grid, GRID_SIZE};
use std::fmt;
use std::sync::Arc;

/// Number of checks per puzzle
pub const CHECKS_PER_PUZZLE: usize = 3 * GRID_SIZE;

/// Worker identity, stable for the lifetime of a run
pub type WorkerId = usize;

/// Kind of group a check covers
///
/// Variant order is significant: reports list rows, then columns, then boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CheckKind {
    Row,
    Column,
    Box,
}

impl CheckKind {
    pub const ALL: [CheckKind; 3] = [CheckKind::Row, CheckKind::Column, CheckKind::Box];

    /// Letter used when printing a failed group
    pub fn letter(self) -> char {
        match self {
            CheckKind::Row => 'L',
            CheckKind::Column => 'C',
            CheckKind::Box => 'R',
        }
    }
}

/// A failed group: `(kind, index)` with a 0-based index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ErrorToken {
    pub kind: CheckKind,
    pub index: u8,
}

impl ErrorToken {
    pub fn new(kind: CheckKind, index: usize) -> Self {
        Self {
            kind,
            index: index as u8,
        }
    }
}

impl fmt::Display for ErrorToken {
    /// Formats as `<letter><index + 1>`, e.g. `L1`, `C4`, `R9`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.letter(), self.index + 1)
    }
}

/// True when `group` holds each value 1-9 exactly once
fn is_complete(group: &[u8; GRID_SIZE]) -> bool {
    let mut seen = 0u16;
    for &v in group {
        seen |= 1 << v;
    }
    // Bits 1..=9 set, bit 0 clear.
    seen == 0b11_1111_1110
}

fn check_group(kind: CheckKind, index: usize, group: [u8; GRID_SIZE]) -> Option<ErrorToken> {
    (!is_complete(&group)).then(|| ErrorToken::new(kind, index))
}

/// Check row `i`
pub fn check_row(i: usize, grid: &Grid) -> Option<ErrorToken> {
    check_group(CheckKind::Row, i, grid.row(i))
}

/// Check column `i`
pub fn check_column(i: usize, grid: &Grid) -> Option<ErrorToken> {
    check_group(CheckKind::Column, i, grid.column(i))
}

/// Check box `i` (row-major box numbering)
pub fn check_box(i: usize, grid: &Grid) -> Option<ErrorToken> {
    check_group(CheckKind::Box, i, grid.block(i))
}

/// Run the check for `kind` on group `i`
pub fn check(kind: CheckKind, i: usize, grid: &Grid) -> Option<ErrorToken> {
    match kind {
        CheckKind::Row => check_row(i, grid),
        CheckKind::Column => check_column(i, grid),
        CheckKind::Box => check_box(i, grid),
    }
}

/// One unit of work: check group `index` of kind `kind` for puzzle `puzzle`
///
/// `puzzle` is the puzzle's 0-based position in the full input file.
#[derive(Debug, Clone)]
pub struct CheckTask {
    pub kind: CheckKind,
    pub index: usize,
    pub grid: Arc<Grid>,
    pub puzzle: usize,
}

impl CheckTask {
    /// Execute the check on behalf of `worker`
    pub fn run(&self, worker: WorkerId) -> CheckResult {
        CheckResult {
            puzzle: self.puzzle,
            worker,
            error: check(self.kind, self.index, &self.grid),
        }
    }
}

/// Outcome of one check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckResult {
    /// Puzzle the check belongs to
    pub puzzle: usize,
    /// Worker that executed the check
    pub worker: WorkerId,
    /// `None` when the group is valid
    pub error: Option<ErrorToken>,
}

/// The 27 checks of one puzzle, in dispatch order
pub fn puzzle_tasks(puzzle: usize, grid: &Arc<Grid>) -> impl Iterator<Item = CheckTask> + '_ {
    CheckKind::ALL.into_iter().flat_map(move |kind| {
        (0..GRID_SIZE).map(move |index| CheckTask {
            kind,
            index,
            grid: Arc::clone(grid),
            puzzle,
        })
    })
}
