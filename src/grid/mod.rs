//! Puzzle grid model
//!
//! A [`Grid`] is a completed 9x9 puzzle: every cell holds a value in `1..=9`.
//! Grids are immutable once loaded and are shared read-only between workers
//! behind an `Arc`, so reads never need synchronization.
//!
//! # Example
//!
//! ```
//! use gridcheck::grid::Grid;
//!
//! let grid = Grid::parse_rows(&[
//!     "534678912", "672195348", "198342567",
//!     "859761423", "426853791", "713924856",
//!     "961537284", "287419635", "345286179",
//! ])?;
//! assert_eq!(grid.cell(0, 0), 5);
//! assert_eq!(grid.column(8)[8], 9);
//! # Ok::<(), gridcheck::grid::GridError>(())
//! ```

pub mod parser;

use std::fmt;
use thiserror::Error;

/// Side length of a grid
pub const GRID_SIZE: usize = 9;

/// Side length of one box
pub const BOX_SIZE: usize = 3;

/// Errors raised while building a grid from text
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("line {line}: expected 9 digits, found {found} characters")]
    RowLength { line: usize, found: usize },

    #[error("line {line}, column {column}: '{found}' is not a digit between 1 and 9")]
    InvalidCell {
        line: usize,
        column: usize,
        found: char,
    },

    #[error("line {line}: puzzle block is incomplete, expected 9 rows, found {rows}")]
    IncompleteBlock { line: usize, rows: usize },

    #[error("line {line}: expected a blank line between puzzles")]
    MissingSeparator { line: usize },
}

/// A completed 9x9 puzzle
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Grid {
    cells: [[u8; GRID_SIZE]; GRID_SIZE],
}

impl Grid {
    /// Build a grid from raw cell values
    ///
    /// Returns `None` if any cell lies outside `1..=9`.
    pub fn from_cells(cells: [[u8; GRID_SIZE]; GRID_SIZE]) -> Option<Self> {
        let in_range = cells
            .iter()
            .flatten()
            .all(|&v| (1..=GRID_SIZE as u8).contains(&v));
        in_range.then_some(Self { cells })
    }

    /// Parse nine text rows of nine digits each
    ///
    /// Line numbers in errors are 1-based and relative to the first row.
    pub fn parse_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, GridError> {
        Self::parse_rows_at(rows, 1)
    }

    /// Parse nine text rows, reporting errors relative to `first_line`
    pub(crate) fn parse_rows_at<S: AsRef<str>>(
        rows: &[S],
        first_line: usize,
    ) -> Result<Self, GridError> {
        if rows.len() != GRID_SIZE {
            return Err(GridError::IncompleteBlock {
                line: first_line + rows.len(),
                rows: rows.len(),
            });
        }

        let mut cells = [[0u8; GRID_SIZE]; GRID_SIZE];
        for (r, row) in rows.iter().enumerate() {
            let line = first_line + r;
            let text = row.as_ref().trim_end();
            let found = text.chars().count();
            if found != GRID_SIZE {
                return Err(GridError::RowLength { line, found });
            }
            for (c, ch) in text.chars().enumerate() {
                match ch.to_digit(10) {
                    Some(d @ 1..=9) => cells[r][c] = d as u8,
                    _ => {
                        return Err(GridError::InvalidCell {
                            line,
                            column: c + 1,
                            found: ch,
                        })
                    }
                }
            }
        }

        Ok(Self { cells })
    }

    /// Value at `(row, col)`
    #[inline]
    pub fn cell(&self, row: usize, col: usize) -> u8 {
        self.cells[row][col]
    }

    /// Copy of row `i`
    pub fn row(&self, i: usize) -> [u8; GRID_SIZE] {
        self.cells[i]
    }

    /// Copy of column `i`
    pub fn column(&self, i: usize) -> [u8; GRID_SIZE] {
        std::array::from_fn(|r| self.cells[r][i])
    }

    /// Copy of box `i`, read left to right, top to bottom
    ///
    /// Boxes are numbered row-major: box 0 is top-left, box 8 bottom-right.
    pub fn block(&self, i: usize) -> [u8; GRID_SIZE] {
        let row0 = (i / BOX_SIZE) * BOX_SIZE;
        let col0 = (i % BOX_SIZE) * BOX_SIZE;
        std::array::from_fn(|k| self.cells[row0 + k / BOX_SIZE][col0 + k % BOX_SIZE])
    }

    /// Return a copy with one cell replaced
    ///
    /// Used to build broken variants of a valid puzzle. Returns `None` if
    /// the value lies outside `1..=9`.
    pub fn with_cell(&self, row: usize, col: usize, value: u8) -> Option<Self> {
        let mut cells = self.cells;
        cells[row][col] = value;
        Self::from_cells(cells)
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Grid [")?;
        for row in &self.cells {
            write!(f, "  ")?;
            for v in row {
                write!(f, "{v}")?;
            }
            writeln!(f)?;
        }
        write!(f, "]")
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (r, row) in self.cells.iter().enumerate() {
            if r > 0 {
                writeln!(f)?;
            }
            for v in row {
                write!(f, "{v}")?;
            }
        }
        Ok(())
    }
}
