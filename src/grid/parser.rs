//! Input file parsing
//!
//! The input is a sequence of 9-line blocks, each line nine ASCII digits,
//! with one blank line between consecutive blocks. A trailing newline or
//! trailing blank lines after the last block are accepted.

use super::{Grid, GridError, GRID_SIZE};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Read and parse every puzzle in `path`
pub fn load_puzzles(path: &Path) -> Result<Vec<Grid>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;

    let puzzles = parse_puzzles(&contents)
        .with_context(|| format!("Failed to parse input file: {}", path.display()))?;

    tracing::debug!(path = %path.display(), puzzles = puzzles.len(), "Loaded puzzles");
    Ok(puzzles)
}

/// Parse puzzles from the full text of an input file
pub fn parse_puzzles(contents: &str) -> Result<Vec<Grid>, GridError> {
    let lines: Vec<&str> = contents.lines().collect();

    // Trailing blank lines carry no puzzle.
    let end = lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .map_or(0, |p| p + 1);

    let mut puzzles = Vec::new();
    let mut pos = 0;
    while pos < end {
        let block_end = (pos + GRID_SIZE).min(end);
        let block = &lines[pos..block_end];

        if let Some(blank) = block.iter().position(|l| l.trim().is_empty()) {
            return Err(GridError::IncompleteBlock {
                line: pos + blank + 1,
                rows: blank,
            });
        }

        puzzles.push(Grid::parse_rows_at(block, pos + 1)?);
        pos = block_end;

        if pos < end {
            if !lines[pos].trim().is_empty() {
                return Err(GridError::MissingSeparator { line: pos + 1 });
            }
            pos += 1;
        }
    }

    Ok(puzzles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::fixtures::{self, SOLVED};
    use std::io::Write;

    fn block(rows: &[&str]) -> String {
        rows.join("\n")
    }

    #[test]
    fn test_single_puzzle_without_trailing_newline() {
        let text = block(&SOLVED);
        let puzzles = parse_puzzles(&text).unwrap();
        assert_eq!(puzzles, vec![fixtures::solved()]);
    }

    #[test]
    fn test_multiple_puzzles() {
        let broken = fixtures::row0_duplicate().to_string();
        let text = format!("{}\n\n{}\n\n{}\n", block(&SOLVED), broken, block(&SOLVED));
        let puzzles = parse_puzzles(&text).unwrap();
        assert_eq!(puzzles.len(), 3);
        assert_eq!(puzzles[1], fixtures::row0_duplicate());
        assert_eq!(puzzles[2], fixtures::solved());
    }

    #[test]
    fn test_trailing_blank_lines() {
        let text = format!("{}\n\n\n", block(&SOLVED));
        assert_eq!(parse_puzzles(&text).unwrap().len(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_puzzles("").unwrap().is_empty());
        assert!(parse_puzzles("\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_missing_separator() {
        let text = format!("{}\n{}", block(&SOLVED), block(&SOLVED));
        assert_eq!(
            parse_puzzles(&text),
            Err(GridError::MissingSeparator { line: 10 })
        );
    }

    #[test]
    fn test_truncated_last_block() {
        let text = format!("{}\n\n{}", block(&SOLVED), block(&SOLVED[..5]));
        assert_eq!(
            parse_puzzles(&text),
            Err(GridError::IncompleteBlock { line: 16, rows: 5 })
        );
    }

    #[test]
    fn test_blank_line_inside_block() {
        let mut rows = SOLVED.to_vec();
        rows[4] = "";
        let text = format!("{}\n\n{}", block(&SOLVED), block(&rows));
        assert_eq!(
            parse_puzzles(&text),
            Err(GridError::IncompleteBlock { line: 15, rows: 4 })
        );
    }

    #[test]
    fn test_error_line_numbers_are_file_relative() {
        let mut rows = SOLVED.to_vec();
        rows[2] = "19834256a";
        let text = format!("{}\n\n{}", block(&SOLVED), block(&rows));
        assert_eq!(
            parse_puzzles(&text),
            Err(GridError::InvalidCell { line: 13, column: 9, found: 'a' })
        );
    }

    #[test]
    fn test_load_puzzles_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}\n\n{}\n", block(&SOLVED), block(&SOLVED)).unwrap();

        let puzzles = load_puzzles(file.path()).unwrap();
        assert_eq!(puzzles.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_puzzles(Path::new("/nonexistent/puzzles.txt")).unwrap_err();
        assert!(err.to_string().contains("Failed to read input file"));
    }
}
