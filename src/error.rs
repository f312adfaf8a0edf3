//! # Error types
//!
//! Three layers of failure exist when loading a frame:
//!
//! - [`LoaderError`] is fatal for a whole file and is returned to the caller.
//! - [`BulkParseError`] means the fast bulk path gave up on a file. The loader
//!   recovers by re-reading the same file with the line-oriented parser.
//! - [`RowError`] describes a single bad data line. It is logged, counted in
//!   the [`ParseReport`](crate::frame::ParseReport) and the line is dropped.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort loading of a single file
#[derive(Error, Debug)]
pub enum LoaderError {
    /// The requested path does not exist
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// I/O errors from the underlying file system
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No recognizable header in a snapshot file, or too few columns in a
    /// custom columnar file
    #[error("format error: {0}")]
    Format(String),

    /// Invalid loader configuration
    #[error("configuration error: {0}")]
    Config(String),
}

/// A single malformed data line
///
/// Line numbers are 1-based and refer to the physical line in the file.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    /// The line does not have the token count established by the first row
    #[error("line {line}: expected {expected} columns, found {found}")]
    ColumnCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A resolved column index lies beyond the end of the line
    #[error("line {line}: column {column} is missing")]
    MissingColumn { line: usize, column: usize },

    /// A token could not be converted to a number
    #[error("line {line}: invalid number {token:?}")]
    InvalidNumber { line: usize, token: String },
}

impl RowError {
    /// The 1-based line number the error refers to
    pub fn line(&self) -> usize {
        match self {
            RowError::ColumnCount { line, .. }
            | RowError::MissingColumn { line, .. }
            | RowError::InvalidNumber { line, .. } => *line,
        }
    }
}

/// Structural failure of the bulk array parser
#[derive(Error, Debug)]
pub enum BulkParseError {
    /// A row could not be converted
    #[error("bulk parse failed: {0}")]
    Row(#[from] RowError),

    /// Rows do not all have the same number of tokens
    #[error("ragged data at line {line}: expected {expected} tokens, found {found}")]
    Ragged {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// The file could not be read
    #[error("bulk read failed: {0}")]
    Io(#[from] std::io::Error),
}
