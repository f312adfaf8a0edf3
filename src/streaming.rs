//! # Large-file streaming parser
//!
//! Custom columnar files can run to many gigabytes. This parser never
//! decodes the whole file: the file is memory-mapped and walked in windows
//! of roughly `chunk_size` bytes. Every window is extended to the next
//! newline, so no line is ever split across two windows, and each window
//! is decoded and tokenized on its own.
//!
//! ## Example
//!
//! ```no_run
//! use dumpframes::streaming::LargeFileParser;
//!
//! let (data, report) = LargeFileParser::new("huge_table.txt")
//!     .with_start_line(2)
//!     .parse()
//!     .unwrap();
//! println!("{} rows, {} skipped", data.len(), report.skipped_lines);
//! ```

use log::{debug, info, warn};
use memmap2::{Mmap, MmapOptions}; // The file is viewed, never read whole
use std::path::{Path, PathBuf};

use crate::columnar::ColumnarData;
use crate::error::LoaderError;
use crate::frame::{ParseMethod, ParseReport};
use crate::sniff::open_existing;

/// Default window size in bytes (10 MiB)
pub const DEFAULT_CHUNK_SIZE: usize = 10 * 1024 * 1024;

/// Progress is logged each time this many more rows have been loaded
const PROGRESS_EVERY: usize = 100_000;

/// Memory-mapped parser for custom columnar files
pub struct LargeFileParser {
    /// Path to the file
    path: PathBuf,

    /// Number of leading lines to skip
    start_line: usize,

    /// Approximate window size in bytes
    chunk_size: usize,
}

impl LargeFileParser {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            start_line: 0,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_start_line(mut self, start_line: usize) -> Self {
        self.start_line = start_line;
        self
    }

    /// Set the window size; values below one byte are raised to one
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Maps the file and parses every window
    ///
    /// The first line after `start_line` fixes the number of columns and
    /// must have at least three tokens. Later lines with fewer than three
    /// tokens, or with a token that does not convert, are skipped.
    pub fn parse(&self) -> Result<(ColumnarData, ParseReport), LoaderError> {
        let file = open_existing(&self.path)?;
        if file.metadata()?.len() == 0 {
            return Err(LoaderError::Format(format!(
                "{} is empty",
                self.path.display()
            )));
        }

        // Mapping is unsafe because the file could be truncated underneath
        // us; the map is only read and dropped before returning.
        let mmap: Mmap = unsafe { MmapOptions::new().map(&file)? };
        let bytes: &[u8] = &mmap;

        // Seek past the skipped lines
        let mut pos = 0usize;
        for _ in 0..self.start_line {
            match next_line_start(bytes, pos) {
                Some(next) => pos = next,
                None => {
                    return Err(LoaderError::Format(format!(
                        "{} has fewer than {} lines",
                        self.path.display(),
                        self.start_line
                    )))
                }
            }
        }

        // Sample the first data line for the column layout
        let sample_end = next_line_start(bytes, pos).unwrap_or(bytes.len());
        let column_count = String::from_utf8_lossy(&bytes[pos..sample_end])
            .split_whitespace()
            .count();
        if column_count < 3 {
            return Err(LoaderError::Format(format!(
                "{}: file must have at least 3 columns (x, y, z), found {}",
                self.path.display(),
                column_count
            )));
        }

        let mut data = ColumnarData::new(column_count, 0);
        let mut skipped = 0usize;
        let mut line_no = self.start_line;
        let mut next_progress = PROGRESS_EVERY;

        for window in LineWindows::new(&bytes[pos..], self.chunk_size) {
            let text = String::from_utf8_lossy(window);
            for line in text.lines() {
                line_no += 1;
                let tokens: Vec<&str> = line.split_whitespace().collect();
                if tokens.is_empty() {
                    continue;
                }
                if let Err(e) = data.push_row(&tokens, line_no) {
                    debug!("{}: skipping {}", self.path.display(), e);
                    skipped += 1;
                }
            }

            if data.len() >= next_progress {
                info!("Loaded {} particles...", data.len());
                next_progress = (data.len() / PROGRESS_EVERY + 1) * PROGRESS_EVERY;
            }
        }

        if skipped > 0 {
            warn!(
                "{}: skipped {} malformed lines",
                self.path.display(),
                skipped
            );
        }

        let report = ParseReport::new(ParseMethod::Streaming, data.len(), skipped);
        Ok((data, report))
    }
}

/// Offset just past the next newline at or after `from`
fn next_line_start(bytes: &[u8], from: usize) -> Option<usize> {
    bytes[from..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|i| from + i + 1)
}

/// Iterator over newline-aligned windows of a byte slice
///
/// Each window holds at least `chunk_size` bytes (except the last) and
/// ends just after a newline or at the end of the input.
pub struct LineWindows<'a> {
    bytes: &'a [u8],
    pos: usize,
    chunk_size: usize,
}

impl<'a> LineWindows<'a> {
    pub fn new(bytes: &'a [u8], chunk_size: usize) -> Self {
        Self {
            bytes,
            pos: 0,
            chunk_size: chunk_size.max(1),
        }
    }
}

impl<'a> Iterator for LineWindows<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.bytes.len() {
            return None;
        }

        let tentative = (self.pos + self.chunk_size).min(self.bytes.len());
        let end = if tentative == self.bytes.len() {
            tentative
        } else {
            // Extend to the end of the line containing byte `tentative - 1`
            next_line_start(self.bytes, tentative - 1).unwrap_or(self.bytes.len())
        };

        let window = &self.bytes[self.pos..end];
        self.pos = end;
        Some(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_end_on_line_boundaries() {
        let text = b"1 2 3\n4 5 6\n7 8 9\n";
        let windows: Vec<&[u8]> = LineWindows::new(text, 4).collect();
        assert_eq!(windows, vec![&b"1 2 3\n"[..], &b"4 5 6\n"[..], &b"7 8 9\n"[..]]);
    }

    #[test]
    fn windows_cover_input_without_trailing_newline() {
        let text = b"1 2 3\n4 5 6";
        let joined: Vec<u8> = LineWindows::new(text, 7).flatten().copied().collect();
        assert_eq!(joined, text.to_vec());
    }

    #[test]
    fn large_window_takes_everything() {
        let text = b"1 2 3\n4 5 6\n";
        assert_eq!(LineWindows::new(text, 1 << 20).count(), 1);
    }
}
