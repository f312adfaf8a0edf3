//! # Bulk array parser
//!
//! Fast path for small and medium snapshot files. The whole file is read in
//! one go and the requested columns are collected into a single row-major
//! [`ColumnBuffer`], which is then split into the arrays of a
//! [`FrameRecord`].
//!
//! The parser is strict: the first malformed or ragged row aborts it with a
//! [`BulkParseError`]. Callers are expected to fall back to the
//! line-oriented parser in [`crate::fallback`], which tolerates bad rows.

use glam::Vec3;
use std::fs;
use std::io;

use crate::error::{BulkParseError, RowError};
use crate::frame::{column, id_from_float, parse_float, FrameRecord};
use crate::sniff::SnapshotHeader;

/// Row-major table of numeric columns
///
/// A file with a single data row is still a `1 × cols` table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnBuffer {
    /// Values, `cols` per row
    data: Vec<f64>,
    /// 1-based source line of each row, for diagnostics
    lines: Vec<usize>,
    rows: usize,
    cols: usize,
}

impl ColumnBuffer {
    /// Creates an empty table with `cols` columns
    pub fn new(cols: usize) -> Self {
        Self {
            data: Vec::new(),
            lines: Vec::new(),
            rows: 0,
            cols,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// One row of the table
    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Source line a row was read from
    pub fn line(&self, row: usize) -> usize {
        self.lines[row]
    }

    /// Iterator over the values of one column
    pub fn column(&self, col: usize) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().skip(col).step_by(self.cols.max(1)).copied()
    }

    fn push_row(&mut self, values: &[f64], line: usize) {
        debug_assert_eq!(values.len(), self.cols);
        self.data.extend_from_slice(values);
        self.lines.push(line);
        self.rows += 1;
    }
}

/// Loads the given columns of every data line into a [`ColumnBuffer`]
///
/// # Arguments
///
/// * `text` - Full file contents
/// * `data_start_line` - 0-based index of the first data line
/// * `usecols` - Column indices to load, in output order
///
/// Blank lines and `#` comments are ignored. Every data line must have the
/// same number of tokens as the first one.
pub fn load_columns(
    text: &str,
    data_start_line: usize,
    usecols: &[usize],
) -> Result<ColumnBuffer, BulkParseError> {
    let mut buffer = ColumnBuffer::new(usecols.len());
    let mut row = Vec::with_capacity(usecols.len());
    let mut expected_tokens = None;

    for (index, line) in text.lines().enumerate().skip(data_start_line) {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line_no = index + 1;
        let tokens: Vec<&str> = line.split_whitespace().collect();

        match expected_tokens {
            None => expected_tokens = Some(tokens.len()),
            Some(expected) if expected != tokens.len() => {
                return Err(BulkParseError::Ragged {
                    line: line_no,
                    expected,
                    found: tokens.len(),
                });
            }
            Some(_) => {}
        }

        row.clear();
        for &col in usecols {
            let token = column(&tokens, col, line_no)?;
            row.push(parse_float(token, line_no)?);
        }
        buffer.push_row(&row, line_no);
    }

    Ok(buffer)
}

/// Splits a buffer laid out as `id x y z radius [fx fy fz]` into a record
///
/// Ids follow the same rule as the line parser: a fractional or
/// out-of-range id fails the row instead of being truncated.
pub fn split_columns(buffer: &ColumnBuffer, with_forces: bool) -> Result<FrameRecord, RowError> {
    let needed = if with_forces { 8 } else { 5 };
    if buffer.cols() < needed {
        return Err(RowError::MissingColumn {
            line: 0,
            column: buffer.cols(),
        });
    }

    let mut record = FrameRecord::with_capacity(buffer.rows(), with_forces);
    for r in 0..buffer.rows() {
        let row = buffer.row(r);
        let id = id_from_float(row[0]).ok_or_else(|| RowError::InvalidNumber {
            line: buffer.line(r),
            token: row[0].to_string(),
        })?;
        record.ids.push(id);
        record
            .positions
            .push(Vec3::new(row[1] as f32, row[2] as f32, row[3] as f32));
        record.radii.push(row[4] as f32);
        if let Some(forces) = record.forces.as_mut() {
            forces.push(Vec3::new(row[5] as f32, row[6] as f32, row[7] as f32));
        }
    }
    Ok(record)
}

/// Parses a snapshot file in a single bulk pass
///
/// Returns a [`BulkParseError`] on the first structural problem; the error
/// is meant to trigger a fallback, not to be shown to users.
pub fn parse_bulk(header: &SnapshotHeader) -> Result<FrameRecord, BulkParseError> {
    let bytes = fs::read(&header.path)?;
    let text = std::str::from_utf8(&bytes)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let usecols = header.map.used_columns();
    let buffer = load_columns(text, header.data_start_line, &usecols)?;
    let record = split_columns(&buffer, header.map.force_columns().is_some())?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = "ITEM: ATOMS id x y z radius\n3 0.0 1.0 2.0 0.5\n1 3.0 4.0 5.0 0.25\n";

    #[test]
    fn single_row_is_two_dimensional() {
        let buffer = load_columns("1 2 3 4 5\n", 0, &[0, 1, 2, 3, 4]).unwrap();
        assert_eq!(buffer.shape(), (1, 5));
        assert_eq!(buffer.row(0), &[1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn columns_are_selected_in_order() {
        let buffer = load_columns(SNAPSHOT, 1, &[4, 0]).unwrap();
        assert_eq!(buffer.shape(), (2, 2));
        assert_eq!(buffer.column(1).collect::<Vec<_>>(), vec![3.0, 1.0]);
        assert_eq!(buffer.column(0).collect::<Vec<_>>(), vec![0.5, 0.25]);
    }

    #[test]
    fn ragged_rows_fail() {
        let text = "1 0 0 0 1\n2 0 0 0\n";
        match load_columns(text, 0, &[0, 1, 2, 3, 4]) {
            Err(BulkParseError::Ragged { line, expected, found }) => {
                assert_eq!((line, expected, found), (2, 5, 4));
            }
            other => panic!("expected ragged error, got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_token_fails() {
        let text = "1 0 0 0 1\n2 0 nan? 0 1\n";
        assert!(matches!(
            load_columns(text, 0, &[0, 1, 2, 3, 4]),
            Err(BulkParseError::Row(RowError::InvalidNumber { line: 2, .. }))
        ));
    }

    #[test]
    fn split_produces_record() {
        let buffer = load_columns(SNAPSHOT, 1, &[0, 1, 2, 3, 4]).unwrap();
        let record = split_columns(&buffer, false).unwrap();
        assert_eq!(record.ids, vec![3, 1]);
        assert_eq!(record.positions[1], Vec3::new(3.0, 4.0, 5.0));
        assert_eq!(record.radii, vec![0.5, 0.25]);
        assert!(record.forces.is_none());
    }

    #[test]
    fn fractional_and_out_of_range_ids_fail() {
        for bad in ["2.7", "3000000000", "-3000000000"] {
            let text = format!("1 0 0 0 1\n{bad} 0 0 0 1\n");
            let buffer = load_columns(&text, 0, &[0, 1, 2, 3, 4]).unwrap();
            match split_columns(&buffer, false) {
                Err(RowError::InvalidNumber { line, .. }) => assert_eq!(line, 2),
                other => panic!("expected invalid id for {bad}, got {other:?}"),
            }
        }
    }

    #[test]
    fn integral_float_ids_are_accepted() {
        let buffer = load_columns("12.0 0 0 0 1\n", 0, &[0, 1, 2, 3, 4]).unwrap();
        assert_eq!(split_columns(&buffer, false).unwrap().ids, vec![12]);
    }
}
