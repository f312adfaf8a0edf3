//! # Custom columnar data
//!
//! Besides snapshot files, the loader reads plain whitespace-separated
//! tables whose first three columns are always `x y z`. Any further
//! columns are kept as named extras: the fourth column is `col_3`, the
//! fifth `col_4` and so on.

use glam::Vec3;

use crate::error::RowError;
use crate::frame::parse_float;

/// Options for parsing a custom columnar file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomOptions {
    /// Number of leading lines to skip before the table starts
    pub start_line: usize,

    /// Stop after this many data lines. `None` reads the whole file.
    pub max_particles: Option<usize>,
}

impl CustomOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_line(mut self, start_line: usize) -> Self {
        self.start_line = start_line;
        self
    }

    pub fn with_max_particles(mut self, max_particles: usize) -> Self {
        self.max_particles = Some(max_particles);
        self
    }
}

/// An extra column of a custom file
#[derive(Debug, Clone, PartialEq)]
pub struct ExtraColumn {
    /// Synthetic name, `col_3` for the fourth column and so on
    pub name: String,
    /// One value per row
    pub values: Vec<f32>,
}

/// Parsed content of a custom columnar file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnarData {
    /// x, y, z of every row
    pub positions: Vec<Vec3>,

    /// Remaining columns in file order
    pub extra: Vec<ExtraColumn>,
}

impl ColumnarData {
    /// Creates an empty table for rows of `column_count` tokens
    pub fn new(column_count: usize, capacity: usize) -> Self {
        let extra = extra_column_names(column_count)
            .into_iter()
            .map(|name| ExtraColumn {
                name,
                values: Vec::with_capacity(capacity),
            })
            .collect();

        Self {
            positions: Vec::with_capacity(capacity),
            extra,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Looks up an extra column by name
    pub fn column(&self, name: &str) -> Option<&[f32]> {
        self.extra
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.extra.iter().map(|c| c.name.as_str())
    }

    /// Converts and appends one row of tokens
    ///
    /// Extra columns missing from the row are stored as `0.0`; surplus
    /// tokens are ignored. Nothing is appended unless every token converts.
    pub(crate) fn push_row(&mut self, tokens: &[&str], line: usize) -> Result<(), RowError> {
        if tokens.len() < 3 {
            return Err(RowError::ColumnCount {
                line,
                expected: 3 + self.extra.len(),
                found: tokens.len(),
            });
        }

        let x = parse_float(tokens[0], line)? as f32;
        let y = parse_float(tokens[1], line)? as f32;
        let z = parse_float(tokens[2], line)? as f32;

        let mut extras = Vec::with_capacity(self.extra.len());
        for j in 0..self.extra.len() {
            let value = match tokens.get(j + 3) {
                Some(token) => parse_float(token, line)? as f32,
                None => 0.0,
            };
            extras.push(value);
        }

        self.positions.push(Vec3::new(x, y, z));
        for (column, value) in self.extra.iter_mut().zip(extras) {
            column.values.push(value);
        }
        Ok(())
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        self.positions.shrink_to_fit();
        for column in &mut self.extra {
            column.values.shrink_to_fit();
        }
    }
}

/// Names of the extra columns of a row with `column_count` tokens
pub fn extra_column_names(column_count: usize) -> Vec<String> {
    (3..column_count).map(|i| format!("col_{i}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_start_after_xyz() {
        assert_eq!(extra_column_names(3), Vec::<String>::new());
        assert_eq!(extra_column_names(5), vec!["col_3", "col_4"]);
    }

    #[test]
    fn rows_are_atomic() {
        let mut data = ColumnarData::new(4, 0);
        data.push_row(&["1", "2", "3", "4"], 1).unwrap();
        assert!(data.push_row(&["1", "2", "3", "oops"], 2).is_err());
        assert_eq!(data.len(), 1);
        assert_eq!(data.column("col_3"), Some(&[4.0][..]));
    }

    #[test]
    fn short_rows_pad_extras() {
        let mut data = ColumnarData::new(5, 0);
        data.push_row(&["1", "2", "3"], 1).unwrap();
        assert_eq!(data.column("col_4"), Some(&[0.0][..]));
    }
}
