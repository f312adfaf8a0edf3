//! # Line-oriented parsers
//!
//! Slow but tolerant parsers that read a file one line at a time. A line
//! that cannot be converted is logged, counted and dropped; the rest of the
//! file is still returned.
//!
//! Two flavors live here:
//! - [`parse_snapshot_lines`] rebuilds a [`FrameRecord`] from a snapshot
//!   file after the bulk parser gave up on it.
//! - [`parse_columnar`] reads custom `x y z [extra...]` tables.

use glam::Vec3;
use log::{debug, info, warn};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::columnar::{ColumnarData, CustomOptions};
use crate::error::{LoaderError, RowError};
use crate::frame::{column, parse_float, parse_id, FrameRecord, ParseMethod, ParseReport};
use crate::sniff::{open_existing, ColumnMap, SnapshotHeader};

/// Reads lines as lossily decoded UTF-8, tracking 1-based line numbers
pub(crate) struct LossyLines<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
    line_no: usize,
}

impl<R: Read> LossyLines<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            buf: Vec::new(),
            line_no: 0,
        }
    }

    /// Reads the next line, returning its number and text
    pub(crate) fn next_line(&mut self) -> std::io::Result<Option<(usize, String)>> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        Ok(Some((
            self.line_no,
            String::from_utf8_lossy(&self.buf).into_owned(),
        )))
    }

    /// Skips `n` lines; returns false if the input ended first
    pub(crate) fn skip(&mut self, n: usize) -> std::io::Result<bool> {
        for _ in 0..n {
            if self.next_line()?.is_none() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Converts one snapshot data line using the resolved columns
fn parse_snapshot_row(
    tokens: &[&str],
    map: &ColumnMap,
    forces: Option<[usize; 3]>,
    line: usize,
) -> Result<(i32, Vec3, f32, Option<Vec3>), RowError> {
    let float = |col: usize| -> Result<f32, RowError> {
        Ok(parse_float(column(tokens, col, line)?, line)? as f32)
    };

    let id = parse_id(column(tokens, map.id, line)?, line)?;
    let position = Vec3::new(float(map.x)?, float(map.y)?, float(map.z)?);
    let radius = float(map.radius)?;
    let force = match forces {
        Some([fx, fy, fz]) => Some(Vec3::new(float(fx)?, float(fy)?, float(fz)?)),
        None => None,
    };
    Ok((id, position, radius, force))
}

/// Rebuilds a snapshot record line by line
///
/// Blank lines and `#` comments are ignored. Each other line contributes to every array or to none of them, so the returned
/// record is always consistent.
pub fn parse_snapshot_lines(
    header: &SnapshotHeader,
) -> Result<(FrameRecord, ParseReport), LoaderError> {
    let file = open_existing(&header.path)?;
    let mut lines = LossyLines::new(file);
    lines.skip(header.data_start_line)?;

    let forces = header.map.force_columns();
    let mut record = FrameRecord::with_capacity(0, forces.is_some());
    let mut skipped = 0usize;

    while let Some((line_no, text)) = lines.next_line()? {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        // blank lines and comments are not data, same as in the bulk parser
        if tokens.first().map_or(true, |t| t.starts_with('#')) {
            continue;
        }

        match parse_snapshot_row(&tokens, &header.map, forces, line_no) {
            Ok((id, position, radius, force)) => {
                record.ids.push(id);
                record.positions.push(position);
                record.radii.push(radius);
                if let (Some(all), Some(force)) = (record.forces.as_mut(), force) {
                    all.push(force);
                }
            }
            Err(e) => {
                warn!("{}: skipping {}", header.path.display(), e);
                skipped += 1;
            }
        }
    }

    info!(
        "Parsed {} particles using fallback method ({} lines skipped)",
        record.len(),
        skipped
    );
    let report = ParseReport::new(ParseMethod::Fallback, record.len(), skipped);
    Ok((record, report))
}

/// Parses a custom columnar file line by line
///
/// The first line after `start_line` fixes the column count; it must have
/// at least three tokens. Later lines with a different token count are
/// dropped. When `max_particles` is set, output buffers are pre-sized to at
/// most `prealloc_limit` rows and reading stops after that many data lines.
pub fn parse_columnar<P: AsRef<Path>>(
    path: P,
    options: &CustomOptions,
    prealloc_limit: usize,
) -> Result<(ColumnarData, ParseReport), LoaderError> {
    let path = path.as_ref();
    let file = open_existing(path)?;
    let mut lines = LossyLines::new(file);

    if !lines.skip(options.start_line)? {
        return Err(LoaderError::Format(format!(
            "{} has fewer than {} lines",
            path.display(),
            options.start_line
        )));
    }

    let (first_no, first) = lines.next_line()?.ok_or_else(|| {
        LoaderError::Format(format!("{}: no data after line {}", path.display(), options.start_line))
    })?;
    let first_tokens: Vec<&str> = first.split_whitespace().collect();
    let num_columns = first_tokens.len();
    if num_columns < 3 {
        return Err(LoaderError::Format(format!(
            "{}: at least x, y, z columns are required, found {}",
            path.display(),
            num_columns
        )));
    }

    let capacity = options
        .max_particles
        .map_or(0, |max| max.min(prealloc_limit));
    let mut data = ColumnarData::new(num_columns, capacity);
    let mut skipped = 0usize;

    if options.max_particles == Some(0) {
        return Ok((data, ParseReport::new(ParseMethod::Columnar, 0, 0)));
    }

    if let Err(e) = data.push_row(&first_tokens, first_no) {
        warn!("{}: skipping first line: {}", path.display(), e);
        skipped += 1;
    }

    let mut examined = 1usize;
    while let Some((line_no, text)) = lines.next_line()? {
        if options.max_particles.map_or(false, |max| examined >= max) {
            break;
        }
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        examined += 1;

        let result = if tokens.len() != num_columns {
            Err(RowError::ColumnCount {
                line: line_no,
                expected: num_columns,
                found: tokens.len(),
            })
        } else {
            data.push_row(&tokens, line_no)
        };

        if let Err(e) = result {
            warn!("{}: skipping {}", path.display(), e);
            skipped += 1;
        }
    }

    if options.max_particles.is_some() {
        data.shrink_to_fit();
    }

    debug!(
        "{}: {} rows, {} extra columns",
        path.display(),
        data.len(),
        data.extra.len()
    );
    let report = ParseReport::new(ParseMethod::Columnar, data.len(), skipped);
    Ok((data, report))
}
