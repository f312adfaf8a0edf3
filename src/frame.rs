//! # Frame records
//!
//! A [`FrameRecord`] is the parsed content of one snapshot file: parallel
//! arrays of particle ids, positions, radii and, when the header declares
//! all three force columns, forces.

use glam::Vec3;

use crate::error::RowError;

/// One timestep's particle data
///
/// All present arrays are index-aligned: entry `i` of every array belongs
/// to the particle with id `ids[i]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameRecord {
    /// Particle ids, one per particle
    pub ids: Vec<i32>,

    /// Particle positions (x, y, z)
    pub positions: Vec<Vec3>,

    /// Particle radii
    pub radii: Vec<f32>,

    /// Per-particle force vectors, present only if the header declared
    /// `fx`, `fy` and `fz`
    pub forces: Option<Vec<Vec3>>,
}

impl FrameRecord {
    /// Creates an empty record, with force storage if `with_forces` is set
    pub fn with_capacity(capacity: usize, with_forces: bool) -> Self {
        Self {
            ids: Vec::with_capacity(capacity),
            positions: Vec::with_capacity(capacity),
            radii: Vec::with_capacity(capacity),
            forces: with_forces.then(|| Vec::with_capacity(capacity)),
        }
    }

    /// Number of particles, taken from the id array
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True for a frame without particles, e.g. before insertion starts
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn has_forces(&self) -> bool {
        self.forces.is_some()
    }

    /// True if every present array has the same length as `ids`
    ///
    /// Inconsistent records are never sorted or used for reference lookups.
    pub fn is_consistent(&self) -> bool {
        let n = self.ids.len();
        self.positions.len() == n
            && self.radii.len() == n
            && self.forces.as_ref().map_or(true, |f| f.len() == n)
    }
}

/// Which parser produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMethod {
    /// Served from the frame cache
    Cache,
    /// Single-pass bulk array parser
    Bulk,
    /// Line-oriented fallback parser
    Fallback,
    /// Line-oriented custom columnar parser
    Columnar,
    /// Memory-mapped windowed parser
    Streaming,
}

/// Diagnostics summary of one parse
#[derive(Debug, Clone, PartialEq)]
pub struct ParseReport {
    /// Parser that produced the data
    pub method: ParseMethod,
    /// Number of particles returned
    pub particles: usize,
    /// Number of data lines dropped as malformed
    pub skipped_lines: usize,
}

impl ParseReport {
    pub fn new(method: ParseMethod, particles: usize, skipped_lines: usize) -> Self {
        Self {
            method,
            particles,
            skipped_lines,
        }
    }
}

/// Parses a floating point token
#[inline]
pub(crate) fn parse_float(token: &str, line: usize) -> Result<f64, RowError> {
    token.parse::<f64>().map_err(|_| RowError::InvalidNumber {
        line,
        token: token.to_string(),
    })
}

/// Parses a particle id token
///
/// Integer tokens are taken as is. Integral floats (`"12.0"`) are accepted
/// since some writers emit every column in float notation.
#[inline]
pub(crate) fn parse_id(token: &str, line: usize) -> Result<i32, RowError> {
    if let Ok(id) = token.parse::<i32>() {
        return Ok(id);
    }
    token
        .parse::<f64>()
        .ok()
        .and_then(id_from_float)
        .ok_or_else(|| RowError::InvalidNumber {
            line,
            token: token.to_string(),
        })
}

/// Converts a float to an id if it is integral and fits in `i32`
#[inline]
pub(crate) fn id_from_float(v: f64) -> Option<i32> {
    (v.fract() == 0.0 && v >= i32::MIN as f64 && v <= i32::MAX as f64).then(|| v as i32)
}

/// Fetches the token at `column`, or reports it missing
#[inline]
pub(crate) fn column<'a>(
    tokens: &[&'a str],
    column: usize,
    line: usize,
) -> Result<&'a str, RowError> {
    tokens
        .get(column)
        .copied()
        .ok_or(RowError::MissingColumn { line, column })
}
