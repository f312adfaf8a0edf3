//! # Snapshot header sniffing
//!
//! Snapshot files carry a few `ITEM:` sections before the particle table.
//! The table itself starts after a line of the form
//!
//! ```text
//! ITEM: ATOMS id type x y z radius fx fy fz
//! ```
//!
//! whose trailing tokens name the columns of every following data line.
//! The sniffer scans for that line and resolves the semantic fields the
//! loader needs to column indices.

use std::fs::File; // Snapshot files are opened once per sniff
use std::io::{BufRead, BufReader}; // Header lines are read one at a time
use std::path::{Path, PathBuf};

use crate::error::LoaderError;

/// Token sequence that opens the particle table
pub const ATOMS_MARKER: &str = "ITEM: ATOMS";

/// Section holding the simulation step of a snapshot
pub const TIMESTEP_MARKER: &str = "ITEM: TIMESTEP";

/// Resolved column indices for the fields of a [`FrameRecord`](crate::FrameRecord)
///
/// Required fields fall back to the legacy fixed layout
/// (`id x y z radius`) when the header does not name them. Force columns
/// are never guessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    /// Particle id column
    pub id: usize,
    /// Position columns
    pub x: usize,
    pub y: usize,
    pub z: usize,
    /// Particle radius column
    pub radius: usize,
    /// Force columns, `None` when the header does not name them
    pub fx: Option<usize>,
    pub fy: Option<usize>,
    pub fz: Option<usize>,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            id: 0,
            x: 1,
            y: 2,
            z: 3,
            radius: 4,
            fx: None,
            fy: None,
            fz: None,
        }
    }
}

impl ColumnMap {
    /// Resolves field names against a header's column list
    pub fn resolve<S: AsRef<str>>(columns: &[S]) -> Self {
        let find = |name: &str| columns.iter().position(|c| c.as_ref() == name);
        let defaults = ColumnMap::default();

        Self {
            id: find("id").unwrap_or(defaults.id),
            x: find("x").unwrap_or(defaults.x),
            y: find("y").unwrap_or(defaults.y),
            z: find("z").unwrap_or(defaults.z),
            radius: find("radius").unwrap_or(defaults.radius),
            fx: find("fx"),
            fy: find("fy"),
            fz: find("fz"),
        }
    }

    /// The three force column indices, if all of them were resolved
    pub fn force_columns(&self) -> Option<[usize; 3]> {
        match (self.fx, self.fy, self.fz) {
            (Some(fx), Some(fy), Some(fz)) => Some([fx, fy, fz]),
            _ => None,
        }
    }

    /// Columns to load, in record order: id, x, y, z, radius and then the
    /// force columns when all three are present
    pub fn used_columns(&self) -> Vec<usize> {
        let mut cols = vec![self.id, self.x, self.y, self.z, self.radius];
        if let Some(forces) = self.force_columns() {
            cols.extend_from_slice(&forces);
        }
        cols
    }
}

/// Everything learned from a snapshot file before its particle table
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotHeader {
    /// Path the header was read from
    pub path: PathBuf,

    /// 0-based index of the first line after the atoms marker
    pub data_start_line: usize,

    /// Column names declared after the marker
    pub columns: Vec<String>,

    /// Field to column index mapping
    pub map: ColumnMap,

    /// Value of the `ITEM: TIMESTEP` section, when it precedes the table
    pub timestep: Option<u64>,
}

/// Scans a snapshot file for its atoms header
///
/// Lines are read one at a time and scanning stops at the marker, so only
/// the preamble of the file is touched. A file without a marker line is a
/// [`LoaderError::Format`].
pub fn sniff_header<P: AsRef<Path>>(path: P) -> Result<SnapshotHeader, LoaderError> {
    let path = path.as_ref();
    let file = open_existing(path)?;
    let mut reader = BufReader::new(file);

    let mut buf = Vec::new();
    let mut index = 0usize;
    let mut timestep = None;
    let mut expect_timestep = false;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim();

        if expect_timestep {
            timestep = line.parse::<u64>().ok();
            expect_timestep = false;
        } else if line.starts_with(TIMESTEP_MARKER) {
            expect_timestep = true;
        } else if line.starts_with(ATOMS_MARKER) {
            // The marker is two tokens: "ITEM:" and "ATOMS"
            let columns: Vec<String> = line
                .split_whitespace()
                .skip(2)
                .map(str::to_string)
                .collect();
            let map = ColumnMap::resolve(&columns);

            return Ok(SnapshotHeader {
                path: path.to_path_buf(),
                data_start_line: index + 1,
                columns,
                map,
                timestep,
            });
        }
        index += 1;
    }

    Err(LoaderError::Format(format!(
        "no atom data found in {}",
        path.display()
    )))
}

/// Opens a file, mapping a missing path to [`LoaderError::NotFound`]
pub(crate) fn open_existing(path: &Path) -> Result<File, LoaderError> {
    File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => LoaderError::NotFound(path.to_path_buf()),
        _ => LoaderError::Io(e),
    })
}
