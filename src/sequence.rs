//! # Frame sequences
//!
//! Simulations write one snapshot per step, with the step number embedded
//! in the file name (`dump_1000.liggghts`, `dump_2000.liggghts`, ...).
//! [`FramePattern`] recovers the naming scheme from one such file and
//! [`FrameTimeline`] maps playback frames to file numbers.

use log::warn;
use std::fs; // Directory listing for sibling discovery
use std::path::{Path, PathBuf};

/// File name split around its first run of digits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePattern {
    /// Everything before the digits, e.g. `dump_`
    pub prefix: String,
    /// The number found in the file the pattern was built from
    pub number: u64,
    /// Everything after the digits, e.g. `.liggghts`
    pub suffix: String,
}

impl FramePattern {
    /// Splits a file name around its first run of ASCII digits
    ///
    /// Returns `None` when the name contains no digits or the run does not
    /// fit in a `u64`.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let start = name.find(|c: char| c.is_ascii_digit())?;
        let len = name[start..]
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(name.len() - start);
        let end = start + len;

        Some(Self {
            prefix: name[..start].to_string(),
            number: name[start..end].parse().ok()?,
            suffix: name[end..].to_string(),
        })
    }

    /// Builds a pattern from the file-name component of a path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let name = path.as_ref().file_name()?.to_str()?;
        Self::from_file_name(name)
    }

    /// `prefix*suffix`
    pub fn glob(&self) -> String {
        format!("{}*{}", self.prefix, self.suffix)
    }

    /// File name for a given run number
    pub fn file_name(&self, number: u64) -> String {
        format!("{}{}{}", self.prefix, number, self.suffix)
    }

    /// Path of the file with run number `number` inside `dir`
    pub fn path_for<P: AsRef<Path>>(&self, dir: P, number: u64) -> PathBuf {
        dir.as_ref().join(self.file_name(number))
    }

    /// Extracts the run number if `name` follows this pattern
    pub fn match_name(&self, name: &str) -> Option<u64> {
        let digits = name
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.suffix.as_str())?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    /// Files in `dir` following this pattern, sorted by run number
    ///
    /// An unreadable directory yields an empty list and a warning.
    pub fn find_matching_files<P: AsRef<Path>>(&self, dir: P) -> Vec<(u64, PathBuf)> {
        let dir = dir.as_ref();
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("error accessing directory {}: {}", dir.display(), e);
                return Vec::new();
            }
        };

        let mut files: Vec<(u64, PathBuf)> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name();
                let number = self.match_name(name.to_str()?)?;
                Some((number, entry.path()))
            })
            .collect();
        files.sort();
        files
    }
}

/// Mapping between playback frames and file run numbers
///
/// Playback frame `start_frame` shows file `file_start`; every following
/// frame advances the file number by `file_increment`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTimeline {
    /// First playback frame
    pub start_frame: i64,
    /// Run number of the file shown at `start_frame`
    pub file_start: i64,
    /// Run number step between consecutive frames
    pub file_increment: i64,
}

impl Default for FrameTimeline {
    fn default() -> Self {
        Self {
            start_frame: 1,
            file_start: 0,
            file_increment: 1,
        }
    }
}

impl FrameTimeline {
    /// Derives a timeline from a sorted list of discovered run numbers
    ///
    /// The increment is the gap between the first two numbers, or 1 when
    /// fewer than two files exist.
    pub fn from_numbers(start_frame: i64, numbers: &[u64]) -> Option<Self> {
        let first = *numbers.first()? as i64;
        let file_increment = match numbers.get(1) {
            Some(&second) if second as i64 > first => second as i64 - first,
            _ => 1,
        };
        Some(Self {
            start_frame,
            file_start: first,
            file_increment,
        })
    }

    pub fn frame_to_file_number(&self, frame: i64) -> i64 {
        self.file_start + (frame - self.start_frame) * self.file_increment
    }

    pub fn file_to_frame(&self, file_number: i64) -> i64 {
        self.start_frame + (file_number - self.file_start).div_euclid(self.file_increment.max(1))
    }
}
