//! # Identity sorting
//!
//! Particles must appear in the same order in every frame so that index
//! `i` always refers to the same particle. Frames are brought into
//! ascending id order with a stable sort: particles sharing an id keep
//! their relative order from the file.

use log::{debug, warn};

use crate::frame::FrameRecord;

/// True iff `ids` never decreases; vacuously true for 0 or 1 ids
pub fn is_ascending(ids: &[i32]) -> bool {
    ids.windows(2).all(|w| w[0] <= w[1])
}

/// Permutation that stable-sorts `ids` ascending
pub fn id_permutation(ids: &[i32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..ids.len()).collect();
    // sort_by_key is stable
    order.sort_by_key(|&i| ids[i]);
    order
}

fn gather<T: Copy>(values: &[T], order: &[usize]) -> Vec<T> {
    order.iter().map(|&i| values[i]).collect()
}

/// Returns a copy of `record` ordered by ascending id
///
/// The same permutation is applied to ids, positions, radii and forces.
/// An inconsistent record (arrays of different lengths) is returned
/// unchanged with a warning.
pub fn sort_by_id(record: &FrameRecord) -> FrameRecord {
    if !record.is_consistent() {
        warn!(
            "inconsistent frame data ({} ids, {} positions, {} radii), skipping sort",
            record.ids.len(),
            record.positions.len(),
            record.radii.len()
        );
        return record.clone();
    }
    if is_ascending(&record.ids) {
        return record.clone();
    }

    let order = id_permutation(&record.ids);
    let sorted = FrameRecord {
        ids: gather(&record.ids, &order),
        positions: gather(&record.positions, &order),
        radii: gather(&record.radii, &order),
        forces: record.forces.as_deref().map(|f| gather(f, &order)),
    };
    debug!("first sorted ids: {:?}", &sorted.ids[..sorted.ids.len().min(10)]);
    sorted
}

/// Per-dataset memo of whether frames arrive already sorted
///
/// The check runs once, on the first frame with at least two particles,
/// and its answer is reused for every later frame of the same dataset.
/// Empty and single-particle frames say nothing about the file order and
/// leave the state [`Unknown`](SortState::Unknown).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortState {
    /// No frame with two or more particles seen yet
    #[default]
    Unknown,
    /// Frames are written in ascending id order and are used as is
    Ascending,
    /// Frames must be sorted by id before use
    Unsorted,
}

impl SortState {
    /// Resolves the state from `ids` if it is still unknown
    pub fn observe(&mut self, ids: &[i32]) -> SortState {
        if *self == SortState::Unknown && ids.len() >= 2 {
            *self = if is_ascending(ids) {
                SortState::Ascending
            } else {
                SortState::Unsorted
            };
            debug!("data is sorted: {}", *self == SortState::Ascending);
        }
        *self
    }

    /// Forget the memo, e.g. when a new dataset is opened
    pub fn reset(&mut self) {
        *self = SortState::Unknown;
    }
}
