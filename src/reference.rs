//! # Reference positions
//!
//! Once a frame is designated as the reference frame, the position of
//! every particle in it is remembered by id. Later frames look their
//! particles up here to compute displacements.

use glam::Vec3;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A stored reference position, in the order it was captured
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    /// Id of the particle in the reference frame
    pub particle_id: i32,
    /// Where that particle was in the reference frame
    pub position: Vec3,
}

/// Map from particle id to reference position
///
/// Each [`set_reference`](Self::set_reference) replaces the whole store;
/// entries are never merged across calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceStore {
    lookup: HashMap<i32, Vec3>,
    entries: Vec<ReferenceEntry>,
    frame: Option<i32>,
}

/// Per-particle reference data for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceAttributes {
    /// Reference position, or the current position when the particle has none
    pub reference_positions: Vec<Vec3>,
    /// 1.0 when a reference exists for the particle, 0.0 otherwise
    pub has_reference: Vec<f32>,
    /// Number of particles with a reference
    pub matches: usize,
}

impl ReferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from persisted entries; later duplicates win
    pub fn from_entries(entries: Vec<ReferenceEntry>, frame: Option<i32>) -> Self {
        let lookup = entries
            .iter()
            .map(|e| (e.particle_id, e.position))
            .collect();
        Self {
            lookup,
            entries,
            frame,
        }
    }

    /// Replaces the store with the given positions
    ///
    /// `positions[i]` belongs to `ids[i]`. If an id appears more than once
    /// the last position wins. Extra elements of the longer slice are
    /// ignored.
    pub fn set_reference(&mut self, positions: &[Vec3], ids: &[i32], frame: i32) {
        if positions.len() != ids.len() {
            warn!(
                "reference frame has {} positions but {} ids",
                positions.len(),
                ids.len()
            );
        }

        self.lookup.clear();
        self.entries.clear();
        self.entries.reserve(ids.len().min(positions.len()));

        for (&position, &particle_id) in positions.iter().zip(ids) {
            self.entries.push(ReferenceEntry {
                particle_id,
                position,
            });
            self.lookup.insert(particle_id, position);
        }
        self.frame = Some(frame);

        info!(
            "Reference frame set to {} with {} positions ({} unique ids)",
            frame,
            self.entries.len(),
            self.lookup.len()
        );
    }

    /// Reference position of a particle
    pub fn lookup(&self, id: i32) -> Option<Vec3> {
        self.lookup.get(&id).copied()
    }

    /// Frame designated as reference, if any
    pub fn frame(&self) -> Option<i32> {
        self.frame
    }

    pub fn is_set(&self) -> bool {
        self.frame.is_some()
    }

    /// Stored entries in capture order
    pub fn entries(&self) -> &[ReferenceEntry] {
        &self.entries
    }

    /// Number of distinct ids with a reference
    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    /// Reference data for every particle of a frame
    pub fn attributes(&self, ids: &[i32], positions: &[Vec3]) -> ReferenceAttributes {
        let n = ids.len().min(positions.len());
        let mut attrs = ReferenceAttributes {
            reference_positions: Vec::with_capacity(n),
            has_reference: Vec::with_capacity(n),
            matches: 0,
        };

        for (&id, &current) in ids.iter().zip(positions) {
            match self.lookup(id) {
                Some(reference) => {
                    attrs.reference_positions.push(reference);
                    attrs.has_reference.push(1.0);
                    attrs.matches += 1;
                }
                None => {
                    attrs.reference_positions.push(current);
                    attrs.has_reference.push(0.0);
                }
            }
        }
        attrs
    }

    /// `current - reference` per particle, zero where no reference exists
    pub fn displacements(&self, ids: &[i32], positions: &[Vec3]) -> Vec<Vec3> {
        ids.iter()
            .zip(positions)
            .map(|(&id, &current)| {
                self.lookup(id)
                    .map_or(Vec3::ZERO, |reference| current - reference)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_previous_reference() {
        let mut store = ReferenceStore::new();
        assert!(!store.is_set());

        store.set_reference(&[Vec3::splat(1.0)], &[10], 1);
        store.set_reference(&[Vec3::splat(2.0)], &[20], 5);

        assert_eq!(store.lookup(10), None);
        assert_eq!(store.lookup(20), Some(Vec3::splat(2.0)));
        assert_eq!(store.frame(), Some(5));
        assert_eq!(store.entries().len(), 1);
    }

    #[test]
    fn duplicate_ids_last_write_wins() {
        let mut store = ReferenceStore::new();
        store.set_reference(&[Vec3::X, Vec3::Y], &[7, 7], 0);
        assert_eq!(store.lookup(7), Some(Vec3::Y));
        assert_eq!(store.len(), 1);
        assert_eq!(store.entries().len(), 2);
    }

    #[test]
    fn attributes_fall_back_to_current_position() {
        let mut store = ReferenceStore::new();
        store.set_reference(&[Vec3::ZERO], &[1], 0);

        let current = [Vec3::ONE, Vec3::splat(3.0)];
        let attrs = store.attributes(&[1, 2], &current);
        assert_eq!(attrs.reference_positions, vec![Vec3::ZERO, Vec3::splat(3.0)]);
        assert_eq!(attrs.has_reference, vec![1.0, 0.0]);
        assert_eq!(attrs.matches, 1);

        assert_eq!(
            store.displacements(&[1, 2], &current),
            vec![Vec3::ONE, Vec3::ZERO]
        );
    }

    #[test]
    fn from_entries_rebuilds_lookup() {
        let entries = vec![
            ReferenceEntry { particle_id: 3, position: Vec3::X },
            ReferenceEntry { particle_id: 3, position: Vec3::Z },
        ];
        let store = ReferenceStore::from_entries(entries, Some(2));
        assert_eq!(store.lookup(3), Some(Vec3::Z));
        assert_eq!(store.frame(), Some(2));
    }
}
