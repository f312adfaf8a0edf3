//! # Frame cache
//!
//! Bounded map from file path to parsed [`FrameRecord`], used to make
//! scrubbing back and forth over a timeline cheap. Eviction is strict FIFO:
//! when the cache is full the entry that was inserted first goes, no matter
//! how recently it was read.
//!
//! Each entry can also carry the id-sorted view of its frame, so a dataset
//! whose files are not in id order is sorted once per cached frame rather
//! than on every visit.

use log::debug;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::LoaderError;
use crate::frame::FrameRecord;

/// Default number of cached frames
pub const DEFAULT_CAPACITY: usize = 5;

/// Largest accepted capacity
pub const MAX_CAPACITY: usize = 20;

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that had to parse the file
    pub misses: u64,
    /// `hits / (hits + misses)`, or 0 before the first lookup
    pub hit_rate: f64,
    /// Number of cached frames
    pub size: usize,
}

/// A cached frame in file order, plus its id-sorted view once computed
#[derive(Debug)]
struct CacheEntry {
    record: Arc<FrameRecord>,
    sorted: Option<Arc<FrameRecord>>,
}

/// FIFO cache of parsed frames keyed by path
#[derive(Debug)]
pub struct FrameCache {
    entries: HashMap<PathBuf, CacheEntry>,
    order: VecDeque<PathBuf>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl Default for FrameCache {
    fn default() -> Self {
        Self::with_valid_capacity(DEFAULT_CAPACITY)
    }
}

impl FrameCache {
    /// Creates an empty cache holding at most `capacity` frames
    ///
    /// The capacity must lie in `1..=20`.
    pub fn new(capacity: usize) -> Result<Self, LoaderError> {
        validate_capacity(capacity)?;
        Ok(Self::with_valid_capacity(capacity))
    }

    fn with_valid_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
            hits: 0,
            misses: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the cached frame for `path`, counting a hit or a miss
    pub fn lookup(&mut self, path: &Path) -> Option<Arc<FrameRecord>> {
        match self.entries.get(path) {
            Some(entry) => {
                self.hits += 1;
                debug!("cache hit: {}", path.display());
                Some(Arc::clone(&entry.record))
            }
            None => {
                self.misses += 1;
                debug!("cache miss: {}", path.display());
                None
            }
        }
    }

    /// Checks for an entry without touching the counters
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Inserts a frame, evicting the oldest entry if the cache is full
    ///
    /// Storing a path that is already cached replaces its frame (dropping
    /// any sorted view) but keeps its original insertion slot.
    pub fn store(&mut self, path: &Path, record: Arc<FrameRecord>) {
        let entry = CacheEntry {
            record,
            sorted: None,
        };
        if let Some(existing) = self.entries.get_mut(path) {
            *existing = entry;
            return;
        }

        while self.entries.len() >= self.capacity {
            if !self.evict_oldest() {
                break;
            }
        }

        self.order.push_back(path.to_path_buf());
        self.entries.insert(path.to_path_buf(), entry);
    }

    /// The sorted view stored for `path`, if `record` is still its frame
    ///
    /// Does not touch the hit/miss counters.
    pub fn sorted_view(&self, path: &Path, record: &Arc<FrameRecord>) -> Option<Arc<FrameRecord>> {
        self.entries
            .get(path)
            .filter(|entry| Arc::ptr_eq(&entry.record, record))
            .and_then(|entry| entry.sorted.clone())
    }

    /// Attaches the sorted view of `record` to its cache entry
    ///
    /// Ignored when `path` is not cached or now holds a different frame.
    pub fn attach_sorted(&mut self, path: &Path, record: &Arc<FrameRecord>, sorted: Arc<FrameRecord>) {
        if let Some(entry) = self.entries.get_mut(path) {
            if Arc::ptr_eq(&entry.record, record) {
                entry.sorted = Some(sorted);
            }
        }
    }

    /// Changes the capacity, evicting the oldest entries if it shrank
    pub fn set_capacity(&mut self, capacity: usize) -> Result<(), LoaderError> {
        validate_capacity(capacity)?;
        self.capacity = capacity;
        while self.entries.len() > self.capacity {
            self.evict_oldest();
        }
        Ok(())
    }

    /// Drops every entry and resets the counters
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn stats(&self) -> CacheStats {
        let total = self.hits + self.misses;
        let hit_rate = if total > 0 {
            self.hits as f64 / total as f64
        } else {
            0.0
        };
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            hit_rate,
            size: self.entries.len(),
        }
    }

    fn evict_oldest(&mut self) -> bool {
        match self.order.pop_front() {
            Some(oldest) => {
                debug!("cache evict: {}", oldest.display());
                self.entries.remove(&oldest);
                true
            }
            None => false,
        }
    }
}

fn validate_capacity(capacity: usize) -> Result<(), LoaderError> {
    if (1..=MAX_CAPACITY).contains(&capacity) {
        Ok(())
    } else {
        Err(LoaderError::Config(format!(
            "cache capacity must be between 1 and {MAX_CAPACITY}, got {capacity}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(id: i32) -> Arc<FrameRecord> {
        Arc::new(FrameRecord {
            ids: vec![id],
            positions: vec![glam::Vec3::ZERO],
            radii: vec![1.0],
            forces: None,
        })
    }

    fn path(i: usize) -> PathBuf {
        PathBuf::from(format!("dump{i}.liggghts"))
    }

    #[test]
    fn evicts_first_inserted() {
        let mut cache = FrameCache::new(5).unwrap();
        for i in 1..=6 {
            cache.store(&path(i), frame(i as i32));
        }
        assert_eq!(cache.len(), 5);
        assert!(cache.lookup(&path(1)).is_none());
        assert!(cache.lookup(&path(2)).is_some());
        assert!(cache.lookup(&path(6)).is_some());
    }

    #[test]
    fn reads_do_not_refresh_position() {
        let mut cache = FrameCache::new(2).unwrap();
        cache.store(&path(1), frame(1));
        cache.store(&path(2), frame(2));
        assert!(cache.lookup(&path(1)).is_some());
        cache.store(&path(3), frame(3));
        assert!(!cache.contains(&path(1)));
        assert!(cache.contains(&path(2)));
    }

    #[test]
    fn hit_rate() {
        let mut cache = FrameCache::new(5).unwrap();
        assert_eq!(cache.stats().hit_rate, 0.0);

        for i in 0..3 {
            assert!(cache.lookup(&path(i)).is_none());
            cache.store(&path(i), frame(i as i32));
        }
        for i in 0..7 {
            assert!(cache.lookup(&path(i % 3)).is_some());
        }

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.size), (7, 3, 3));
        assert!((stats.hit_rate - 0.7).abs() < 1e-12);
    }

    #[test]
    fn shrinking_evicts_oldest() {
        let mut cache = FrameCache::new(4).unwrap();
        for i in 0..4 {
            cache.store(&path(i), frame(i as i32));
        }
        cache.set_capacity(2).unwrap();
        assert!(!cache.contains(&path(0)));
        assert!(!cache.contains(&path(1)));
        assert!(cache.contains(&path(3)));
    }

    #[test]
    fn capacity_bounds() {
        assert!(FrameCache::new(0).is_err());
        assert!(FrameCache::new(21).is_err());
        assert!(FrameCache::new(20).is_ok());
    }

    #[test]
    fn clear_resets_everything() {
        let mut cache = FrameCache::default();
        cache.store(&path(0), frame(0));
        cache.lookup(&path(0));
        cache.clear();
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 0,
                misses: 0,
                hit_rate: 0.0,
                size: 0
            }
        );
    }

    #[test]
    fn sorted_view_belongs_to_the_stored_frame() {
        let mut cache = FrameCache::new(2).unwrap();
        let raw = frame(1);
        let sorted = frame(1);
        cache.store(&path(0), Arc::clone(&raw));

        // a frame that is not the cached one is not memoised
        cache.attach_sorted(&path(0), &frame(1), Arc::clone(&sorted));
        assert!(cache.sorted_view(&path(0), &raw).is_none());

        cache.attach_sorted(&path(0), &raw, Arc::clone(&sorted));
        let view = cache.sorted_view(&path(0), &raw).unwrap();
        assert!(Arc::ptr_eq(&view, &sorted));
        assert_eq!((cache.stats().hits, cache.stats().misses), (0, 0));

        // replacing the frame drops the old view
        let fresh = frame(2);
        cache.store(&path(0), Arc::clone(&fresh));
        assert!(cache.sorted_view(&path(0), &fresh).is_none());
    }
}
