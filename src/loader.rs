//! # Frame loader session
//!
//! [`FrameLoader`] ties the components together and owns all state that
//! must live across frames: the frame cache, the reference store and the
//! per-dataset sort memo. A host creates one loader per dataset, calls
//! [`FrameLoader::load_frame`] whenever the displayed frame changes and
//! drops (or [`reset`](FrameLoader::reset)s) it when the dataset goes away.
//!
//! ## Parse strategy
//!
//! For snapshot files the loader tries, in order:
//! 1. the frame cache (if enabled for the call)
//! 2. the bulk array parser, whose result is cached on success
//! 3. the line-oriented fallback parser, if the bulk parser failed
//!
//! ## Example
//!
//! ```no_run
//! use dumpframes::FrameLoader;
//!
//! let mut loader = FrameLoader::builder().cache_capacity(8).build().unwrap();
//! let frame = loader.load_frame("dump_1000.liggghts").unwrap();
//! println!("{} particles", frame.len());
//! ```

use glam::Vec3;
use log::{info, warn};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::bulk::parse_bulk;
use crate::cache::{CacheStats, FrameCache};
use crate::columnar::{ColumnarData, CustomOptions};
use crate::config::LoaderConfig;
use crate::error::LoaderError;
use crate::fallback::{parse_columnar, parse_snapshot_lines};
use crate::frame::{FrameRecord, ParseMethod, ParseReport};
use crate::reference::{ReferenceAttributes, ReferenceStore};
use crate::sniff::sniff_header;
use crate::sort::{sort_by_id, SortState};

/// Per-call parse options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Read from and write to the frame cache
    pub use_cache: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { use_cache: true }
    }
}

impl ParseOptions {
    /// Options that bypass the cache entirely
    pub fn uncached() -> Self {
        Self { use_cache: false }
    }
}

/// A loader shared between threads
///
/// Holding the lock across a whole `load_frame` keeps the cache
/// lookup / parse / store sequence and reference replacement atomic.
pub type SharedFrameLoader = Arc<Mutex<FrameLoader>>;

/// Builder for [`FrameLoader`]
///
/// Starts from [`LoaderConfig::default`] or a supplied config and lets
/// individual settings be overridden.
#[derive(Debug, Clone, Default)]
pub struct FrameLoaderBuilder {
    config: LoaderConfig,
}

impl FrameLoaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn use_bulk_parser(mut self, enabled: bool) -> Self {
        self.config.use_bulk_parser = enabled;
        self
    }

    pub fn use_cache(mut self, enabled: bool) -> Self {
        self.config.use_cache = enabled;
        self
    }

    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.config.cache_capacity = capacity;
        self
    }

    pub fn large_file_threshold(mut self, bytes: u64) -> Self {
        self.config.large_file_threshold = bytes;
        self
    }

    pub fn chunk_size(mut self, bytes: usize) -> Self {
        self.config.chunk_size = bytes;
        self
    }

    /// Validate the configuration and create the loader
    pub fn build(self) -> Result<FrameLoader, LoaderError> {
        self.config.validate()?;
        let cache = FrameCache::new(self.config.cache_capacity)?;
        Ok(FrameLoader {
            config: self.config,
            cache,
            references: ReferenceStore::new(),
            sort_state: SortState::default(),
            last_report: None,
        })
    }
}

/// Session state for loading one dataset's frames
#[derive(Debug)]
pub struct FrameLoader {
    config: LoaderConfig,
    cache: FrameCache,
    references: ReferenceStore,
    sort_state: SortState,
    last_report: Option<ParseReport>,
}

impl FrameLoader {
    /// Loader with default settings
    pub fn new() -> Self {
        Self {
            config: LoaderConfig::default(),
            cache: FrameCache::default(),
            references: ReferenceStore::new(),
            sort_state: SortState::default(),
            last_report: None,
        }
    }

    pub fn builder() -> FrameLoaderBuilder {
        FrameLoaderBuilder::new()
    }

    /// Wrap the loader for use from several threads
    pub fn into_shared(self) -> SharedFrameLoader {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Summary of the most recent successful parse
    pub fn last_report(&self) -> Option<&ParseReport> {
        self.last_report.as_ref()
    }

    /// Parse a snapshot file, in file order
    ///
    /// The cache is consulted only when both the loader configuration and
    /// `options` allow it. A missing file or a file without an atoms header
    /// is an error; malformed data lines are skipped.
    pub fn parse<P: AsRef<Path>>(
        &mut self,
        path: P,
        options: &ParseOptions,
    ) -> Result<Arc<FrameRecord>, LoaderError> {
        let path = path.as_ref();
        let use_cache = options.use_cache && self.config.use_cache;

        if use_cache {
            if let Some(record) = self.cache.lookup(path) {
                self.last_report = Some(ParseReport::new(ParseMethod::Cache, record.len(), 0));
                return Ok(record);
            }
        }

        if !path.exists() {
            return Err(LoaderError::NotFound(path.to_path_buf()));
        }
        self.notice_large_file(path);

        let start = Instant::now();
        let header = sniff_header(path)?;

        if self.config.use_bulk_parser {
            match parse_bulk(&header) {
                Ok(record) => {
                    info!(
                        "Parsed {} particles in {:.3}s using bulk parser",
                        record.len(),
                        start.elapsed().as_secs_f64()
                    );
                    let record = Arc::new(record);
                    if use_cache {
                        self.cache.store(path, Arc::clone(&record));
                    }
                    self.last_report = Some(ParseReport::new(ParseMethod::Bulk, record.len(), 0));
                    return Ok(record);
                }
                Err(e) => {
                    warn!("{}: {}; falling back to line parser", path.display(), e);
                }
            }
        }

        let (record, report) = parse_snapshot_lines(&header)?;
        self.last_report = Some(report);
        Ok(Arc::new(record))
    }

    /// Parse a snapshot file and bring it into ascending id order
    ///
    /// Whether frames need sorting is decided once, from the first frame
    /// with at least two particles loaded after construction or
    /// [`reset`](Self::reset). Sorted views of cached frames are kept with
    /// the cache entry, so revisiting a frame does not sort it again.
    /// Records whose arrays disagree in length are returned unsorted.
    pub fn load_frame<P: AsRef<Path>>(&mut self, path: P) -> Result<Arc<FrameRecord>, LoaderError> {
        let path = path.as_ref();
        let record = self.parse(path, &ParseOptions::default())?;

        if !record.is_consistent() {
            warn!("inconsistent frame data, skipping sort");
            return Ok(record);
        }

        match self.sort_state.observe(&record.ids) {
            SortState::Unsorted => {
                if let Some(sorted) = self.cache.sorted_view(path, &record) {
                    return Ok(sorted);
                }
                let sorted = Arc::new(sort_by_id(&record));
                self.cache.attach_sorted(path, &record, Arc::clone(&sorted));
                Ok(sorted)
            }
            _ => Ok(record),
        }
    }

    /// Parse a custom columnar file
    ///
    /// Files larger than `large_file_threshold` are streamed through a
    /// memory map when no particle cap is requested.
    pub fn parse_custom<P: AsRef<Path>>(
        &mut self,
        path: P,
        options: &CustomOptions,
    ) -> Result<ColumnarData, LoaderError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LoaderError::NotFound(path.to_path_buf()));
        }
        #[cfg_attr(not(feature = "streaming"), allow(unused_variables))]
        let size = self.notice_large_file(path);
        let start = Instant::now();

        let (data, report) = match () {
            #[cfg(feature = "streaming")]
            _ if size > self.config.large_file_threshold && options.max_particles.is_none() => {
                crate::streaming::LargeFileParser::new(path)
                    .with_start_line(options.start_line)
                    .with_chunk_size(self.config.chunk_size)
                    .parse()?
            }
            _ => parse_columnar(path, options, self.config.prealloc_limit)?,
        };

        info!(
            "Parsed {} rows from {} in {:.3}s ({:?}, {} lines skipped)",
            data.len(),
            path.display(),
            start.elapsed().as_secs_f64(),
            report.method,
            report.skipped_lines
        );
        self.last_report = Some(report);
        Ok(data)
    }

    /// Logs a notice for big files and returns the file size
    fn notice_large_file(&self, path: &Path) -> u64 {
        let size = path.metadata().map(|m| m.len()).unwrap_or(0);
        if size > self.config.large_file_notice {
            info!(
                "Loading large file ({:.1}MB), this may take a moment...",
                size as f64 / (1024.0 * 1024.0)
            );
        }
        size
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Change the cache bound; shrinking evicts the oldest frames
    pub fn set_cache_capacity(&mut self, capacity: usize) -> Result<(), LoaderError> {
        self.cache.set_capacity(capacity)?;
        self.config.cache_capacity = capacity;
        Ok(())
    }

    pub fn sort_state(&self) -> SortState {
        self.sort_state
    }

    /// Designate reference positions, replacing any previous reference
    pub fn set_reference(&mut self, positions: &[Vec3], ids: &[i32], frame: i32) {
        self.references.set_reference(positions, ids, frame);
    }

    /// Designate a loaded frame as the reference
    ///
    /// Inconsistent records are rejected and leave the store untouched.
    pub fn set_reference_from_frame(
        &mut self,
        record: &FrameRecord,
        frame: i32,
    ) -> Result<(), LoaderError> {
        if !record.is_consistent() {
            return Err(LoaderError::Format(
                "cannot use an inconsistent frame as reference".into(),
            ));
        }
        self.references.set_reference(&record.positions, &record.ids, frame);
        Ok(())
    }

    pub fn lookup_reference(&self, id: i32) -> Option<Vec3> {
        self.references.lookup(id)
    }

    pub fn references(&self) -> &ReferenceStore {
        &self.references
    }

    /// Reference data for every particle of `record`
    ///
    /// `None` when no reference frame is set or the record is inconsistent.
    pub fn reference_attributes(&self, record: &FrameRecord) -> Option<ReferenceAttributes> {
        if !self.references.is_set() {
            return None;
        }
        if !record.is_consistent() {
            warn!("inconsistent frame data, skipping reference attributes");
            return None;
        }
        Some(self.references.attributes(&record.ids, &record.positions))
    }

    /// Drop cached frames, references and the sort memo
    pub fn reset(&mut self) {
        self.cache.clear();
        self.references = ReferenceStore::new();
        self.sort_state.reset();
        self.last_report = None;
    }
}

impl Default for FrameLoader {
    fn default() -> Self {
        Self::new()
    }
}
