//! # dumpframes - snapshot frame loading for particle simulations
//!
//! `dumpframes` reads the per-step snapshot files written by DEM and MD
//! codes such as LIGGGHTS and LAMMPS and turns them into ordered numeric
//! arrays, ready to drive a timeline in a viewer.
//!
//! ## Features
//!
//! - Header sniffing that resolves `id x y z radius [fx fy fz]` columns
//! - Bulk parsing with a tolerant line-by-line fallback
//! - Memory-mapped, windowed parsing of very large columnar files
//! - Bounded FIFO frame cache for fast timeline scrubbing
//! - Stable identity sorting so index `i` means the same particle in every frame
//! - Reference frame store for per-particle displacements
//!
//! ## Example
//!
//! ```no_run
//! use dumpframes::FrameLoader;
//!
//! let mut loader = FrameLoader::new();
//! let frame = loader.load_frame("post/dump_1000.liggghts").unwrap();
//! println!("Contains {} particles", frame.len());
//!
//! // Use this frame as the baseline for displacements
//! loader.set_reference_from_frame(&frame, 1).unwrap();
//!
//! let later = loader.load_frame("post/dump_2000.liggghts").unwrap();
//! let attrs = loader.reference_attributes(&later).unwrap();
//! println!("{} particles have a reference", attrs.matches);
//! ```

// Re-export the main components so users can write `use dumpframes::FrameLoader`
pub use cache::{CacheStats, FrameCache};
pub use columnar::{ColumnarData, CustomOptions, ExtraColumn};
pub use config::LoaderConfig;
pub use error::{BulkParseError, LoaderError, RowError};
pub use frame::{FrameRecord, ParseMethod, ParseReport};
pub use loader::{FrameLoader, FrameLoaderBuilder, ParseOptions, SharedFrameLoader};
pub use reference::{ReferenceAttributes, ReferenceEntry, ReferenceStore};
pub use sequence::{FramePattern, FrameTimeline};
pub use sniff::{sniff_header, ColumnMap, SnapshotHeader};
pub use sort::{is_ascending, sort_by_id, SortState};

pub mod bulk;
pub mod cache;
pub mod columnar;
pub mod config;
pub mod error;
pub mod fallback;
pub mod frame;
pub mod loader;
pub mod reference;
pub mod sequence;
pub mod sniff;
pub mod sort;

// The memory-mapped parser is the only user of memmap2; builds that never
// see huge columnar files can drop it with `default-features = false`
#[cfg(feature = "streaming")]
pub mod streaming;

// Positions and forces are glam vectors
pub use glam::Vec3;
