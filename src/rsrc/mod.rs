//! Native Win32 (`.rsrc`) resource tree reading, merging, and serialization.
//!
//! A PE file's resource section is a three-level directory tree (type, name/id,
//! language) with leaf nodes pointing at raw data blocks. Merging several input
//! assemblies means folding their trees into the primary's tree under a conflict
//! policy, then serializing the result back into the exact byte layout a PE loader
//! expects.
//!
//! # Architecture
//!
//! The module is split along the three phases of that flow:
//!
//! - [`reader`] parses section bytes (or a PE file on disk) into the tree model
//! - [`merge`] folds source trees into a target tree, resolving conflicts
//! - [`writer`] serializes the merged tree deterministically
//!
//! Identical inputs merged in identical order always produce byte-identical output;
//! there is no randomness or time dependence anywhere in the flow.
//!
//! # Key Components
//!
//! - [`ResourceDirectory`] / [`ResourceEntry`] / [`ResourceNode`] - The tree model
//! - [`RsrcMerger`] - Conflict-resolving merge engine
//! - [`read_rsrc`] / [`load_rsrc`] - Section and PE file parsing
//! - [`write_rsrc`] - Deterministic serialization
//!
//! # Usage Examples
//!
//! ```rust,no_run
//! use dotmerge::logger::NullLog;
//! use dotmerge::rsrc::{load_rsrc, write_rsrc, ResourceDirectory, RsrcMerger};
//!
//! let mut merged = load_rsrc("primary.exe")?.unwrap_or_default();
//!
//! let log = NullLog;
//! let mut merger = RsrcMerger::new(&log);
//! if let Some(other) = load_rsrc("library.dll")? {
//!     merger.merge_into(&mut merged, other, "library");
//! }
//!
//! let section = write_rsrc(&mut merged, 0x4000)?;
//! # let _ = section;
//! # Ok::<(), dotmerge::Error>(())
//! ```

pub mod merge;
pub mod reader;
pub mod types;
pub mod writer;

pub use merge::RsrcMerger;
pub use reader::{load_rsrc, read_rsrc};
pub use types::{ResourceDirectory, ResourceEntry, ResourceNode, MAX_RSRC_DEPTH};
pub use writer::write_rsrc;
