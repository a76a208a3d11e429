// Copyright 2026 The dotmerge authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]
//#![deny(unsafe_code)]
// - 'rsrc/reader.rs' uses mmap to map a PE file into memory

//! # dotmerge
//!
//! The resource-merging subsystem of a .NET assembly-merging tool, built in pure Rust.
//! When several compiled modules are combined into one output assembly, every ancillary
//! binary resource has to be reconciled so the merged artifact behaves like the
//! unmerged set: native Win32 resource trees are folded together under per-kind
//! conflict policies and re-serialized byte-exactly, and compiled markup (BAML) streams
//! get their cross-assembly references rewritten and their theme dictionaries stitched
//! into the primary assembly's generic theme.
//!
//! ## Features
//!
//! - **Win32 resource merging** - Recursive tree merge with ASP.NET blob concatenation,
//!   version-info precedence, and warn-and-keep conflict resolution
//! - **`.rsrc` serialization** - Deterministic three-pass directory layout with string
//!   table deduplication and aligned data blocks, ready for a PE patcher
//! - **`.rsrc` loading** - Section parsing plus memory-mapped PE resource table lookup
//! - **BAML rewriting** - Assembly-info, xmlns, and pack-URI reference collapsing,
//!   generic-theme generation and in-place patching
//! - **Processing pipeline** - Chain-of-responsibility resource processors with
//!   first-match-wins dispatch and verbatim-copy fallback
//!
//! ## Quick Start
//!
//! ```rust
//! use dotmerge::prelude::*;
//!
//! // Merge the native resource trees of two assemblies and serialize the result.
//! let mut primary = ResourceDirectory::new();
//! let mut library = ResourceDirectory::new();
//! library.entries.push(ResourceEntry::data(2, vec![0x01, 0x02]));
//!
//! let log = NullLog;
//! let mut merger = RsrcMerger::new(&log);
//! merger.merge_into(&mut primary, library, "ClassLibrary");
//!
//! let section = write_rsrc(&mut primary, 0x4000)?;
//! assert!(!section.is_empty());
//! # Ok::<(), dotmerge::Error>(())
//! ```
//!
//! Embedded resources flow through the pipeline instead:
//!
//! ```rust
//! use dotmerge::prelude::*;
//!
//! let set = AssemblySet::new(Assembly::new("App"), vec![Assembly::new("Lib")]);
//! let log = FacadeLog;
//! let mut sink = CollectedResources::new();
//! ResourcePipeline::new(&set, &log).run(&set, &mut sink)?;
//! # Ok::<(), dotmerge::Error>(())
//! ```

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use dotmerge::prelude::*;
///
/// let mut tree = ResourceDirectory::new();
/// tree.entries.push(ResourceEntry::data(16, vec![0u8; 4]));
/// let bytes = write_rsrc(&mut tree, 0x4000)?;
/// # Ok::<(), dotmerge::Error>(())
/// ```
pub mod prelude;

/// Low-level binary parsing and writing utilities.
///
/// Cursor-based, bounds-checked little-endian access over byte slices, plus the
/// growable writer the serializers emit through. Both formats' string encodings
/// (UTF-16 length-prefixed names, 7-bit-length-prefixed UTF-8) live here.
///
/// # Key Types
///
/// - [`file::Parser`] - Bounds-checked reader over a borrowed slice
/// - [`file::Writer`] - Growable little-endian writer with back-patching
pub mod file;

/// The logging boundary: diagnostics without global state.
///
/// Merge conflicts and stage transitions are reported through the [`logger::Log`]
/// trait, passed explicitly wherever diagnostics originate.
pub mod logger;

/// Input assembly model: names, embedded resources, native resource trees.
pub mod assembly;

/// Native Win32 (`.rsrc`) resource reading, merging, and serialization.
///
/// # Key Components
///
/// - [`rsrc::RsrcMerger`] - Conflict-resolving tree merge
/// - [`rsrc::write_rsrc`] / [`rsrc::read_rsrc`] - Byte-exact serialization and parsing
/// - [`rsrc::load_rsrc`] - Resource tree extraction from a PE file on disk
pub mod rsrc;

/// BAML (compiled markup) document engine.
///
/// # Key Components
///
/// - [`baml::BamlDocument`] - Record-level document codec
/// - [`baml::generate_generic_theme`] - Synthetic theme manifest generation
/// - [`baml::ThemePatcher`] / [`baml::BamlRewriter`] - In-place document rewriting
pub mod baml;

/// Chain-of-responsibility resource processing pipeline.
///
/// # Key Components
///
/// - [`pipeline::ResourcePipeline`] - Orchestrates the processor chain per assembly
/// - [`pipeline::ResourceSink`] - Output boundary for the merged resource set
pub mod pipeline;

pub use crate::{
    error::{Error, Result},
    file::{Parser, Writer},
    logger::Log,
};
