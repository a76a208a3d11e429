//! # dotmerge Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the dotmerge library. Import this module to get quick access to the essential
//! types for resource merging.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dotmerge operations
pub use crate::Error;

/// The result type used throughout dotmerge
pub use crate::Result;

/// Low-level binary parsing and writing utilities
pub use crate::{Parser, Writer};

// ================================================================================================
// Logging Boundary
// ================================================================================================

/// Diagnostics receiver and the provided implementations
pub use crate::logger::{FacadeLog, Log, MemoryLog, NullLog};

// ================================================================================================
// Assembly Model
// ================================================================================================

/// Input assembly surface and resource records
pub use crate::assembly::{Assembly, AssemblySet, EmbeddedResource, Res, ResKind};

// ================================================================================================
// Win32 Resource Engine
// ================================================================================================

/// Native resource tree model, merge engine, and serialization
pub use crate::rsrc::{
    load_rsrc, read_rsrc, write_rsrc, ResourceDirectory, ResourceEntry, ResourceNode, RsrcMerger,
};

// ================================================================================================
// BAML Engine
// ================================================================================================

/// Compiled markup documents and the merge-time transformations over them
pub use crate::baml::{
    generate_generic_theme, patch_path, BamlDocument, BamlRecord, BamlRewriter, ThemePatcher,
};

// ================================================================================================
// Pipeline
// ================================================================================================

/// Resource processing orchestration and the output boundary
pub use crate::pipeline::{
    CollectedResources, EmbeddedResourceProcessor, ResProcessor, ResourcePipeline, ResourceSink,
};
