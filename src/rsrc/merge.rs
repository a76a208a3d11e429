//! Merge engine folding multiple Win32 resource trees into one.
//!
//! The primary assembly's tree is the accumulator: every other assembly's tree is folded
//! into it, in assembly list order, by a recursive directory walk. Entries with no
//! counterpart are adopted verbatim; colliding leaves are resolved by a per-resource-kind
//! policy dispatched on the entry id and its ancestor id chain. The merge is not
//! commutative for conflicting leaves: the first writer (the primary) wins everywhere
//! except the ASP.NET concatenation case.

use std::collections::HashMap;

use crate::{
    logger::Log,
    rsrc::{ResourceDirectory, ResourceEntry, ResourceNode},
};

/// Entry id of the ASP.NET precompiled resource blob.
pub const ASPNET_RESOURCE_ID: u32 = 101;
/// Parent directory id under which ASP.NET resource blobs live.
pub const ASPNET_PARENT_ID: u32 = 3771;
/// Resource type id of RT_VERSION directories.
pub const RT_VERSION: u32 = 16;

/// Resolution policy for a leaf/leaf collision, selected by entry id and ancestor ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConflictPolicy {
    /// Concatenate source bytes after target bytes and record the source offset.
    Concatenate,
    /// Keep the target bytes without logging; the collision is expected.
    KeepSilently,
    /// Keep the target bytes and warn about the discarded source.
    KeepAndWarn,
}

/// Select the collision policy for a leaf entry.
///
/// The special cases form a small closed set keyed on the id chain, not on the
/// immediate parent alone:
/// - id `101` under a single parent `3771` is an ASP.NET resource blob
/// - id `0` under `16` then `1` is a VS_VERSION_INFO leaf under RT_VERSION
fn conflict_policy(entry: &ResourceEntry, ancestor_ids: &[Option<u32>]) -> ConflictPolicy {
    if entry.name.is_some() {
        return ConflictPolicy::KeepAndWarn;
    }

    match (entry.id, ancestor_ids) {
        (ASPNET_RESOURCE_ID, [Some(ASPNET_PARENT_ID)]) => ConflictPolicy::Concatenate,
        (0, [Some(RT_VERSION), Some(1)]) => ConflictPolicy::KeepSilently,
        _ => ConflictPolicy::KeepAndWarn,
    }
}

/// Merges other assemblies' native resource trees into the primary's tree.
///
/// The merger owns the per-assembly ASP.NET offset side table: when two ASP.NET resource
/// blobs are concatenated, the byte offset at which the source assembly's portion begins
/// is recorded under the source assembly's name for later consumers.
///
/// # Examples
///
/// ```rust
/// use dotmerge::logger::NullLog;
/// use dotmerge::rsrc::{ResourceDirectory, ResourceEntry, RsrcMerger};
///
/// let mut primary = ResourceDirectory::new();
/// let mut other = ResourceDirectory::new();
/// other.entries.push(ResourceEntry::data(2, vec![1, 2, 3]));
///
/// let log = NullLog;
/// let mut merger = RsrcMerger::new(&log);
/// merger.merge_into(&mut primary, other, "ClassLibrary");
/// assert_eq!(primary.entries.len(), 1);
/// ```
pub struct RsrcMerger<'a> {
    log: &'a dyn Log,
    asp_offsets: HashMap<String, usize>,
}

impl<'a> RsrcMerger<'a> {
    /// Create a merger reporting through the given log.
    #[must_use]
    pub fn new(log: &'a dyn Log) -> Self {
        RsrcMerger {
            log,
            asp_offsets: HashMap::new(),
        }
    }

    /// Fold `source` into `target`, discarding or concatenating collisions by policy.
    ///
    /// # Arguments
    /// * `target` - The accumulator tree (the primary's, mutated in place)
    /// * `source` - The tree being merged away; ownership of adopted entries transfers
    /// * `source_assembly` - Name of the assembly `source` came from, for diagnostics
    ///   and the ASP.NET offset table
    pub fn merge_into(
        &mut self,
        target: &mut ResourceDirectory,
        source: ResourceDirectory,
        source_assembly: &str,
    ) {
        self.log.info(&format!(
            "Merging win32 resources from assembly '{}'",
            source_assembly
        ));

        let mut ancestors = Vec::new();
        self.merge_directory(target, source, source_assembly, &mut ancestors);
    }

    /// Recorded ASP.NET blob offsets, keyed by source assembly name.
    #[must_use]
    pub fn asp_offsets(&self) -> &HashMap<String, usize> {
        &self.asp_offsets
    }

    /// Consume the merger and return the ASP.NET offset table.
    #[must_use]
    pub fn into_asp_offsets(self) -> HashMap<String, usize> {
        self.asp_offsets
    }

    fn merge_directory(
        &mut self,
        target: &mut ResourceDirectory,
        source: ResourceDirectory,
        source_assembly: &str,
        ancestors: &mut Vec<ResourceEntry>,
    ) {
        for entry in source.entries {
            let Some(index) = target.entries.iter().position(|e| e.same_key(&entry)) else {
                target.entries.push(entry);
                continue;
            };

            let existing = &mut target.entries[index];
            let frame = ResourceEntry {
                name: existing.name.clone(),
                id: existing.id,
                node: ResourceNode::Directory(ResourceDirectory::new()),
            };

            match (&mut existing.node, entry.node) {
                (
                    ResourceNode::Data { .. },
                    ResourceNode::Data {
                        bytes: source_bytes,
                        ..
                    },
                ) => {
                    self.merge_data(existing, source_bytes, source_assembly, ancestors);
                }
                (
                    ResourceNode::Directory(target_dir),
                    ResourceNode::Directory(source_dir),
                ) => {
                    ancestors.push(frame);
                    self.merge_directory(target_dir, source_dir, source_assembly, ancestors);
                    ancestors.pop();
                }
                _ => {
                    self.warn_shape_mismatch(&frame, source_assembly, ancestors);
                }
            }
        }
    }

    fn merge_data(
        &mut self,
        existing: &mut ResourceEntry,
        source_bytes: Vec<u8>,
        source_assembly: &str,
        ancestors: &[ResourceEntry],
    ) {
        let ancestor_ids: Vec<Option<u32>> = ancestors
            .iter()
            .map(|a| if a.name.is_some() { None } else { Some(a.id) })
            .collect();

        match conflict_policy(existing, &ancestor_ids) {
            ConflictPolicy::Concatenate => {
                if let ResourceNode::Data { bytes, .. } = &mut existing.node {
                    self.asp_offsets
                        .insert(source_assembly.to_string(), bytes.len());
                    bytes.extend_from_slice(&source_bytes);
                }
            }
            ConflictPolicy::KeepSilently => {}
            ConflictPolicy::KeepAndWarn => {
                self.log.warn(&format!(
                    "Duplicate win32 resource with id={}, parent={}, name={}; ignoring the \
                     resource from assembly '{}'",
                    existing.id,
                    ancestor_path(ancestors),
                    existing.name.as_deref().unwrap_or(""),
                    source_assembly
                ));
            }
        }
    }

    fn warn_shape_mismatch(
        &mut self,
        existing: &ResourceEntry,
        source_assembly: &str,
        ancestors: &[ResourceEntry],
    ) {
        self.log.warn(&format!(
            "Inconsistent win32 resources: data and directory share key={} under parent={}; \
             ignoring the resource from assembly '{}'",
            existing.display_key(),
            ancestor_path(ancestors),
            source_assembly
        ));
    }
}

fn ancestor_path(ancestors: &[ResourceEntry]) -> String {
    if ancestors.is_empty() {
        return "<root>".to_string();
    }
    ancestors
        .iter()
        .map(ResourceEntry::display_key)
        .collect::<Vec<_>>()
        .join("/")
}
