//! In-memory model of a PE `.rsrc` resource directory.
//!
//! A native resource section is a fixed-depth tree: a type-level directory whose entries
//! are name/id-level directories, whose entries are language-level leaves holding the raw
//! resource bytes. The model here mirrors that shape with the leaf/interior distinction
//! expressed as a sum type, so an entry can never be both (or neither).
//!
//! # Key Types
//! - [`ResourceDirectory`] - Ordered collection of entries plus verbatim header fields
//! - [`ResourceEntry`] - One node, keyed by name or numeric id
//! - [`ResourceNode`] - Leaf data or child directory

/// Maximum directory nesting the PE resource format defines (type / name / language).
pub const MAX_RSRC_DEPTH: usize = 3;

/// The payload of a resource entry: either leaf data or a child directory.
///
/// A leaf never becomes interior (or vice versa) during a merge; shape mismatches between
/// inputs are resolved by discarding the source side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceNode {
    /// Leaf entry holding raw resource bytes.
    Data {
        /// Raw resource bytes
        bytes: Vec<u8>,
        /// Code page recorded in the data entry
        code_page: u32,
        /// Reserved field recorded in the data entry, kept verbatim
        reserved: u32,
    },
    /// Interior entry holding a child directory.
    Directory(ResourceDirectory),
}

/// A node in a native resource directory.
///
/// Keyed by `name` when present, by `id` otherwise; the two are mutually exclusive in
/// the binary format (a set high bit selects the interpretation of the key field).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    /// Entry name; `None` for id-keyed entries
    pub name: Option<String>,
    /// Numeric id; meaningful only when `name` is `None`
    pub id: u32,
    /// Leaf data or child directory
    pub node: ResourceNode,
}

impl ResourceEntry {
    /// Create an id-keyed leaf entry.
    ///
    /// # Arguments
    /// * `id` - Numeric entry id
    /// * `bytes` - Raw resource bytes
    #[must_use]
    pub fn data(id: u32, bytes: Vec<u8>) -> Self {
        ResourceEntry {
            name: None,
            id,
            node: ResourceNode::Data {
                bytes,
                code_page: 0,
                reserved: 0,
            },
        }
    }

    /// Create a name-keyed leaf entry.
    ///
    /// # Arguments
    /// * `name` - Entry name
    /// * `bytes` - Raw resource bytes
    #[must_use]
    pub fn named_data(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        ResourceEntry {
            name: Some(name.into()),
            id: 0,
            node: ResourceNode::Data {
                bytes,
                code_page: 0,
                reserved: 0,
            },
        }
    }

    /// Create an id-keyed interior entry.
    ///
    /// # Arguments
    /// * `id` - Numeric entry id
    /// * `directory` - Child directory
    #[must_use]
    pub fn directory(id: u32, directory: ResourceDirectory) -> Self {
        ResourceEntry {
            name: None,
            id,
            node: ResourceNode::Directory(directory),
        }
    }

    /// Create a name-keyed interior entry.
    ///
    /// # Arguments
    /// * `name` - Entry name
    /// * `directory` - Child directory
    #[must_use]
    pub fn named_directory(name: impl Into<String>, directory: ResourceDirectory) -> Self {
        ResourceEntry {
            name: Some(name.into()),
            id: 0,
            node: ResourceNode::Directory(directory),
        }
    }

    /// Returns `true` if both entries share the same key (name if present, id otherwise).
    #[must_use]
    pub fn same_key(&self, other: &ResourceEntry) -> bool {
        match (&self.name, &other.name) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.id == other.id,
            _ => false,
        }
    }

    /// Returns `true` if this entry is a leaf.
    #[must_use]
    pub fn is_data(&self) -> bool {
        matches!(self.node, ResourceNode::Data { .. })
    }

    /// Human-readable key for diagnostics: the name, or the id rendered as a number.
    #[must_use]
    pub fn display_key(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.id.to_string(),
        }
    }
}

/// Ordered collection of [`ResourceEntry`] nodes with verbatim header fields.
///
/// The header fields are copied from the primary assembly's directory at the
/// corresponding tree level and re-emitted unchanged by the serializer. The name/id
/// entry counts of the binary header are not stored; they fall out of
/// [`ResourceDirectory::sort_entries`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceDirectory {
    /// Characteristics header field, copied verbatim
    pub characteristics: u32,
    /// Time/date stamp header field, copied verbatim
    pub time_date_stamp: u32,
    /// Major version header field, copied verbatim
    pub major_version: u16,
    /// Minor version header field, copied verbatim
    pub minor_version: u16,
    /// Entries at this level
    pub entries: Vec<ResourceEntry>,
}

impl ResourceDirectory {
    /// Create an empty directory with zeroed header fields.
    #[must_use]
    pub fn new() -> Self {
        ResourceDirectory::default()
    }

    /// Find the entry sharing `probe`'s key, if any.
    pub fn find_entry_mut(&mut self, probe: &ResourceEntry) -> Option<&mut ResourceEntry> {
        self.entries.iter_mut().find(|e| e.same_key(probe))
    }

    /// Sort entries into the order the binary format requires and return the split index.
    ///
    /// After sorting, all name-keyed entries precede all id-keyed entries; name entries
    /// are ordered case-insensitively ascending and id entries ascending by numeric id.
    /// The returned index equals the number of named entries (the point where id entries
    /// begin).
    pub fn sort_entries(&mut self) -> usize {
        self.entries.sort_by(|a, b| match (&a.name, &b.name) {
            (Some(a), Some(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.id.cmp(&b.id),
        });

        self.entries.iter().filter(|e| e.name.is_some()).count()
    }

    /// Total number of leaf entries in this directory and all child directories.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.entries
            .iter()
            .map(|e| match &e.node {
                ResourceNode::Data { .. } => 1,
                ResourceNode::Directory(dir) => dir.leaf_count(),
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_names_before_ids() {
        let mut dir = ResourceDirectory::new();
        dir.entries.push(ResourceEntry::data(16, vec![1]));
        dir.entries.push(ResourceEntry::named_data("zeta", vec![2]));
        dir.entries.push(ResourceEntry::data(3, vec![3]));
        dir.entries.push(ResourceEntry::named_data("Alpha", vec![4]));
        dir.entries.push(ResourceEntry::named_data("beta", vec![5]));

        let split = dir.sort_entries();
        assert_eq!(split, 3);

        let keys: Vec<String> = dir.entries.iter().map(|e| e.display_key()).collect();
        assert_eq!(keys, vec!["Alpha", "beta", "zeta", "3", "16"]);
    }

    #[test]
    fn sort_names_case_insensitive() {
        let mut dir = ResourceDirectory::new();
        dir.entries.push(ResourceEntry::named_data("b", vec![]));
        dir.entries.push(ResourceEntry::named_data("A", vec![]));
        dir.entries.push(ResourceEntry::named_data("C", vec![]));

        let split = dir.sort_entries();
        assert_eq!(split, 3);

        let keys: Vec<String> = dir.entries.iter().map(|e| e.display_key()).collect();
        assert_eq!(keys, vec!["A", "b", "C"]);
    }

    #[test]
    fn key_matching() {
        let named = ResourceEntry::named_data("MANIFEST", vec![]);
        let id = ResourceEntry::data(0, vec![]);
        assert!(!named.same_key(&id));
        assert!(named.same_key(&ResourceEntry::named_directory(
            "MANIFEST",
            ResourceDirectory::new()
        )));
        assert!(id.same_key(&ResourceEntry::data(0, vec![9])));
        assert!(!id.same_key(&ResourceEntry::data(1, vec![])));
    }

    #[test]
    fn leaf_counting() {
        let mut lang = ResourceDirectory::new();
        lang.entries.push(ResourceEntry::data(0x409, vec![1]));
        lang.entries.push(ResourceEntry::data(0x407, vec![2]));

        let mut name = ResourceDirectory::new();
        name.entries.push(ResourceEntry::directory(1, lang));
        name.entries.push(ResourceEntry::data(2, vec![3]));

        let mut root = ResourceDirectory::new();
        root.entries.push(ResourceEntry::directory(16, name));

        assert_eq!(root.leaf_count(), 3);
    }
}
