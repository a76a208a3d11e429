//! Deterministic serializer producing the byte layout of a PE `.rsrc` section.
//!
//! The serializer turns a merged [`ResourceDirectory`] into the exact layout a PE loader
//! expects, ready to be spliced at a known virtual address by a PE patcher:
//!
//! 1. Directory tables, written in three fixed passes (type, name/id, language level) -
//!    the format's nesting depth is fixed at three, so deeper trees are rejected.
//! 2. Data entry records, one per leaf, in the order the passes encounter them.
//! 3. The string table for named entries, deduplicated by exact name, length-prefixed
//!    UTF-16, aligned to 4 bytes as a whole. Linkers emit it after the data entries,
//!    not between directories and data as the format description suggests, and this
//!    serializer matches the linker layout.
//! 4. Raw data blocks, each individually 4-byte aligned.
//!
//! All entry name/id fields and offsets use a set high bit to flag "string name" and
//! "subdirectory" respectively; data RVAs are relative to the supplied virtual address.

use std::collections::HashMap;

use widestring::U16String;

use crate::{
    file::Writer,
    rsrc::{ResourceDirectory, ResourceNode, MAX_RSRC_DEPTH},
    Result,
};

/// High bit flagging a string name or a subdirectory offset in directory entries.
pub(crate) const RSRC_HIGH_BIT: u32 = 0x8000_0000;

/// Size in bytes of a directory header.
pub(crate) const DIR_HEADER_SIZE: u32 = 16;
/// Size in bytes of a directory entry.
pub(crate) const DIR_ENTRY_SIZE: u32 = 8;
/// Size in bytes of a data entry record.
pub(crate) const DATA_ENTRY_SIZE: u32 = 16;

/// Serialize a resource directory tree into `.rsrc` section bytes.
///
/// Entries are sorted into the binary format's required order as a side effect (named
/// entries first, case-insensitively ascending, then id entries ascending). An empty
/// root produces an empty buffer; callers treat that as "nothing to patch".
///
/// # Arguments
/// * `root` - The merged tree; sorted in place during serialization
/// * `virtual_address` - RVA at which the section will be placed, used for data RVAs
///
/// # Errors
/// Returns [`crate::Error::NotSupported`] if the tree nests deeper than the three
/// levels the PE resource format defines.
///
/// # Examples
///
/// ```rust
/// use dotmerge::rsrc::{write_rsrc, ResourceDirectory, ResourceEntry};
///
/// let mut lang = ResourceDirectory::new();
/// lang.entries.push(ResourceEntry::data(0x409, vec![0xAA; 6]));
/// let mut name = ResourceDirectory::new();
/// name.entries.push(ResourceEntry::directory(1, lang));
/// let mut root = ResourceDirectory::new();
/// root.entries.push(ResourceEntry::directory(16, name));
///
/// let bytes = write_rsrc(&mut root, 0x4000)?;
/// assert!(!bytes.is_empty());
/// # Ok::<(), dotmerge::Error>(())
/// ```
pub fn write_rsrc(root: &mut ResourceDirectory, virtual_address: u32) -> Result<Vec<u8>> {
    if root.entries.is_empty() {
        return Ok(Vec::new());
    }

    sort_tree(root);

    let levels = collect_levels(root)?;

    let dir_table_size: u32 = levels
        .iter()
        .flatten()
        .map(|dir| DIR_HEADER_SIZE + DIR_ENTRY_SIZE * dir.entries.len() as u32)
        .sum();
    let leaf_count = root.leaf_count() as u32;
    let data_entries_offset = dir_table_size;
    let strings_offset = dir_table_size + DATA_ENTRY_SIZE * leaf_count;

    let strings = StringTable::build(&levels, strings_offset);
    let data_base = align4(strings_offset + strings.size);

    let mut writer = Writer::with_capacity(data_base as usize);

    // Pass 0..2: directory headers plus their entries. Children are laid out in the
    // same order the passes reference them, so a running cursor yields their offsets.
    let mut next_dir_offset = DIR_HEADER_SIZE + DIR_ENTRY_SIZE * root.entries.len() as u32;
    let mut next_data_entry = 0u32;
    let mut leaves: Vec<(&[u8], u32, u32)> = Vec::with_capacity(leaf_count as usize);

    for level in &levels {
        for dir in level {
            let named = dir.entries.iter().filter(|e| e.name.is_some()).count() as u16;
            let ids = dir.entries.len() as u16 - named;

            writer.write_le(dir.characteristics);
            writer.write_le(dir.time_date_stamp);
            writer.write_le(dir.major_version);
            writer.write_le(dir.minor_version);
            writer.write_le(named);
            writer.write_le(ids);

            for entry in &dir.entries {
                match &entry.name {
                    Some(name) => writer.write_le(strings.offsets[name] | RSRC_HIGH_BIT),
                    None => writer.write_le(entry.id),
                }

                match &entry.node {
                    ResourceNode::Directory(child) => {
                        writer.write_le(next_dir_offset | RSRC_HIGH_BIT);
                        next_dir_offset +=
                            DIR_HEADER_SIZE + DIR_ENTRY_SIZE * child.entries.len() as u32;
                    }
                    ResourceNode::Data {
                        bytes,
                        code_page,
                        reserved,
                    } => {
                        writer.write_le(data_entries_offset + DATA_ENTRY_SIZE * next_data_entry);
                        next_data_entry += 1;
                        leaves.push((bytes, *code_page, *reserved));
                    }
                }
            }
        }
    }

    // Data entry records, in encounter order, pointing at the raw blocks laid out
    // after the string table.
    let mut raw_cursor = data_base;
    for (bytes, code_page, reserved) in &leaves {
        writer.write_le(virtual_address + raw_cursor);
        writer.write_le(bytes.len() as u32);
        writer.write_le(*code_page);
        writer.write_le(*reserved);
        raw_cursor = align4(raw_cursor + bytes.len() as u32);
    }

    for name in &strings.names {
        let wide = U16String::from_str(name);
        writer.write_le(wide.len() as u32);
        for unit in wide.as_slice() {
            writer.write_le(*unit);
        }
    }
    writer.align(4);

    for (bytes, _, _) in &leaves {
        writer.write_bytes(bytes);
        writer.align(4);
    }

    Ok(writer.into_inner())
}

fn align4(value: u32) -> u32 {
    (value + 3) & !3
}

fn sort_tree(dir: &mut ResourceDirectory) {
    dir.sort_entries();
    for entry in &mut dir.entries {
        if let ResourceNode::Directory(child) = &mut entry.node {
            sort_tree(child);
        }
    }
}

/// Breadth-first level lists of the tree, one per pass.
fn collect_levels(root: &ResourceDirectory) -> Result<Vec<Vec<&ResourceDirectory>>> {
    let mut levels: Vec<Vec<&ResourceDirectory>> = vec![vec![root]];

    while levels.len() <= MAX_RSRC_DEPTH {
        let next: Vec<&ResourceDirectory> = levels
            .last()
            .unwrap()
            .iter()
            .flat_map(|dir| dir.entries.iter())
            .filter_map(|entry| match &entry.node {
                ResourceNode::Directory(child) => Some(child),
                ResourceNode::Data { .. } => None,
            })
            .collect();

        if next.is_empty() {
            return Ok(levels);
        }
        if levels.len() == MAX_RSRC_DEPTH {
            return Err(crate::Error::NotSupported);
        }
        levels.push(next);
    }

    Ok(levels)
}

/// Deduplicated string table layout: offsets are relative to the directory region start.
struct StringTable {
    names: Vec<String>,
    offsets: HashMap<String, u32>,
    size: u32,
}

impl StringTable {
    fn build(levels: &[Vec<&ResourceDirectory>], strings_offset: u32) -> Self {
        let mut names = Vec::new();
        let mut offsets = HashMap::new();
        let mut cursor = 0u32;

        for dir in levels.iter().flatten() {
            for entry in &dir.entries {
                let Some(name) = &entry.name else { continue };
                if offsets.contains_key(name) {
                    continue;
                }
                offsets.insert(name.clone(), strings_offset + cursor);
                cursor += 4 + 2 * U16String::from_str(name).len() as u32;
                names.push(name.clone());
            }
        }

        StringTable {
            names,
            offsets,
            size: cursor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rsrc::ResourceEntry;

    #[test]
    fn empty_tree_serializes_to_nothing() {
        let mut root = ResourceDirectory::new();
        assert!(write_rsrc(&mut root, 0x1000).unwrap().is_empty());
    }

    #[test]
    fn too_deep_tree_is_rejected() {
        let mut level3 = ResourceDirectory::new();
        level3.entries.push(ResourceEntry::data(0, vec![1]));
        let mut level2 = ResourceDirectory::new();
        level2.entries.push(ResourceEntry::directory(0, level3));
        let mut level1 = ResourceDirectory::new();
        level1.entries.push(ResourceEntry::directory(0, level2));
        let mut root = ResourceDirectory::new();
        root.entries.push(ResourceEntry::directory(0, level1));

        assert!(matches!(
            write_rsrc(&mut root, 0x1000),
            Err(crate::Error::NotSupported)
        ));
    }

    #[test]
    fn single_leaf_layout() {
        let mut root = ResourceDirectory {
            characteristics: 0,
            time_date_stamp: 0x5F00_0000,
            major_version: 4,
            minor_version: 0,
            entries: vec![ResourceEntry::data(7, vec![0xDE, 0xAD, 0xBE, 0xEF])],
        };

        let bytes = write_rsrc(&mut root, 0x4000).unwrap();

        // Header: one id entry, zero named.
        assert_eq!(u16::from_le_bytes([bytes[12], bytes[13]]), 0);
        assert_eq!(u16::from_le_bytes([bytes[14], bytes[15]]), 1);
        // Entry: id 7, offset points at the data entry record (24 = 16 + 8).
        assert_eq!(u32::from_le_bytes(bytes[16..20].try_into().unwrap()), 7);
        assert_eq!(u32::from_le_bytes(bytes[20..24].try_into().unwrap()), 24);
        // Data entry: RVA = va + aligned end of tables (24 + 16 = 40), size 4.
        assert_eq!(
            u32::from_le_bytes(bytes[24..28].try_into().unwrap()),
            0x4000 + 40
        );
        assert_eq!(u32::from_le_bytes(bytes[28..32].try_into().unwrap()), 4);
        // Raw block at the end.
        assert_eq!(&bytes[40..44], &[0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn data_blocks_are_individually_aligned() {
        let mut root = ResourceDirectory::new();
        root.entries.push(ResourceEntry::data(1, vec![0xAA; 3]));
        root.entries.push(ResourceEntry::data(2, vec![0xBB; 2]));

        let bytes = write_rsrc(&mut root, 0).unwrap();

        // Tables: 16 + 2*8 + 2*16 = 64. First block at 64 (3 bytes + 1 pad),
        // second at 68.
        assert_eq!(&bytes[64..67], &[0xAA; 3]);
        assert_eq!(bytes[67], 0);
        assert_eq!(&bytes[68..70], &[0xBB; 2]);

        let first_rva = u32::from_le_bytes(bytes[32..36].try_into().unwrap());
        let second_rva = u32::from_le_bytes(bytes[48..52].try_into().unwrap());
        assert_eq!(first_rva, 64);
        assert_eq!(second_rva, 68);
    }
}
