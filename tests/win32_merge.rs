//! End-to-end tests for the Win32 resource merge and serialization flow.
//!
//! Each scenario builds input trees the way a PE loader would produce them, folds them
//! with the merge engine, serializes the result, and reads it back with the section
//! parser to verify the byte layout is self-consistent.


use dotmerge::{prelude::*, Result};
use fixtures::ensure_env_logger_initialized;
use pretty_assertions::assert_eq;

fn leaf_tree(parent_ids: &[u32], id: u32, bytes: Vec<u8>) -> ResourceDirectory {
    let mut entry = ResourceEntry::data(id, bytes);
    for parent in parent_ids.iter().rev() {
        let mut dir = ResourceDirectory::new();
        dir.entries.push(entry);
        entry = ResourceEntry::directory(*parent, dir);
    }
    let mut root = ResourceDirectory::new();
    root.entries.push(entry);
    root
}

#[test]
fn merge_serialize_reread_round_trip() -> Result<()> {
    ensure_env_logger_initialized();

    let log = MemoryLog::new();
    let mut merger = RsrcMerger::new(&log);

    // Primary: an icon (3) and version info (16); library: a manifest type (24).
    let mut primary = leaf_tree(&[3, 1], 0x409, vec![0xAA; 16]);
    let version = leaf_tree(&[16, 1], 0, vec![0xBB; 8]);
    merger.merge_into(&mut primary, version, "self");
    let library = leaf_tree(&[24, 1], 0, vec![0xCC; 5]);
    merger.merge_into(&mut primary, library, "ClassLibrary");

    let bytes = write_rsrc(&mut primary, 0x4000)?;
    let reread = read_rsrc(&bytes, 0x4000)?;

    assert_eq!(reread, primary);
    assert!(log.warnings().is_empty());
    Ok(())
}

#[test]
fn string_table_deduplicates_identical_names() -> Result<()> {
    // The same name under two different type directories must occupy one string slot.
    let mut type_a = ResourceDirectory::new();
    type_a
        .entries
        .push(ResourceEntry::named_data("SHARED", vec![1, 2, 3, 4]));
    let mut type_b = ResourceDirectory::new();
    type_b
        .entries
        .push(ResourceEntry::named_data("SHARED", vec![5, 6, 7, 8]));

    let mut root = ResourceDirectory::new();
    root.entries.push(ResourceEntry::directory(10, type_a));
    root.entries.push(ResourceEntry::directory(11, type_b));

    let bytes = write_rsrc(&mut root, 0)?;

    let needle: Vec<u8> = "SHARED".encode_utf16().flat_map(u16::to_le_bytes).collect();
    let occurrences = bytes
        .windows(needle.len())
        .filter(|window| *window == needle.as_slice())
        .count();
    assert_eq!(occurrences, 1);

    let reread = read_rsrc(&bytes, 0)?;
    assert_eq!(reread, root);
    Ok(())
}

#[test]
fn aspnet_blobs_concatenate_with_recorded_offsets() {
    let log = MemoryLog::new();
    let mut merger = RsrcMerger::new(&log);

    let mut primary = leaf_tree(&[3771], 101, vec![1; 10]);
    merger.merge_into(&mut primary, leaf_tree(&[3771], 101, vec![2; 4]), "LibA");
    merger.merge_into(&mut primary, leaf_tree(&[3771], 101, vec![3; 6]), "LibB");

    let offsets = merger.into_asp_offsets();
    assert_eq!(offsets["LibA"], 10);
    assert_eq!(offsets["LibB"], 14);
    assert!(log.warnings().is_empty());
}

#[test]
fn version_info_conflict_is_silent_and_generic_conflict_warns() -> Result<()> {
    let log = MemoryLog::new();
    let mut merger = RsrcMerger::new(&log);

    let mut primary = leaf_tree(&[16, 1], 0, vec![0x10; 4]);
    merger.merge_into(&mut primary, leaf_tree(&[16, 1], 0, vec![0x20; 4]), "Lib");
    assert!(log.warnings().is_empty());

    let mut primary = leaf_tree(&[24, 1], 0, vec![0x10; 4]);
    merger.merge_into(&mut primary, leaf_tree(&[24, 1], 0, vec![0x20; 4]), "Lib");

    let warnings = log.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("'Lib'"));

    // The primary's bytes survived; the section still serializes and re-reads.
    let bytes = write_rsrc(&mut primary, 0x2000)?;
    let reread = read_rsrc(&bytes, 0x2000)?;
    assert_eq!(reread, primary);
    Ok(())
}

#[test]
fn merged_output_is_deterministic() -> Result<()> {
    let build = || -> Result<Vec<u8>> {
        let log = NullLog;
        let mut merger = RsrcMerger::new(&log);
        let mut primary = leaf_tree(&[3, 2], 0x409, vec![0xAA; 7]);
        merger.merge_into(&mut primary, leaf_tree(&[3, 1], 0x409, vec![0xBB; 9]), "Lib");
        write_rsrc(&mut primary, 0x3000)
    };

    assert_eq!(build()?, build()?);
    Ok(())
}
