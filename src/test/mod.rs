use crate::rsrc::{ResourceDirectory, ResourceEntry, ResourceNode};

/// Build a tree with a single id-keyed leaf nested under the given parent ids.
pub fn leaf_under(parent_ids: &[u32], id: u32, bytes: Vec<u8>) -> ResourceDirectory {
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

/// Follow a chain of id keys and return the leaf bytes at the end.
///
/// Panics when the path does not lead to a leaf; tests use it to assert tree contents.
pub fn leaf_bytes<'d>(dir: &'d ResourceDirectory, path: &[u32]) -> &'d [u8] {
    let mut dir = dir;
    for (i, id) in path.iter().enumerate() {
        let entry = dir.entries.iter().find(|e| e.id == *id).unwrap();
        if i + 1 == path.len() {
            match &entry.node {
                ResourceNode::Data { bytes, .. } => return bytes,
                ResourceNode::Directory(_) => panic!("expected leaf at {:?}", path),
            }
        }
        match &entry.node {
            ResourceNode::Directory(child) => dir = child,
            ResourceNode::Data { .. } => panic!("expected directory at {:?}", path),
        }
    }
    unreachable!()
}
