//! Output boundary for merged resources.

use crate::assembly::{Res, ResKind};

/// Receiver for the merged resource set.
///
/// Processors and the pipeline's fallback copy write every surviving resource through
/// this trait; the caller decides whether entries land in memory, in a module writer,
/// or elsewhere. Names are flat: merging collapses all input containers into the
/// primary assembly's single resource namespace, which is why BAML streams get
/// relocated under per-library folders before they arrive here.
pub trait ResourceSink {
    /// Add a binary resource entry.
    fn add_data(&mut self, name: &str, kind: ResKind, bytes: Vec<u8>);

    /// Add a string resource entry.
    fn add_string(&mut self, name: &str, value: &str);
}

/// Vec-backed [`ResourceSink`] accumulating the merged set in memory.
#[derive(Debug, Default)]
pub struct CollectedResources {
    entries: Vec<Res>,
}

impl CollectedResources {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        CollectedResources::default()
    }

    /// All collected entries, in write order.
    #[must_use]
    pub fn entries(&self) -> &[Res] {
        &self.entries
    }

    /// Find an entry by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Res> {
        self.entries.iter().find(|r| r.name == name)
    }

    /// Consume the collection and return the entries.
    #[must_use]
    pub fn into_entries(self) -> Vec<Res> {
        self.entries
    }
}

impl ResourceSink for CollectedResources {
    fn add_data(&mut self, name: &str, kind: ResKind, bytes: Vec<u8>) {
        self.entries.push(Res::new(name, kind, bytes));
    }

    fn add_string(&mut self, name: &str, value: &str) {
        self.entries
            .push(Res::new(name, ResKind::String, value.as_bytes().to_vec()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_in_write_order() {
        let mut sink = CollectedResources::new();
        sink.add_string("greeting", "hello");
        sink.add_data("blob", ResKind::ByteArray, vec![1, 2, 3]);

        assert_eq!(sink.entries().len(), 2);
        assert_eq!(sink.find("greeting").unwrap().data, b"hello");
        assert!(sink.find("missing").is_none());
    }
}
