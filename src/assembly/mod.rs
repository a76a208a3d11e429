//! Input assembly model for the resource merge.
//!
//! The merge operates over a minimal view of each input module: its name, its embedded
//! resources, and its native Win32 resource tree. The IL/metadata side of an assembly
//! is outside this crate; callers extract the pieces below from their module reader and
//! hand them over as owned data.
//!
//! # Key Types
//! - [`Assembly`] - One input module's mergeable surface
//! - [`AssemblySet`] - The distinguished primary assembly plus the ordered other inputs
//! - [`EmbeddedResource`] - A module-level embedded resource container record
//! - [`Res`] - A single resource item inside a container

use crate::rsrc::ResourceDirectory;

/// Type tag of a resource item inside a `.resources` container.
///
/// Mirrors the resource type codes the .NET resource format distinguishes, collapsed to
/// the cases the merge pipeline dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResKind {
    /// A UTF-8 string value
    String,
    /// A nested binary stream (BAML streams are stored this way)
    Stream,
    /// An opaque byte array
    ByteArray,
}

/// A single resource item inside an embedded resource container.
///
/// Identity is `(assembly, name)`; the item is owned by the pipeline for the duration of
/// one processing pass and then written to the output resource set. There is no
/// cross-resource shared state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Res {
    /// Item name, e.g. `themes/generic.baml`
    pub name: String,
    /// Type tag of the item
    pub kind: ResKind,
    /// Raw item bytes; for [`ResKind::String`] these are the UTF-8 contents
    pub data: Vec<u8>,
}

impl Res {
    /// Create a new resource item.
    ///
    /// # Arguments
    /// * `name` - Item name within its container
    /// * `kind` - Type tag
    /// * `data` - Raw item bytes
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ResKind, data: Vec<u8>) -> Self {
        Res {
            name: name.into(),
            kind,
            data,
        }
    }

    /// Returns `true` if this item is a compiled markup (BAML) stream.
    #[must_use]
    pub fn is_baml_stream(&self) -> bool {
        self.kind == ResKind::Stream && self.name.ends_with(".baml")
    }

    /// Returns `true` if this item is a string value.
    #[must_use]
    pub fn is_string(&self) -> bool {
        self.kind == ResKind::String
    }
}

/// A module-level embedded resource container record.
///
/// For WPF-style assemblies this is typically the `{AssemblyName}.g.resources` container
/// holding the compiled markup streams. The wrapper itself can be renamed by
/// embedded-resource processors; its items flow through the per-item processor chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedResource {
    /// Container name, e.g. `ClassLibrary.g.resources`
    pub name: String,
    /// Items stored in the container, in declaration order
    pub items: Vec<Res>,
}

impl EmbeddedResource {
    /// Create a new container record.
    ///
    /// # Arguments
    /// * `name` - Container name
    /// * `items` - Items stored in the container
    #[must_use]
    pub fn new(name: impl Into<String>, items: Vec<Res>) -> Self {
        EmbeddedResource {
            name: name.into(),
            items,
        }
    }
}

/// One input module's mergeable surface.
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    /// Simple assembly name, without version/culture/token qualifiers
    pub name: String,
    /// Full names of the module's assembly references, in declaration order
    pub references: Vec<String>,
    /// Embedded resource containers, in module declaration order
    pub resources: Vec<EmbeddedResource>,
    /// Native Win32 resource tree, when the module carries a `.rsrc` section
    pub win32_resources: Option<ResourceDirectory>,
}

impl Assembly {
    /// Create an assembly with no resources.
    ///
    /// # Arguments
    /// * `name` - Simple assembly name
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Assembly {
            name: name.into(),
            ..Assembly::default()
        }
    }
}

/// The primary assembly plus the ordered list of other assemblies being merged into it.
///
/// Merge results depend on this order: the primary's data wins leaf conflicts, and the
/// others are folded in list order.
#[derive(Debug, Clone)]
pub struct AssemblySet {
    /// The assembly the others are merged into
    pub primary: Assembly,
    /// The assemblies being merged away, in merge order
    pub others: Vec<Assembly>,
}

impl AssemblySet {
    /// Create a set from the primary and the ordered other assemblies.
    #[must_use]
    pub fn new(primary: Assembly, others: Vec<Assembly>) -> Self {
        AssemblySet { primary, others }
    }

    /// Returns `true` if the given name is the primary assembly's.
    #[must_use]
    pub fn is_primary(&self, name: &str) -> bool {
        self.primary.name == name
    }

    /// Simple names of the assemblies being merged away, in merge order.
    #[must_use]
    pub fn merged_names(&self) -> Vec<String> {
        self.others.iter().map(|a| a.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baml_stream_predicate() {
        let baml = Res::new("themes/generic.baml", ResKind::Stream, vec![]);
        assert!(baml.is_baml_stream());

        let xaml = Res::new("themes/generic.xaml", ResKind::Stream, vec![]);
        assert!(!xaml.is_baml_stream());

        let string = Res::new("themes/generic.baml", ResKind::String, vec![]);
        assert!(!string.is_baml_stream());
        assert!(string.is_string());
    }
}
