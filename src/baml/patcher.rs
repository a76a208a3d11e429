//! In-place patching and reference rewriting of existing BAML documents.
//!
//! Two transformations live here:
//!
//! - [`ThemePatcher`] appends merged-dictionary entries to an existing generic-theme
//!   document without disturbing unrelated records, rejecting documents whose root
//!   element is not a `ResourceDictionary`.
//! - [`BamlRewriter`] collapses cross-assembly references inside any BAML stream being
//!   carried over from a merged library: assembly-info names, `assembly=` xmlns
//!   suffixes, and pack-URI property values all get redirected at the primary assembly.
//!
//! Both operate on [`BamlDocument`]s and leave serialization to the codec, which
//! recomputes deferred-content sizes after records have been spliced in.

use std::borrow::Cow;

use crate::{
    baml::{
        generator::to_pack_uri,
        records::{BamlDocument, BamlRecord},
        TYPE_RESOURCE_DICTIONARY, TYPE_URI_CONVERTER,
    },
    logger::Log,
};

/// Rewrite a resource path for the merged output.
///
/// Pure function of its inputs. Paths with no recognizable structure (empty, no leading
/// delimiter, no assembly-qualified pattern) come back unchanged, borrowed.
///
/// The rules, with `prefix` being an optional `pack://application:,,,` scheme part:
///
/// - `{prefix}/{Asm};component/{rest}` where `Asm` is the primary: unchanged.
/// - `{prefix}/{Asm};component/{rest}` where `Asm` is a merged library:
///   `{prefix}/{primary};component/{Asm}/{rest}`, the library name becoming a
///   namespacing folder.
/// - `/{rest}` with no component marker, seen inside a merged library's own stream:
///   `/{owner}/{rest}`, avoiding collisions with same-named resources elsewhere.
/// - `/{rest}` inside the primary's own stream: unchanged, it already resolves.
///
/// # Examples
///
/// ```rust
/// use dotmerge::baml::patch_path;
///
/// let merged = vec!["ClassLibrary".to_string()];
/// assert_eq!(
///     patch_path(
///         "pack://application:,,,/ClassLibrary;component/TextBlockStyles.xaml",
///         "ClassLibrary",
///         "MainAssembly",
///         &merged,
///     ),
///     "pack://application:,,,/MainAssembly;component/ClassLibrary/TextBlockStyles.xaml"
/// );
/// assert_eq!(patch_path("123", "ClassLibrary", "MainAssembly", &merged), "123");
/// ```
#[must_use]
pub fn patch_path<'a>(
    path: &'a str,
    owner: &str,
    primary: &str,
    merged: &[String],
) -> Cow<'a, str> {
    const PACK_PREFIX: &str = "pack://application:,,,";
    const COMPONENT: &str = ";component/";

    let (prefix, rest) = match path.strip_prefix(PACK_PREFIX) {
        Some(rest) => (PACK_PREFIX, rest),
        None => ("", path),
    };
    if !rest.starts_with('/') {
        return Cow::Borrowed(path);
    }

    if let Some(marker) = rest.find(COMPONENT) {
        let assembly = &rest[1..marker];
        let tail = &rest[marker + COMPONENT.len()..];

        if assembly == primary {
            return Cow::Borrowed(path);
        }
        if merged.iter().any(|m| m == assembly) {
            return Cow::Owned(format!(
                "{}/{};component/{}/{}",
                prefix, primary, assembly, tail
            ));
        }
        return Cow::Borrowed(path);
    }

    if owner != primary {
        return Cow::Owned(format!("{}/{}{}", prefix, owner, rest));
    }
    Cow::Borrowed(path)
}

/// Per-record reference rewriter for BAML streams crossing the merge boundary.
pub struct BamlRewriter<'a> {
    primary: &'a str,
    merged: &'a [String],
}

impl<'a> BamlRewriter<'a> {
    /// Create a rewriter targeting `primary`, collapsing references to `merged`.
    #[must_use]
    pub fn new(primary: &'a str, merged: &'a [String]) -> Self {
        BamlRewriter { primary, merged }
    }

    /// Rewrite every cross-assembly reference in `doc`, which came from `owner`.
    pub fn rewrite(&self, doc: &mut BamlDocument, owner: &str) {
        for record in &mut doc.records {
            match record {
                BamlRecord::AssemblyInfo { full_name, .. } => {
                    let simple = full_name.split(',').next().unwrap_or(full_name).trim();
                    if self.merged.iter().any(|m| m == simple) {
                        *full_name = self.primary.to_string();
                    }
                }
                BamlRecord::XmlnsProperty { xml_namespace, .. } => {
                    if let Some(pos) = xml_namespace.find("assembly=") {
                        xml_namespace.truncate(pos + "assembly=".len());
                        xml_namespace.push_str(self.primary);
                    }
                }
                BamlRecord::PropertyWithConverter { value, .. } => {
                    *value = patch_path(value, owner, self.primary, self.merged).into_owned();
                }
                _ => {}
            }
        }
    }
}

/// Appends merged-dictionary entries to an existing generic-theme document.
///
/// Documents patched here may be hand-authored rather than generator output, so every
/// lookup is by content (attribute names, element types) rather than by fixed record
/// position, and anything the patcher needs that is missing gets created at the
/// position the markup compiler would have used.
pub struct ThemePatcher<'a> {
    primary: &'a str,
    log: &'a dyn Log,
}

impl<'a> ThemePatcher<'a> {
    /// Create a patcher targeting `primary`, reporting through `log`.
    #[must_use]
    pub fn new(primary: &'a str, log: &'a dyn Log) -> Self {
        ThemePatcher { primary, log }
    }

    /// Add one merged-dictionary entry per path in `files` to `doc`.
    ///
    /// Returns `false`, leaving the document untouched, when the root element is not a
    /// `ResourceDictionary`; the condition is reported as an error but does not abort
    /// the merge.
    pub fn add_merged_dictionaries(&self, doc: &mut BamlDocument, files: &[String]) -> bool {
        let Some(root) = doc
            .records
            .iter()
            .position(|r| matches!(r, BamlRecord::ElementStart { .. }))
        else {
            self.log
                .error("Cannot patch theme resource: the document has no root element");
            return false;
        };
        if !matches!(
            doc.records[root],
            BamlRecord::ElementStart {
                type_id: TYPE_RESOURCE_DICTIONARY,
                ..
            }
        ) {
            self.log.error(
                "Cannot patch theme resource: the root element is not a ResourceDictionary",
            );
            return false;
        }

        let merged_id = self.ensure_attribute_info(doc, root, "MergedDictionaries");
        let source_id = self.ensure_attribute_info(doc, root, "Source");
        // Attribute insertion may have shifted the root index.
        let root = doc
            .records
            .iter()
            .position(|r| matches!(r, BamlRecord::ElementStart { .. }))
            .unwrap_or(root);

        let list_end = self.ensure_merged_dictionaries_list(doc, root, merged_id);

        let mut additions = Vec::with_capacity(3 * files.len());
        for file in files {
            additions.push(BamlRecord::ElementStart {
                type_id: TYPE_RESOURCE_DICTIONARY,
                flags: 0,
            });
            additions.push(BamlRecord::PropertyWithConverter {
                attribute_id: source_id,
                value: to_pack_uri(self.primary, file),
                converter_type_id: TYPE_URI_CONVERTER,
            });
            additions.push(BamlRecord::ElementEnd);
        }
        insert_records(doc, list_end, additions);

        true
    }

    /// Find the attribute id of `name`, creating an attribute-info record when absent.
    ///
    /// An existing record is reused rather than duplicated; a created one gets the next
    /// free attribute id and is declared just before the root element, where the markup
    /// compiler places attribute infos.
    fn ensure_attribute_info(&self, doc: &mut BamlDocument, root: usize, name: &str) -> u16 {
        let existing = doc.records.iter().find_map(|r| match r {
            BamlRecord::AttributeInfo {
                attribute_id,
                name: n,
                ..
            } if n == name => Some(*attribute_id),
            _ => None,
        });
        if let Some(id) = existing {
            return id;
        }

        let next_id = doc
            .records
            .iter()
            .filter_map(|r| match r {
                BamlRecord::AttributeInfo { attribute_id, .. } => Some(*attribute_id + 1),
                _ => None,
            })
            .max()
            .unwrap_or(0);
        insert_records(
            doc,
            root,
            vec![BamlRecord::AttributeInfo {
                attribute_id: next_id,
                owner_type_id: TYPE_RESOURCE_DICTIONARY,
                attribute_usage: 0,
                name: name.to_string(),
            }],
        );
        next_id
    }

    /// Locate the `MergedDictionaries` property list, creating an empty one when
    /// absent, and return the index of its closing record.
    fn ensure_merged_dictionaries_list(
        &self,
        doc: &mut BamlDocument,
        root: usize,
        merged_id: u16,
    ) -> usize {
        let start = doc.records.iter().position(|r| {
            matches!(r, BamlRecord::PropertyListStart { attribute_id } if *attribute_id == merged_id)
        });

        if let Some(start) = start {
            let mut depth = 0usize;
            for (index, record) in doc.records.iter().enumerate().skip(start) {
                match record {
                    BamlRecord::PropertyListStart { .. } => depth += 1,
                    BamlRecord::PropertyListEnd => {
                        depth -= 1;
                        if depth == 0 {
                            return index;
                        }
                    }
                    _ => {}
                }
            }
        }

        // Immediately inside the root element, after its namespace declarations and
        // any deferred-content marker.
        let mut insert_at = root + 1;
        while matches!(
            doc.records.get(insert_at),
            Some(
                BamlRecord::XmlnsProperty { .. } | BamlRecord::DeferableContentStart { .. }
            )
        ) {
            insert_at += 1;
        }
        insert_records(
            doc,
            insert_at,
            vec![
                BamlRecord::PropertyListStart {
                    attribute_id: merged_id,
                },
                BamlRecord::PropertyListEnd,
            ],
        );
        insert_at + 1
    }
}

/// Splice `records` into the document at `position`, keeping deferred targets valid.
fn insert_records(doc: &mut BamlDocument, position: usize, records: Vec<BamlRecord>) {
    let count = records.len();
    doc.records.splice(position..position, records);

    for record in &mut doc.records {
        if let BamlRecord::DeferableContentStart {
            target: Some(target),
            ..
        } = record
        {
            if *target >= position {
                *target += count;
            }
        }
    }
}
