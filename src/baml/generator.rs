//! Synthetic `themes/generic` BAML document generation.
//!
//! When merged libraries bring BAML dictionaries but the primary assembly has no generic
//! theme of its own, the merge must still make those styles reachable. The generator
//! builds a minimal `ResourceDictionary` document whose `MergedDictionaries` collection
//! references every collected markup file through a pack URI, exactly as the markup
//! compiler would have emitted it.

use crate::baml::{
    records::{BamlDocument, BamlRecord},
    TYPE_RESOURCE_DICTIONARY, TYPE_URI_CONVERTER, WPF_FRAMEWORK_ASSEMBLIES,
    XMLNS_PRESENTATION,
};

/// Build the pack URI referencing `path` as a component of `assembly`.
///
/// A `.baml` extension is swapped to `.xaml`: pack URIs name the source markup, the
/// runtime maps it back to the compiled stream.
#[must_use]
pub fn to_pack_uri(assembly: &str, path: &str) -> String {
    let path = path.strip_suffix(".baml").map_or_else(
        || path.to_string(),
        |stem| format!("{}.xaml", stem),
    );
    format!("pack://application:,,,/{};component/{}", assembly, path)
}

/// Generate a generic-theme document referencing `files` from `primary_name`.
///
/// Output is fully determined by the inputs: the same file list, primary name, and
/// reference list always produce byte-identical documents.
///
/// # Arguments
/// * `primary_name` - Simple name of the merged output assembly
/// * `references` - Full names of the primary's assembly references; the framework
///   assemblies among them become assembly-info records, ids assigned in reference order
/// * `files` - Resource paths of the merged dictionaries, `.baml` extension included
#[must_use]
pub fn generate_generic_theme(
    primary_name: &str,
    references: &[String],
    files: &[String],
) -> BamlDocument {
    let mut doc = BamlDocument::new();

    doc.records.push(BamlRecord::DocumentStart {
        load_async: false,
        max_async_records: -1,
        debug_baml: false,
    });

    let mut assembly_ids = Vec::new();
    for reference in references {
        let simple = reference.split(',').next().unwrap_or(reference).trim();
        if !WPF_FRAMEWORK_ASSEMBLIES.contains(&simple) {
            continue;
        }
        if doc.records.iter().any(
            |r| matches!(r, BamlRecord::AssemblyInfo { full_name, .. } if full_name == reference),
        ) {
            continue;
        }
        let assembly_id = assembly_ids.len() as u16;
        doc.records.push(BamlRecord::AssemblyInfo {
            assembly_id,
            full_name: reference.clone(),
        });
        assembly_ids.push(assembly_id);
    }

    doc.records.push(BamlRecord::AttributeInfo {
        attribute_id: 0,
        owner_type_id: TYPE_RESOURCE_DICTIONARY,
        attribute_usage: 0,
        name: "MergedDictionaries".to_string(),
    });
    doc.records.push(BamlRecord::AttributeInfo {
        attribute_id: 1,
        owner_type_id: TYPE_RESOURCE_DICTIONARY,
        attribute_usage: 0,
        name: "Source".to_string(),
    });

    doc.records.push(BamlRecord::ElementStart {
        type_id: TYPE_RESOURCE_DICTIONARY,
        flags: 0,
    });
    doc.records.push(BamlRecord::XmlnsProperty {
        prefix: String::new(),
        xml_namespace: XMLNS_PRESENTATION.to_string(),
        assembly_ids,
    });
    doc.records.push(BamlRecord::DeferableContentStart {
        content_size: 0,
        target: None,
    });
    let deferable_index = doc.records.len() - 1;

    doc.records.push(BamlRecord::PropertyListStart { attribute_id: 0 });
    for file in files {
        doc.records.push(BamlRecord::ElementStart {
            type_id: TYPE_RESOURCE_DICTIONARY,
            flags: 0,
        });
        doc.records.push(BamlRecord::PropertyWithConverter {
            attribute_id: 1,
            value: to_pack_uri(primary_name, file),
            converter_type_id: TYPE_URI_CONVERTER,
        });
        doc.records.push(BamlRecord::ElementEnd);
    }
    doc.records.push(BamlRecord::PropertyListEnd);
    doc.records.push(BamlRecord::ElementEnd);
    let dictionary_end = doc.records.len() - 1;
    doc.records.push(BamlRecord::DocumentEnd);

    if let BamlRecord::DeferableContentStart { target, .. } = &mut doc.records[deferable_index] {
        *target = Some(dictionary_end);
    }

    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baml::records::BamlRecordKind;

    const PRESENTATION_FRAMEWORK: &str =
        "PresentationFramework, Version=4.0.0.0, Culture=neutral, PublicKeyToken=31bf3856ad364e35";
    const WINDOWS_BASE: &str =
        "WindowsBase, Version=4.0.0.0, Culture=neutral, PublicKeyToken=31bf3856ad364e35";

    fn references() -> Vec<String> {
        vec![
            "mscorlib, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089".into(),
            WINDOWS_BASE.into(),
            PRESENTATION_FRAMEWORK.into(),
        ]
    }

    #[test]
    fn pack_uri_swaps_extension() {
        assert_eq!(
            to_pack_uri("App", "classlibrary/themes/button.baml"),
            "pack://application:,,,/App;component/classlibrary/themes/button.xaml"
        );
        assert_eq!(
            to_pack_uri("App", "readme.txt"),
            "pack://application:,,,/App;component/readme.txt"
        );
    }

    #[test]
    fn references_outside_allow_list_are_skipped() {
        let doc = generate_generic_theme("App", &references(), &[]);

        let infos: Vec<&str> = doc
            .records
            .iter()
            .filter_map(|r| match r {
                BamlRecord::AssemblyInfo { full_name, .. } => Some(full_name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(infos, vec![WINDOWS_BASE, PRESENTATION_FRAMEWORK]);
    }

    #[test]
    fn document_structure() {
        let files = vec!["classlibrary/themes/generic.baml".to_string()];
        let doc = generate_generic_theme("App", &references(), &files);

        let kinds: Vec<BamlRecordKind> = doc.records.iter().map(BamlRecord::kind).collect();
        assert_eq!(
            kinds,
            vec![
                BamlRecordKind::DocumentStart,
                BamlRecordKind::AssemblyInfo,
                BamlRecordKind::AssemblyInfo,
                BamlRecordKind::AttributeInfo,
                BamlRecordKind::AttributeInfo,
                BamlRecordKind::ElementStart,
                BamlRecordKind::XmlnsProperty,
                BamlRecordKind::DeferableContentStart,
                BamlRecordKind::PropertyListStart,
                BamlRecordKind::ElementStart,
                BamlRecordKind::PropertyWithConverter,
                BamlRecordKind::ElementEnd,
                BamlRecordKind::PropertyListEnd,
                BamlRecordKind::ElementEnd,
                BamlRecordKind::DocumentEnd,
            ]
        );

        match &doc.records[10] {
            BamlRecord::PropertyWithConverter { value, .. } => assert_eq!(
                value,
                "pack://application:,,,/App;component/classlibrary/themes/generic.xaml"
            ),
            other => panic!("unexpected record {:?}", other),
        }

        // The deferred span closes at the dictionary's own ElementEnd.
        match &doc.records[7] {
            BamlRecord::DeferableContentStart { target, .. } => assert_eq!(*target, Some(13)),
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let files = vec![
            "a/themes/x.baml".to_string(),
            "b/themes/y.baml".to_string(),
        ];
        let first = generate_generic_theme("App", &references(), &files)
            .to_bytes()
            .unwrap();
        let second = generate_generic_theme("App", &references(), &files)
            .to_bytes()
            .unwrap();
        assert_eq!(first, second);
    }
}
