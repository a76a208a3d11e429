//! End-to-end tests for the resource pipeline and the BAML engine.
//!
//! These scenarios mirror a WPF-style merge: a primary application assembly absorbing a
//! class library whose `.g.resources` container carries compiled markup streams.


use dotmerge::{
    baml::{BamlDocument, BamlRecord, TYPE_RESOURCE_DICTIONARY, XMLNS_PRESENTATION},
    prelude::*,
    Result,
};
use fixtures::ensure_env_logger_initialized;

const PRESENTATION_FRAMEWORK: &str =
    "PresentationFramework, Version=4.0.0.0, Culture=neutral, PublicKeyToken=31bf3856ad364e35";

fn library_theme_baml() -> Vec<u8> {
    let mut doc = BamlDocument::new();
    doc.records = vec![
        BamlRecord::DocumentStart {
            load_async: false,
            max_async_records: -1,
            debug_baml: false,
        },
        BamlRecord::AssemblyInfo {
            assembly_id: 0,
            full_name: "ClassLibrary, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null"
                .into(),
        },
        BamlRecord::ElementStart {
            type_id: TYPE_RESOURCE_DICTIONARY,
            flags: 0,
        },
        BamlRecord::XmlnsProperty {
            prefix: String::new(),
            xml_namespace: XMLNS_PRESENTATION.into(),
            assembly_ids: vec![0],
        },
        BamlRecord::ElementEnd,
        BamlRecord::DocumentEnd,
    ];
    doc.to_bytes().unwrap()
}

fn merge_set() -> AssemblySet {
    let mut library = Assembly::new("ClassLibrary");
    library.resources.push(EmbeddedResource::new(
        "ClassLibrary.g.resources",
        vec![
            Res::new("themes/generic.baml", ResKind::Stream, library_theme_baml()),
            Res::new(
                "typename",
                ResKind::String,
                b"ClassLibrary.Widget, ClassLibrary".to_vec(),
            ),
            Res::new("icon.png", ResKind::ByteArray, vec![0x89, 0x50, 0x4E, 0x47]),
        ],
    ));

    let mut primary = Assembly::new("App");
    primary.references = vec![PRESENTATION_FRAMEWORK.to_string()];
    AssemblySet::new(primary, vec![library])
}

#[test]
fn full_pipeline_run() -> Result<()> {
    ensure_env_logger_initialized();

    let set = merge_set();
    let log = FacadeLog;
    let mut sink = CollectedResources::new();

    ResourcePipeline::new(&set, &log).run(&set, &mut sink)?;

    // The library's theme was relocated under its own lowercased folder with its
    // assembly reference collapsed onto the primary.
    let relocated = sink.find("classlibrary/themes/generic.baml").unwrap();
    let doc = BamlDocument::parse(&relocated.data)?;
    assert!(doc.records.iter().any(|r| matches!(
        r,
        BamlRecord::AssemblyInfo { full_name, .. } if full_name == "App"
    )));

    // The string resource had the library name rewritten.
    let string = sink.find("typename").unwrap();
    assert_eq!(string.data, b"App.Widget, App");

    // The binary resource fell through the chain verbatim.
    let icon = sink.find("icon.png").unwrap();
    assert_eq!(icon.data, vec![0x89, 0x50, 0x4E, 0x47]);

    // A synthetic generic theme referencing the relocated dictionary was generated.
    let theme = sink.find("themes/generic.baml").unwrap();
    let doc = BamlDocument::parse(&theme.data)?;
    assert!(doc.records.iter().any(|r| matches!(
        r,
        BamlRecord::PropertyWithConverter { value, .. }
            if value == "pack://application:,,,/App;component/classlibrary/themes/generic.xaml"
    )));

    Ok(())
}

#[test]
fn primary_theme_is_patched_not_replaced() -> Result<()> {
    ensure_env_logger_initialized();

    let mut set = merge_set();

    // Give the primary its own generic theme carrying an existing dictionary entry.
    let own_theme = dotmerge::baml::generate_generic_theme(
        "App",
        &[PRESENTATION_FRAMEWORK.to_string()],
        &["own/themes/colors.baml".to_string()],
    );
    set.primary.resources.push(EmbeddedResource::new(
        "App.g.resources",
        vec![Res::new(
            "themes/generic.baml",
            ResKind::Stream,
            own_theme.to_bytes()?,
        )],
    ));

    let log = MemoryLog::new();
    let mut sink = CollectedResources::new();
    ResourcePipeline::new(&set, &log).run(&set, &mut sink)?;

    let theme = sink.find("themes/generic.baml").unwrap();
    let doc = BamlDocument::parse(&theme.data)?;
    let uris: Vec<&str> = doc
        .records
        .iter()
        .filter_map(|r| match r {
            BamlRecord::PropertyWithConverter { value, .. } => Some(value.as_str()),
            _ => None,
        })
        .collect();

    // The original entry survived and the merged library's dictionary was appended.
    assert_eq!(
        uris,
        vec![
            "pack://application:,,,/App;component/own/themes/colors.xaml",
            "pack://application:,,,/App;component/classlibrary/themes/generic.xaml",
        ]
    );

    // Exactly one generic theme in the output.
    let themes = sink
        .entries()
        .iter()
        .filter(|r| r.name == "themes/generic.baml")
        .count();
    assert_eq!(themes, 1);

    Ok(())
}

#[test]
fn theme_generation_is_deterministic() -> Result<()> {
    let run = || -> Result<Vec<u8>> {
        let set = merge_set();
        let log = NullLog;
        let mut sink = CollectedResources::new();
        ResourcePipeline::new(&set, &log).run(&set, &mut sink)?;
        Ok(sink.find("themes/generic.baml").unwrap().data.clone())
    };

    assert_eq!(run()?, run()?);
    Ok(())
}

#[test]
fn patch_path_public_contract() {
    let merged = vec!["ClassLibrary".to_string()];

    assert_eq!(
        patch_path(
            "pack://application:,,,/ClassLibrary;component/TextBlockStyles.xaml",
            "ClassLibrary",
            "MainAssembly",
            &merged,
        ),
        "pack://application:,,,/MainAssembly;component/ClassLibrary/TextBlockStyles.xaml"
    );
    assert_eq!(
        patch_path("/themes/ButtonStyles.xaml", "ClassLibrary", "MainAssembly", &merged),
        "/ClassLibrary/themes/ButtonStyles.xaml"
    );
    assert_eq!(
        patch_path(
            "/MainAssembly;component/ButtonStyles.xaml",
            "MainAssembly",
            "MainAssembly",
            &merged,
        ),
        "/MainAssembly;component/ButtonStyles.xaml"
    );
    assert_eq!(patch_path("123", "ClassLibrary", "MainAssembly", &merged), "123");
}
