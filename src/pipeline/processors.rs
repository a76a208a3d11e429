//! The built-in resource processors.
//!
//! Each processor claims one category of resource and transforms it for the merged
//! output; the pipeline tries them in a fixed order and falls back to a verbatim copy
//! when none claims. The BAML collector and the theme patcher share a collected-stream
//! list so the primary's generic theme, processed last, can reference every dictionary
//! the collector relocated.

use std::{cell::RefCell, rc::Rc};

use crate::{
    assembly::{Assembly, EmbeddedResource, Res, ResKind},
    baml::{generate_generic_theme, BamlDocument, BamlRewriter, ThemePatcher},
    logger::Log,
    pipeline::{EmbeddedResourceProcessor, ResProcessor, ResourceSink},
    Result,
};

/// Resource path of the generic theme dictionary inside a `.g.resources` container.
pub const GENERIC_THEME_RESOURCE: &str = "themes/generic.baml";

/// BAML streams relocated by the collector, shared with the theme patcher.
#[derive(Debug, Default)]
pub struct CollectedBaml {
    /// Relocated resource paths of merged generic-theme dictionaries
    pub theme_files: Vec<String>,
}

/// Rewrites string resources that embed a merged assembly's name.
///
/// String resources frequently carry assembly-qualified type names or resource URIs;
/// after the merge those names must point at the primary assembly.
pub struct StringFixProcessor {
    primary: String,
    merged: Vec<String>,
}

impl StringFixProcessor {
    /// Create a processor redirecting `merged` names to `primary`.
    #[must_use]
    pub fn new(primary: String, merged: Vec<String>) -> Self {
        StringFixProcessor { primary, merged }
    }
}

impl ResProcessor for StringFixProcessor {
    fn process(
        &mut self,
        _owner: &Assembly,
        res: &mut Res,
        sink: &mut dyn ResourceSink,
    ) -> Result<bool> {
        if !res.is_string() {
            return Ok(false);
        }

        let value = std::str::from_utf8(&res.data)
            .map_err(|e| malformed_error!("String resource '{}' is not UTF-8: {}", res.name, e))?;

        let mut patched = value.to_string();
        for name in &self.merged {
            if patched.contains(name.as_str()) {
                patched = patched.replace(name.as_str(), &self.primary);
            }
        }

        sink.add_string(&res.name, &patched);
        Ok(true)
    }
}

/// Relocates BAML streams of merged libraries under per-library folders.
///
/// A library's `themes/generic.baml` would collide with the primary's (and with every
/// other library's), so each stream moves to `{library-lowercase}/{original-path}`
/// with its cross-assembly references rewritten on the way. Relocated generic themes
/// are recorded for the theme patcher.
pub struct BamlStreamCollector {
    primary: String,
    merged: Vec<String>,
    collected: Rc<RefCell<CollectedBaml>>,
}

impl BamlStreamCollector {
    /// Create a collector for streams merged into `primary`.
    #[must_use]
    pub fn new(primary: String, merged: Vec<String>, collected: Rc<RefCell<CollectedBaml>>) -> Self {
        BamlStreamCollector {
            primary,
            merged,
            collected,
        }
    }
}

impl ResProcessor for BamlStreamCollector {
    fn process(
        &mut self,
        owner: &Assembly,
        res: &mut Res,
        sink: &mut dyn ResourceSink,
    ) -> Result<bool> {
        if !res.is_baml_stream() || owner.name == self.primary {
            return Ok(false);
        }

        let mut doc = BamlDocument::parse(&res.data)?;
        BamlRewriter::new(&self.primary, &self.merged).rewrite(&mut doc, &owner.name);

        let relocated = format!("{}/{}", owner.name.to_lowercase(), res.name);
        if res.name == GENERIC_THEME_RESOURCE {
            self.collected
                .borrow_mut()
                .theme_files
                .push(relocated.clone());
        }

        sink.add_data(&relocated, ResKind::Stream, doc.to_bytes()?);
        Ok(true)
    }
}

/// Rewrites the primary assembly's own BAML streams and patches its generic theme.
///
/// Runs after the collector has seen every merged library (the pipeline processes the
/// primary last), so the collected theme list is complete by the time the primary's
/// `themes/generic.baml` comes through. When the primary has no generic theme at all,
/// [`ResProcessor::finish`] generates a synthetic one.
pub struct BamlResourcePatcher<'a> {
    primary: String,
    references: Vec<String>,
    merged: Vec<String>,
    collected: Rc<RefCell<CollectedBaml>>,
    log: &'a dyn Log,
    saw_primary_theme: bool,
}

impl<'a> BamlResourcePatcher<'a> {
    /// Create a patcher for the primary's streams.
    #[must_use]
    pub fn new(
        primary: &Assembly,
        merged: Vec<String>,
        collected: Rc<RefCell<CollectedBaml>>,
        log: &'a dyn Log,
    ) -> Self {
        BamlResourcePatcher {
            primary: primary.name.clone(),
            references: primary.references.clone(),
            merged,
            collected,
            log,
            saw_primary_theme: false,
        }
    }
}

impl ResProcessor for BamlResourcePatcher<'_> {
    fn process(
        &mut self,
        owner: &Assembly,
        res: &mut Res,
        sink: &mut dyn ResourceSink,
    ) -> Result<bool> {
        if !res.is_baml_stream() || owner.name != self.primary {
            return Ok(false);
        }

        let mut doc = BamlDocument::parse(&res.data)?;
        BamlRewriter::new(&self.primary, &self.merged).rewrite(&mut doc, &owner.name);

        if res.name == GENERIC_THEME_RESOURCE {
            self.saw_primary_theme = true;
            let theme_files = self.collected.borrow().theme_files.clone();
            if !theme_files.is_empty() {
                ThemePatcher::new(&self.primary, self.log)
                    .add_merged_dictionaries(&mut doc, &theme_files);
            }
        }

        sink.add_data(&res.name, ResKind::Stream, doc.to_bytes()?);
        Ok(true)
    }

    fn finish(&mut self, sink: &mut dyn ResourceSink) -> Result<()> {
        let theme_files = self.collected.borrow().theme_files.clone();
        if self.saw_primary_theme || theme_files.is_empty() {
            return Ok(());
        }

        self.log
            .info("Generating a themes/generic.baml referencing the merged dictionaries");
        let doc = generate_generic_theme(&self.primary, &self.references, &theme_files);
        sink.add_data(GENERIC_THEME_RESOURCE, ResKind::Stream, doc.to_bytes()?);
        Ok(())
    }
}

/// Renames merged libraries' resource containers into the primary's namespace.
///
/// A library's `{Library}.g.resources` wrapper becomes `{Primary}.g.resources`; every
/// other container name is kept.
pub struct NamespaceRenamer {
    primary: String,
}

impl NamespaceRenamer {
    /// Create a renamer targeting `primary`.
    #[must_use]
    pub fn new(primary: String) -> Self {
        NamespaceRenamer { primary }
    }
}

impl EmbeddedResourceProcessor for NamespaceRenamer {
    fn process(&mut self, owner: &Assembly, container: &mut EmbeddedResource) {
        if owner.name == self.primary {
            return;
        }

        let expected = format!("{}.g.resources", owner.name);
        if container.name == expected {
            container.name = format!("{}.g.resources", self.primary);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{logger::MemoryLog, pipeline::CollectedResources};

    fn lib_assembly() -> Assembly {
        Assembly::new("ClassLibrary")
    }

    #[test]
    fn string_fix_rewrites_merged_names() {
        let mut processor =
            StringFixProcessor::new("App".into(), vec!["ClassLibrary".to_string()]);
        let mut sink = CollectedResources::new();
        let mut res = Res::new(
            "typeref",
            ResKind::String,
            b"ClassLibrary.Controls.Widget, ClassLibrary".to_vec(),
        );

        let claimed = processor
            .process(&lib_assembly(), &mut res, &mut sink)
            .unwrap();
        assert!(claimed);
        assert_eq!(
            sink.find("typeref").unwrap().data,
            b"App.Controls.Widget, App"
        );
    }

    #[test]
    fn string_fix_ignores_binary_resources() {
        let mut processor = StringFixProcessor::new("App".into(), vec![]);
        let mut sink = CollectedResources::new();
        let mut res = Res::new("blob", ResKind::ByteArray, vec![0xFF]);

        assert!(!processor
            .process(&lib_assembly(), &mut res, &mut sink)
            .unwrap());
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn collector_relocates_and_records_themes() {
        let collected = Rc::new(RefCell::new(CollectedBaml::default()));
        let mut processor = BamlStreamCollector::new(
            "App".into(),
            vec!["ClassLibrary".to_string()],
            Rc::clone(&collected),
        );
        let mut sink = CollectedResources::new();

        let doc = BamlDocument::new();
        let mut res = Res::new(
            GENERIC_THEME_RESOURCE,
            ResKind::Stream,
            doc.to_bytes().unwrap(),
        );

        let claimed = processor
            .process(&lib_assembly(), &mut res, &mut sink)
            .unwrap();
        assert!(claimed);
        assert!(sink.find("classlibrary/themes/generic.baml").is_some());
        assert_eq!(
            collected.borrow().theme_files,
            vec!["classlibrary/themes/generic.baml".to_string()]
        );
    }

    #[test]
    fn collector_leaves_primary_streams_alone() {
        let collected = Rc::new(RefCell::new(CollectedBaml::default()));
        let mut processor = BamlStreamCollector::new("App".into(), vec![], collected);
        let mut sink = CollectedResources::new();

        let mut res = Res::new(GENERIC_THEME_RESOURCE, ResKind::Stream, vec![]);
        let claimed = processor
            .process(&Assembly::new("App"), &mut res, &mut sink)
            .unwrap();
        assert!(!claimed);
    }

    #[test]
    fn patcher_generates_theme_when_primary_has_none() {
        let collected = Rc::new(RefCell::new(CollectedBaml {
            theme_files: vec!["classlibrary/themes/generic.baml".to_string()],
        }));
        let log = MemoryLog::new();
        let mut primary = Assembly::new("App");
        primary.references = vec![
            "PresentationFramework, Version=4.0.0.0, Culture=neutral, PublicKeyToken=31bf3856ad364e35"
                .to_string(),
        ];
        let mut processor = BamlResourcePatcher::new(
            &primary,
            vec!["ClassLibrary".to_string()],
            collected,
            &log,
        );
        let mut sink = CollectedResources::new();

        processor.finish(&mut sink).unwrap();

        let theme = sink.find(GENERIC_THEME_RESOURCE).unwrap();
        let doc = BamlDocument::parse(&theme.data).unwrap();
        assert!(doc.records.iter().any(|r| matches!(
            r,
            crate::baml::BamlRecord::PropertyWithConverter { value, .. }
                if value == "pack://application:,,,/App;component/classlibrary/themes/generic.xaml"
        )));
    }

    #[test]
    fn patcher_skips_generation_without_collected_themes() {
        let collected = Rc::new(RefCell::new(CollectedBaml::default()));
        let log = MemoryLog::new();
        let primary = Assembly::new("App");
        let mut processor = BamlResourcePatcher::new(&primary, vec![], collected, &log);
        let mut sink = CollectedResources::new();

        processor.finish(&mut sink).unwrap();
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn renamer_moves_container_into_primary_namespace() {
        let mut renamer = NamespaceRenamer::new("App".into());

        let mut container = EmbeddedResource::new("ClassLibrary.g.resources", vec![]);
        renamer.process(&lib_assembly(), &mut container);
        assert_eq!(container.name, "App.g.resources");

        let mut other = EmbeddedResource::new("ClassLibrary.Strings.resources", vec![]);
        renamer.process(&lib_assembly(), &mut other);
        assert_eq!(other.name, "ClassLibrary.Strings.resources");
    }
}
