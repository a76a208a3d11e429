//! Chain-of-responsibility resource processing pipeline.
//!
//! Every embedded resource of every input assembly flows through an ordered processor
//! chain into the output resource set. A processor either claims a resource (handles it
//! fully, chain stops) or passes; unclaimed resources are copied verbatim. The order is
//! fixed: content-rewriting processors run before anything that would copy bytes
//! through unchanged.
//!
//! Assemblies are processed strictly sequentially, merged libraries first and the
//! primary last, so processors that accumulate state across libraries (the BAML
//! collector) are complete before the primary's own resources are handled.
//!
//! # Key Components
//!
//! - [`ResProcessor`] / [`EmbeddedResourceProcessor`] - The two capability traits
//! - [`ResourcePipeline`] - The orchestrator with the default chain
//! - [`ResourceSink`] / [`CollectedResources`] - The output boundary
//!
//! # Usage Examples
//!
//! ```rust
//! use dotmerge::assembly::{Assembly, AssemblySet};
//! use dotmerge::logger::NullLog;
//! use dotmerge::pipeline::{CollectedResources, ResourcePipeline};
//!
//! let set = AssemblySet::new(Assembly::new("App"), vec![Assembly::new("Lib")]);
//! let log = NullLog;
//! let mut sink = CollectedResources::new();
//!
//! ResourcePipeline::new(&set, &log).run(&set, &mut sink)?;
//! # Ok::<(), dotmerge::Error>(())
//! ```

pub mod processors;
pub mod sink;

pub use processors::{
    BamlResourcePatcher, BamlStreamCollector, CollectedBaml, NamespaceRenamer,
    StringFixProcessor,
};
pub use sink::{CollectedResources, ResourceSink};

use std::{cell::RefCell, rc::Rc};

use crate::{
    assembly::{Assembly, AssemblySet, EmbeddedResource, Res},
    logger::Log,
    Result,
};

/// A processor operating on a single resource item.
pub trait ResProcessor {
    /// Try to handle `res`.
    ///
    /// Returns `true` when the resource was fully handled and the chain must stop,
    /// `false` when this processor is not applicable.
    ///
    /// # Errors
    /// Structurally undecodable input (a corrupt BAML stream, a non-UTF-8 string
    /// resource) aborts the merge.
    fn process(
        &mut self,
        owner: &Assembly,
        res: &mut Res,
        sink: &mut dyn ResourceSink,
    ) -> Result<bool>;

    /// Called once after every assembly's resources have been processed.
    ///
    /// # Errors
    /// Same conditions as [`ResProcessor::process`].
    fn finish(&mut self, sink: &mut dyn ResourceSink) -> Result<()> {
        let _ = sink;
        Ok(())
    }
}

/// A processor operating on a resource container's wrapper record.
pub trait EmbeddedResourceProcessor {
    /// Rewrite the wrapper record in place (e.g. rename the container).
    fn process(&mut self, owner: &Assembly, container: &mut EmbeddedResource);
}

/// Runs every resource of an [`AssemblySet`] through the processor chain.
pub struct ResourcePipeline<'a> {
    log: &'a dyn Log,
    item_processors: Vec<Box<dyn ResProcessor + 'a>>,
    wrapper_processors: Vec<Box<dyn EmbeddedResourceProcessor + 'a>>,
}

impl<'a> ResourcePipeline<'a> {
    /// Create a pipeline with the default processor chain for `set`.
    ///
    /// The chain, in claim order: string fixing, BAML stream collection, BAML theme
    /// patching; plus the container renamer at the wrapper level.
    #[must_use]
    pub fn new(set: &AssemblySet, log: &'a dyn Log) -> Self {
        let primary = set.primary.name.clone();
        let merged = set.merged_names();
        let collected = Rc::new(RefCell::new(CollectedBaml::default()));

        ResourcePipeline {
            log,
            item_processors: vec![
                Box::new(StringFixProcessor::new(primary.clone(), merged.clone())),
                Box::new(BamlStreamCollector::new(
                    primary.clone(),
                    merged.clone(),
                    Rc::clone(&collected),
                )),
                Box::new(BamlResourcePatcher::new(
                    &set.primary,
                    merged,
                    collected,
                    log,
                )),
            ],
            wrapper_processors: vec![Box::new(NamespaceRenamer::new(primary))],
        }
    }

    /// Create a pipeline with an explicit processor chain.
    #[must_use]
    pub fn with_processors(
        log: &'a dyn Log,
        item_processors: Vec<Box<dyn ResProcessor + 'a>>,
        wrapper_processors: Vec<Box<dyn EmbeddedResourceProcessor + 'a>>,
    ) -> Self {
        ResourcePipeline {
            log,
            item_processors,
            wrapper_processors,
        }
    }

    /// Process every resource of `set` into `sink`.
    ///
    /// Merged libraries are processed in list order, the primary last; after all
    /// assemblies, each item processor's [`ResProcessor::finish`] hook runs once.
    ///
    /// # Errors
    /// Propagates the first fatal decode failure from a processor; recoverable
    /// conflicts are logged and do not surface here.
    pub fn run(&mut self, set: &AssemblySet, sink: &mut dyn ResourceSink) -> Result<()> {
        for assembly in set.others.iter().chain(std::iter::once(&set.primary)) {
            self.log
                .info(&format!("Processing resources of assembly '{}'", assembly.name));

            for container in &assembly.resources {
                let mut container = container.clone();
                for processor in &mut self.wrapper_processors {
                    processor.process(assembly, &mut container);
                }

                for item in container.items {
                    self.process_item(assembly, item, sink)?;
                }
            }
        }

        for processor in &mut self.item_processors {
            processor.finish(sink)?;
        }

        Ok(())
    }

    fn process_item(
        &mut self,
        owner: &Assembly,
        mut item: Res,
        sink: &mut dyn ResourceSink,
    ) -> Result<()> {
        for processor in &mut self.item_processors {
            if processor.process(owner, &mut item, sink)? {
                return Ok(());
            }
        }

        // No processor claimed it: verbatim copy.
        sink.add_data(&item.name, item.kind, item.data);
        Ok(())
    }
}
