//! TypeScript typings generation from a [`SchemaCorpus`].
//!
//! A [`TypingsGenerator`] walks the selected methods, turns their parameters
//! and responses into declarations, then drains the discovery queue until
//! every referenced object has a unit of its own. The result is an
//! in-memory [`GeneratedTypings`] that can be inspected or written out.

use crate::config::GeneratorOptions;
use crate::corpus::SchemaCorpus;
use crate::error::Result;
use crate::graph::{Dependencies, DiscoveryQueue, ExportRegistry};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub mod declaration;
pub mod enums;
pub mod names;
mod methods;
mod objects;
mod output;
pub mod types;

pub use declaration::{Declaration, DeclarationKind, Field};
pub use output::GeneratedTypings;
pub use types::{EnumLookup, TypeContext, TypeExpr};

/// Typings generator for one corpus and one set of options
pub struct TypingsGenerator<'c> {
    corpus: &'c SchemaCorpus,
    options: &'c GeneratorOptions,
}

impl<'c> TypingsGenerator<'c> {
    pub fn new(corpus: &'c SchemaCorpus, options: &'c GeneratorOptions) -> Self {
        Self { corpus, options }
    }

    /// Run a full generation.
    ///
    /// Every call starts from fresh run state, so a generator can be run
    /// repeatedly with identical results.
    pub fn generate(&self) -> Result<GeneratedTypings> {
        tracing::info!("generating typings");
        let mut run = GenerationRun::default();

        self.generate_methods(&mut run)?;
        self.generate_discovered_objects(&mut run)?;
        self.emit_method_units(&mut run)?;
        self.generate_errors(&mut run)?;
        self.generate_common(&mut run)?;

        tracing::info!("creating index.ts exports...");
        let (manifest, count) = run.exports.manifest();
        run.files.insert(PathBuf::from("index.ts"), manifest);
        tracing::info!("{count} objects successfully generated");

        Ok(GeneratedTypings {
            files: run.files,
            exports: run.exports.into_inner(),
        })
    }
}

/// Declarations produced together, with what they reference
#[derive(Debug, Clone, Default)]
pub(crate) struct Emitted {
    pub declarations: Vec<Declaration>,
    pub dependencies: Dependencies,
}

impl Emitted {
    fn extend(&mut self, other: Emitted) {
        self.declarations.extend(other.declarations);
        self.dependencies.merge(&other.dependencies);
    }
}

impl From<Vec<Declaration>> for Emitted {
    fn from(declarations: Vec<Declaration>) -> Self {
        Self {
            declarations,
            dependencies: Dependencies::new(),
        }
    }
}

/// Mutable state of a single generation run
#[derive(Debug, Default)]
pub(crate) struct GenerationRun {
    queue: DiscoveryQueue,
    /// Method declarations per section, written once all methods are done
    method_units: BTreeMap<String, Emitted>,
    exports: ExportRegistry,
    files: BTreeMap<PathBuf, String>,
}

impl GenerationRun {
    /// Render a unit, register its exports under `export_path` and store it
    fn add_unit(
        &mut self,
        path: PathBuf,
        export_path: &str,
        imports: &[String],
        declarations: &[Declaration],
    ) -> Result<()> {
        let mut blocks = Vec::with_capacity(declarations.len() + 1);
        if !imports.is_empty() {
            blocks.push(imports.join("\n"));
        }
        for declaration in declarations {
            blocks.push(declaration.render()?);
            if let Some(name) = declaration.exported_name() {
                self.exports.register(export_path, name);
            }
        }

        self.files.insert(path, blocks.join("\n\n"));
        Ok(())
    }
}

/// Non-blank parts joined by `separator`
fn join_descriptions<'a>(
    parts: impl IntoIterator<Item = Option<&'a str>>,
    separator: &str,
) -> Option<String> {
    let parts: Vec<&str> = parts
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(separator))
    }
}
