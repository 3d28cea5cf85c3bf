//! Import/export graph of generated declarations.
//!
//! [`Dependencies`] records which definitions a declaration refers to and
//! how; [`DiscoveryQueue`] turns those records into a work-list of
//! definitions still to generate; [`ExportRegistry`] collects what every
//! output unit exports for the root manifest.

use crate::codegen::names::{interface_name, object_section};
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

/// How a referenced definition has to be emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RefMark {
    /// Generate the target, but the referencing unit does not import it
    GenerateOnly,
    /// Generate the target in its own module and import it
    GenerateAndImport,
}

/// Referenced definition names with their marks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependencies {
    marks: BTreeMap<String, RefMark>,
}

impl Dependencies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `mark` for `name`.
    ///
    /// An existing [`RefMark::GenerateAndImport`] is never downgraded.
    pub fn mark(&mut self, name: impl Into<String>, mark: RefMark) {
        let entry = self.marks.entry(name.into()).or_insert(mark);
        if *entry != RefMark::GenerateAndImport {
            *entry = mark;
        }
    }

    /// Apply every entry of `other` through [`Dependencies::mark`]
    pub fn merge(&mut self, other: &Dependencies) {
        for (name, mark) in &other.marks {
            self.mark(name.clone(), *mark);
        }
    }

    pub fn get(&self, name: &str) -> Option<RefMark> {
        self.marks.get(name).copied()
    }

    pub fn remove(&mut self, name: &str) -> Option<RefMark> {
        self.marks.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, RefMark)> {
        self.marks.iter().map(|(name, mark)| (name.as_str(), *mark))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.marks.keys().map(String::as_str)
    }

    /// Names that must be imported into the referencing unit
    pub fn imported(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(|(_, mark)| *mark == RefMark::GenerateAndImport)
            .map(|(name, _)| name)
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}

/// Kind of output unit an import block is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// `objects/{section}/{Name}.ts`
    Object,
    /// `methods/{section}.ts`
    Methods,
}

/// Group definition names by their section
pub fn partition<'a>(names: impl IntoIterator<Item = &'a str>) -> BTreeMap<String, Vec<String>> {
    let mut sections: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for name in names {
        sections
            .entry(object_section(name).to_string())
            .or_default()
            .push(name.to_string());
    }
    sections
}

/// Import statements for every imported dependency of a unit.
///
/// Names resolving to the same module path share one statement; paths and
/// the names inside each statement are sorted.
pub fn import_statements(
    dependencies: &Dependencies,
    current_section: Option<&str>,
    kind: OutputKind,
) -> Vec<String> {
    let mut paths: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for (section, names) in partition(dependencies.imported()) {
        for name in names {
            let type_name = interface_name(&name);
            let path = match kind {
                OutputKind::Object if current_section == Some(section.as_str()) => {
                    format!("./{type_name}")
                }
                OutputKind::Object => format!("../{section}/{type_name}"),
                OutputKind::Methods => format!("../objects/{section}/{type_name}"),
            };
            paths.entry(path).or_default().insert(type_name);
        }
    }

    paths
        .into_iter()
        .map(|(path, names)| {
            let names: Vec<_> = names.into_iter().collect();
            format!("import {{ {} }} from '{}';", names.join(", "), path)
        })
        .collect()
}

/// Work-list of definitions discovered through dependencies
///
/// A name is handed out at most once per run, so draining terminates once
/// every reachable definition has been generated.
#[derive(Debug, Default)]
pub struct DiscoveryQueue {
    pending: VecDeque<String>,
    generated: HashSet<String>,
}

impl DiscoveryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue every dependency that has not been generated yet
    pub fn enqueue(&mut self, dependencies: &Dependencies) {
        for name in dependencies.names() {
            self.push(name);
        }
    }

    pub fn push(&mut self, name: &str) {
        if !self.generated.contains(name) {
            self.pending.push_back(name.to_string());
        }
    }

    /// Next name to generate, marking it as generated
    pub fn next_pending(&mut self) -> Option<String> {
        while let Some(name) = self.pending.pop_front() {
            if self.generated.insert(name.clone()) {
                return Some(name);
            }
        }
        None
    }

    pub fn is_generated(&self, name: &str) -> bool {
        self.generated.contains(name)
    }

    pub fn generated_count(&self) -> usize {
        self.generated.len()
    }
}

/// Exported declaration names per output unit path
#[derive(Debug, Clone, Default)]
pub struct ExportRegistry {
    exports: BTreeMap<String, BTreeSet<String>>,
}

impl ExportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, path: impl Into<String>, name: impl Into<String>) {
        self.exports.entry(path.into()).or_default().insert(name.into());
    }

    pub fn exports(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.exports
    }

    /// Root manifest re-exporting every name once.
    ///
    /// Paths are visited in sorted order and the first one to claim a name
    /// keeps it. Returns the manifest text and the number of names exported.
    pub fn manifest(&self) -> (String, usize) {
        let mut exported: HashSet<&str> = HashSet::new();
        let mut blocks = Vec::new();

        for (path, names) in &self.exports {
            let lines: Vec<String> = names
                .iter()
                .filter(|name| exported.insert(name.as_str()))
                .map(|name| format!("  {name},"))
                .collect();

            if lines.is_empty() {
                continue;
            }

            blocks.push(format!("export {{\n{}\n}} from '{}';", lines.join("\n"), path));
        }

        (blocks.join("\n\n"), exported.len())
    }

    pub fn into_inner(self) -> BTreeMap<String, BTreeSet<String>> {
        self.exports
    }
}
