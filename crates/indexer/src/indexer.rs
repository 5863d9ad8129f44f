use crate::error::{IndexerError, Result};
use crate::scanner::FileScanner;
use crate::stats::ExtractStats;
use codegraph_graph::{extract_unit, merge_units, CodeGraph, UnitInfo};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tree_sitter::Parser;

/// Walks a project root, parses each Python unit, and extracts its symbol
/// graph in isolation; unit outputs are merged at the end.
///
/// Units share nothing during extraction (each traversal owns its scope
/// stack, import table, and output map), so a failed unit is reported and
/// skipped without touching the others.
#[derive(Debug)]
pub struct ProjectExtractor {
    root: PathBuf,
    package: String,
}

/// Merged graph plus run statistics.
#[derive(Debug)]
pub struct ExtractOutput {
    pub graph: CodeGraph,
    pub stats: ExtractStats,
}

impl ProjectExtractor {
    pub fn new(root: impl AsRef<Path>, package: impl Into<String>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(IndexerError::InvalidPath(format!(
                "not a directory: {}",
                root.display()
            )));
        }
        Ok(Self {
            root,
            package: package.into(),
        })
    }

    pub fn extract(&self) -> Result<ExtractOutput> {
        let started = Instant::now();
        let files = FileScanner::new(&self.root).scan();

        // pre-pass: module names of the whole tree, so sibling imports
        // resolve internally
        let known_modules: BTreeSet<String> = files
            .iter()
            .filter_map(|path| self.module_name(path))
            .collect();

        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .map_err(|e| IndexerError::Language(e.to_string()))?;

        let mut stats = ExtractStats::new();
        let mut units = Vec::new();

        for path in &files {
            let Some(module) = self.module_name(path) else {
                continue;
            };
            let source = match fs::read_to_string(path) {
                Ok(source) => source,
                Err(e) => {
                    log::warn!("Skipping unreadable unit {}: {e}", path.display());
                    stats.add_error(format!("{}: {e}", path.display()));
                    continue;
                }
            };
            let Some(tree) = parser.parse(&source, None) else {
                log::warn!("Skipping unparseable unit {}", path.display());
                stats.add_error(format!("{}: parser produced no tree", path.display()));
                continue;
            };

            let unit = UnitInfo::new(&self.package, module)
                .with_known_modules(known_modules.clone());
            match extract_unit(&tree, &source, &unit) {
                Ok(graph) => {
                    stats.add_file(source.lines().count());
                    units.push(graph);
                }
                Err(e) => {
                    log::warn!("Skipping unit {}: {e}", path.display());
                    stats.add_error(format!("{}: {e}", path.display()));
                }
            }
        }

        let graph = merge_units(units);
        stats.nodes = graph.len();
        stats.relations = graph.relation_count();
        stats.time_ms = started.elapsed().as_millis() as u64;

        log::info!(
            "Extracted {} units: {} nodes, {} relations in {}ms",
            stats.files,
            stats.nodes,
            stats.relations,
            stats.time_ms
        );
        Ok(ExtractOutput { graph, stats })
    }

    fn module_name(&self, path: &Path) -> Option<String> {
        module_qualified_name(&self.package, &self.root, path)
    }
}

/// Derive a unit's module qualified name from its path relative to the
/// indexed root: separators become dots, the extension is stripped, and a
/// trailing `__init__` collapses into its package.
pub fn module_qualified_name(package: &str, root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let mut parts: Vec<&str> = rel
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect();

    let last = parts.pop()?;
    let stem = last.strip_suffix(".py")?;
    if stem != "__init__" {
        parts.push(stem);
    }

    let dotted = parts.join(".");
    match (package.is_empty(), dotted.is_empty()) {
        (true, true) => None,
        (true, false) => Some(dotted),
        (false, true) => Some(package.to_string()),
        (false, false) => Some(format!("{package}.{dotted}")),
    }
}
