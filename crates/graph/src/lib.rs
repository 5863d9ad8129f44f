//! # Codegraph
//!
//! Scope-aware symbol graph extraction from parsed Python source.
//!
//! Given an already-parsed concrete syntax tree for one compilation unit,
//! the extractor builds a qualified-name-indexed node table and a
//! bidirectional relation set, resolving unqualified references to
//! fully-qualified targets using lexical scope and import information.
//! Static analysis only; nothing is executed.
//!
//! ## Pipeline
//!
//! ```text
//! Syntax tree (one unit)
//!     │
//!     ├──> Import Table Builder (pre-pass)
//!     │      └─ alias -> qualified target / opaque external
//!     │
//!     ├──> Node Collector (scope-stack traversal)
//!     │      ├─ Node per recognized construct
//!     │      └─ forward relations via the Reference Resolver
//!     │
//!     └──> Graph Assembler (deferred patch)
//!            ├─ retry unresolved call targets
//!            └─ attach CALLED_BY inverses
//! ```
//!
//! Units are extracted in isolation; [`merge_units`] combines their outputs
//! into one flat qualified-name map and synthesizes cross-unit inverses.

mod assembler;
mod collector;
mod error;
mod imports;
mod resolver;
mod scope;
mod types;

pub use assembler::merge_units;
pub use error::{GraphError, Result};
pub use imports::{ImportTable, ImportTarget};
pub use resolver::{resolve_reference, Resolution};
pub use scope::ScopeStack;
pub use types::{CodeGraph, GraphNode, NodeKind, Pos, RelType, Relation, UnitInfo};

use tree_sitter::Tree;

/// Extract the symbol graph of one compilation unit.
///
/// The tree comes from the front-end parser; `unit` carries the package
/// prefix, the unit's module qualified name, and the module names known to
/// the indexed tree. Extraction is deterministic and pure: identical input
/// yields byte-identical output.
pub fn extract_unit(tree: &Tree, source: &str, unit: &UnitInfo) -> Result<CodeGraph> {
    let root = tree.root_node();
    if root.kind() != "module" {
        return Err(GraphError::UnparseableUnit(unit.module.clone()));
    }

    let imports = ImportTable::build(root, source, unit);
    let (mut graph, pending) = collector::NodeCollector::new(source, unit, imports).collect(root);
    assembler::finalize_unit(&mut graph, pending);

    log::debug!(
        "extracted unit {}: {} nodes, {} relations",
        unit.module,
        graph.len(),
        graph.relation_count()
    );
    Ok(graph)
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use std::collections::BTreeSet;
    use tree_sitter::Parser;

    pub(crate) fn parse(source: &str) -> Tree {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .expect("python grammar");
        parser.parse(source, None).expect("parse")
    }

    pub(crate) fn extract_in(source: &str, unit: &UnitInfo) -> CodeGraph {
        let tree = parse(source);
        extract_unit(&tree, source, unit).expect("extraction")
    }

    /// Extract one unit whose only known module is itself.
    pub(crate) fn extract(source: &str, package: &str, module: &str) -> CodeGraph {
        let unit = UnitInfo::new(package, module)
            .with_known_modules(BTreeSet::from([module.to_string()]));
        extract_in(source, &unit)
    }
}
