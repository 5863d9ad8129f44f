use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Line span of a construct, 1-based inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pos {
    pub start: usize,
    pub end: usize,
}

impl Pos {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Span of a tree-sitter node (tree-sitter rows are 0-based).
    pub fn from_node(node: &tree_sitter::Node) -> Self {
        Self {
            start: node.start_position().row + 1,
            end: node.end_position().row + 1,
        }
    }
}

/// Closed set of node kinds the extractor recognizes.
///
/// Stable for downstream consumers; the underlying grammar kind is carried
/// separately in `GraphNode::ast_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Module,
    Class,
    Function,
    AsyncFunction,
    ParamsOf,
    Returns,
    Yields,
    Assignment,
    AugmentedAssignment,
    Try,
    Except,
    Import,
    ForLoop,
    WhileLoop,
    IfStatement,
    WithStatement,
    Comprehension,
    Lambda,
}

impl NodeKind {
    /// Serialized name, also used as the segment of synthetic qualified names.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Module => "module",
            NodeKind::Class => "class",
            NodeKind::Function => "function",
            NodeKind::AsyncFunction => "async_function",
            NodeKind::ParamsOf => "params_of",
            NodeKind::Returns => "returns",
            NodeKind::Yields => "yields",
            NodeKind::Assignment => "assignment",
            NodeKind::AugmentedAssignment => "augmented_assignment",
            NodeKind::Try => "try",
            NodeKind::Except => "except",
            NodeKind::Import => "import",
            NodeKind::ForLoop => "for_loop",
            NodeKind::WhileLoop => "while_loop",
            NodeKind::IfStatement => "if_statement",
            NodeKind::WithStatement => "with_statement",
            NodeKind::Comprehension => "comprehension",
            NodeKind::Lambda => "lambda",
        }
    }
}

/// Closed set of relation types (graph edge labels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelType {
    ClassDef,
    FunctionDef,
    ParamOf,
    Returns,
    Imports,
    Calls,
    CalledBy,
    InheritsFrom,
    DecoratedBy,
    Yields,
    Assigns,
    Try,
    Except,
    Finally,
}

impl RelType {
    /// Inverse relation synthesized on the target node, if one is defined.
    pub fn inverse(self) -> Option<RelType> {
        match self {
            RelType::Calls => Some(RelType::CalledBy),
            _ => None,
        }
    }
}

/// Directed, typed edge between two qualified names (or a qualified name and
/// an unresolved literal identifier).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub source: String,
    pub rel_type: RelType,
    pub target: String,
    pub pos: Pos,
}

/// One extracted construct, keyed by its qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Local name; `None` for synthetic statement nodes.
    pub name: Option<String>,
    pub kind: NodeKind,
    /// Underlying grammar kind (e.g. "function_definition").
    pub ast_type: String,
    pub pos: Pos,
    pub qualified_name: String,
    pub parent_qualified_name: Option<String>,
    /// Type annotation text, when the grammar carries one.
    pub annotation: Option<String>,
    /// Variadic marker for parameters ("*" or "**").
    pub modifier: Option<String>,
    pub docstring: Option<String>,
    /// Forward relations in discovery order, then synthesized inverses.
    pub relations: Vec<Relation>,
}

impl GraphNode {
    pub fn new(kind: NodeKind, ast_type: impl Into<String>, qualified_name: impl Into<String>, pos: Pos) -> Self {
        Self {
            name: None,
            kind,
            ast_type: ast_type.into(),
            pos,
            qualified_name: qualified_name.into(),
            parent_qualified_name: None,
            annotation: None,
            modifier: None,
            docstring: None,
            relations: Vec::new(),
        }
    }
}

/// Qualified-name-keyed node table for one unit, or for a merged run.
///
/// `BTreeMap` keeps iteration (and serialization) order stable, so identical
/// input yields byte-identical output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeGraph {
    nodes: BTreeMap<String, GraphNode>,
}

impl CodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, returning the displaced one when the qualified name was
    /// already taken (last-write-wins collision policy).
    pub fn insert(&mut self, node: GraphNode) -> Option<GraphNode> {
        let displaced = self.nodes.insert(node.qualified_name.clone(), node);
        if let Some(prev) = &displaced {
            log::debug!(
                "duplicate qualified name {}, overwriting earlier definition",
                prev.qualified_name
            );
        }
        displaced
    }

    pub fn contains(&self, qualified_name: &str) -> bool {
        self.nodes.contains_key(qualified_name)
    }

    pub fn node(&self, qualified_name: &str) -> Option<&GraphNode> {
        self.nodes.get(qualified_name)
    }

    pub fn node_mut(&mut self, qualified_name: &str) -> Option<&mut GraphNode> {
        self.nodes.get_mut(qualified_name)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn qualified_names(&self) -> impl Iterator<Item = &String> {
        self.nodes.keys()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn relation_count(&self) -> usize {
        self.nodes.values().map(|n| n.relations.len()).sum()
    }

    pub(crate) fn into_nodes(self) -> BTreeMap<String, GraphNode> {
        self.nodes
    }

    pub(crate) fn absorb(&mut self, other: CodeGraph) {
        for (_, node) in other.into_nodes() {
            self.insert(node);
        }
    }
}

/// Extraction context for one compilation unit.
#[derive(Debug, Clone, Default)]
pub struct UnitInfo {
    /// Root qualification segment (e.g. "github.com/org/repo"); may be empty.
    pub package: String,
    /// Module qualified name of this unit, package prefix included.
    pub module: String,
    /// Module qualified names of every unit in the indexed tree. Imports
    /// found here resolve internally; everything else stays opaque.
    pub known_modules: BTreeSet<String>,
}

impl UnitInfo {
    pub fn new(package: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            module: module.into(),
            known_modules: BTreeSet::new(),
        }
    }

    pub fn with_known_modules(mut self, modules: BTreeSet<String>) -> Self {
        self.known_modules = modules;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_and_rel_type_serialize_to_stable_names() {
        assert_eq!(
            serde_json::to_string(&NodeKind::AsyncFunction).unwrap(),
            "\"async_function\""
        );
        assert_eq!(
            serde_json::to_string(&RelType::InheritsFrom).unwrap(),
            "\"INHERITS_FROM\""
        );
        assert_eq!(
            serde_json::to_string(&RelType::CalledBy).unwrap(),
            "\"CALLED_BY\""
        );
    }

    #[test]
    fn insert_reports_displaced_node() {
        let mut graph = CodeGraph::new();
        let first = GraphNode::new(NodeKind::Function, "function_definition", "m.f", Pos::new(1, 1));
        let second = GraphNode::new(NodeKind::Function, "function_definition", "m.f", Pos::new(3, 4));

        assert!(graph.insert(first).is_none());
        let displaced = graph.insert(second).expect("first definition displaced");
        assert_eq!(displaced.pos, Pos::new(1, 1));
        assert_eq!(graph.node("m.f").unwrap().pos, Pos::new(3, 4));
    }

    #[test]
    fn calls_is_the_only_inverted_relation() {
        for rel in [
            RelType::ClassDef,
            RelType::FunctionDef,
            RelType::Imports,
            RelType::InheritsFrom,
            RelType::DecoratedBy,
        ] {
            assert!(rel.inverse().is_none());
        }
        assert_eq!(RelType::Calls.inverse(), Some(RelType::CalledBy));
    }
}
