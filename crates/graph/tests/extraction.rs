use codegraph_graph::{
    extract_unit, merge_units, CodeGraph, NodeKind, RelType, UnitInfo,
};
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use tree_sitter::Parser;

fn parse(source: &str) -> tree_sitter::Tree {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .expect("python grammar");
    parser.parse(source, None).expect("parse")
}

fn extract(source: &str, module: &str, known: &[&str]) -> CodeGraph {
    let known: BTreeSet<String> = known.iter().map(|s| s.to_string()).collect();
    let unit = UnitInfo::new("", module).with_known_modules(known);
    let tree = parse(source);
    extract_unit(&tree, source, &unit).expect("extraction")
}

const SAMPLE: &str = r#""""Sample module."""
import os

class Base:
    pass

class C(Base):
    """A class."""

    def m(self):
        return 1

def f(x: int = 0) -> int:
    """Doc."""
    try:
        return helper(x)
    except ValueError:
        return 0

def helper(x):
    for i in [n for n in range(x)]:
        f(i)
    return x
"#;

#[test]
fn parents_always_point_at_existing_nodes() {
    let graph = extract(SAMPLE, "mod", &["mod"]);
    for node in graph.nodes() {
        if let Some(parent) = &node.parent_qualified_name {
            assert!(
                graph.contains(parent),
                "dangling parent {parent} on {}",
                node.qualified_name
            );
        }
    }
}

#[test]
fn every_resolved_call_has_a_matching_inverse() {
    let graph = extract(SAMPLE, "mod", &["mod"]);
    for node in graph.nodes() {
        for relation in &node.relations {
            if relation.rel_type != RelType::Calls {
                continue;
            }
            let Some(target) = graph.node(&relation.target) else {
                continue;
            };
            assert!(
                target.relations.iter().any(|r| {
                    r.rel_type == RelType::CalledBy
                        && r.source == relation.source
                        && r.pos == relation.pos
                }),
                "missing inverse for {} -> {}",
                relation.source,
                relation.target
            );
        }
    }
}

#[test]
fn extraction_is_deterministic() {
    let first = serde_json::to_string_pretty(&extract(SAMPLE, "mod", &["mod"])).unwrap();
    let second = serde_json::to_string_pretty(&extract(SAMPLE, "mod", &["mod"])).unwrap();
    assert_eq!(first, second);
}

#[test]
fn base_classes_yield_inherits_from_in_declaration_order() {
    let source = "class D(A, B, C):\n    pass\n";
    let graph = extract(source, "mod", &["mod"]);
    let d = graph.node("mod.D").unwrap();
    let bases: Vec<_> = d
        .relations
        .iter()
        .filter(|r| r.rel_type == RelType::InheritsFrom)
        .map(|r| r.target.as_str())
        .collect();
    assert_eq!(bases, vec!["A", "B", "C"]);
}

#[test]
fn docstrings_are_captured_not_emitted_as_statements() {
    let graph = extract(SAMPLE, "mod", &["mod"]);

    assert_eq!(
        graph.node("mod").unwrap().docstring.as_deref(),
        Some("Sample module.")
    );
    assert_eq!(
        graph.node("mod.C").unwrap().docstring.as_deref(),
        Some("A class.")
    );
    assert_eq!(graph.node("mod.f").unwrap().docstring.as_deref(), Some("Doc."));
    // the Base class has no docstring
    assert_eq!(graph.node("mod.Base").unwrap().docstring, None);
}

#[test]
fn class_with_method_scenario() {
    let source = "class C(Base):\n    def m(self):\n        return 1\n";
    let graph = extract(source, "mod", &["mod"]);

    let class = graph.node("mod.C").expect("class node");
    assert_eq!(class.kind, NodeKind::Class);
    assert!(class
        .relations
        .iter()
        .any(|r| r.rel_type == RelType::InheritsFrom && r.target == "Base"));

    let method = graph.node("mod.C.m").expect("method node");
    assert_eq!(method.kind, NodeKind::Function);
    assert_eq!(method.parent_qualified_name.as_deref(), Some("mod.C"));
    assert!(method
        .relations
        .iter()
        .any(|r| r.rel_type == RelType::FunctionDef && r.target == "mod.C"));
}

#[test]
fn same_scope_redefinition_keeps_the_later_node() {
    let source = "def f():\n    pass\n\ndef f():\n    return 2\n";
    let graph = extract(source, "mod", &["mod"]);

    let nodes: Vec<_> = graph
        .nodes()
        .filter(|n| n.qualified_name == "mod.f")
        .collect();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].pos.start, 4);
}

#[test]
fn cross_unit_call_scenario() {
    let unit_a = extract("def f():\n    pass\n", "a", &["a", "b"]);
    let unit_b = extract("import a\n\ndef g():\n    a.f()\n", "b", &["a", "b"]);

    let merged = merge_units(vec![unit_a, unit_b]);

    let g = merged.node("b.g").expect("caller node");
    assert!(g
        .relations
        .iter()
        .any(|r| r.rel_type == RelType::Calls && r.target == "a.f"));

    let f = merged.node("a.f").expect("callee node");
    assert!(f
        .relations
        .iter()
        .any(|r| r.rel_type == RelType::CalledBy && r.source == "b.g"));
}

#[test]
fn serialized_nodes_expose_the_stable_field_set() {
    let graph = extract("def f(a):\n    pass\n", "mod", &["mod"]);
    let value = serde_json::to_value(&graph).unwrap();
    let f = &value["mod.f"];

    for field in [
        "name",
        "kind",
        "ast_type",
        "pos",
        "qualified_name",
        "parent_qualified_name",
        "annotation",
        "modifier",
        "docstring",
        "relations",
    ] {
        assert!(f.get(field).is_some(), "missing field {field}");
    }
    assert_eq!(f["kind"], "function");
    assert_eq!(f["pos"]["start"], 1);
}
