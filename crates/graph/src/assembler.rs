use crate::resolver::PendingCall;
use crate::types::{CodeGraph, Pos, RelType, Relation};

/// Deferred-patch pass over one finished unit.
///
/// Traversal records every call site as pending; once the node table is
/// complete this pass (a) retries still-unresolved targets against the
/// enclosing scopes, rewriting the forward CALLS relation in place when the
/// target turns out to be a node defined later, and (b) attaches the
/// synthesized CALLED_BY inverse on targets that are real nodes. A node's
/// relation list is final only after this pass.
pub(crate) fn finalize_unit(graph: &mut CodeGraph, pending: Vec<PendingCall>) {
    for call in pending {
        let mut target = call.target.target().to_string();

        if !call.target.is_resolved() && !graph.contains(&target) {
            let found = call
                .scope_path
                .iter()
                .rev()
                .map(|scope| format!("{scope}.{}", call.retry_name))
                .find(|candidate| graph.contains(candidate));
            if let Some(found) = found {
                if !rewrite_forward(graph, &call.source, &target, call.pos, &found) {
                    // forward relation displaced by a later overwrite
                    continue;
                }
                target = found;
            }
        }

        attach_inverse(graph, &call.source, &target, call.pos);
    }
}

/// Point the recorded forward CALLS relation at the retried target.
fn rewrite_forward(
    graph: &mut CodeGraph,
    source: &str,
    old_target: &str,
    pos: Pos,
    new_target: &str,
) -> bool {
    let Some(node) = graph.node_mut(source) else {
        return false;
    };
    let Some(relation) = node.relations.iter_mut().find(|r| {
        r.rel_type == RelType::Calls && r.pos == pos && r.target == old_target
    }) else {
        return false;
    };
    relation.target = new_target.to_string();
    true
}

/// Append CALLED_BY on the target node when the target resolved to a real
/// node and the forward relation survived (the source node may have been
/// overwritten by a later same-name definition).
fn attach_inverse(graph: &mut CodeGraph, source: &str, target: &str, pos: Pos) {
    if !graph.contains(target) {
        return;
    }
    let forward_present = graph.node(source).is_some_and(|node| {
        node.relations
            .iter()
            .any(|r| r.rel_type == RelType::Calls && r.pos == pos && r.target == target)
    });
    if !forward_present {
        return;
    }
    if let Some(node) = graph.node_mut(target) {
        node.relations.push(Relation {
            source: source.to_string(),
            rel_type: RelType::CalledBy,
            target: target.to_string(),
            pos,
        });
    }
}

/// Merge independently extracted units into one flat qualified-name map.
///
/// Units never share state during traversal; cross-unit CALLED_BY edges are
/// synthesized here as a post-pass, once all node tables are accumulated. A
/// CALLS relation whose target lived outside its own unit gains its inverse
/// if the merged map contains the target.
pub fn merge_units(units: Vec<CodeGraph>) -> CodeGraph {
    let mut cross_unit: Vec<(String, String, Pos)> = Vec::new();
    for unit in &units {
        for node in unit.nodes() {
            for relation in &node.relations {
                if relation.rel_type == RelType::Calls && !unit.contains(&relation.target) {
                    cross_unit.push((
                        relation.source.clone(),
                        relation.target.clone(),
                        relation.pos,
                    ));
                }
            }
        }
    }

    let mut merged = CodeGraph::new();
    for unit in units {
        merged.absorb(unit);
    }

    for (source, target, pos) in cross_unit {
        if !merged.contains(&source) {
            continue;
        }
        if let Some(node) = merged.node_mut(&target) {
            node.relations.push(Relation {
                source,
                rel_type: RelType::CalledBy,
                target: target.clone(),
                pos,
            });
        }
    }

    merged
}
