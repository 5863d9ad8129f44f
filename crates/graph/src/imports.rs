use crate::types::UnitInfo;
use std::collections::HashMap;
use tree_sitter::Node;

/// Resolved endpoint of an import binding.
///
/// Internal targets live inside the indexed tree and carry the package
/// prefix; external targets keep the raw dotted path as an opaque string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportTarget {
    Internal(String),
    External(String),
}

impl ImportTarget {
    pub fn as_str(&self) -> &str {
        match self {
            ImportTarget::Internal(s) | ImportTarget::External(s) => s,
        }
    }
}

/// Per-unit alias table, built in one pre-pass over every import statement
/// reachable in the unit (imports nested in function bodies are valid
/// lexical bindings and land in the same table). Immutable afterwards.
#[derive(Debug, Default)]
pub struct ImportTable {
    aliases: HashMap<String, ImportTarget>,
}

impl ImportTable {
    pub fn build(root: Node, source: &str, unit: &UnitInfo) -> Self {
        let mut table = ImportTable::default();
        table.collect(root, source, unit);
        table
    }

    fn collect(&mut self, node: Node, source: &str, unit: &UnitInfo) {
        if matches!(node.kind(), "import_statement" | "import_from_statement") {
            for (alias, target) in statement_bindings(node, source, unit) {
                // `import a.b` also binds the head name `a`
                if let Some((head, _)) = alias.split_once('.') {
                    self.aliases
                        .insert(head.to_string(), resolve_module(head, unit));
                }
                self.aliases.insert(alias, target);
            }
            return;
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.collect(child, source, unit);
        }
    }

    pub fn resolve(&self, alias: &str) -> Option<&ImportTarget> {
        self.aliases.get(alias)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// Alias/target pairs introduced by one import statement. Shared between the
/// table pre-pass and the emitter, which turns the targets into IMPORTS
/// relations.
pub(crate) fn statement_bindings(
    node: Node,
    source: &str,
    unit: &UnitInfo,
) -> Vec<(String, ImportTarget)> {
    match node.kind() {
        "import_statement" => plain_import_bindings(node, source, unit),
        "import_from_statement" => from_import_bindings(node, source, unit),
        _ => Vec::new(),
    }
}

/// `import a.b, x.y as z`
fn plain_import_bindings(node: Node, source: &str, unit: &UnitInfo) -> Vec<(String, ImportTarget)> {
    let mut bindings = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "dotted_name" => {
                let path = text(child, source);
                bindings.push((path.clone(), resolve_module(&path, unit)));
            }
            "aliased_import" => {
                let Some(name) = child.child_by_field_name("name") else {
                    continue;
                };
                let Some(alias) = child.child_by_field_name("alias") else {
                    continue;
                };
                let path = text(name, source);
                bindings.push((text(alias, source), resolve_module(&path, unit)));
            }
            _ => {}
        }
    }
    bindings
}

/// Source module of a from-import before the imported names are joined on.
/// `Path` is a dotted path relative to the package, still resolvable; `Raw`
/// is already opaque (a relative import that escaped the indexed root).
enum FromBase {
    Path(String),
    Raw(String),
}

/// `from M import a, b as c` / `from ..M import a`
fn from_import_bindings(node: Node, source: &str, unit: &UnitInfo) -> Vec<(String, ImportTarget)> {
    let Some(module_name) = node.child_by_field_name("module_name") else {
        return Vec::new();
    };

    let base = match module_name.kind() {
        "dotted_name" => FromBase::Path(text(module_name, source)),
        "relative_import" => resolve_relative(module_name, source, unit),
        _ => FromBase::Raw(text(module_name, source)),
    };

    let target_for = |name: &str| -> ImportTarget {
        match &base {
            FromBase::Raw(raw) => ImportTarget::External(format!("{raw}.{name}")),
            FromBase::Path(path) => {
                let joined = if path.is_empty() {
                    name.to_string()
                } else {
                    format!("{path}.{name}")
                };
                // the imported name may itself be a sibling module
                match resolve_module(&joined, unit) {
                    internal @ ImportTarget::Internal(_) => internal,
                    ImportTarget::External(_) => match resolve_module(path, unit) {
                        ImportTarget::Internal(module) => {
                            ImportTarget::Internal(format!("{module}.{name}"))
                        }
                        ImportTarget::External(_) => ImportTarget::External(joined),
                    },
                }
            }
        }
    };

    let mut bindings = Vec::new();
    let mut cursor = node.walk();
    for child in node.children_by_field_name("name", &mut cursor) {
        match child.kind() {
            "dotted_name" => {
                let name = text(child, source);
                bindings.push((name.clone(), target_for(&name)));
            }
            "aliased_import" => {
                let Some(name) = child.child_by_field_name("name") else {
                    continue;
                };
                let Some(alias) = child.child_by_field_name("alias") else {
                    continue;
                };
                bindings.push((text(alias, source), target_for(&text(name, source))));
            }
            _ => {}
        }
    }
    // wildcard imports introduce no alias we can track
    bindings
}

/// Resolve a dotted module path against the indexed tree. Sibling modules
/// become internal targets under the package prefix; everything else stays
/// an opaque external path.
fn resolve_module(dotted: &str, unit: &UnitInfo) -> ImportTarget {
    let candidate = if unit.package.is_empty() {
        dotted.to_string()
    } else {
        format!("{}.{}", unit.package, dotted)
    };
    if unit.known_modules.contains(&candidate) {
        ImportTarget::Internal(candidate)
    } else {
        ImportTarget::External(dotted.to_string())
    }
}

/// Resolve `from .`/`from ..sibling` against the unit's own module path.
/// Imports escaping the indexed root degrade to opaque external targets.
fn resolve_relative(node: Node, source: &str, unit: &UnitInfo) -> FromBase {
    let level = node
        .named_child(0)
        .filter(|c| c.kind() == "import_prefix")
        .map(|c| text(c, source).chars().filter(|&ch| ch == '.').count())
        .unwrap_or(0);
    let suffix = (1..node.named_child_count())
        .filter_map(|i| node.named_child(i))
        .find(|c| c.kind() == "dotted_name")
        .map(|c| text(c, source));

    // Walk up `level` segments of the module path relative to the package.
    let rel = match unit.package.is_empty() {
        true => unit.module.as_str(),
        false => unit
            .module
            .strip_prefix(&unit.package)
            .map(|m| m.trim_start_matches('.'))
            .unwrap_or(unit.module.as_str()),
    };
    let mut segments: Vec<&str> = rel.split('.').filter(|s| !s.is_empty()).collect();
    if level > segments.len() {
        log::debug!("relative import escapes indexed root in {}", unit.module);
        return FromBase::Raw(text(node, source));
    }
    segments.truncate(segments.len() - level);

    let mut path = segments.join(".");
    if let Some(suffix) = suffix {
        if path.is_empty() {
            path = suffix;
        } else {
            path = format!("{path}.{suffix}");
        }
    }
    // an empty path means `from . import x` at the package root; the joined
    // names resolve directly under the package
    FromBase::Path(path)
}

fn text(node: Node, source: &str) -> String {
    node.utf8_text(source.as_bytes()).unwrap_or("").to_string()
}
