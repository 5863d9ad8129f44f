use crate::imports::ImportTable;
use crate::scope::ScopeStack;
use crate::types::Pos;

/// Outcome of resolving one reference site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Bound in an enclosing scope frame.
    Scope(String),
    /// Bound through the unit's import table.
    Import(String),
    /// Fallback: the literal text. Never an error; call sites may be retried
    /// against the finished node table after traversal.
    Unresolved(String),
}

impl Resolution {
    pub fn target(&self) -> &str {
        match self {
            Resolution::Scope(s) | Resolution::Import(s) | Resolution::Unresolved(s) => s,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Resolution::Unresolved(_))
    }
}

/// Resolve an identifier or dotted reference at a call, base-class,
/// decorator, or assignment site.
///
/// Search order: innermost-to-outermost scope frames, then the import alias
/// table (longest dotted prefix first), then the literal text as an
/// unresolved target. For dotted references the head (or longest bound
/// prefix) resolves and the remaining tail is re-joined.
pub fn resolve_reference(text: &str, scopes: &ScopeStack, imports: &ImportTable) -> Resolution {
    if let Some(qualified) = scopes.lookup(text) {
        return Resolution::Scope(qualified.to_string());
    }
    if let Some((head, tail)) = text.split_once('.') {
        if let Some(qualified) = scopes.lookup(head) {
            return Resolution::Scope(format!("{qualified}.{tail}"));
        }
    }

    let parts: Vec<&str> = text.split('.').collect();
    for end in (1..=parts.len()).rev() {
        let prefix = parts[..end].join(".");
        if let Some(target) = imports.resolve(&prefix) {
            let resolved = if end == parts.len() {
                target.as_str().to_string()
            } else {
                format!("{}.{}", target.as_str(), parts[end..].join("."))
            };
            return Resolution::Import(resolved);
        }
    }

    Resolution::Unresolved(text.to_string())
}

/// A call site recorded during traversal and patched once the unit's node
/// table is complete: still-unresolved targets are retried against the
/// enclosing scopes, and the CALLED_BY inverse is attached when the target
/// turns out to be a real node.
#[derive(Debug, Clone)]
pub(crate) struct PendingCall {
    pub source: String,
    pub target: Resolution,
    /// Name joined onto enclosing scopes during the retry. Usually the
    /// literal text; for `self.m()` / `cls.m()` it is the bare method name,
    /// so the retry lands on the enclosing class.
    pub retry_name: String,
    /// Enclosing scope qualified names at the site, innermost last.
    pub scope_path: Vec<String>,
    pub pos: Pos,
}
