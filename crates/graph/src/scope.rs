use std::collections::HashMap;

/// The active naming context during traversal: the qualified name of the
/// enclosing construct plus its local definition table.
#[derive(Debug)]
struct ScopeFrame {
    qualified_name: String,
    locals: HashMap<String, String>,
}

/// Ordered stack of enclosing scopes for one compilation unit.
///
/// A frame is pushed on entering any scope-introducing construct (module,
/// class, function, lambda, comprehension) and popped on exit. The collector
/// pairs push/pop through a closure helper rather than by hand, so the stack
/// is restored on every exit path.
#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<ScopeFrame>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, qualified_name: String) {
        self.frames.push(ScopeFrame {
            qualified_name,
            locals: HashMap::new(),
        });
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Qualified name of the innermost scope, or `None` outside the module.
    pub fn current(&self) -> Option<&str> {
        self.frames.last().map(|f| f.qualified_name.as_str())
    }

    /// Qualified name for a new local name under the current scope.
    pub fn qualify(&self, name: &str) -> String {
        match self.current() {
            Some(parent) => format!("{parent}.{name}"),
            None => name.to_string(),
        }
    }

    /// Record a local binding in the innermost frame.
    pub fn bind(&mut self, name: &str, qualified: &str) {
        if let Some(frame) = self.frames.last_mut() {
            frame.locals.insert(name.to_string(), qualified.to_string());
        }
    }

    /// Innermost-to-outermost lookup. The innermost binding always wins;
    /// shadowing produces no diagnostic.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.locals.get(name).map(String::as_str))
    }

    /// Qualified names of all enclosing scopes, innermost last.
    pub fn path(&self) -> Vec<String> {
        self.frames.iter().map(|f| f.qualified_name.clone()).collect()
    }
}
