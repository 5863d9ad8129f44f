use crate::imports::{statement_bindings, ImportTable};
use crate::resolver::{resolve_reference, PendingCall, Resolution};
use crate::scope::ScopeStack;
use crate::types::{CodeGraph, GraphNode, NodeKind, Pos, RelType, Relation, UnitInfo};
use tree_sitter::Node;

/// Walks one unit's syntax tree, emitting a node per recognized construct
/// and a forward relation per reference site.
///
/// Traversal is single-pass; call sites whose targets may only exist later
/// (forward definitions, inverse CALLED_BY edges) are recorded as pending and
/// patched by the assembler once the unit finishes.
pub(crate) struct NodeCollector<'a> {
    source: &'a str,
    unit: &'a UnitInfo,
    imports: ImportTable,
    scopes: ScopeStack,
    graph: CodeGraph,
    pending: Vec<PendingCall>,
}

impl<'a> NodeCollector<'a> {
    pub(crate) fn new(source: &'a str, unit: &'a UnitInfo, imports: ImportTable) -> Self {
        Self {
            source,
            unit,
            imports,
            scopes: ScopeStack::new(),
            graph: CodeGraph::new(),
            pending: Vec::new(),
        }
    }

    /// Run the traversal over the module root.
    pub(crate) fn collect(mut self, root: Node) -> (CodeGraph, Vec<PendingCall>) {
        let pos = Pos::from_node(&root);
        let (docstring, doc_stmt) = self.docstring(root);

        let mut module = GraphNode::new(NodeKind::Module, root.kind(), self.unit.module.clone(), pos);
        module.name = self.unit.module.rsplit('.').next().map(String::from);
        module.docstring = docstring;
        self.emit(module);

        let module_qual = self.unit.module.clone();
        self.in_scope(module_qual, |c| c.visit_body(root, doc_stmt));

        (self.graph, self.pending)
    }

    // ---------- traversal ----------

    fn visit(&mut self, node: Node) {
        match node.kind() {
            "decorated_definition" => self.handle_decorated(node),
            "class_definition" => self.handle_class(node, &[]),
            "function_definition" => self.handle_function(node, &[]),
            "import_statement" | "import_from_statement" => self.handle_import(node),
            "assignment" => self.handle_assignment(node),
            "augmented_assignment" => self.handle_augmented_assignment(node),
            "call" => self.handle_call(node),
            "yield" => self.handle_yield(node),
            "try_statement" => self.handle_try(node),
            "for_statement" => self.handle_statement(node, NodeKind::ForLoop),
            "while_statement" => self.handle_statement(node, NodeKind::WhileLoop),
            "if_statement" => self.handle_statement(node, NodeKind::IfStatement),
            "with_statement" => self.handle_statement(node, NodeKind::WithStatement),
            "list_comprehension" | "set_comprehension" | "dictionary_comprehension"
            | "generator_expression" => self.handle_comprehension(node),
            "lambda" => self.handle_lambda(node),
            _ => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, node: Node) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit(child);
        }
    }

    /// Visit a body, skipping the statement already captured as a docstring.
    fn visit_body(&mut self, body: Node, skip: Option<Node>) {
        let skip_id = skip.map(|n| n.id());
        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            if Some(child.id()) == skip_id {
                continue;
            }
            self.visit(child);
        }
    }

    /// Push a scope frame for the duration of `f`; the frame is popped on
    /// every exit path.
    fn in_scope<R>(&mut self, qualified: String, f: impl FnOnce(&mut Self) -> R) -> R {
        self.scopes.push(qualified);
        let out = f(self);
        self.scopes.pop();
        out
    }

    // ---------- named scopes ----------

    fn handle_decorated(&mut self, node: Node) {
        let mut decorators = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() == "decorator" {
                decorators.push(child);
            }
        }
        match node.child_by_field_name("definition") {
            Some(def) if def.kind() == "class_definition" => self.handle_class(def, &decorators),
            Some(def) if def.kind() == "function_definition" => {
                self.handle_function(def, &decorators)
            }
            Some(def) => self.visit(def),
            None => {}
        }
    }

    fn handle_class(&mut self, node: Node, decorators: &[Node]) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return self.visit_children(node);
        };
        let name = self.text(name_node);
        let qualified = self.scopes.qualify(&name);
        let parent = self.scopes.current().map(String::from);
        let pos = Pos::from_node(&node);
        let body = node.child_by_field_name("body");
        let (docstring, doc_stmt) = match body {
            Some(body) => self.docstring(body),
            None => (None, None),
        };

        let mut class = GraphNode::new(NodeKind::Class, node.kind(), qualified.clone(), pos);
        class.name = Some(name.clone());
        class.parent_qualified_name = parent.clone();
        class.docstring = docstring;
        self.emit(class);

        if let Some(parent) = &parent {
            self.push_relation(&qualified, RelType::ClassDef, parent.clone(), pos);
        }
        if let Some(superclasses) = node.child_by_field_name("superclasses") {
            let mut cursor = superclasses.walk();
            for base in superclasses.named_children(&mut cursor) {
                if matches!(base.kind(), "keyword_argument" | "comment") {
                    continue;
                }
                let target = resolve_reference(&self.text(base), &self.scopes, &self.imports);
                self.push_relation(
                    &qualified,
                    RelType::InheritsFrom,
                    target.target().to_string(),
                    Pos::from_node(&base),
                );
            }
        }
        self.emit_decorations(&qualified, decorators);

        self.scopes.bind(&name, &qualified);
        self.in_scope(qualified, |c| {
            if let Some(body) = body {
                c.visit_body(body, doc_stmt);
            }
        });
    }

    fn handle_function(&mut self, node: Node, decorators: &[Node]) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return self.visit_children(node);
        };
        let name = self.text(name_node);
        let qualified = self.scopes.qualify(&name);
        let parent = self.scopes.current().map(String::from);
        let pos = Pos::from_node(&node);
        let is_async = node.child(0).is_some_and(|c| c.kind() == "async");
        let body = node.child_by_field_name("body");
        let (docstring, doc_stmt) = match body {
            Some(body) => self.docstring(body),
            None => (None, None),
        };

        let kind = if is_async {
            NodeKind::AsyncFunction
        } else {
            NodeKind::Function
        };
        let mut function = GraphNode::new(kind, node.kind(), qualified.clone(), pos);
        function.name = Some(name.clone());
        function.parent_qualified_name = parent.clone();
        function.annotation = node.child_by_field_name("return_type").map(|t| self.text(t));
        function.docstring = docstring;
        self.emit(function);

        if let Some(parent) = &parent {
            self.push_relation(&qualified, RelType::FunctionDef, parent.clone(), pos);
        }
        self.emit_decorations(&qualified, decorators);

        self.scopes.bind(&name, &qualified);
        self.in_scope(qualified.clone(), |c| {
            if let Some(params) = node.child_by_field_name("parameters") {
                c.handle_parameters(params, &qualified);
            }
            if let Some(return_type) = node.child_by_field_name("return_type") {
                c.handle_return_annotation(return_type, &qualified);
            }
            if let Some(body) = body {
                c.visit_body(body, doc_stmt);
            }
        });
    }

    /// Emit one params_of node per parameter, bound into the function scope.
    fn handle_parameters(&mut self, params: Node, function: &str) {
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            let (name_node, annotation, modifier) = match param.kind() {
                "identifier" => (Some(param), None, None),
                "typed_parameter" => {
                    let inner = param.named_child(0);
                    let (inner, modifier) = splat_inner(inner);
                    (inner, param.child_by_field_name("type"), modifier)
                }
                "default_parameter" => (param.child_by_field_name("name"), None, None),
                "typed_default_parameter" => (
                    param.child_by_field_name("name"),
                    param.child_by_field_name("type"),
                    None,
                ),
                "list_splat_pattern" => (param.named_child(0), None, Some("*")),
                "dictionary_splat_pattern" => (param.named_child(0), None, Some("**")),
                _ => continue,
            };
            let Some(name_node) = name_node else { continue };
            let name = self.text(name_node);
            let qualified = self.scopes.qualify(&name);
            let pos = Pos::from_node(&param);

            let mut parameter = GraphNode::new(NodeKind::ParamsOf, param.kind(), qualified.clone(), pos);
            parameter.name = Some(name.clone());
            parameter.parent_qualified_name = Some(function.to_string());
            parameter.annotation = annotation.map(|a| self.text(a));
            parameter.modifier = modifier.map(String::from);
            self.emit(parameter);

            self.push_relation(&qualified, RelType::ParamOf, function.to_string(), pos);
            self.scopes.bind(&name, &qualified);

            // default values may carry calls
            if let Some(value) = param.child_by_field_name("value") {
                self.visit(value);
            }
        }
    }

    fn handle_return_annotation(&mut self, annotation: Node, function: &str) {
        let pos = Pos::from_node(&annotation);
        let qualified = self.synthetic_name(NodeKind::Returns, annotation);
        let text = self.text(annotation);

        let mut returns = GraphNode::new(NodeKind::Returns, annotation.kind(), qualified, pos);
        returns.parent_qualified_name = Some(function.to_string());
        returns.annotation = Some(text.clone());
        self.emit(returns);

        let target = resolve_reference(&text, &self.scopes, &self.imports);
        self.push_relation(function, RelType::Returns, target.target().to_string(), pos);
    }

    // ---------- statements ----------

    fn handle_import(&mut self, node: Node) {
        let pos = Pos::from_node(&node);
        let qualified = self.synthetic_name(NodeKind::Import, node);
        let mut import = GraphNode::new(NodeKind::Import, node.kind(), qualified, pos);
        import.parent_qualified_name = self.scopes.current().map(String::from);
        self.emit(import);

        let Some(scope) = self.scopes.current().map(String::from) else {
            return;
        };
        for (_, target) in statement_bindings(node, self.source, self.unit) {
            self.push_relation(&scope, RelType::Imports, target.as_str().to_string(), pos);
        }
    }

    fn handle_assignment(&mut self, node: Node) {
        let pos = Pos::from_node(&node);
        let left = node.child_by_field_name("left");
        let name = left
            .filter(|l| l.kind() == "identifier")
            .map(|l| self.text(l));

        let qualified = match &name {
            Some(name) => self.scopes.qualify(name),
            None => self.synthetic_name(NodeKind::Assignment, node),
        };
        let mut assignment = GraphNode::new(NodeKind::Assignment, node.kind(), qualified.clone(), pos);
        assignment.name = name.clone();
        assignment.parent_qualified_name = self.scopes.current().map(String::from);
        assignment.annotation = node.child_by_field_name("type").map(|t| self.text(t));
        self.emit(assignment);

        if let Some(name) = &name {
            self.scopes.bind(name, &qualified);
        }
        if let Some(scope) = self.scopes.current().map(String::from) {
            self.push_relation(&scope, RelType::Assigns, qualified, pos);
        }
        if let Some(right) = node.child_by_field_name("right") {
            self.visit(right);
        }
    }

    fn handle_augmented_assignment(&mut self, node: Node) {
        let pos = Pos::from_node(&node);
        let qualified = self.synthetic_name(NodeKind::AugmentedAssignment, node);
        let left = node.child_by_field_name("left");

        let mut assignment =
            GraphNode::new(NodeKind::AugmentedAssignment, node.kind(), qualified, pos);
        assignment.name = left
            .filter(|l| l.kind() == "identifier")
            .map(|l| self.text(l));
        assignment.parent_qualified_name = self.scopes.current().map(String::from);
        self.emit(assignment);

        // an augmented target references an existing binding
        if let (Some(left), Some(scope)) = (left, self.scopes.current().map(String::from)) {
            if let Some(name) = self.dotted_name(left) {
                let target = resolve_reference(&name, &self.scopes, &self.imports);
                self.push_relation(&scope, RelType::Assigns, target.target().to_string(), pos);
            }
        }
        if let Some(right) = node.child_by_field_name("right") {
            self.visit(right);
        }
    }

    fn handle_call(&mut self, node: Node) {
        let pos = Pos::from_node(&node);
        if let Some(callee) = node.child_by_field_name("function") {
            if let Some(name) = self.dotted_name(callee) {
                let (resolution, retry_name) = match name.split_once('.') {
                    // method calls through the instance retry against the
                    // enclosing class after traversal
                    Some(("self" | "cls", tail)) => {
                        (Resolution::Unresolved(name.clone()), tail.to_string())
                    }
                    _ => (
                        resolve_reference(&name, &self.scopes, &self.imports),
                        name.clone(),
                    ),
                };
                if let Some(scope) = self.scopes.current().map(String::from) {
                    self.push_relation(
                        &scope,
                        RelType::Calls,
                        resolution.target().to_string(),
                        pos,
                    );
                    self.pending.push(PendingCall {
                        source: scope,
                        target: resolution,
                        retry_name,
                        scope_path: self.scopes.path(),
                        pos,
                    });
                }
            }
        }
        self.visit_children(node);
    }

    fn handle_yield(&mut self, node: Node) {
        let pos = Pos::from_node(&node);
        let qualified = self.synthetic_name(NodeKind::Yields, node);
        let mut yields = GraphNode::new(NodeKind::Yields, node.kind(), qualified, pos);
        yields.parent_qualified_name = self.scopes.current().map(String::from);
        self.emit(yields);

        if let Some(scope) = self.scopes.current().map(String::from) {
            let expr = (0..node.named_child_count())
                .rev()
                .filter_map(|i| node.named_child(i))
                .next();
            if let Some(name) = expr.and_then(|e| self.dotted_name(e)) {
                let target = resolve_reference(&name, &self.scopes, &self.imports);
                self.push_relation(&scope, RelType::Yields, target.target().to_string(), pos);
            }
        }
        self.visit_children(node);
    }

    fn handle_try(&mut self, node: Node) {
        let pos = Pos::from_node(&node);
        let try_qual = self.synthetic_name(NodeKind::Try, node);
        let mut try_node = GraphNode::new(NodeKind::Try, node.kind(), try_qual.clone(), pos);
        try_node.parent_qualified_name = self.scopes.current().map(String::from);
        self.emit(try_node);

        if let Some(scope) = self.scopes.current().map(String::from) {
            self.push_relation(&scope, RelType::Try, try_qual.clone(), pos);
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "except_clause" => self.handle_except(child, &try_qual),
                "finally_clause" => {
                    let clause_pos = Pos::from_node(&child);
                    let target = format!("{try_qual}.finally@{}", clause_pos.start);
                    self.push_relation(&try_qual, RelType::Finally, target, clause_pos);
                    self.visit_children(child);
                }
                _ => self.visit(child),
            }
        }
    }

    fn handle_except(&mut self, clause: Node, try_qual: &str) {
        let pos = Pos::from_node(&clause);
        // keyed under the try node, which is also the parent
        let qualified = format!("{try_qual}.{}@{}", NodeKind::Except.as_str(), pos.start);

        // `except Type as alias:` - the first non-block child is the type,
        // with the alias either a sibling or inside an as_pattern
        let mut exc_type = None;
        let mut alias = None;
        let mut cursor = clause.walk();
        for child in clause.named_children(&mut cursor) {
            match child.kind() {
                "block" | "comment" => {}
                "as_pattern" => {
                    exc_type = child.named_child(0).map(|t| self.text(t));
                    alias = child
                        .named_child(1)
                        .and_then(|a| a.named_child(0).or(Some(a)))
                        .map(|a| self.text(a));
                }
                "identifier" if exc_type.is_some() && alias.is_none() => {
                    alias = Some(self.text(child));
                }
                _ if exc_type.is_none() => exc_type = Some(self.text(child)),
                _ => {}
            }
        }

        let mut except = GraphNode::new(NodeKind::Except, clause.kind(), qualified.clone(), pos);
        except.name = alias;
        except.annotation = exc_type;
        except.parent_qualified_name = Some(try_qual.to_string());
        self.emit(except);

        self.push_relation(try_qual, RelType::Except, qualified, pos);
        self.visit_children(clause);
    }

    /// Loops, conditionals, and with-blocks: a synthetic node, no new scope.
    fn handle_statement(&mut self, node: Node, kind: NodeKind) {
        let pos = Pos::from_node(&node);
        let qualified = self.synthetic_name(kind, node);
        let mut statement = GraphNode::new(kind, node.kind(), qualified, pos);
        statement.parent_qualified_name = self.scopes.current().map(String::from);
        self.emit(statement);
        self.visit_children(node);
    }

    // ---------- expression scopes ----------

    fn handle_comprehension(&mut self, node: Node) {
        let pos = Pos::from_node(&node);
        let qualified = self.synthetic_name(NodeKind::Comprehension, node);
        let mut comp = GraphNode::new(NodeKind::Comprehension, node.kind(), qualified.clone(), pos);
        comp.parent_qualified_name = self.scopes.current().map(String::from);
        self.emit(comp);

        self.in_scope(qualified, |c| {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                if child.kind() == "for_in_clause" {
                    if let Some(left) = child.child_by_field_name("left") {
                        c.bind_pattern(left);
                    }
                }
            }
            c.visit_children(node);
        });
    }

    fn handle_lambda(&mut self, node: Node) {
        let pos = Pos::from_node(&node);
        let qualified = self.synthetic_name(NodeKind::Lambda, node);
        let mut lambda = GraphNode::new(NodeKind::Lambda, node.kind(), qualified.clone(), pos);
        lambda.parent_qualified_name = self.scopes.current().map(String::from);
        self.emit(lambda);

        self.in_scope(qualified, |c| {
            if let Some(params) = node.child_by_field_name("parameters") {
                let mut cursor = params.walk();
                for param in params.named_children(&mut cursor) {
                    c.bind_pattern(param);
                }
            }
            if let Some(body) = node.child_by_field_name("body") {
                c.visit(body);
            }
        });
    }

    /// Bind the identifiers of a target pattern into the current frame.
    fn bind_pattern(&mut self, node: Node) {
        match node.kind() {
            "identifier" => {
                let name = self.text(node);
                let qualified = self.scopes.qualify(&name);
                self.scopes.bind(&name, &qualified);
            }
            "tuple_pattern" | "list_pattern" | "pattern_list" => {
                let mut cursor = node.walk();
                let children: Vec<Node> = node.named_children(&mut cursor).collect();
                for child in children {
                    self.bind_pattern(child);
                }
            }
            _ => {}
        }
    }

    // ---------- helpers ----------

    fn text(&self, node: Node) -> String {
        node.utf8_text(self.source.as_bytes())
            .unwrap_or("")
            .to_string()
    }

    /// Dotted text of an identifier/attribute chain; `None` when the chain
    /// contains anything else (subscripts, nested calls).
    fn dotted_name(&self, node: Node) -> Option<String> {
        match node.kind() {
            "identifier" => Some(self.text(node)),
            "attribute" => {
                let object = node.child_by_field_name("object")?;
                let attribute = node.child_by_field_name("attribute")?;
                Some(format!(
                    "{}.{}",
                    self.dotted_name(object)?,
                    self.text(attribute)
                ))
            }
            _ => None,
        }
    }

    /// Synthetic qualified name for an unnamed construct:
    /// `<scope>.<kind>@<start_line>`.
    fn synthetic_name(&self, kind: NodeKind, node: Node) -> String {
        let parent = self.scopes.current().unwrap_or(&self.unit.module);
        format!("{}.{}@{}", parent, kind.as_str(), node.start_position().row + 1)
    }

    fn emit(&mut self, node: GraphNode) {
        self.graph.insert(node);
    }

    /// Append a forward relation to its source node.
    fn push_relation(&mut self, source: &str, rel_type: RelType, target: String, pos: Pos) {
        match self.graph.node_mut(source) {
            Some(node) => node.relations.push(Relation {
                source: source.to_string(),
                rel_type,
                target,
                pos,
            }),
            None => log::debug!("relation source {source} missing from node table"),
        }
    }

    fn emit_decorations(&mut self, decorated: &str, decorators: &[Node]) {
        for decorator in decorators {
            let Some(expr) = decorator.named_child(0) else {
                continue;
            };
            // `@app.route("/")` decorates with app.route
            let reference = if expr.kind() == "call" {
                expr.child_by_field_name("function").unwrap_or(expr)
            } else {
                expr
            };
            let target = match self.dotted_name(reference) {
                Some(name) => resolve_reference(&name, &self.scopes, &self.imports)
                    .target()
                    .to_string(),
                None => self.text(reference),
            };
            self.push_relation(
                decorated,
                RelType::DecoratedBy,
                target,
                Pos::from_node(decorator),
            );
            // decorator arguments may carry calls of their own
            if expr.kind() == "call" {
                if let Some(args) = expr.child_by_field_name("arguments") {
                    self.visit_children(args);
                }
            }
        }
    }

    /// Bare leading string literal of a module/class/function body.
    ///
    /// The returned statement node borrows from the tree, not from `self`,
    /// so the collector stays mutable while the node is held.
    fn docstring<'t>(&self, body: Node<'t>) -> (Option<String>, Option<Node<'t>>) {
        let mut cursor = body.walk();
        let first = body
            .named_children(&mut cursor)
            .find(|c| c.kind() != "comment");
        let Some(stmt) = first else {
            return (None, None);
        };
        if stmt.kind() != "expression_statement" {
            return (None, None);
        }
        let Some(expr) = stmt.named_child(0) else {
            return (None, None);
        };
        if expr.kind() != "string" || stmt.named_child_count() != 1 {
            return (None, None);
        }
        (Some(self.string_value(expr)), Some(stmt))
    }

    fn string_value(&self, string: Node) -> String {
        let mut cursor = string.walk();
        let content: String = string
            .named_children(&mut cursor)
            .filter(|c| c.kind() == "string_content")
            .map(|c| self.text(c))
            .collect();
        if content.is_empty() && string.named_child_count() == 2 {
            // empty literal ("" has only start/end children)
            return content;
        }
        if content.is_empty() {
            return self.text(string).trim_matches(['"', '\'']).to_string();
        }
        content
    }
}

fn splat_inner<'t>(inner: Option<Node<'t>>) -> (Option<Node<'t>>, Option<&'static str>) {
    match inner {
        Some(node) if node.kind() == "list_splat_pattern" => (node.named_child(0), Some("*")),
        Some(node) if node.kind() == "dictionary_splat_pattern" => (node.named_child(0), Some("**")),
        other => (other, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{extract, parse};
    use pretty_assertions::assert_eq;

    #[test]
    fn module_node_carries_docstring_without_statement_node() {
        let graph = extract("\"\"\"Module doc.\"\"\"\nx = 1\n", "pkg", "pkg.m");
        let module = graph.node("pkg.m").expect("module node");

        assert_eq!(module.kind, NodeKind::Module);
        assert_eq!(module.docstring.as_deref(), Some("Module doc."));
        assert_eq!(module.name.as_deref(), Some("m"));
        // the bare string is a docstring, not an assignment/statement node
        assert_eq!(
            graph.nodes().filter(|n| n.kind == NodeKind::Assignment).count(),
            1
        );
    }

    #[test]
    fn function_parameters_become_params_of_nodes() {
        let graph = extract(
            "def f(a, b: int = 0, *args, **kwargs):\n    pass\n",
            "",
            "m",
        );

        let a = graph.node("m.f.a").expect("positional param");
        assert_eq!(a.kind, NodeKind::ParamsOf);
        assert_eq!(a.parent_qualified_name.as_deref(), Some("m.f"));
        assert_eq!(a.relations[0].rel_type, RelType::ParamOf);
        assert_eq!(a.relations[0].target, "m.f");

        let b = graph.node("m.f.b").expect("typed default param");
        assert_eq!(b.annotation.as_deref(), Some("int"));

        assert_eq!(graph.node("m.f.args").unwrap().modifier.as_deref(), Some("*"));
        assert_eq!(graph.node("m.f.kwargs").unwrap().modifier.as_deref(), Some("**"));
    }

    #[test]
    fn async_function_gets_its_own_kind() {
        let graph = extract("async def fetch():\n    pass\n", "", "m");
        assert_eq!(graph.node("m.fetch").unwrap().kind, NodeKind::AsyncFunction);
        assert_eq!(graph.node("m.fetch").unwrap().ast_type, "function_definition");
    }

    #[test]
    fn return_annotation_emits_returns_node_and_relation() {
        let graph = extract("def f() -> int:\n    return 1\n", "", "m");

        let f = graph.node("m.f").unwrap();
        assert_eq!(f.annotation.as_deref(), Some("int"));
        assert!(f
            .relations
            .iter()
            .any(|r| r.rel_type == RelType::Returns && r.target == "int"));
        assert!(graph.contains("m.f.returns@1"));
    }

    #[test]
    fn decorator_produces_decorated_by_relation() {
        let graph = extract("@staticmethod\ndef f():\n    pass\n", "", "m");
        let f = graph.node("m.f").unwrap();
        assert!(f
            .relations
            .iter()
            .any(|r| r.rel_type == RelType::DecoratedBy && r.target == "staticmethod"));
    }

    #[test]
    fn try_except_finally_emit_nodes_and_relations() {
        let source = "try:\n    risky()\nexcept ValueError as e:\n    pass\nfinally:\n    done()\n";
        let graph = extract(source, "", "m");

        let try_node = graph.node("m.try@1").expect("try node");
        assert_eq!(try_node.kind, NodeKind::Try);
        assert!(try_node
            .relations
            .iter()
            .any(|r| r.rel_type == RelType::Except && r.target == "m.try@1.except@3"));
        assert!(try_node
            .relations
            .iter()
            .any(|r| r.rel_type == RelType::Finally && r.target == "m.try@1.finally@5"));

        // except nodes are keyed under their parent try node
        let except = graph.node("m.try@1.except@3").expect("except node");
        assert_eq!(except.parent_qualified_name.as_deref(), Some("m.try@1"));
        assert_eq!(except.annotation.as_deref(), Some("ValueError"));
        assert_eq!(except.name.as_deref(), Some("e"));

        let module = graph.node("m").unwrap();
        assert!(module
            .relations
            .iter()
            .any(|r| r.rel_type == RelType::Try && r.target == "m.try@1"));
    }

    #[test]
    fn comprehension_and_lambda_get_their_own_scope_segment() {
        let source = "def f(items):\n    g = lambda x: x\n    return [transform(i) for i in items]\n";
        let graph = extract(source, "", "m");

        assert!(graph.contains("m.f.lambda@2"));
        assert!(graph.contains("m.f.comprehension@3"));

        // the call inside the comprehension is sourced at the comprehension scope
        let comp = graph.node("m.f.comprehension@3").unwrap();
        assert!(comp
            .relations
            .iter()
            .any(|r| r.rel_type == RelType::Calls && r.target == "transform"));
    }

    #[test]
    fn docstring_helper_ignores_non_leading_strings() {
        let graph = extract("x = 1\n\"not a docstring\"\n", "", "m");
        assert_eq!(graph.node("m").unwrap().docstring, None);
    }

    #[test]
    fn import_statement_emits_import_node_and_relations() {
        let graph = extract("import os\nfrom json import dumps\n", "", "m");

        assert!(graph.contains("m.import@1"));
        assert!(graph.contains("m.import@2"));
        let module = graph.node("m").unwrap();
        let imports: Vec<_> = module
            .relations
            .iter()
            .filter(|r| r.rel_type == RelType::Imports)
            .map(|r| r.target.as_str())
            .collect();
        assert_eq!(imports, vec!["os", "json.dumps"]);
    }

    #[test]
    fn assignment_binds_name_for_later_resolution() {
        let source = "handler = make()\nhandler()\n";
        let graph = extract(source, "", "m");

        let module = graph.node("m").unwrap();
        let calls: Vec<_> = module
            .relations
            .iter()
            .filter(|r| r.rel_type == RelType::Calls)
            .map(|r| r.target.as_str())
            .collect();
        assert_eq!(calls, vec!["make", "m.handler"]);
    }

    #[test]
    fn parse_produces_module_root() {
        let tree = parse("x = 1\n");
        assert_eq!(tree.root_node().kind(), "module");
    }
}
