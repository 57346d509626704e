//! In-place tree editing bound to a current node.

use crate::errors::{check_count, PatchError};
use crate::js::literal::json_to_js;
use crate::js::{generate_node, Syntax};
use crate::query::{matcher, raw, walk, MatchSpec};
use crate::tree::{Field, Function, Node, NodeId, Parents, PropertyKind, Tree};
use serde::Deserialize;
use serde_json::Value;

/// Minimum similarity for a "did you mean" field suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertPosition {
    /// Beginning of the current node's own statement list.
    Start,
    /// End of the current node's own statement list.
    End,
    /// Directly before the current node in its parent's statement list.
    Before,
    /// Directly after the current node in its parent's statement list.
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeMethod {
    /// Recursively merge into an object literal.
    Update,
    /// Replace the value outright.
    Set,
}

/// Value for [`Editor::change`]: JSON data or a JavaScript expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeValue {
    Json(Value),
    Code(String),
}

impl From<Value> for ChangeValue {
    fn from(value: Value) -> Self {
        ChangeValue::Json(value)
    }
}

impl ChangeValue {
    pub fn code(code: impl Into<String>) -> Self {
        ChangeValue::Code(code.into())
    }

    fn to_source(&self) -> String {
        match self {
            ChangeValue::Json(value) => json_to_js(value),
            ChangeValue::Code(code) => code.clone(),
        }
    }
}

enum SetTarget {
    Declarator,
    Property,
    Object,
    Literal,
}

/// Editing cursor over a tree.
///
/// Holds the tree and the parent map of the current AST run mutably, so
/// every operation edits in place. Callbacks of [`Editor::find_each`] get a
/// fresh editor rooted at the match that shares both.
pub struct Editor<'a> {
    tree: &'a mut Tree,
    parents: &'a mut Parents,
    syntax: &'a dyn Syntax,
    current: NodeId,
}

impl<'a> Editor<'a> {
    pub fn new(
        tree: &'a mut Tree,
        parents: &'a mut Parents,
        syntax: &'a dyn Syntax,
        current: NodeId,
    ) -> Self {
        Self {
            tree,
            parents,
            syntax,
            current,
        }
    }

    pub fn current(&self) -> NodeId {
        self.current
    }

    pub fn node(&self) -> &Node {
        self.tree.get(self.current)
    }

    pub fn tree(&self) -> &Tree {
        self.tree
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parents.get(self.current)
    }

    /// JavaScript source of the current node.
    pub fn source(&self) -> String {
        generate_node(self.tree, self.current)
    }

    fn scoped(&mut self, at: NodeId) -> Editor<'_> {
        Editor {
            tree: &mut *self.tree,
            parents: &mut *self.parents,
            syntax: self.syntax,
            current: at,
        }
    }

    /// All descendants of the current node matching `spec`, in document order.
    pub fn find_all(&mut self, spec: &MatchSpec) -> Vec<NodeId> {
        walk::collect(self.tree, self.parents, self.current, |tree, parents, id| {
            matcher::matches(tree, parents, id, spec)
        })
    }

    /// Search the current subtree; see [`Editor::find_each`].
    pub fn find(&mut self, spec: &MatchSpec, expected: Option<usize>) -> Result<bool, PatchError> {
        self.find_each(spec, expected, |_| Ok(()))
    }

    /// Search the current subtree and run `on_match` once per match.
    ///
    /// When `expected` is given, a different match count fails before any
    /// callback runs. Returns whether anything matched.
    pub fn find_each<F>(
        &mut self,
        spec: &MatchSpec,
        expected: Option<usize>,
        on_match: F,
    ) -> Result<bool, PatchError>
    where
        F: FnMut(&mut Editor<'_>) -> Result<(), PatchError>,
    {
        let found = self.find_all(spec);
        tracing::debug!(
            category = spec.category(),
            matches = found.len(),
            ?expected,
            "find"
        );
        check_count(|| spec.describe(), expected, found.len())?;
        self.visit(&found, on_match)
    }

    /// Search by deep containment of an ESTree-shaped JSON pattern.
    pub fn find_raw(&mut self, pattern: &Value, expected: Option<usize>) -> Result<bool, PatchError> {
        self.find_raw_each(pattern, expected, |_| Ok(()))
    }

    pub fn find_raw_each<F>(
        &mut self,
        pattern: &Value,
        expected: Option<usize>,
        on_match: F,
    ) -> Result<bool, PatchError>
    where
        F: FnMut(&mut Editor<'_>) -> Result<(), PatchError>,
    {
        let found = walk::collect(self.tree, self.parents, self.current, |tree, _, id| {
            raw::contains(tree, id, pattern)
        });
        tracing::debug!(matches = found.len(), ?expected, "raw find");
        check_count(|| format!("raw pattern {pattern}"), expected, found.len())?;
        self.visit(&found, on_match)
    }

    fn visit<F>(&mut self, found: &[NodeId], mut on_match: F) -> Result<bool, PatchError>
    where
        F: FnMut(&mut Editor<'_>) -> Result<(), PatchError>,
    {
        for &id in found {
            let mut editor = self.scoped(id);
            on_match(&mut editor)?;
        }
        Ok(!found.is_empty())
    }

    /// Move to the node held in `field`.
    pub fn goto_child(&mut self, field: &str) -> Result<(), PatchError> {
        let node = self.tree.get(self.current);
        match node.field(field) {
            Some(Field::Node(child)) => {
                self.parents.link(child, self.current);
                self.current = child;
                Ok(())
            }
            Some(Field::List(_) | Field::Holes(_)) => Err(PatchError::precondition(
                "goto child",
                node.type_name(),
                format!("field '{field}' is a list; an index is required"),
            )),
            Some(Field::Null) => Err(PatchError::precondition(
                "goto child",
                node.type_name(),
                format!("field '{field}' is empty"),
            )),
            Some(_) => Err(PatchError::precondition(
                "goto child",
                node.type_name(),
                format!("field '{field}' holds a value, not a node"),
            )),
            None => Err(self.unknown_field(field)),
        }
    }

    /// Move to element `index` of the list held in `field`.
    pub fn goto_child_at(&mut self, field: &str, index: usize) -> Result<(), PatchError> {
        let node = self.tree.get(self.current);
        let child = match node.field(field) {
            Some(Field::List(ids)) => ids.get(index).copied(),
            Some(Field::Holes(slots)) => slots.get(index).copied().flatten(),
            Some(_) => {
                return Err(PatchError::precondition(
                    "goto child",
                    node.type_name(),
                    format!("field '{field}' is not a list"),
                ))
            }
            None => return Err(self.unknown_field(field)),
        };
        let Some(child) = child else {
            return Err(PatchError::precondition(
                "goto child",
                node.type_name(),
                format!("field '{field}' has no element at index {index}"),
            ));
        };
        self.parents.link(child, self.current);
        self.current = child;
        Ok(())
    }

    /// Move to the recorded parent of the current node.
    pub fn goto_parent(&mut self) -> Result<(), PatchError> {
        match self.parents.get(self.current) {
            Some(parent) => {
                self.current = parent;
                Ok(())
            }
            None => Err(PatchError::precondition(
                "goto parent",
                self.node().type_name(),
                "no parent was recorded for this node",
            )),
        }
    }

    fn unknown_field(&self, field: &str) -> PatchError {
        let node = self.node();
        let names: Vec<&str> = node.fields().into_iter().map(|(name, _)| name).collect();
        let suggestion = names
            .iter()
            .map(|name| (*name, strsim::jaro_winkler(field, name)))
            .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.1.total_cmp(&b.1));
        let reason = match suggestion {
            Some((name, _)) => format!("no field '{field}'; did you mean '{name}'?"),
            None => format!("no field '{field}'; available: {}", names.join(", ")),
        };
        PatchError::precondition("goto child", node.type_name(), reason)
    }

    /// Parse `code` as statements and splice them in at `position`.
    ///
    /// A fragment that is a single block contributes its statements
    /// individually.
    pub fn insert(&mut self, position: InsertPosition, code: &str) -> Result<(), PatchError> {
        let (owner, index) = self.insertion_point(position)?;
        let statements = self.parse_statements(code)?;
        let owner_type = self.tree.get(owner).type_name();
        let Some(list) = self.tree.get_mut(owner).statements_mut() else {
            return Err(PatchError::precondition(
                "insert",
                owner_type,
                "node has no statement list",
            ));
        };
        for (offset, &statement) in statements.iter().enumerate() {
            list.insert(index + offset, statement);
        }
        for &statement in &statements {
            self.parents.link(statement, owner);
        }
        tracing::debug!(?position, count = statements.len(), into = owner_type, "inserted statements");
        Ok(())
    }

    fn insertion_point(&self, position: InsertPosition) -> Result<(NodeId, usize), PatchError> {
        let node = self.node();
        let type_name = node.type_name();
        match position {
            InsertPosition::Start | InsertPosition::End => {
                let owner = match node {
                    Node::Program { .. } | Node::BlockStatement { .. } => self.current,
                    _ => match node.as_function() {
                        Some(f) if matches!(self.tree.get(f.body), Node::BlockStatement { .. }) => {
                            f.body
                        }
                        Some(_) => {
                            return Err(PatchError::precondition(
                                "insert",
                                type_name,
                                "function has an expression body",
                            ))
                        }
                        None => {
                            return Err(PatchError::precondition(
                                "insert",
                                type_name,
                                "node has no statement list",
                            ))
                        }
                    },
                };
                let index = match position {
                    InsertPosition::Start => 0,
                    _ => self.tree.get(owner).statements().map_or(0, Vec::len),
                };
                Ok((owner, index))
            }
            InsertPosition::Before | InsertPosition::After => {
                let parent = self.parent().ok_or_else(|| {
                    PatchError::precondition("insert", type_name, "node has no recorded parent")
                })?;
                let parent_node = self.tree.get(parent);
                let list = parent_node.statements().ok_or_else(|| {
                    PatchError::precondition(
                        "insert",
                        type_name,
                        format!("parent {} has no statement list", parent_node.type_name()),
                    )
                })?;
                let at = list.iter().position(|&s| s == self.current).ok_or_else(|| {
                    PatchError::precondition(
                        "insert",
                        type_name,
                        "node is not in its parent's statement list",
                    )
                })?;
                Ok((parent, if position == InsertPosition::Before { at } else { at + 1 }))
            }
        }
    }

    fn parse_statements(&mut self, code: &str) -> Result<Vec<NodeId>, PatchError> {
        let statements = self
            .syntax
            .parse_statements(self.tree, code)
            .map_err(PatchError::fragment)?;
        if let [single] = statements.as_slice() {
            if let Node::BlockStatement { body } = self.tree.get(*single) {
                return Ok(body.clone());
            }
        }
        Ok(statements)
    }

    fn parse_value(&mut self, value: &ChangeValue) -> Result<NodeId, PatchError> {
        self.syntax
            .parse_expression(self.tree, &value.to_source())
            .map_err(PatchError::fragment)
    }

    /// Wrap the current function with an arrow function of the form
    /// `(original, ...extra) => { ... }`.
    ///
    /// The original body moves into an inner function declaration named after
    /// the wrapper's first parameter; the current function takes the remaining
    /// wrapper parameters and runs the wrapper body after that declaration.
    pub fn wrap(&mut self, code: &str) -> Result<(), PatchError> {
        let target = self.current;
        let type_name = self.node().type_name();
        let Some(original) = self.tree.function(target).cloned() else {
            return Err(PatchError::precondition("wrap", type_name, "node is not a function"));
        };

        let wrapper = self
            .syntax
            .parse_expression(self.tree, code)
            .map_err(PatchError::fragment)?;
        let wrapper = match self.tree.get(wrapper) {
            Node::ArrowFunctionExpression(f) => f.clone(),
            other => {
                return Err(PatchError::precondition(
                    "wrap",
                    type_name,
                    format!("wrapper must be an arrow function, got {}", other.type_name()),
                ))
            }
        };
        if wrapper.params.len() != original.params.len() + 1 {
            return Err(PatchError::precondition(
                "wrap",
                type_name,
                format!(
                    "wrapper takes {} parameter(s), expected {}",
                    wrapper.params.len(),
                    original.params.len() + 1
                ),
            ));
        }
        let Some(inner_name) = self.tree.identifier_name(wrapper.params[0]).map(str::to_string)
        else {
            return Err(PatchError::precondition(
                "wrap",
                type_name,
                "first wrapper parameter must be a plain identifier",
            ));
        };

        let inner_body = if matches!(self.tree.get(original.body), Node::BlockStatement { .. }) {
            original.body
        } else {
            let ret = self.tree.alloc(Node::ReturnStatement {
                argument: Some(original.body),
            });
            self.tree.alloc(Node::BlockStatement { body: vec![ret] })
        };
        let inner_id = self.tree.alloc(Node::Identifier { name: inner_name });
        let inner = self.tree.alloc(Node::FunctionDeclaration(Function {
            id: Some(inner_id),
            params: original.params.clone(),
            body: inner_body,
            is_async: original.is_async,
            generator: original.generator,
        }));

        let wrapper_statements = match self.tree.get(wrapper.body) {
            Node::BlockStatement { body } => body.clone(),
            _ => vec![self.tree.alloc(Node::ReturnStatement {
                argument: Some(wrapper.body),
            })],
        };
        let mut body = Vec::with_capacity(wrapper_statements.len() + 1);
        body.push(inner);
        body.extend(wrapper_statements);
        let new_body = self.tree.alloc(Node::BlockStatement { body });

        if let Some(f) = self.tree.function_mut(target) {
            f.params = wrapper.params[1..].to_vec();
            f.body = new_body;
            f.is_async |= wrapper.is_async;
        }
        self.parents.link_children(self.tree, target);
        self.parents.link_children(self.tree, new_body);
        self.parents.link_children(self.tree, inner);
        Ok(())
    }

    /// Modify the current node with `value`; see [`ChangeMethod`].
    pub fn change(
        &mut self,
        method: ChangeMethod,
        value: impl Into<ChangeValue>,
    ) -> Result<(), PatchError> {
        let value = value.into();
        match method {
            ChangeMethod::Update => self.update(&value),
            ChangeMethod::Set => self.set(&value),
        }
    }

    fn update(&mut self, value: &ChangeValue) -> Result<(), PatchError> {
        let target = match self.node() {
            Node::ObjectExpression { .. } => self.current,
            Node::Property { value, .. }
                if matches!(self.tree.get(*value), Node::ObjectExpression { .. }) =>
            {
                *value
            }
            other => {
                return Err(PatchError::precondition(
                    "update",
                    other.type_name(),
                    "update needs an object literal",
                ))
            }
        };
        let source = self.parse_value(value)?;
        if !matches!(self.tree.get(source), Node::ObjectExpression { .. }) {
            return Err(PatchError::precondition(
                "update",
                self.node().type_name(),
                format!("update value must be an object, got `{}`", value.to_source()),
            ));
        }
        self.merge_object(target, source);
        Ok(())
    }

    /// Merge the properties of `source` into `target`: existing keys are
    /// overwritten (merged when both sides are objects), new keys appended.
    fn merge_object(&mut self, target: NodeId, source: NodeId) {
        let incoming = match self.tree.get(source) {
            Node::ObjectExpression { properties } => properties.clone(),
            _ => return,
        };
        for prop in incoming {
            let existing = match self.tree.get(prop) {
                Node::Property { .. } => self
                    .tree
                    .member_key_name(prop)
                    .and_then(|name| self.tree.find_property(target, &name)),
                _ => None,
            };
            let pair = existing.and_then(|existing| {
                Some((
                    existing,
                    self.tree.property_value(existing)?,
                    self.tree.property_value(prop)?,
                ))
            });
            match pair {
                Some((_, old, new))
                    if matches!(self.tree.get(old), Node::ObjectExpression { .. })
                        && matches!(self.tree.get(new), Node::ObjectExpression { .. }) =>
                {
                    self.merge_object(old, new);
                }
                Some((existing, _, new)) => self.set_property_value(existing, new),
                None => {
                    if let Node::ObjectExpression { properties } = self.tree.get_mut(target) {
                        properties.push(prop);
                    }
                    self.parents.link(prop, target);
                }
            }
        }
    }

    fn set_property_value(&mut self, prop: NodeId, new_value: NodeId) {
        if let Node::Property {
            value,
            kind,
            shorthand,
            method,
            ..
        } = self.tree.get_mut(prop)
        {
            *value = new_value;
            *kind = PropertyKind::Init;
            *shorthand = false;
            *method = false;
        }
        self.parents.link(new_value, prop);
    }

    fn set(&mut self, value: &ChangeValue) -> Result<(), PatchError> {
        let current = self.current;
        let type_name = self.node().type_name();
        let target = match self.node() {
            Node::VariableDeclarator { .. } => SetTarget::Declarator,
            Node::Property { .. } => SetTarget::Property,
            Node::ObjectExpression { .. } => SetTarget::Object,
            Node::Literal { .. } => SetTarget::Literal,
            _ => {
                return Err(PatchError::precondition(
                    "set",
                    type_name,
                    "set applies to variable declarators, properties, object literals and literals",
                ))
            }
        };
        let parsed = self.parse_value(value)?;
        match target {
            SetTarget::Declarator => {
                if let Node::VariableDeclarator { init, .. } = self.tree.get_mut(current) {
                    *init = Some(parsed);
                }
                self.parents.link(parsed, current);
            }
            SetTarget::Property => self.set_property_value(current, parsed),
            SetTarget::Object => {
                let Node::ObjectExpression { properties } = self.tree.get(parsed).clone() else {
                    return Err(PatchError::precondition(
                        "set",
                        type_name,
                        format!("value must be an object, got `{}`", value.to_source()),
                    ));
                };
                self.tree.replace(current, Node::ObjectExpression { properties });
                self.parents.link_children(self.tree, current);
            }
            SetTarget::Literal => {
                let replacement = self.tree.get(parsed).clone();
                self.tree.replace(current, replacement);
                self.parents.link_children(self.tree, current);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::js::JavaScript;
    use serde_json::json;
    use std::cell::Cell;

    fn edit<F>(source: &str, action: F) -> Result<String, PatchError>
    where
        F: FnOnce(&mut Editor<'_>) -> Result<(), PatchError>,
    {
        let mut tree = JavaScript.parse_program(source).unwrap();
        let mut parents = Parents::new();
        let root = tree.root();
        let mut editor = Editor::new(&mut tree, &mut parents, &JavaScript, root);
        action(&mut editor)?;
        Ok(JavaScript.generate(&tree))
    }

    fn statement_calling(name: &str) -> Value {
        json!({ "type": "ExpressionStatement", "expression": { "callee": { "name": name } } })
    }

    #[test]
    fn insert_at_start_of_function_body() {
        let out = edit("function update(dt) { step(dt); }", |e| {
            e.find_each(&MatchSpec::function("update"), Some(1), |f| {
                f.insert(InsertPosition::Start, "hook(dt);")
            })?;
            Ok(())
        })
        .unwrap();
        assert_eq!(out, "function update(dt) {\n  hook(dt);\n  step(dt);\n}");
    }

    #[test]
    fn insert_block_fragment_splices_statements() {
        let out = edit("x();", |e| e.insert(InsertPosition::End, "{ a(); b(); }")).unwrap();
        assert_eq!(out, "x();\na();\nb();");
    }

    #[test]
    fn insert_before_and_after_sibling() {
        let out = edit("b(); c();", |e| {
            e.find_raw_each(&statement_calling("b"), Some(1), |s| {
                s.insert(InsertPosition::Before, "a();")?;
                s.insert(InsertPosition::After, "z();")
            })?;
            Ok(())
        })
        .unwrap();
        assert_eq!(out, "a();\nb();\nz();\nc();");
    }

    #[test]
    fn insert_requires_a_statement_list() {
        let err = edit("x = { a: 1 };", |e| {
            e.find_each(&MatchSpec::property("a"), Some(1), |p| {
                p.insert(InsertPosition::Before, "y();")
            })?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, PatchError::StructuralPrecondition { .. }));

        let err = edit("const f = () => 1;", |e| {
            e.find_each(&MatchSpec::function("f"), Some(1), |f| {
                f.insert(InsertPosition::Start, "y();")
            })?;
            Ok(())
        })
        .unwrap_err();
        assert!(err.to_string().contains("expression body"));
    }

    #[test]
    fn fragment_errors_are_distinct() {
        let err = edit("x();", |e| e.insert(InsertPosition::End, "if (")).unwrap_err();
        assert!(matches!(err, PatchError::FragmentParse { .. }));
    }

    #[test]
    fn wrap_moves_body_into_inner_function() {
        let out = edit("function f() { return 1; }", |e| {
            e.find_each(&MatchSpec::function("f"), Some(1), |f| {
                f.wrap("(inner) => { console.log('x'); inner(); }")
            })?;
            Ok(())
        })
        .unwrap();
        assert_eq!(
            out,
            "function f() {\n  function inner() {\n    return 1;\n  }\n  console.log('x');\n  inner();\n}"
        );
    }

    #[test]
    fn wrap_expression_bodied_arrow() {
        let out = edit("const g = (a, b) => a + b;", |e| {
            e.find_each(&MatchSpec::function("g"), Some(1), |f| {
                f.wrap("(orig, a, b) => orig(a, b) * 2")
            })?;
            Ok(())
        })
        .unwrap();
        assert_eq!(
            out,
            "const g = (a, b) => {\n  function orig(a, b) {\n    return a + b;\n  }\n  return orig(a, b) * 2;\n};"
        );
    }

    #[test]
    fn wrap_checks_arity_and_shape() {
        let err = edit("function f(a) {}", |e| {
            e.find_each(&MatchSpec::function("f"), Some(1), |f| f.wrap("(inner) => inner()"))?;
            Ok(())
        })
        .unwrap_err();
        assert!(err.to_string().contains("expected 2"));

        let err = edit("x = 1;", |e| e.wrap("(inner) => inner()")).unwrap_err();
        assert!(matches!(err, PatchError::StructuralPrecondition { .. }));
    }

    #[test]
    fn update_merges_recursively() {
        let out = edit("var o = { x: 0, w: 9 };", |e| {
            e.find_each(
                &MatchSpec::Object {
                    name: Some("o".into()),
                    anonymous: None,
                    keys: None,
                    values: None,
                },
                Some(1),
                |o| o.change(ChangeMethod::Update, json!({ "x": 1, "y": { "z": 2 } })),
            )?;
            Ok(())
        })
        .unwrap();
        assert_eq!(out, "var o = { x: 1, w: 9, y: { z: 2 } };");
    }

    #[test]
    fn update_merges_into_nested_objects() {
        let out = edit("cfg = { shop: { cost: 5, tax: 1 } };", |e| {
            e.find_each(&MatchSpec::property("shop"), Some(1), |p| {
                p.change(ChangeMethod::Update, ChangeValue::code("{ cost: 1 }"))
            })?;
            Ok(())
        })
        .unwrap();
        assert_eq!(out, "cfg = { shop: { cost: 1, tax: 1 } };");
    }

    #[test]
    fn set_replaces_values() {
        let declarator = json!({ "type": "VariableDeclarator", "id": { "name": "cost" } });
        let out = edit("var cost = 50;", |e| {
            e.find_raw_each(&declarator, Some(1), |d| {
                d.change(ChangeMethod::Set, ChangeValue::code("1"))
            })?;
            Ok(())
        })
        .unwrap();
        assert_eq!(out, "var cost = 1;");

        let out = edit("x = 50;", |e| {
            e.find_each(&MatchSpec::literal(50), Some(1), |l| {
                l.change(ChangeMethod::Set, json!(-1))
            })?;
            Ok(())
        })
        .unwrap();
        assert_eq!(out, "x = -1;");

        let out = edit("x = { speed };", |e| {
            e.find_each(&MatchSpec::property("speed"), Some(1), |p| {
                p.change(ChangeMethod::Set, ChangeValue::code("() => 2"))
            })?;
            Ok(())
        })
        .unwrap();
        assert_eq!(out, "x = { speed: () => 2 };");

        let out = edit("x = { a: 1 };", |e| {
            e.find_each(&MatchSpec::object_with_keys(["a"]), Some(1), |o| {
                o.change(ChangeMethod::Set, json!({ "b": 2 }))
            })?;
            Ok(())
        })
        .unwrap();
        assert_eq!(out, "x = { b: 2 };");
    }

    #[test]
    fn change_rejects_unsupported_nodes() {
        let err = edit("hp;", |e| {
            e.find_each(&MatchSpec::identifier("hp"), Some(1), |i| {
                i.change(ChangeMethod::Set, json!(1))
            })?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, PatchError::StructuralPrecondition { .. }));
    }

    #[test]
    fn goto_navigation() {
        let out = edit("start(1);", |e| {
            e.find_each(&MatchSpec::call("start"), Some(1), |c| {
                assert!(c.goto_child("arguments").is_err());
                c.goto_child_at("arguments", 0)?;
                c.change(ChangeMethod::Set, json!(5))?;
                c.goto_parent()?;
                c.goto_child("callee")?;
                assert_eq!(c.source(), "start");
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();
        assert_eq!(out, "start(5);");
    }

    #[test]
    fn goto_suggests_close_field_names() {
        let err = edit("start(1);", |e| {
            e.find_each(&MatchSpec::call("start"), Some(1), |c| c.goto_child("calee"))?;
            Ok(())
        })
        .unwrap_err();
        assert!(err.to_string().contains("did you mean 'callee'"));
    }

    #[test]
    fn count_mismatch_runs_no_callbacks() {
        let calls = Cell::new(0);
        let err = edit("a(); a();", |e| {
            e.find_each(&MatchSpec::call("a"), Some(1), |_| {
                calls.set(calls.get() + 1);
                Ok(())
            })?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(
            err,
            PatchError::MatchCountMismatch {
                expected: 1,
                found: 2,
                ..
            }
        ));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn nested_find_searches_only_the_match() {
        let out = edit("function a() { hit(); } function b() { hit(); }", |e| {
            e.find_each(&MatchSpec::function("a"), Some(1), |f| {
                f.find_each(&MatchSpec::call("hit"), Some(1), |c| {
                    c.goto_child("callee")?;
                    c.goto_parent()?;
                    c.goto_parent()?;
                    c.insert(InsertPosition::After, "extra();")
                })?;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();
        assert_eq!(
            out,
            "function a() {\n  hit();\n  extra();\n}\nfunction b() {\n  hit();\n}"
        );
    }

    #[test]
    fn find_without_match_reports_false() {
        let out = edit("a();", |e| {
            assert!(!e.find(&MatchSpec::call("zzz"), None)?);
            assert!(e.find(&MatchSpec::call("a"), None)?);
            Ok(())
        });
        assert!(out.is_ok());
    }
}
