//! Arena-backed JavaScript syntax tree.
//!
//! Nodes live in a single `Vec` and reference each other through [`NodeId`].
//! Editing replaces node slots or child lists in place; detached nodes simply
//! become unreachable from the root. Parent links are not stored in the tree
//! itself but in a [`Parents`] side table that the walker fills in as it
//! visits nodes.

mod node;

pub use node::{
    Class, Field, Function, LiteralValue, MethodKind, Node, NodeId, PropertyKind, VariableKind,
};

use std::borrow::Cow;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Create a tree holding an empty `Program`.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::Program { body: Vec::new() }],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.root = id;
    }

    /// Number of allocated slots, reachable or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Borrow a node.
    ///
    /// Ids are only ever handed out by this tree, so indexing cannot fail for
    /// ids that did not come from a different tree.
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Overwrite the contents of a slot, returning what was there.
    pub fn replace(&mut self, id: NodeId, node: Node) -> Node {
        std::mem::replace(&mut self.nodes[id.0], node)
    }

    pub fn function(&self, id: NodeId) -> Option<&Function> {
        self.get(id).as_function()
    }

    pub fn function_mut(&mut self, id: NodeId) -> Option<&mut Function> {
        self.get_mut(id).as_function_mut()
    }

    pub fn identifier_name(&self, id: NodeId) -> Option<&str> {
        match self.get(id) {
            Node::Identifier { name } => Some(name),
            _ => None,
        }
    }

    /// Is `id` a member or call chain with a `?.` link that is not already
    /// closed off by a [`Node::ChainExpression`]?
    pub fn is_optional_chain(&self, mut id: NodeId) -> bool {
        loop {
            id = match self.get(id) {
                Node::MemberExpression {
                    optional: true, ..
                }
                | Node::CallExpression {
                    optional: true, ..
                } => return true,
                Node::MemberExpression { object, .. } => *object,
                Node::CallExpression { callee, .. } => *callee,
                _ => return false,
            };
        }
    }

    /// Static name of a property key node.
    ///
    /// Identifiers, string literals and numeric literals name a key.
    /// Computed keys only count when they are a string or number literal.
    pub fn key_name(&self, key: NodeId, computed: bool) -> Option<Cow<'_, str>> {
        match self.get(key) {
            Node::Identifier { name } if !computed => Some(Cow::Borrowed(name)),
            Node::Literal {
                value: LiteralValue::String(s),
                ..
            } => Some(Cow::Borrowed(s)),
            Node::Literal {
                value: LiteralValue::Number(n),
                ..
            } => Some(Cow::Owned(format_number(*n))),
            _ => None,
        }
    }

    /// Key name of a `Property`, `MethodDefinition` or `PropertyDefinition`.
    pub fn member_key_name(&self, member: NodeId) -> Option<Cow<'_, str>> {
        match self.get(member) {
            Node::Property { key, computed, .. }
            | Node::MethodDefinition { key, computed, .. }
            | Node::PropertyDefinition { key, computed, .. } => self.key_name(*key, *computed),
            _ => None,
        }
    }

    /// First property of an object expression or pattern whose key is `name`.
    pub fn find_property(&self, object: NodeId, name: &str) -> Option<NodeId> {
        let properties = match self.get(object) {
            Node::ObjectExpression { properties } | Node::ObjectPattern { properties } => {
                properties
            }
            _ => return None,
        };
        properties
            .iter()
            .copied()
            .find(|&prop| self.member_key_name(prop).as_deref() == Some(name))
    }

    /// Value node of a `Property`.
    pub fn property_value(&self, prop: NodeId) -> Option<NodeId> {
        match self.get(prop) {
            Node::Property { value, .. } => Some(*value),
            _ => None,
        }
    }
}

/// Render a number the way JavaScript's `String(n)` does for the values that
/// appear as object keys.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// Child-to-parent links recorded while walking a tree.
#[derive(Debug, Clone, Default)]
pub struct Parents {
    links: HashMap<NodeId, NodeId>,
}

impl Parents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn link(&mut self, child: NodeId, parent: NodeId) {
        self.links.insert(child, parent);
    }

    pub fn get(&self, child: NodeId) -> Option<NodeId> {
        self.links.get(&child).copied()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Link every direct child of `parent`.
    pub fn link_children(&mut self, tree: &Tree, parent: NodeId) {
        for child in tree.get(parent).children() {
            self.link(child, parent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object_with_key(tree: &mut Tree, key: Node) -> (NodeId, NodeId) {
        let key = tree.alloc(key);
        let value = tree.alloc(Node::Literal {
            value: LiteralValue::Number(1.0),
            raw: "1".into(),
        });
        let prop = tree.alloc(Node::Property {
            key,
            value,
            kind: PropertyKind::Init,
            computed: false,
            shorthand: false,
            method: false,
        });
        let object = tree.alloc(Node::ObjectExpression {
            properties: vec![prop],
        });
        (object, prop)
    }

    #[test]
    fn new_tree_is_empty_program() {
        let tree = Tree::new();
        assert_eq!(tree.get(tree.root()), &Node::Program { body: vec![] });
    }

    #[test]
    fn find_property_by_identifier_key() {
        let mut tree = Tree::new();
        let (object, prop) = object_with_key(&mut tree, Node::Identifier { name: "cost".into() });
        assert_eq!(tree.find_property(object, "cost"), Some(prop));
        assert_eq!(tree.find_property(object, "price"), None);
    }

    #[test]
    fn string_and_number_keys_have_names() {
        let mut tree = Tree::new();
        let (object, _) = object_with_key(
            &mut tree,
            Node::Literal {
                value: LiteralValue::String("max-hp".into()),
                raw: "\"max-hp\"".into(),
            },
        );
        assert!(tree.find_property(object, "max-hp").is_some());

        let (object, _) = object_with_key(
            &mut tree,
            Node::Literal {
                value: LiteralValue::Number(3.0),
                raw: "3".into(),
            },
        );
        assert!(tree.find_property(object, "3").is_some());
    }

    #[test]
    fn format_number_matches_js_string_conversion() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-2.0), "-2");
        assert_eq!(format_number(1.5), "1.5");
    }

    #[test]
    fn link_children_records_parents() {
        let mut tree = Tree::new();
        let (object, prop) = object_with_key(&mut tree, Node::Identifier { name: "a".into() });
        let mut parents = Parents::new();
        parents.link_children(&tree, object);
        assert_eq!(parents.get(prop), Some(object));
        assert_eq!(parents.get(object), None);
    }
}
