//! Deep-containment matching of nodes against free-form JSON patterns.
//!
//! The pattern is compared with the node's ESTree-shaped view: `type` plus
//! the named fields from [`Node::fields`]. Every key in the pattern must be
//! present and match; fields the pattern does not mention are ignored.

use crate::tree::{Field, Node, NodeId, Tree};
use serde_json::Value;

/// Does the node at `id` contain `pattern`?
pub fn contains(tree: &Tree, id: NodeId, pattern: &Value) -> bool {
    let Value::Object(expected) = pattern else {
        return false;
    };
    let node = tree.get(id);
    expected.iter().all(|(key, want)| {
        if key == "type" {
            return want.as_str() == Some(node.type_name());
        }
        match node.field(key) {
            Some(field) => field_contains(tree, field, want),
            None => false,
        }
    })
}

fn field_contains(tree: &Tree, field: Field<'_>, want: &Value) -> bool {
    match (field, want) {
        (Field::Node(id), Value::Object(_)) => contains(tree, id, want),
        (Field::List(ids), Value::Array(items)) => {
            items.len() <= ids.len()
                && items
                    .iter()
                    .zip(ids)
                    .all(|(item, &id)| contains(tree, id, item))
        }
        (Field::Holes(slots), Value::Array(items)) => {
            items.len() <= slots.len()
                && items.iter().zip(slots).all(|(item, slot)| match slot {
                    Some(id) => contains(tree, *id, item),
                    None => item.is_null(),
                })
        }
        (Field::Str(actual), Value::String(want)) => actual == want,
        (Field::Number(actual), Value::Number(want)) => want.as_f64() == Some(actual),
        (Field::Bool(actual), Value::Bool(want)) => actual == *want,
        (Field::Null, Value::Null) => true,
        _ => false,
    }
}

/// Type names accepted by the `type` key, useful for validating patterns.
pub fn is_known_type(name: &str) -> bool {
    Node::TYPE_NAMES.contains(&name)
}
