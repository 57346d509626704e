//! Structural matching of single nodes against a [`MatchSpec`].

use crate::query::spec::{ArgSpec, KeySpec, MatchSpec};
use crate::tree::{LiteralValue, Node, NodeId, Parents, Tree};
use serde_json::{Map, Value};

/// Test `node` against `spec`, reading parent context from `parents`.
pub fn matches(tree: &Tree, parents: &Parents, node: NodeId, spec: &MatchSpec) -> bool {
    matches_in(tree, node, parents.get(node), spec)
}

/// Like [`matches`] with an explicit parent. Call arguments are matched with
/// the call as their parent even before the walker has linked them.
fn matches_in(tree: &Tree, node: NodeId, parent: Option<NodeId>, spec: &MatchSpec) -> bool {
    match spec {
        MatchSpec::Function {
            name,
            anonymous,
            params,
        } => {
            let Some(function) = tree.function(node) else {
                return false;
            };
            if let Some(expected) = params {
                if function.params.len() != expected.len() {
                    return false;
                }
                let names_match = function
                    .params
                    .iter()
                    .zip(expected)
                    .all(|(&param, want)| param_name(tree, param) == Some(want.as_str()));
                if !names_match {
                    return false;
                }
            }
            if name.is_none() && anonymous.is_none() {
                return true;
            }
            let own = function.id.and_then(|id| tree.identifier_name(id)).map(str::to_string);
            let resolved = own.or_else(|| context_name(tree, node, parent));
            name_satisfies(resolved.as_deref(), name.as_deref(), *anonymous)
        }
        MatchSpec::Object {
            name,
            anonymous,
            keys,
            values,
        } => {
            if !matches!(tree.get(node), Node::ObjectExpression { .. }) {
                return false;
            }
            if let Some(keys) = keys {
                if !has_keys(tree, node, keys) {
                    return false;
                }
            }
            if let Some(values) = values {
                if !has_values(tree, node, values) {
                    return false;
                }
            }
            if name.is_none() && anonymous.is_none() {
                return true;
            }
            let resolved = context_name(tree, node, parent);
            name_satisfies(resolved.as_deref(), name.as_deref(), *anonymous)
        }
        MatchSpec::Property { name } => {
            matches!(tree.get(node), Node::Property { .. })
                && tree.member_key_name(node).as_deref() == Some(name.as_str())
        }
        MatchSpec::Identifier { name } => tree.identifier_name(node) == Some(name.as_str()),
        MatchSpec::Literal { value } => match tree.get(node) {
            Node::Literal { value: actual, .. } => literal_equals(actual, value),
            _ => false,
        },
        MatchSpec::Call { name, params } => {
            let Node::CallExpression {
                callee, arguments, ..
            } = tree.get(node)
            else {
                return false;
            };
            if let Some(name) = name {
                if callee_name(tree, *callee) != Some(name.as_str()) {
                    return false;
                }
            }
            match params {
                Some(params) => {
                    params.len() == arguments.len()
                        && params.iter().zip(arguments).all(|(param, &arg)| match param {
                            ArgSpec::Match(spec) => matches_in(tree, arg, Some(node), spec),
                            ArgSpec::Any => true,
                        })
                }
                None => true,
            }
        }
    }
}

fn name_satisfies(resolved: Option<&str>, name: Option<&str>, anonymous: Option<bool>) -> bool {
    if let Some(name) = name {
        if resolved != Some(name) {
            return false;
        }
    }
    match anonymous {
        Some(anonymous) => resolved.is_none() == anonymous,
        None => true,
    }
}

/// Name a parameter contributes to a `params` constraint.
fn param_name(tree: &Tree, param: NodeId) -> Option<&str> {
    match tree.get(param) {
        Node::Identifier { name } => Some(name),
        Node::AssignmentPattern { left, .. } => tree.identifier_name(*left),
        Node::RestElement { argument } => tree.identifier_name(*argument),
        _ => None,
    }
}

/// Name a function or object receives from where it sits.
///
/// Returns `None` for anonymous positions, including unrecognized parents.
pub fn context_name(tree: &Tree, node: NodeId, parent: Option<NodeId>) -> Option<String> {
    let parent = parent?;
    match tree.get(parent) {
        Node::CallExpression { .. }
        | Node::NewExpression { .. }
        | Node::ReturnStatement { .. }
        | Node::LogicalExpression { .. }
        | Node::SequenceExpression { .. }
        | Node::ArrayExpression { .. }
        | Node::MemberExpression { .. }
        | Node::ConditionalExpression { .. }
        | Node::ArrowFunctionExpression(_) => None,
        Node::AssignmentExpression { left, .. } => match tree.get(*left) {
            Node::MemberExpression {
                property, computed, ..
            } => tree.key_name(*property, *computed).map(|n| n.into_owned()),
            Node::Identifier { name } => Some(name.clone()),
            _ => None,
        },
        Node::VariableDeclarator { id, .. } => tree.identifier_name(*id).map(str::to_string),
        Node::AssignmentPattern { left, .. } => tree.identifier_name(*left).map(str::to_string),
        Node::Property { .. } | Node::MethodDefinition { .. } | Node::PropertyDefinition { .. } => {
            tree.member_key_name(parent).map(|n| n.into_owned())
        }
        other => {
            tracing::debug!(
                parent = other.type_name(),
                node = %node,
                "unrecognized parent context; treating node as anonymous"
            );
            None
        }
    }
}

/// Name of the function being called: `f()` and `o.f()` both give `f`.
fn callee_name(tree: &Tree, callee: NodeId) -> Option<&str> {
    match tree.get(callee) {
        Node::Identifier { name } => Some(name),
        Node::ChainExpression { expression } => callee_name(tree, *expression),
        Node::MemberExpression {
            property,
            computed: false,
            ..
        } => tree.identifier_name(*property),
        Node::MemberExpression {
            property,
            computed: true,
            ..
        } => match tree.get(*property) {
            Node::Literal {
                value: LiteralValue::String(s),
                ..
            } => Some(s),
            _ => None,
        },
        _ => None,
    }
}

fn has_keys(tree: &Tree, object: NodeId, keys: &KeySpec) -> bool {
    match keys {
        KeySpec::Names(names) => names
            .iter()
            .all(|name| tree.find_property(object, name).is_some()),
        KeySpec::Nested(map) => map.iter().all(|(key, nested)| {
            let Some(prop) = tree.find_property(object, key) else {
                return false;
            };
            match nested {
                KeySpec::Present(_) => true,
                _ => match tree.property_value(prop) {
                    Some(value) if matches!(tree.get(value), Node::ObjectExpression { .. }) => {
                        has_keys(tree, value, nested)
                    }
                    _ => false,
                },
            }
        }),
        KeySpec::Present(_) => true,
    }
}

fn has_values(tree: &Tree, object: NodeId, values: &Map<String, Value>) -> bool {
    values.iter().all(|(key, expected)| {
        let Some(value) = tree
            .find_property(object, key)
            .and_then(|prop| tree.property_value(prop))
        else {
            return false;
        };
        match expected {
            Value::Object(nested) => {
                matches!(tree.get(value), Node::ObjectExpression { .. })
                    && has_values(tree, value, nested)
            }
            _ => constant_value(tree, value).is_some_and(|actual| literal_equals(&actual, expected)),
        }
    })
}

/// Constant value of an expression, folding common minifier spellings.
pub fn constant_value(tree: &Tree, id: NodeId) -> Option<LiteralValue> {
    match tree.get(id) {
        Node::Literal { value, .. } => Some(value.clone()),
        Node::UnaryExpression { operator, argument } => {
            let operand = match tree.get(*argument) {
                Node::Literal { value, .. } => value,
                _ => return None,
            };
            match (operator.as_str(), operand) {
                ("-", LiteralValue::Number(n)) => Some(LiteralValue::Number(-n)),
                ("+", LiteralValue::Number(n)) => Some(LiteralValue::Number(*n)),
                ("!", LiteralValue::Number(n)) => Some(LiteralValue::Boolean(*n == 0.0)),
                ("!", LiteralValue::Boolean(b)) => Some(LiteralValue::Boolean(!b)),
                ("void", LiteralValue::Number(n)) if *n == 0.0 => Some(LiteralValue::Null),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Strict equality between a literal value and a JSON value.
pub fn literal_equals(actual: &LiteralValue, expected: &Value) -> bool {
    match (actual, expected) {
        (LiteralValue::String(a), Value::String(b)) => a == b,
        (LiteralValue::Number(a), Value::Number(b)) => b.as_f64() == Some(*a),
        (LiteralValue::Boolean(a), Value::Bool(b)) => a == b,
        (LiteralValue::Null, Value::Null) => true,
        _ => false,
    }
}
