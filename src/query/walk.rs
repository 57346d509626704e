//! Iterative depth-first traversal.

use crate::tree::{NodeId, Parents, Tree};

/// Collect every strict descendant of `root` accepted by `predicate`.
///
/// Traversal uses an explicit stack, so arbitrarily deep bundles cannot
/// overflow the call stack. Children are pushed in reverse, which yields
/// matches in document pre-order. Every visited child is linked to its parent
/// in `parents` before the predicate sees it, and matching never prunes: a
/// match's own descendants are still visited.
pub fn collect<F>(tree: &Tree, parents: &mut Parents, root: NodeId, mut predicate: F) -> Vec<NodeId>
where
    F: FnMut(&Tree, &Parents, NodeId) -> bool,
{
    let mut stack = Vec::new();
    push_children(tree, parents, root, &mut stack);

    let mut found = Vec::new();
    while let Some(id) = stack.pop() {
        if predicate(tree, parents, id) {
            found.push(id);
        }
        push_children(tree, parents, id, &mut stack);
    }
    found
}

fn push_children(tree: &Tree, parents: &mut Parents, parent: NodeId, stack: &mut Vec<NodeId>) {
    let children = tree.get(parent).children();
    for &child in children.iter().rev() {
        parents.link(child, parent);
        stack.push(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::js::{JavaScript, Syntax};
    use crate::tree::Node;

    #[test]
    fn visits_in_document_order() {
        let tree = JavaScript.parse_program("a; function f() { b; } c;").unwrap();
        let mut parents = Parents::new();
        let names: Vec<String> = collect(&tree, &mut parents, tree.root(), |tree, _, id| {
            matches!(tree.get(id), Node::Identifier { .. })
        })
        .into_iter()
        .filter_map(|id| tree.identifier_name(id).map(str::to_string))
        .collect();
        assert_eq!(names, ["a", "f", "b", "c"]);
    }

    #[test]
    fn root_is_not_a_candidate_but_children_are_linked() {
        let tree = JavaScript.parse_program("x;").unwrap();
        let root = tree.root();
        let mut parents = Parents::new();
        let all = collect(&tree, &mut parents, root, |_, _, _| true);
        assert!(!all.contains(&root));
        let statement = tree.get(root).children()[0];
        assert_eq!(parents.get(statement), Some(root));
    }

    #[test]
    fn matches_do_not_prune_descendants() {
        let tree = JavaScript.parse_program("x = { a: { a: 1 } };").unwrap();
        let mut parents = Parents::new();
        let found = collect(&tree, &mut parents, tree.root(), |tree, _, id| {
            tree.member_key_name(id).as_deref() == Some("a")
        });
        assert_eq!(found.len(), 2);
    }
}
