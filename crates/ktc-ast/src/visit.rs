//! Pre-order traversal helpers.

use crate::arena::NodeArena;
use crate::node::{NodeIndex, NodeKind};

/// Visit `root` and all its descendants in pre-order.
///
/// The callback returns `false` to skip the children of the current node.
pub fn walk_preorder<F>(arena: &NodeArena, root: NodeIndex, mut f: F)
where
    F: FnMut(NodeIndex, &NodeKind) -> bool,
{
    let mut stack = vec![root];
    while let Some(index) = stack.pop() {
        let Some(node) = arena.get(index) else {
            continue;
        };
        if !f(index, &node.kind) {
            continue;
        }
        let children = node.kind.children();
        stack.extend(children.into_iter().rev());
    }
}

/// All nodes under `root` (inclusive) matching `predicate`, in pre-order.
pub fn collect<P>(arena: &NodeArena, root: NodeIndex, predicate: P) -> Vec<NodeIndex>
where
    P: Fn(&NodeKind) -> bool,
{
    let mut out = Vec::new();
    walk_preorder(arena, root, |index, kind| {
        if predicate(kind) {
            out.push(index);
        }
        true
    });
    out
}
