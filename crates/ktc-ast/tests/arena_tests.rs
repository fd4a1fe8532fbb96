use super::*;
use crate::node::BinaryOp;
use crate::visit;
use ktc_common::Atom;

fn name(arena: &mut NodeArena, atom: u32) -> NodeIndex {
    arena.add(NodeKind::SimpleName { name: Atom(atom) }, Span::new(0, 1))
}

#[test]
fn add_links_children_to_parent() {
    let mut arena = NodeArena::new();
    let this = arena.add(NodeKind::This { label: None }, Span::new(0, 4));
    let sel = name(&mut arena, 1);
    let qualified = arena.add(
        NodeKind::Qualified {
            receiver: this,
            selector: sel,
            safe: false,
        },
        Span::new(0, 6),
    );
    assert_eq!(arena.parent(this), qualified);
    assert_eq!(arena.parent(sel), qualified);
    assert!(arena.parent(qualified).is_none());
    assert_eq!(arena.ancestors(this).collect::<Vec<_>>(), vec![qualified]);
}

#[test]
fn containing_declaration_skips_expressions() {
    let mut arena = NodeArena::new();
    let left = name(&mut arena, 1);
    let right = name(&mut arena, 2);
    let bin = arena.add(
        NodeKind::Binary {
            op: BinaryOp::Eq,
            left,
            right,
        },
        Span::default(),
    );
    let block = arena.add(
        NodeKind::Block {
            statements: [bin].into_iter().collect(),
        },
        Span::default(),
    );
    let func = arena.add(
        NodeKind::Function {
            name: Atom(3),
            body: Some(block),
            annotations: Default::default(),
        },
        Span::default(),
    );
    assert_eq!(arena.containing_declaration(left), func);
    assert_eq!(arena.containing_declaration(func), func);
    assert!(arena.containing_declaration(NodeIndex::NONE).is_none());
}

#[test]
fn deserialized_arena_relinks_parents() {
    let json = r#"{"nodes":[
        {"kind":"this"},
        {"kind":"simple_name","name":1},
        {"kind":"qualified","receiver":0,"selector":1,"span":{"start":0,"end":6}}
    ]}"#;
    let mut arena: NodeArena = serde_json::from_str(json).unwrap();
    assert!(arena.parent(NodeIndex(0)).is_none());
    arena.link_parents();
    assert_eq!(arena.parent(NodeIndex(0)), NodeIndex(2));
    assert_eq!(arena.span(NodeIndex(2)), Span::new(0, 6));
    assert!(matches!(
        arena.kind(NodeIndex(2)),
        Some(NodeKind::Qualified { safe: false, .. })
    ));
}

#[test]
fn preorder_walk_visits_in_evaluation_order() {
    let mut arena = NodeArena::new();
    let callee = name(&mut arena, 1);
    let arg = name(&mut arena, 2);
    let call = arena.add(
        NodeKind::Call {
            callee,
            arguments: [arg].into_iter().collect(),
        },
        Span::default(),
    );
    let names = visit::collect(&arena, call, |k| matches!(k, NodeKind::SimpleName { .. }));
    assert_eq!(names, vec![callee, arg]);
}
