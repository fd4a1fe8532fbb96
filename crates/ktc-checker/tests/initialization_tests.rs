use super::*;
use crate::test_world::World;
use ktc_ast::NodeKind;

#[test]
fn meet_of_different_states_is_unknown() {
    use super::InitState::*;
    assert_eq!(Initialized.meet(Initialized), Initialized);
    assert_eq!(Uninitialized.meet(Uninitialized), Uninitialized);
    assert_eq!(Initialized.meet(Uninitialized), Unknown);
    assert_eq!(Unknown.meet(Initialized), Unknown);
    assert!(!Unknown.is_initialized());
}

/// `class C { val a; val b; init { if (c) { a = 1 } else { a = 1 or nothing }; b = 1 } }`
fn branch_world(both: bool) -> (World, Vec<CallableId>, Pseudocode) {
    let mut world = World::new();
    let c = world.class("C", Vec::new());
    let a = world.property(c, "a");
    let b = world.property(c, "b");
    let a_decl = world.property_node(a, None);
    let b_decl = world.property_node(b, None);
    let condition = world.condition();
    let then_set = world.set("a", a);
    let then_branch = world.block(&[then_set]);
    let else_branch = if both {
        let else_set = world.set("a", a);
        world.block(&[else_set])
    } else {
        world.block(&[])
    };
    let branch = world.node(NodeKind::If {
        condition,
        then_branch,
        else_branch: Some(else_branch),
    });
    let set_b = world.set("b", b);
    let init = world.init(&[branch, set_b]);
    let class = world.class_node(c, &[a_decl, b_decl, init]);
    let pseudocode = world.class_initializer(class);
    (world, vec![a, b], pseudocode)
}

#[test]
fn write_on_one_branch_only_is_unknown_after_merge() {
    let (_, tracked, pseudocode) = branch_world(false);
    let data = VariableInitializers::compute(&pseudocode, &tracked, None).expect("dataflow");

    let exit = data.exit_state().expect("subroutine completes");
    assert_eq!(exit.get(&tracked[0]), Some(&InitState::Unknown));
    assert_eq!(exit.get(&tracked[1]), Some(&InitState::Initialized));
    assert_eq!(
        data.state_at_enter(pseudocode.enter(), tracked[0]),
        Some(InitState::Uninitialized)
    );
}

#[test]
fn write_on_both_branches_initializes() {
    let (_, tracked, pseudocode) = branch_world(true);
    let data = VariableInitializers::compute(&pseudocode, &tracked, None).expect("dataflow");

    let exit = data.exit_state().expect("subroutine completes");
    assert!(tracked.iter().all(|v| exit.get(v) == Some(&InitState::Initialized)));
}

#[test]
fn initial_states_are_extended_with_missing_variables() {
    let (_, tracked, pseudocode) = branch_world(false);
    let mut initial = InitStates::new();
    initial.insert(tracked[0], InitState::Initialized);

    let data = VariableInitializers::compute(&pseudocode, &tracked, Some(&initial)).expect("dataflow");

    let enter = data.enter_data(pseudocode.enter()).expect("entry is reachable");
    assert_eq!(enter.get(&tracked[0]), Some(&InitState::Initialized));
    assert_eq!(enter.get(&tracked[1]), Some(&InitState::Uninitialized));
    let exit = data.exit_state().expect("subroutine completes");
    assert_eq!(exit.get(&tracked[0]), Some(&InitState::Initialized));
}

#[test]
fn subroutine_that_always_throws_has_no_exit_state() {
    let mut world = World::new();
    let c = world.class("C", Vec::new());
    let value = world.literal();
    let throw = world.node(NodeKind::Throw { value });
    let init = world.init(&[throw]);
    let class = world.class_node(c, &[init]);
    let pseudocode = world.class_initializer(class);

    let data = VariableInitializers::compute(&pseudocode, &[], None).expect("dataflow");
    assert!(data.exit_state().is_none());
    assert!(data.enter_data(pseudocode.error()).is_some());
}
