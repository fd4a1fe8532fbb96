use super::*;

#[test]
fn enter_leave_tracks_depth() {
    let mut guard: RecursionGuard<u32> = RecursionGuard::with_profile(RecursionProfile::Variance);
    assert!(guard.enter(1).is_entered());
    assert!(guard.enter(2).is_entered());
    assert_eq!(guard.depth(), 2);
    assert_eq!(guard.enter(1), RecursionResult::Cycle);
    guard.leave(2);
    guard.leave(1);
    assert_eq!(guard.depth(), 0);
}

#[test]
fn depth_limit_is_reported() {
    let mut guard: RecursionGuard<u32> = RecursionGuard::new(2, 100);
    assert!(guard.enter(1).is_entered());
    assert!(guard.enter(2).is_entered());
    assert_eq!(guard.enter(3), RecursionResult::DepthExceeded);
    assert!(guard.enter(3).is_denied());
    guard.leave(2);
    guard.leave(1);
}

#[test]
fn iteration_budget_is_reported() {
    let mut guard: RecursionGuard<u32> = RecursionGuard::new(10, 2);
    for _ in 0..2 {
        assert!(guard.enter(1).is_entered());
        guard.leave(1);
    }
    assert_eq!(guard.enter(1), RecursionResult::IterationExceeded);
}

#[test]
fn formatting_profile_is_shallower_than_variance() {
    let formatting = RecursionProfile::TypeFormatting;
    assert_eq!(formatting.max_depth(), 32);
    assert!(formatting.max_depth() < RecursionProfile::Variance.max_depth());
    let custom = RecursionProfile::Custom { max_depth: 3, max_iterations: 7 };
    assert_eq!((custom.max_depth(), custom.max_iterations()), (3, 7));
}
