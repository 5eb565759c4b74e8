use super::*;

#[test]
fn test_enter_leave_and_cycle() {
    let mut guard: RecursionGuard<u32> = RecursionGuard::new(8);
    assert_eq!(guard.enter(1), RecursionResult::Entered);
    assert_eq!(guard.enter(1), RecursionResult::Cycle);
    guard.leave(1);
    assert_eq!(guard.enter(1), RecursionResult::Entered);
    guard.leave(1);
}

#[test]
fn test_depth_limit_frees_on_leave() {
    let mut guard: RecursionGuard<u32> = RecursionGuard::new(2);
    assert_eq!(guard.enter(1), RecursionResult::Entered);
    assert_eq!(guard.enter(2), RecursionResult::Entered);
    assert_eq!(guard.enter(3), RecursionResult::DepthExceeded);
    guard.leave(2);
    assert_eq!(guard.enter(3), RecursionResult::Entered);
    guard.leave(3);
    guard.leave(1);
}

#[test]
fn test_depth_counter() {
    let mut counter = DepthCounter::new(1);
    assert!(counter.enter());
    assert!(!counter.enter());
    counter.leave();
    assert!(counter.enter());
    counter.leave();
}

#[test]
fn test_profiles() {
    assert_eq!(RecursionProfile::Formatting.max_depth(), 32);
    assert_eq!(
        RecursionProfile::MroWalk.max_depth(),
        pyz_common::limits::MAX_MRO_LENGTH as u32
    );
}
