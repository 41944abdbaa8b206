use ghost_kernel::prelude::*;
use proptest::prelude::*;

#[test]
fn test_stale_generation_is_detectable_after_bump() {
    let mut generations = GenerationCounter::new();
    let mut queue = TimerQueue::new();

    let old = generations.bump();
    queue.schedule(Millis(10), old, "old phase");
    let new = generations.bump();
    queue.schedule(Millis(10), new, "new phase");

    let first = queue.pop_due(Millis(10)).unwrap();
    assert!(!generations.is_current(first.generation));
    let second = queue.pop_due(Millis(10)).unwrap();
    assert!(generations.is_current(second.generation));
}

#[test]
fn test_clock_drives_queue() {
    let mut clock = VirtualClock::new();
    let mut queue = TimerQueue::new();
    let g = Generation(1);
    queue.schedule(Millis(100), g, 1);
    queue.schedule(Millis(250), g, 2);

    clock.advance_by(Millis(120));
    let mut fired = Vec::new();
    while let Some(entry) = queue.pop_due(clock.now()) {
        fired.push(entry.payload);
    }
    assert_eq!(fired, vec![1]);
    assert_eq!(queue.next_due(), Some(Millis(250)));
}

#[test]
fn test_join_either_order() {
    for order in [["x", "y"], ["y", "x"]] {
        let mut join = AndJoin::new(["x", "y"]);
        assert!(matches!(join.arrive(order[0]), Ok(JoinStatus::Waiting { remaining: 1 })));
        assert_eq!(join.arrive(order[1]), Ok(JoinStatus::Complete));
    }
}

#[test]
fn test_kernel_error_wraps_parts() {
    let err: KernelError = TimerError::NotPending.into();
    assert!(err.is_recoverable());
    assert_eq!(err.to_string(), "Timer error: NotPending");

    let err: KernelError = JoinError::UnknownParticipant.into();
    assert!(!err.is_recoverable());
}

#[test]
fn test_millis_serializes_transparently_enough() {
    let json = serde_json::to_string(&Millis(42)).unwrap();
    assert_eq!(json, "42");
}

proptest! {
    #[test]
    fn prop_pop_order_is_sorted(dues in proptest::collection::vec(0u64..1_000, 1..64)) {
        let mut queue = TimerQueue::new();
        for (i, due) in dues.iter().enumerate() {
            queue.schedule(Millis(*due), Generation(1), i);
        }
        let mut last: Option<(Millis, usize)> = None;
        while let Some(entry) = queue.pop_due(Millis(u64::MAX)) {
            if let Some((due, idx)) = last {
                prop_assert!(entry.due > due || (entry.due == due && entry.payload > idx));
            }
            last = Some((entry.due, entry.payload));
        }
        prop_assert!(queue.is_empty());
    }
}
