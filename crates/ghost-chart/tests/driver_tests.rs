use ghost_chart::prelude::*;
use ghost_test_utils::{assert_no_errors, demo_sequencer, fast_config};
use std::time::Duration;
use tokio::sync::watch;

#[tokio::test(start_paused = true)]
async fn test_driver_plays_to_completion() {
    let (mut sequencer, host) = demo_sequencer(fast_config());
    sequencer.start().unwrap();
    let (_stop_tx, stop_rx) = watch::channel(false);

    let outcome = RealtimeDriver::new(Duration::from_millis(5))
        .run(&mut sequencer, stop_rx)
        .await;

    assert!(matches!(outcome, DriverOutcome::Completed { .. }));
    assert_eq!(sequencer.run_state(), RunState::Interactive);
    assert!(!sequencer.playback().is_animating);
    assert_no_errors(&host);
}

#[tokio::test(start_paused = true)]
async fn test_driver_stops_on_signal() {
    let (mut sequencer, _host) = demo_sequencer(SequencerConfig::default().with_jitter_seed(1));
    sequencer.start().unwrap();
    let (stop_tx, stop_rx) = watch::channel(false);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        let _ = stop_tx.send(true);
    });
    let outcome = RealtimeDriver::default().run(&mut sequencer, stop_rx).await;

    match outcome {
        DriverOutcome::Stopped { at } => assert!(at < Millis(1_000), "stopped at {at}"),
        other => panic!("expected a stop, got {other:?}"),
    }
    assert_eq!(sequencer.run_state(), RunState::Stopped);
    assert_eq!(sequencer.pending_timers(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_stop_sender_still_completes() {
    let (mut sequencer, _host) = demo_sequencer(fast_config());
    sequencer.start().unwrap();
    let (stop_tx, stop_rx) = watch::channel(false);
    drop(stop_tx);

    let outcome = RealtimeDriver::new(Duration::from_millis(5))
        .run(&mut sequencer, stop_rx)
        .await;
    assert!(matches!(outcome, DriverOutcome::Completed { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_driver_follows_wall_clock() {
    let (mut sequencer, _host) = demo_sequencer(fast_config());
    sequencer.start().unwrap();
    let (_stop_tx, stop_rx) = watch::channel(false);
    let begun = tokio::time::Instant::now();

    let outcome = RealtimeDriver::new(Duration::from_millis(1))
        .run(&mut sequencer, stop_rx)
        .await;
    let DriverOutcome::Completed { at } = outcome else {
        panic!("expected completion");
    };
    let elapsed = u64::try_from(begun.elapsed().as_millis()).unwrap();
    assert!(elapsed >= at.as_u64());
}
