//! The filesystem-borne sentinel protocol: emit writes a `.signal` file,
//! drain consumes it (read-then-delete), and malformed files are moved
//! aside rather than silently dropped.

use loom_core::{PlanId, SignalEvent, UuidIdGen};
use loom_engine::SignalChannel;

#[tokio::test]
async fn emitted_signal_is_drained_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let channel = SignalChannel::new(dir.path());
    let id_gen = UuidIdGen;

    channel
        .emit(
            &id_gen,
            &PlanId::new("auth"),
            SignalEvent::PlannerFinished,
            None,
            1_000,
        )
        .await
        .unwrap();

    let first = channel.drain().await.unwrap();
    assert_eq!(first.signals.len(), 1);
    assert_eq!(first.signals[0].plan_file, PlanId::new("auth"));
    assert_eq!(first.signals[0].event, SignalEvent::PlannerFinished);
    assert!(first.rejected.is_empty());

    let second = channel.drain().await.unwrap();
    assert!(second.signals.is_empty(), "signal file is deleted after consumption");
}

#[tokio::test]
async fn signal_body_round_trips_through_emit_and_drain() {
    let dir = tempfile::tempdir().unwrap();
    let channel = SignalChannel::new(dir.path());
    let id_gen = UuidIdGen;

    channel
        .emit(
            &id_gen,
            &PlanId::new("auth"),
            SignalEvent::ReviewChangesRequested,
            Some("please add a test for the edge case"),
            2_000,
        )
        .await
        .unwrap();

    let drained = channel.drain().await.unwrap();
    assert_eq!(drained.signals.len(), 1);
    assert_eq!(
        drained.signals[0].body.as_deref(),
        Some("please add a test for the edge case")
    );
}

#[tokio::test]
async fn malformed_signal_file_is_rejected_not_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let signals_dir = dir.path().join(".signals");
    std::fs::create_dir_all(&signals_dir).unwrap();
    std::fs::write(signals_dir.join("3000-bogus.signal"), "event: NotARealEvent\nplan:  auth\n").unwrap();

    let channel = SignalChannel::new(dir.path());
    let drained = channel.drain().await.unwrap();

    assert!(drained.signals.is_empty());
    assert_eq!(drained.rejected.len(), 1);
    assert_eq!(drained.rejected[0].original_name, "3000-bogus.signal");
    assert!(signals_dir.join("rejected").join("3000-bogus.signal").is_file());
    assert!(!signals_dir.join("3000-bogus.signal").exists());
}
