//! Example replay with the simulation on a background thread

use crate::error::HarnessError;
use crate::replay::{
    ObserverContext, ReplayStatus, ReplayTest, SimulationPlacement, StatusTracker, ensure,
    expect_eq, expect_ne,
};
use crate::sandbox::{
    Block, EXAMPLE, EXAMPLE_EDITS, EXAMPLE_EVENT_COUNT, EXAMPLE_FINAL_POSITION,
    EXAMPLE_START_POSITION, SandboxView,
};

use super::test_utils::*;

/// Player position checks shared by both placements
pub(super) fn check_player(ctx: &ObserverContext<SandboxView>) -> Result<(), HarnessError> {
    ctx.wait_for_status(ReplayStatus::Replaying)?;
    ctx.wait_until(|| ctx.view().player_position().is_some())?;
    expect_eq(
        "initial position",
        ctx.view().player_position(),
        Some(EXAMPLE_START_POSITION),
    )?;

    ctx.wait_for_progress(1810)?;
    expect_ne(
        "position after 1810 events",
        ctx.view().player_position(),
        Some(EXAMPLE_START_POSITION),
    )?;

    ctx.wait_for_status(ReplayStatus::ReplayFinished)?;
    expect_eq(
        "final position",
        ctx.view().player_position(),
        Some(EXAMPLE_FINAL_POSITION),
    )?;
    ctx.shutdown();
    ensure(!ctx.host_running(), "host still running after shutdown")
}

/// Block checks shared by both placements
pub(super) fn check_blocks(ctx: &ObserverContext<SandboxView>) -> Result<(), HarnessError> {
    ctx.wait_for_status(ReplayStatus::Replaying)?;
    let (first, _, _) = EXAMPLE_EDITS[0];
    ctx.wait_until(|| ctx.view().block_at(first) != Block::Unloaded)?;
    for (at, before, _) in EXAMPLE_EDITS {
        expect_eq(&format!("block {} before replay", at), ctx.view().block_at(at), before)?;
    }

    ctx.wait_for_status(ReplayStatus::ReplayFinished)?;
    for (at, _, after) in EXAMPLE_EDITS {
        expect_eq(&format!("block {} after replay", at), ctx.view().block_at(at), after)?;
    }
    ctx.shutdown();
    Ok(())
}

/// Observer on the test thread itself, driving the host directly
#[test]
fn test_example_replay_observed_from_test_thread() {
    let host = example_host();
    let poller = test_poller();
    let tracker = StatusTracker::new(host.session().clone());
    let view = host.view().clone();

    host.open(EXAMPLE, false).unwrap();
    assert!(!host.session().is_producer_thread());

    tracker.wait_for_status(&poller, ReplayStatus::Replaying).unwrap();
    assert_eq!(view.player_position(), Some(EXAMPLE_START_POSITION));

    tracker.wait_for_progress(&poller, 1810).unwrap();
    assert_ne!(view.player_position(), Some(EXAMPLE_START_POSITION));

    tracker
        .wait_for_status(&poller, ReplayStatus::ReplayFinished)
        .unwrap();
    assert_eq!(view.player_position(), Some(EXAMPLE_FINAL_POSITION));
    assert_eq!(tracker.progress().unwrap(), EXAMPLE_EVENT_COUNT);

    host.shutdown();
    assert!(!host.is_running());
    assert_eq!(host.status(), ReplayStatus::ReplayFinished);
    assert!(host.producer_error().is_none());
}

#[test]
fn test_example_player_background() {
    ReplayTest::new(example_host())
        .placement(SimulationPlacement::Background)
        .poller(test_poller())
        .observer("player", check_player)
        .run(EXAMPLE)
        .unwrap();
}

#[test]
fn test_example_blocks_background() {
    ReplayTest::new(example_host())
        .poller(test_poller())
        .observer("blocks", check_blocks)
        .run(EXAMPLE)
        .unwrap();
}

/// Both observers at once; the host stops when the last one finishes
#[test]
fn test_example_concurrent_observers() {
    ReplayTest::new(example_host())
        .poller(test_poller())
        .observer("player", check_player)
        .observer("blocks", check_blocks)
        .observer("status", |ctx| {
            // Every observer sees the same monotonic history
            let mut last = ctx.status()?;
            while last != ReplayStatus::ReplayFinished {
                let now = ctx.status()?;
                ensure(now >= last, "status went backwards")?;
                last = now;
                std::thread::yield_now();
            }
            Ok(())
        })
        .run(EXAMPLE)
        .unwrap();
}

#[test]
fn test_observer_runs_on_named_thread() {
    ReplayTest::new(example_host())
        .poller(test_poller())
        .observer("naming", |ctx| {
            expect_eq(
                "thread name",
                std::thread::current().name(),
                Some("observer-naming"),
            )?;
            ensure(
                !ctx.session().is_producer_thread(),
                "observer registered as producer",
            )
        })
        .run(EXAMPLE)
        .unwrap();
}
