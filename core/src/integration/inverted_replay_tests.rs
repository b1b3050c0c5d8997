//! Example replay with the simulation on the calling thread
//!
//! Same assertions as the background tests, but the thread that calls
//! `run` becomes the producer and every observer runs on a worker.

use crate::replay::{ReplayStatus, ReplayTest, SimulationPlacement, ensure};
use crate::sandbox::EXAMPLE;

use super::example_replay_tests::{check_blocks, check_player};
use super::test_utils::*;

#[test]
fn test_inverted_player() {
    ReplayTest::new(example_host())
        .placement(SimulationPlacement::Foreground)
        .poller(test_poller())
        .observer("player", check_player)
        .run(EXAMPLE)
        .unwrap();
}

#[test]
fn test_inverted_blocks() {
    ReplayTest::new(example_host())
        .placement(SimulationPlacement::Foreground)
        .poller(test_poller())
        .observer("blocks", check_blocks)
        .run(EXAMPLE)
        .unwrap();
}

#[test]
fn test_inverted_producer_is_calling_thread() {
    let caller = std::thread::current().id();
    ReplayTest::new(example_host())
        .placement(SimulationPlacement::Foreground)
        .poller(test_poller())
        .observer("producer", move |ctx| {
            ctx.wait_for_status(ReplayStatus::Replaying)?;
            ensure(
                ctx.session().producer_thread() == Some(caller),
                "simulation is not on the calling thread",
            )?;
            ensure(
                std::thread::current().id() != caller,
                "observer on the calling thread",
            )
        })
        .run(EXAMPLE)
        .unwrap();
}

/// With no observers, a foreground run returns once playback is done
#[test]
fn test_inverted_without_observers() {
    let host = example_host();
    let session = host.session().clone();
    ReplayTest::new(host)
        .placement(SimulationPlacement::Foreground)
        .poller(test_poller())
        .run(EXAMPLE)
        .unwrap();
    assert_eq!(session.status(), ReplayStatus::ReplayFinished);
    assert!(session.shutdown_requested());
}
