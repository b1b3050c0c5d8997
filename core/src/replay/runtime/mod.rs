//! Replay runtime
//!
//! Execution side of the harness:
//! - **Host**: drives a simulation through a recording on the producer thread
//! - **Orchestrator**: runs observer threads against a host and collects verdicts
//! - **Player**: event cursor and pacing over a loaded recording
//! - **Recorder**: captures events into a new recording

mod host;
mod orchestrator;
mod player;
mod recorder;
mod simulation;

pub use host::{HostHandle, PRODUCER_THREAD_NAME, ReplayHost};
pub use orchestrator::{
    ObserverContext, ReplayTest, SimulationPlacement, catch_assertion, ensure, expect_eq,
    expect_ne,
};
pub use player::Player;
pub use recorder::{Recorder, RecorderConfig};
pub use simulation::Simulation;
