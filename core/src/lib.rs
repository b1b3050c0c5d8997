//! Ticktrace Core - record-and-replay verification harness
//!
//! Replays a recorded session against a simulation on one thread while test
//! code on other threads waits for replay milestones and asserts on the
//! simulated world.
//!
//! # Architecture
//!
//! - [`ReplayHost`] - Loads a recording and drives a [`Simulation`] through it
//! - [`ReplaySession`] - Status register and progress counter shared with observers
//! - [`ReplayTest`] - Runs observer threads against a host and collects verdicts
//! - [`Poller`] - Bounded polling wait used by every observer
//! - [`sandbox`] - Small block world used by the bundled example recording

pub mod config;
pub mod error;
#[cfg(test)]
mod integration;
pub mod replay;
pub mod sandbox;

pub use config::{ConfigError, HarnessConfig, HostConfig, PollConfig};
pub use error::{HarnessError, LoadError};

pub use replay::{
    HostHandle, MemoryRecordings, ObserverContext, Poller, ProgressCounter, RecordingDir,
    RecordingSource, ReplayHost, ReplaySession, ReplayStatus, ReplayTest, Simulation,
    SimulationPlacement, StatusRegister, StatusTracker, wait_until,
};
