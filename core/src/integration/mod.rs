//! Integration tests for the replay harness
//!
//! Replays the bundled sandbox recording end to end, with the simulation on
//! a background thread and on the calling thread, and exercises host
//! lifecycle edge cases.

#[cfg(test)]
mod example_replay_tests;
#[cfg(test)]
mod inverted_replay_tests;

#[cfg(test)]
pub(crate) mod test_utils {
    use std::time::Duration;

    use crate::config::HostConfig;
    use crate::replay::{MemoryRecordings, Poller, ReplayHost};
    use crate::sandbox::{EXAMPLE, SandboxWorld, example_recording};

    /// Playback rate for the example: one event per millisecond
    pub const TICK_RATE: u32 = 1000;

    pub fn example_source() -> MemoryRecordings {
        MemoryRecordings::new().with(EXAMPLE, example_recording().unwrap())
    }

    pub fn host_config() -> HostConfig {
        HostConfig {
            tick_rate: TICK_RATE,
            recordings_dir: None,
        }
    }

    /// Sandbox host with the example recording available
    pub fn example_host() -> ReplayHost<SandboxWorld> {
        ReplayHost::new(SandboxWorld::new(), example_source(), host_config())
    }

    pub fn test_poller() -> Poller {
        Poller::new(Duration::from_millis(1), Duration::from_secs(30))
    }
}
