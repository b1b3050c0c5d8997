//! Replay lifecycle status
//!
//! The status register is written by the producer thread only and read by any
//! number of observer threads. It is a single atomic byte, so reads never block
//! the simulation.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use tracing::debug;

/// Where the replay process is in its lifecycle.
///
/// Variants are declared in lifecycle order, so `<` means "earlier".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ReplayStatus {
    /// No replay has been opened yet
    NotActivated = 0,
    /// Recording loaded, simulation preparing its initial state
    PreparingReplay = 1,
    /// Recorded events are being applied
    Replaying = 2,
    /// Every recorded event has been applied (terminal)
    ReplayFinished = 3,
}

impl ReplayStatus {
    /// All states in lifecycle order
    pub const ALL: [ReplayStatus; 4] = [
        ReplayStatus::NotActivated,
        ReplayStatus::PreparingReplay,
        ReplayStatus::Replaying,
        ReplayStatus::ReplayFinished,
    ];

    /// True while a session is loading or playing back.
    pub fn is_active(self) -> bool {
        matches!(self, Self::PreparingReplay | Self::Replaying)
    }

    /// True once playback has consumed the whole recording.
    pub fn is_finished(self) -> bool {
        self == Self::ReplayFinished
    }

    /// The state that follows this one, or `None` for the terminal state.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::NotActivated => Some(Self::PreparingReplay),
            Self::PreparingReplay => Some(Self::Replaying),
            Self::Replaying => Some(Self::ReplayFinished),
            Self::ReplayFinished => None,
        }
    }

    /// Upper-snake name used in logs and reports
    pub fn name(self) -> &'static str {
        match self {
            Self::NotActivated => "NOT_ACTIVATED",
            Self::PreparingReplay => "PREPARING_REPLAY",
            Self::Replaying => "REPLAYING",
            Self::ReplayFinished => "REPLAY_FINISHED",
        }
    }
}

impl fmt::Display for ReplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for ReplayStatus {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::NotActivated),
            1 => Ok(Self::PreparingReplay),
            2 => Ok(Self::Replaying),
            3 => Ok(Self::ReplayFinished),
            other => Err(other),
        }
    }
}

impl From<ReplayStatus> for u8 {
    fn from(status: ReplayStatus) -> Self {
        status as u8
    }
}

/// Thread-visible cell holding the current [`ReplayStatus`].
///
/// No transition validation happens on write: only the producer writes, and it
/// does so strictly in lifecycle order. Observers that need to detect a
/// regression do it on their side (see `StatusTracker`).
#[derive(Debug)]
pub struct StatusRegister {
    value: AtomicU8,
}

impl StatusRegister {
    /// Create a register in `NOT_ACTIVATED`
    pub fn new() -> Self {
        Self {
            value: AtomicU8::new(ReplayStatus::NotActivated as u8),
        }
    }

    /// Read the current status.
    ///
    /// Acquire pairs with the release store in [`set`](Self::set): everything
    /// the producer did before publishing a status is visible after reading it.
    pub fn get(&self) -> ReplayStatus {
        let raw = self.value.load(Ordering::Acquire);
        // Only `set` writes, and it only writes valid discriminants.
        ReplayStatus::try_from(raw).unwrap_or(ReplayStatus::NotActivated)
    }

    /// Publish a new status (producer thread only).
    pub fn set(&self, status: ReplayStatus) {
        let previous = self.value.swap(status as u8, Ordering::AcqRel);
        if previous != status as u8 {
            debug!(
                from = %ReplayStatus::try_from(previous).unwrap_or(ReplayStatus::NotActivated),
                to = %status,
                "replay status changed"
            );
        }
    }
}

impl Default for StatusRegister {
    fn default() -> Self {
        Self::new()
    }
}
