//! Error types shared across the harness

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crate::replay::ReplayStatus;

/// Failure while resolving or decoding a named recording
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// No recording with that name exists in the source
    #[error("recording '{name}' not found at {}", path.display())]
    NotFound { name: String, path: PathBuf },

    /// Filesystem error while reading the recording
    #[error("failed to read recording: {0}")]
    Io(#[from] io::Error),

    /// The bytes do not form a valid recording
    #[error("recording is corrupt: {0}")]
    Corrupt(String),

    /// Event stream checksum did not match the trailer
    #[error("recording checksum mismatch (expected {expected:016x}, got {actual:016x})")]
    Checksum { expected: u64, actual: u64 },
}

/// Every way a replay test can fail.
///
/// Failures stay local to the thread that detects them; nothing here is
/// retried.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// A wait predicate never became true
    #[error("condition not met after {waited:?} (timeout {timeout:?})")]
    Timeout { waited: Duration, timeout: Duration },

    /// The requested recording could not be loaded
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The status register moved backwards
    #[error("replay status regressed from {from} to {to}")]
    StatusRegression { from: ReplayStatus, to: ReplayStatus },

    /// The progress counter moved backwards
    #[error("replay progress regressed from {from} to {to}")]
    ProgressRegression { from: u64, to: u64 },

    /// Status was observed in a state the caller did not allow
    #[error("expected replay status {expected}, found {found}")]
    UnexpectedStatus {
        expected: ReplayStatus,
        found: ReplayStatus,
    },

    /// Observed simulation state differs from the expectation
    #[error("assertion failed: {0}")]
    Assertion(String),

    /// An observer thread panicked (usually a failed `assert!`)
    #[error("observer '{name}' panicked: {message}")]
    ObserverPanicked { name: String, message: String },

    /// `open` was called on a host that already ran a session
    #[error("replay host is already open")]
    AlreadyOpen,

    /// The OS refused to spawn a thread
    #[error("failed to spawn thread: {0}")]
    Spawn(#[source] io::Error),

    /// The simulation rejected a recorded event
    #[error("simulation failed: {0}")]
    Simulation(String),
}

impl HarnessError {
    /// True for failures that mean the harness itself misbehaved, as opposed
    /// to the simulation producing unexpected state.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::StatusRegression { .. } | Self::ProgressRegression { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = HarnessError::StatusRegression {
            from: ReplayStatus::Replaying,
            to: ReplayStatus::PreparingReplay,
        };
        assert_eq!(
            err.to_string(),
            "replay status regressed from REPLAYING to PREPARING_REPLAY"
        );
        assert!(err.is_invariant_violation());

        let err = HarnessError::from(LoadError::NotFound {
            name: "Example".to_string(),
            path: PathBuf::from("/tmp/Example.ttrp"),
        });
        assert_eq!(
            err.to_string(),
            "recording 'Example' not found at /tmp/Example.ttrp"
        );
        assert!(!err.is_invariant_violation());
    }
}
