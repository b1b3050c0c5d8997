//! Simulation seam
//!
//! The harness does not know what the simulated world contains. It drives a
//! [`Simulation`] on the producer thread and hands observers a read-only
//! [`Simulation::View`] to build predicates and assertions from.

use anyhow::Result;

use crate::replay::types::{Checkpoint, RecordedEvent, RecordingHeader};

/// A simulation the replay host can drive.
///
/// All methods run on the producer thread. The host publishes status and
/// progress only after these calls return, so anything a method has written
/// to the shared view is visible to an observer that sees the matching status
/// or progress value.
pub trait Simulation: Send + 'static {
    /// Read-only query handle for observer threads
    type View: Clone + Send + Sync + 'static;

    /// Create a query handle onto this simulation's state.
    fn view(&self) -> Self::View;

    /// Build the initial world for a recording.
    ///
    /// `initial` is the checkpoint taken before the first event, when the
    /// recording has one.
    fn prepare(&mut self, header: &RecordingHeader, initial: Option<&Checkpoint>) -> Result<()>;

    /// Apply one recorded event.
    fn apply(&mut self, event: &RecordedEvent) -> Result<()>;

    /// Advance the world with no recorded input (after playback finished).
    fn idle(&mut self) -> Result<()> {
        Ok(())
    }
}
