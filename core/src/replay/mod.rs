//! Record-and-replay verification
//!
//! A recorded session is replayed by a producer thread while observer threads
//! wait for conditions on the replay's progress and assert on the simulated
//! world.
//!
//! # Architecture
//!
//! ```text
//!   RecordingSource ──► ReplayHost ──(producer thread)──► Simulation
//!                           │ publishes                       │ exposes
//!                           ▼                                 ▼
//!                 StatusRegister + ProgressCounter      Simulation::View
//!                           │                                 │
//!                           └──────── observers poll ─────────┘
//!                                   (wait_until / Poller)
//! ```
//!
//! Status only moves forward (`NOT_ACTIVATED → PREPARING_REPLAY → REPLAYING →
//! REPLAY_FINISHED`) and progress only grows; observers that see a value can
//! rely on every effect published before it.
//!
//! # Usage
//!
//! ```ignore
//! use ticktrace_core::replay::{ReplayHost, ReplayStatus, ReplayTest, RecordingDir};
//!
//! let host = ReplayHost::new(world, RecordingDir::new("recordings"), config.host);
//! ReplayTest::new(host)
//!     .observer("main", |ctx| {
//!         ctx.wait_for_status(ReplayStatus::Replaying)?;
//!         ctx.wait_for_progress(100)?;
//!         // query ctx.view() here
//!         Ok(())
//!     })
//!     .run("Example")?;
//! ```

pub mod binary;
pub mod poll;
pub mod progress;
pub mod runtime;
pub mod session;
pub mod source;
pub mod status;
pub mod tracker;
pub mod types;

pub use binary::{BinaryReader, BinaryWriter};
pub use poll::{Poller, try_wait_until, wait_until};
pub use progress::ProgressCounter;
pub use runtime::{
    HostHandle, ObserverContext, Player, Recorder, RecorderConfig, ReplayHost, ReplayTest,
    Simulation, SimulationPlacement, catch_assertion, ensure, expect_eq, expect_ne,
};
pub use session::ReplaySession;
pub use source::{MemoryRecordings, RecordingDir, RecordingSource};
pub use status::{ReplayStatus, StatusRegister};
pub use tracker::StatusTracker;
pub use types::{Checkpoint, EventSequence, RecordedEvent, Recording, RecordingFlags, RecordingHeader};
