//! Recording authoring
//!
//! Captures simulation events (and optional state checkpoints) into a
//! [`Recording`] that the replay host can play back later.

use tracing::warn;

use crate::replay::types::{
    Checkpoint, EventSequence, RecordedEvent, Recording, RecordingFlags, RecordingHeader,
};

/// Configuration for the recorder
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Simulation identifier written to the header
    pub sim_id: u8,
    /// Random seed
    pub seed: u64,
    /// Take a checkpoint every N events (0 = only explicit checkpoints)
    pub checkpoint_interval: u64,
    /// Whether to compress the event stream
    pub compress: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            sim_id: 0,
            seed: 0,
            checkpoint_interval: 0,
            compress: true,
        }
    }
}

/// Recorder state
pub struct Recorder {
    config: RecorderConfig,
    events: EventSequence,
    checkpoints: Vec<Checkpoint>,
    last_tick: u64,
    recording: bool,
}

impl Recorder {
    /// Create a new recorder with the given configuration
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            config,
            events: EventSequence::new(),
            checkpoints: Vec::new(),
            last_tick: 0,
            recording: false,
        }
    }

    /// Start recording, optionally with the state before the first event
    pub fn start(&mut self, initial_state: Option<Vec<u8>>) {
        self.recording = true;
        self.events = EventSequence::new();
        self.checkpoints = Vec::new();
        self.last_tick = 0;
        if let Some(state) = initial_state {
            self.checkpoints.push(Checkpoint {
                event_index: 0,
                state,
            });
        }
    }

    /// Stop recording and finalize the recording
    pub fn stop(&mut self) -> Recording {
        self.recording = false;

        let mut flags = RecordingFlags::empty();
        if self.config.compress {
            flags |= RecordingFlags::COMPRESSED_EVENTS;
        }
        if !self.checkpoints.is_empty() {
            flags |= RecordingFlags::HAS_CHECKPOINTS;
        }

        let events = std::mem::take(&mut self.events);
        Recording {
            header: RecordingHeader {
                sim_id: self.config.sim_id,
                flags,
                reserved: [0; 6],
                seed: self.config.seed,
                event_count: events.len(),
            },
            events,
            checkpoints: std::mem::take(&mut self.checkpoints),
        }
    }

    /// Check if recording is active
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Record an event captured on `tick`.
    ///
    /// Ticks must not decrease; an earlier tick is clamped to the last one
    /// so the recording stays linear.
    pub fn record_event(&mut self, tick: u64, payload: Vec<u8>) {
        if !self.recording {
            return;
        }

        let tick = if tick < self.last_tick {
            warn!(
                "event tick {} is earlier than {}, clamping",
                tick,
                self.last_tick
            );
            self.last_tick
        } else {
            tick
        };
        self.last_tick = tick;
        self.events.push(RecordedEvent { tick, payload });
    }

    /// Record a checkpoint (state snapshot) at the current event index
    pub fn record_checkpoint(&mut self, state: Vec<u8>) {
        if !self.recording {
            return;
        }

        self.checkpoints.push(Checkpoint {
            event_index: self.events.len(),
            state,
        });
    }

    /// Check if a checkpoint should be recorded at the current event index
    pub fn should_checkpoint(&self) -> bool {
        if !self.recording || self.config.checkpoint_interval == 0 {
            return false;
        }
        let count = self.events.len();
        count > 0 && count.is_multiple_of(self.config.checkpoint_interval)
    }

    /// Number of events recorded so far
    pub fn event_count(&self) -> u64 {
        self.events.len()
    }

    /// Get the configuration
    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }
}
