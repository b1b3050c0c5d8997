//! Core recording types
//!
//! In-memory representation of a recorded session. The harness only
//! interprets tick numbers and ordering; event payloads are opaque bytes owned
//! by the simulation.

use serde::{Deserialize, Serialize};

/// Complete recording (in-memory representation)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub header: RecordingHeader,
    pub events: EventSequence,
    pub checkpoints: Vec<Checkpoint>,
}

impl Recording {
    /// State snapshot taken before the first event, if recorded
    pub fn initial_state(&self) -> Option<&Checkpoint> {
        self.checkpoints.iter().find(|c| c.event_index == 0)
    }

    /// Number of recorded events
    pub fn event_count(&self) -> u64 {
        self.events.len()
    }

    /// Tick of the last recorded event (0 for an empty recording)
    pub fn last_tick(&self) -> u64 {
        self.events.iter().last().map_or(0, |e| e.tick)
    }
}

/// Fixed-size header.
///
/// No simulation build identification: recordings are expected to survive
/// simulation changes as long as event payloads stay decodable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingHeader {
    /// Simulation identifier (which `Simulation` implementation recorded it)
    pub sim_id: u8,
    /// Feature flags
    pub flags: RecordingFlags,
    /// Reserved for future use
    pub reserved: [u8; 6],
    /// Random seed for deterministic execution
    pub seed: u64,
    /// Total number of events
    pub event_count: u64,
}

impl Default for RecordingHeader {
    fn default() -> Self {
        Self {
            sim_id: 0,
            flags: RecordingFlags::empty(),
            reserved: [0u8; 6],
            seed: 0,
            event_count: 0,
        }
    }
}

bitflags::bitflags! {
    /// Recording feature flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RecordingFlags: u8 {
        /// Recording contains state checkpoints
        const HAS_CHECKPOINTS = 0b0000_0001;
        /// Event stream is LZ4 compressed
        const COMPRESSED_EVENTS = 0b0000_0010;
    }
}

impl Serialize for RecordingFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RecordingFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u8::deserialize(deserializer)?;
        Ok(RecordingFlags::from_bits_truncate(bits))
    }
}

/// One recorded simulation event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedEvent {
    /// Simulation tick the event was captured on (non-decreasing)
    pub tick: u64,
    /// Simulation-defined encoding of the event
    pub payload: Vec<u8>,
}

/// Ordered event list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventSequence {
    events: Vec<RecordedEvent>,
}

impl EventSequence {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Append an event
    pub fn push(&mut self, event: RecordedEvent) {
        self.events.push(event);
    }

    /// Get the event at `index`
    pub fn get(&self, index: u64) -> Option<&RecordedEvent> {
        self.events.get(index as usize)
    }

    pub fn len(&self) -> u64 {
        self.events.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RecordedEvent> {
        self.events.iter()
    }

    /// True if ticks never decrease along the sequence
    pub fn is_tick_ordered(&self) -> bool {
        self.events.windows(2).all(|w| w[0].tick <= w[1].tick)
    }
}

impl FromIterator<RecordedEvent> for EventSequence {
    fn from_iter<I: IntoIterator<Item = RecordedEvent>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

/// Simulation state snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Number of events applied when the snapshot was taken
    pub event_index: u64,
    /// Serialized simulation state
    pub state: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(tick: u64, byte: u8) -> RecordedEvent {
        RecordedEvent {
            tick,
            payload: vec![byte],
        }
    }

    #[test]
    fn test_event_sequence_access() {
        let events: EventSequence = [event(0, 1), event(0, 2), event(3, 3)].into_iter().collect();

        assert_eq!(events.len(), 3);
        assert_eq!(events.get(1), Some(&event(0, 2)));
        assert_eq!(events.get(3), None);
        assert!(events.is_tick_ordered());
    }

    #[test]
    fn test_tick_order_violation() {
        let events: EventSequence = [event(5, 0), event(4, 0)].into_iter().collect();
        assert!(!events.is_tick_ordered());
    }

    #[test]
    fn test_recording_flags() {
        let flags = RecordingFlags::HAS_CHECKPOINTS | RecordingFlags::COMPRESSED_EVENTS;
        assert!(flags.contains(RecordingFlags::HAS_CHECKPOINTS));
        assert_eq!(flags.bits(), 0b11);
        assert_eq!(RecordingFlags::from_bits_truncate(0xFF), flags);
    }

    #[test]
    fn test_initial_state_lookup() {
        let mut recording = Recording::default();
        assert!(recording.initial_state().is_none());
        assert_eq!(recording.last_tick(), 0);

        recording.checkpoints = vec![
            Checkpoint {
                event_index: 50,
                state: vec![2],
            },
            Checkpoint {
                event_index: 0,
                state: vec![1],
            },
        ];
        recording.events.push(event(7, 0));

        assert_eq!(recording.initial_state().unwrap().state, vec![1]);
        assert_eq!(recording.last_tick(), 7);
    }
}
