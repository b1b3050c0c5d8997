//! Replay player
//!
//! Cursor over a recording's events, with optional wall-clock pacing by
//! recorded tick.

use std::time::{Duration, Instant};

use crate::replay::types::{RecordedEvent, Recording};

/// Playback cursor
pub struct Player {
    recording: Recording,
    tick_duration: Option<Duration>,
    next_index: u64,
    started_at: Option<Instant>,
}

impl Player {
    /// Create a player. `tick_duration` of `None` plays unpaced.
    pub fn new(recording: Recording, tick_duration: Option<Duration>) -> Self {
        Self {
            recording,
            tick_duration,
            next_index: 0,
            started_at: None,
        }
    }

    /// Start the playback clock
    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    /// The recording being played
    pub fn recording(&self) -> &Recording {
        &self.recording
    }

    /// Next event to apply, without consuming it
    pub fn peek(&self) -> Option<&RecordedEvent> {
        self.recording.events.get(self.next_index)
    }

    /// Mark the peeked event as applied. Returns the number applied so far.
    pub fn advance(&mut self) -> u64 {
        if !self.is_complete() {
            self.next_index += 1;
        }
        self.next_index
    }

    /// Check if every event has been applied
    pub fn is_complete(&self) -> bool {
        self.next_index >= self.recording.event_count()
    }

    /// Number of events applied so far
    pub fn applied(&self) -> u64 {
        self.next_index
    }

    /// Total event count
    pub fn event_count(&self) -> u64 {
        self.recording.event_count()
    }

    /// Wall-clock instant at which events of `tick` are due.
    ///
    /// `None` when unpaced or not started.
    pub fn due_at(&self, tick: u64) -> Option<Instant> {
        let tick_duration = self.tick_duration?;
        let started_at = self.started_at?;
        let offset = tick_duration.as_nanos().saturating_mul(tick as u128);
        Some(started_at + Duration::from_nanos(offset.min(u64::MAX as u128) as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_recording(events: u64) -> Recording {
        let mut recording = Recording::default();
        for i in 0..events {
            recording.events.push(RecordedEvent {
                tick: i,
                payload: vec![i as u8],
            });
        }
        recording.header.event_count = events;
        recording
    }

    #[test]
    fn test_player_basic() {
        let mut player = Player::new(create_test_recording(10), None);

        assert_eq!(player.applied(), 0);
        assert_eq!(player.event_count(), 10);
        assert_eq!(player.peek().unwrap().payload, vec![0]);

        for expected in 1..=10 {
            assert_eq!(player.advance(), expected);
        }

        assert!(player.is_complete());
        assert!(player.peek().is_none());
        assert_eq!(player.advance(), 10);
        assert_eq!(player.applied(), 10);
    }

    #[test]
    fn test_player_unpaced_has_no_deadline() {
        let mut player = Player::new(create_test_recording(3), None);
        player.start();
        assert!(player.due_at(2).is_none());
    }

    #[test]
    fn test_player_pacing() {
        let mut player = Player::new(create_test_recording(3), Some(Duration::from_millis(10)));
        assert!(player.due_at(1).is_none(), "not started yet");

        player.start();
        let first = player.due_at(0).unwrap();
        let later = player.due_at(6).unwrap();
        assert_eq!(later - first, Duration::from_millis(60));
    }

    #[test]
    fn test_empty_recording_is_complete() {
        let player = Player::new(Recording::default(), None);
        assert!(player.is_complete());
        assert!(player.peek().is_none());
    }
}
