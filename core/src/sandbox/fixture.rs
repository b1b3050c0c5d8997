//! The bundled "Example" recording
//!
//! Two thousand events, one per tick. The player stands still for the first
//! thousand, walks to the final position over the next nine hundred (editing
//! three blocks along the way) and the remainder is idle input.

use glam::{IVec3, Vec3};

use super::world::{Block, SANDBOX_SIM_ID, SandboxEvent, SandboxState};
use crate::replay::runtime::{Recorder, RecorderConfig};
use crate::replay::types::Recording;

/// Name of the bundled recording
pub const EXAMPLE: &str = "Example";

pub const EXAMPLE_EVENT_COUNT: u64 = 2000;

pub const EXAMPLE_START_POSITION: Vec3 = Vec3::new(19.79358, 13.511584, 2.3982882);

pub const EXAMPLE_FINAL_POSITION: Vec3 = Vec3::new(25.189344, 13.406443, 8.6651945);

/// Blocks edited by the recording: (position, before, after)
pub const EXAMPLE_EDITS: [(IVec3, Block, Block); 3] = [
    (IVec3::new(26, 12, -3), Block::Grass, Block::Grass),
    (IVec3::new(26, 13, -3), Block::Air, Block::Grass),
    (IVec3::new(26, 12, -2), Block::Grass, Block::Air),
];

const EXAMPLE_SEED: u64 = 0x5EED_7E57;

const WALK_START: u64 = 1000;
const WALK_END: u64 = 1900;

/// Event indices of the three block edits
const EDIT_AT: [u64; 3] = [1800, 1802, 1805];

/// Build the "Example" recording.
pub fn example_recording() -> bincode::Result<Recording> {
    let mut recorder = Recorder::new(RecorderConfig {
        sim_id: SANDBOX_SIM_ID,
        seed: EXAMPLE_SEED,
        checkpoint_interval: 0,
        compress: true,
    });

    let initial = SandboxState {
        player: EXAMPLE_START_POSITION,
        edits: Vec::new(),
    };
    recorder.start(Some(initial.encode()?));

    let walk_steps = (WALK_END - WALK_START) as f32;
    for index in 0..EXAMPLE_EVENT_COUNT {
        let event = if let Some(edit) = EDIT_AT.iter().position(|&at| at == index) {
            let (at, _, block) = EXAMPLE_EDITS[edit];
            SandboxEvent::SetBlock { at, block }
        } else if index == WALK_END - 1 {
            SandboxEvent::MovePlayer(EXAMPLE_FINAL_POSITION)
        } else if (WALK_START..WALK_END).contains(&index) {
            let t = (index - WALK_START + 1) as f32 / walk_steps;
            SandboxEvent::MovePlayer(EXAMPLE_START_POSITION.lerp(EXAMPLE_FINAL_POSITION, t))
        } else {
            SandboxEvent::Idle
        };
        recorder.record_event(index, event.encode()?);
    }

    Ok(recorder.stop())
}
