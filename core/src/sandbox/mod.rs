//! Sandbox block world
//!
//! A deliberately small world for exercising the harness: one player position
//! and a grid of blocks over flat generated terrain. The bundled
//! [`example_recording`] walks the player across the map and edits three
//! blocks.

mod fixture;
mod world;

pub use fixture::{
    EXAMPLE, EXAMPLE_EDITS, EXAMPLE_EVENT_COUNT, EXAMPLE_FINAL_POSITION, EXAMPLE_START_POSITION,
    example_recording,
};
pub use world::{Block, SANDBOX_SIM_ID, SandboxEvent, SandboxState, SandboxView, SandboxWorld};
