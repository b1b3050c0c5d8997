use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{Context, Result, bail};
use glam::{IVec3, Vec3};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::replay::runtime::Simulation;
use crate::replay::types::{Checkpoint, RecordedEvent, RecordingHeader};

/// `sim_id` written into sandbox recordings
pub const SANDBOX_SIM_ID: u8 = 1;

/// Terrain surface height; the grass layer sits at this y.
const SURFACE_Y: i32 = 12;

/// Dirt depth below the grass layer
const DIRT_DEPTH: i32 = 3;

/// Spawn point used when a recording has no initial checkpoint
const DEFAULT_SPAWN: Vec3 = Vec3::new(0.5, 13.5, 0.5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Block {
    /// Reported for every position before the world is prepared
    Unloaded,
    Air,
    Grass,
    Dirt,
    Stone,
}

impl Block {
    pub fn display_name(self) -> &'static str {
        match self {
            Block::Unloaded => "Unloaded",
            Block::Air => "Air",
            Block::Grass => "Grass",
            Block::Dirt => "Dirt",
            Block::Stone => "Stone",
        }
    }

    /// Generated terrain at `at`, before any edits
    fn terrain(at: IVec3) -> Block {
        match at.y {
            y if y > SURFACE_Y => Block::Air,
            SURFACE_Y => Block::Grass,
            y if y > SURFACE_Y - 1 - DIRT_DEPTH => Block::Dirt,
            _ => Block::Stone,
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One recorded sandbox event (the payload of a [`RecordedEvent`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SandboxEvent {
    /// Player moved to an absolute position
    MovePlayer(Vec3),
    /// A block was placed or removed
    SetBlock { at: IVec3, block: Block },
    /// A tick with no world-visible input
    Idle,
}

impl SandboxEvent {
    pub fn encode(&self) -> bincode::Result<Vec<u8>> {
        bincode::serialize(self)
    }

    pub fn decode(payload: &[u8]) -> bincode::Result<Self> {
        bincode::deserialize(payload)
    }
}

/// World state captured in a checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxState {
    pub player: Vec3,
    /// Block edits on top of the generated terrain
    pub edits: Vec<(IVec3, Block)>,
}

impl SandboxState {
    pub fn encode(&self) -> bincode::Result<Vec<u8>> {
        bincode::serialize(self)
    }

    pub fn decode(bytes: &[u8]) -> bincode::Result<Self> {
        bincode::deserialize(bytes)
    }
}

#[derive(Debug, Default)]
struct WorldState {
    loaded: bool,
    player: Option<Vec3>,
    edits: HashMap<IVec3, Block>,
    idle_ticks: u64,
}

/// Read-only handle onto a [`SandboxWorld`], safe to query from any thread.
#[derive(Debug, Clone)]
pub struct SandboxView {
    state: Arc<RwLock<WorldState>>,
}

impl SandboxView {
    fn read(&self) -> RwLockReadGuard<'_, WorldState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    /// True once the world has been prepared for a recording
    pub fn is_loaded(&self) -> bool {
        self.read().loaded
    }

    /// Player position, or `None` before the player has spawned
    pub fn player_position(&self) -> Option<Vec3> {
        self.read().player
    }

    /// Block at `at` ([`Block::Unloaded`] before the world is prepared)
    pub fn block_at(&self, at: IVec3) -> Block {
        let state = self.read();
        if !state.loaded {
            return Block::Unloaded;
        }
        state
            .edits
            .get(&at)
            .copied()
            .unwrap_or_else(|| Block::terrain(at))
    }

    /// Ticks idled after playback finished
    pub fn idle_ticks(&self) -> u64 {
        self.read().idle_ticks
    }
}

/// The sandbox simulation driven by the replay host.
#[derive(Debug, Default)]
pub struct SandboxWorld {
    state: Arc<RwLock<WorldState>>,
}

impl SandboxWorld {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> RwLockWriteGuard<'_, WorldState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Simulation for SandboxWorld {
    type View = SandboxView;

    fn view(&self) -> SandboxView {
        SandboxView {
            state: self.state.clone(),
        }
    }

    fn prepare(&mut self, header: &RecordingHeader, initial: Option<&Checkpoint>) -> Result<()> {
        if header.sim_id != SANDBOX_SIM_ID {
            bail!(
                "recording was made by simulation {}, not the sandbox ({})",
                header.sim_id,
                SANDBOX_SIM_ID
            );
        }

        let initial = match initial {
            Some(checkpoint) => SandboxState::decode(&checkpoint.state)
                .context("decoding initial sandbox state")?,
            None => SandboxState {
                player: DEFAULT_SPAWN,
                edits: Vec::new(),
            },
        };

        let mut state = self.write();
        state.edits = initial.edits.into_iter().collect();
        state.player = Some(initial.player);
        state.idle_ticks = 0;
        state.loaded = true;
        debug!(player = ?initial.player, edits = state.edits.len(), "sandbox prepared");
        Ok(())
    }

    fn apply(&mut self, event: &RecordedEvent) -> Result<()> {
        let decoded = SandboxEvent::decode(&event.payload)
            .with_context(|| format!("decoding sandbox event at tick {}", event.tick))?;

        let mut state = self.write();
        match decoded {
            SandboxEvent::MovePlayer(position) => state.player = Some(position),
            SandboxEvent::SetBlock { at, block } => {
                if block == Block::Unloaded {
                    bail!("cannot place an unloaded block at {}", at);
                }
                trace!(%at, %block, "set block");
                state.edits.insert(at, block);
            }
            SandboxEvent::Idle => {}
        }
        Ok(())
    }

    fn idle(&mut self) -> Result<()> {
        self.write().idle_ticks += 1;
        Ok(())
    }
}
