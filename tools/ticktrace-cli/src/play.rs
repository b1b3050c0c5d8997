//! Play a recording against the sandbox world
//!
//! Runs the producer in the background and a single observer that logs each
//! status transition and a progress line every hundred events, then shuts the
//! host down once playback finishes. Playback that makes no progress for the
//! configured poll timeout fails the command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use ticktrace_core::replay::{
    ObserverContext, Poller, RecordingDir, ReplayHost, ReplayStatus, ReplayTest,
};
use ticktrace_core::sandbox::{SandboxView, SandboxWorld};
use ticktrace_core::{HarnessError, LoadError};
use tracing::info;

/// Arguments for the play command
#[derive(Args)]
pub struct PlayArgs {
    /// Recording name (file stem inside the recordings directory)
    pub name: String,

    /// Recordings directory (default: configured recordings dir)
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Config file (default: user config)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Recorded ticks per second (0 = as fast as possible)
    #[arg(long)]
    pub tick_rate: Option<u32>,

    /// Maximum time a single wait may take, in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

/// Execute the play command
pub fn execute(args: PlayArgs) -> Result<()> {
    let mut config = crate::load_config(args.config.as_ref())?;
    if let Some(tick_rate) = args.tick_rate {
        config.host.tick_rate = tick_rate;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.poll.timeout_ms = timeout_ms;
    }

    let recordings = RecordingDir::new(crate::recordings_dir(args.dir, &config));
    info!(
        "playing '{}' from {} at {} ticks/s",
        args.name,
        recordings.root().display(),
        config.host.tick_rate
    );

    let host = ReplayHost::new(SandboxWorld::new(), recordings.clone(), config.host.clone());
    let result = ReplayTest::new(host)
        .poller(Poller::from(config.poll))
        .observer("progress", watch)
        .run(&args.name);
    if let Err(HarnessError::Load(LoadError::NotFound { .. })) = &result {
        return result
            .context(available_hint(&recordings))
            .with_context(|| format!("Replay of '{}' failed", args.name));
    }
    result.with_context(|| format!("Replay of '{}' failed", args.name))?;

    println!("Replay of '{}' finished", args.name);
    Ok(())
}

/// Names the recordings that do exist, for a failed lookup.
fn available_hint(recordings: &RecordingDir) -> String {
    match recordings.list() {
        Ok(names) if !names.is_empty() => format!("available: {}", names.join(", ")),
        Ok(_) => format!("no recordings in {}", recordings.root().display()),
        Err(e) => format!("cannot list {}: {}", recordings.root().display(), e),
    }
}

/// Log transitions until playback finishes.
fn watch(ctx: &ObserverContext<SandboxView>) -> Result<(), HarnessError> {
    let mut status = ctx.wait_for_status(ReplayStatus::PreparingReplay)?;
    info!(%status, "status");

    let mut reported = 0;
    let mut last_change = Instant::now();
    let step = Poller::new(ctx.poller().interval, Duration::from_millis(500));
    while status != ReplayStatus::ReplayFinished {
        // Short waits so progress is logged while the status is unchanged.
        let changed = step.try_wait_until(|| Ok::<bool, HarnessError>(ctx.status()? != status));
        match changed {
            Ok(()) | Err(HarnessError::Timeout { .. }) => {}
            Err(e) => return Err(e),
        }

        let progress = ctx.progress()?;
        if progress / 100 != reported / 100 {
            info!(progress, position = ?ctx.view().player_position(), "progress");
        }
        if progress != reported {
            reported = progress;
            last_change = Instant::now();
        }

        let now = ctx.status()?;
        if now != status {
            status = now;
            last_change = Instant::now();
            info!(%status, "status");
        }

        if last_change.elapsed() >= ctx.poller().timeout {
            return Err(HarnessError::Timeout {
                waited: last_change.elapsed(),
                timeout: ctx.poller().timeout,
            });
        }

        if !ctx.host_running() && status != ReplayStatus::ReplayFinished {
            return Err(HarnessError::Simulation(
                "replay stopped before finishing".to_string(),
            ));
        }
    }

    info!(position = ?ctx.view().player_position(), "final position");
    ctx.shutdown();
    Ok(())
}
