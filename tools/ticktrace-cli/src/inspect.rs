//! Inspect a recording file

use anyhow::{Context, Result};
use clap::Args;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use ticktrace_core::replay::{BinaryReader, Recording};

/// Arguments for the inspect command
#[derive(Args)]
pub struct InspectArgs {
    /// Recording file (.ttrp)
    pub file: PathBuf,

    /// Also list every event
    #[arg(long)]
    pub events: bool,
}

/// Execute the inspect command
pub fn execute(args: InspectArgs) -> Result<()> {
    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open recording: {}", args.file.display()))?;
    let recording = BinaryReader::new(BufReader::new(file))
        .read_recording()
        .with_context(|| format!("Failed to read recording: {}", args.file.display()))?;

    print!("{}", summary(&recording));

    if args.events {
        println!();
        for (index, event) in recording.events.iter().enumerate() {
            println!("{:>8}  tick {:>8}  {} bytes", index, event.tick, event.payload.len());
        }
    }
    Ok(())
}

fn summary(recording: &Recording) -> String {
    let header = &recording.header;
    let payload_bytes: usize = recording.events.iter().map(|e| e.payload.len()).sum();
    let mut out = String::new();
    out.push_str("=== Recording ===\n");
    out.push_str(&format!("Simulation: {}\n", header.sim_id));
    out.push_str(&format!("Seed: {:#x}\n", header.seed));
    out.push_str(&format!("Flags: {:?}\n", header.flags));
    out.push_str(&format!("Events: {}\n", recording.event_count()));
    out.push_str(&format!("Last tick: {}\n", recording.last_tick()));
    out.push_str(&format!("Payload bytes: {}\n", payload_bytes));
    out.push_str(&format!("Checkpoints: {}\n", recording.checkpoints.len()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticktrace_core::sandbox::example_recording;

    #[test]
    fn test_summary_of_example() {
        let text = summary(&example_recording().unwrap());
        assert!(text.contains("Events: 2000"));
        assert!(text.contains("Last tick: 1999"));
        assert!(text.contains("Checkpoints: 1"));
    }
}
