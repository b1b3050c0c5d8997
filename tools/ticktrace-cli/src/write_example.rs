//! Write the bundled sandbox recording

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use ticktrace_core::replay::RecordingDir;
use ticktrace_core::sandbox::{EXAMPLE, example_recording};

/// Arguments for the write-example command
#[derive(Args)]
pub struct WriteExampleArgs {
    /// Directory to write Example.ttrp into (default: configured recordings dir)
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Config file (default: user config)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Execute the write-example command
pub fn execute(args: WriteExampleArgs) -> Result<()> {
    let config = crate::load_config(args.config.as_ref())?;
    let recordings = RecordingDir::new(crate::recordings_dir(args.dir, &config));

    let recording = example_recording().context("Failed to build the example recording")?;
    let path = recordings
        .save(EXAMPLE, &recording)
        .with_context(|| format!("Failed to write recording to {}", recordings.root().display()))?;

    println!(
        "Wrote {} ({} events) to {}",
        EXAMPLE,
        recording.event_count(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::{self, InspectArgs};
    use ticktrace_core::replay::RecordingSource;
    use ticktrace_core::sandbox::EXAMPLE_EVENT_COUNT;
    use ticktrace_core::HarnessConfig;

    #[test]
    fn test_write_then_inspect() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("ticktrace.toml");
        HarnessConfig::default().save(&config_path).unwrap();
        let root = dir.path().join("recordings");

        execute(WriteExampleArgs {
            dir: Some(root.clone()),
            config: Some(config_path),
        })
        .unwrap();

        let recordings = RecordingDir::new(&root);
        assert_eq!(recordings.list().unwrap(), vec![EXAMPLE.to_string()]);
        let recording = recordings.load(EXAMPLE).unwrap();
        assert_eq!(recording.event_count(), EXAMPLE_EVENT_COUNT);
        assert_eq!(recording.event_count(), 2000);

        inspect::execute(InspectArgs {
            file: recordings.path_for(EXAMPLE),
            events: false,
        })
        .unwrap();
    }
}
