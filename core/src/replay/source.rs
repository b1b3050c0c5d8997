//! Where recordings come from
//!
//! The replay host resolves a recording by name through a [`RecordingSource`].
//! Two sources are provided: a directory of `.ttrp` files and an in-memory
//! map for tests and tools that build recordings on the fly.

use hashbrown::HashMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::binary::{BinaryReader, BinaryWriter, FILE_EXTENSION};
use super::types::Recording;
use crate::error::LoadError;

/// Resolves recording names to decoded recordings.
pub trait RecordingSource: Send + Sync {
    /// Load the recording called `name`.
    fn load(&self, name: &str) -> Result<Recording, LoadError>;
}

impl<S: RecordingSource + ?Sized> RecordingSource for Arc<S> {
    fn load(&self, name: &str) -> Result<Recording, LoadError> {
        (**self).load(name)
    }
}

/// Directory of `<name>.ttrp` files.
#[derive(Debug, Clone)]
pub struct RecordingDir {
    root: PathBuf,
}

impl RecordingDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory this source reads from
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a recording called `name` lives at
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.{}", name, FILE_EXTENSION))
    }

    /// Write `recording` as `<name>.ttrp`, creating the directory if needed.
    pub fn save(&self, name: &str, recording: &Recording) -> io::Result<PathBuf> {
        std::fs::create_dir_all(&self.root)?;
        let path = self.path_for(name);
        let file = File::create(&path)?;
        BinaryWriter::new(BufWriter::new(file)).write_recording(recording)?;
        debug!("saved recording '{}' to {}", name, path.display());
        Ok(path)
    }

    /// Names of all recordings in the directory, sorted.
    pub fn list(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(FILE_EXTENSION)
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

impl RecordingSource for RecordingDir {
    fn load(&self, name: &str) -> Result<Recording, LoadError> {
        let path = self.path_for(name);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(LoadError::NotFound {
                    name: name.to_string(),
                    path,
                });
            }
            Err(e) => return Err(LoadError::Io(e)),
        };

        let recording = BinaryReader::new(BufReader::new(file)).read_recording()?;
        debug!(
            "loaded recording '{}' ({} events) from {}",
            name,
            recording.event_count(),
            path.display()
        );
        Ok(recording)
    }
}

/// In-memory recordings keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordings {
    recordings: HashMap<String, Recording>,
}

impl MemoryRecordings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a recording
    pub fn insert(&mut self, name: impl Into<String>, recording: Recording) {
        self.recordings.insert(name.into(), recording);
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, name: impl Into<String>, recording: Recording) -> Self {
        self.insert(name, recording);
        self
    }
}

impl RecordingSource for MemoryRecordings {
    fn load(&self, name: &str) -> Result<Recording, LoadError> {
        self.recordings
            .get(name)
            .cloned()
            .ok_or_else(|| LoadError::NotFound {
                name: name.to_string(),
                path: PathBuf::from(format!("memory:{}", name)),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::types::{RecordedEvent, RecordingFlags};

    fn small_recording() -> Recording {
        let mut recording = Recording::default();
        recording.header.flags = RecordingFlags::COMPRESSED_EVENTS;
        for tick in 0..5 {
            recording.events.push(RecordedEvent {
                tick,
                payload: vec![tick as u8],
            });
        }
        recording.header.event_count = 5;
        recording
    }

    #[test]
    fn test_dir_save_load_list() {
        let dir = tempfile::tempdir().unwrap();
        let source = RecordingDir::new(dir.path().join("recordings"));

        let path = source.save("Example", &small_recording()).unwrap();
        assert!(path.ends_with("Example.ttrp"));
        source.save("Another", &Recording::default()).unwrap();

        assert_eq!(source.list().unwrap(), vec!["Another", "Example"]);
        assert_eq!(source.load("Example").unwrap(), small_recording());
    }

    #[test]
    fn test_dir_missing_recording() {
        let dir = tempfile::tempdir().unwrap();
        let source = RecordingDir::new(dir.path());

        match source.load("Nope") {
            Err(LoadError::NotFound { name, path }) => {
                assert_eq!(name, "Nope");
                assert_eq!(path, dir.path().join("Nope.ttrp"));
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_dir_corrupt_recording() {
        let dir = tempfile::tempdir().unwrap();
        let source = RecordingDir::new(dir.path());
        std::fs::write(source.path_for("Broken"), b"not a recording").unwrap();

        assert!(matches!(source.load("Broken"), Err(LoadError::Corrupt(_))));
    }

    #[test]
    fn test_memory_source() {
        let source = MemoryRecordings::new().with("Example", small_recording());
        assert_eq!(source.load("Example").unwrap().event_count(), 5);
        assert!(matches!(
            source.load("Missing"),
            Err(LoadError::NotFound { .. })
        ));
    }
}
