//! Harness configuration (`ticktrace.toml`)
//!
//! Every field has a default, so an empty or missing file is a valid
//! configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name looked up in the platform config directory
pub const CONFIG_FILE_NAME: &str = "ticktrace.toml";

/// Error loading or saving a configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HarnessConfig {
    /// Condition poller timings
    #[serde(default)]
    pub poll: PollConfig,
    /// Replay host settings
    #[serde(default)]
    pub host: HostConfig,
}

/// Condition poller timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Sleep between predicate evaluations (default: 10ms)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Maximum time a single wait may take (default: 30s)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Replay host settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HostConfig {
    /// Recorded ticks played per second; 0 plays as fast as possible
    /// (default: 0)
    #[serde(default)]
    pub tick_rate: u32,
    /// Directory holding `.ttrp` recordings (default: platform data dir)
    #[serde(default)]
    pub recordings_dir: Option<PathBuf>,
}

impl HostConfig {
    /// Wall-clock duration of one recorded tick, or `None` when unpaced.
    pub fn tick_duration(&self) -> Option<Duration> {
        (self.tick_rate > 0).then(|| Duration::from_secs_f64(1.0 / self.tick_rate as f64))
    }

    /// Configured recordings directory, falling back to the platform default.
    pub fn recordings_dir(&self) -> Option<PathBuf> {
        self.recordings_dir.clone().or_else(default_recordings_dir)
    }
}

fn default_interval_ms() -> u64 {
    10
}
fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Linux: `~/.config/ticktrace`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io", "ticktrace", "ticktrace")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Returns the default recordings directory.
///
/// On Linux: `~/.local/share/ticktrace/recordings`
pub fn default_recordings_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io", "ticktrace", "ticktrace")
        .map(|dirs| dirs.data_dir().join("recordings"))
}

impl HarnessConfig {
    /// Parse a config file. A missing file is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Parse a config file, returning defaults if it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Load `ticktrace.toml` from the platform config directory.
    pub fn load_user() -> Result<Self, ConfigError> {
        match config_dir() {
            Some(dir) => Self::load_or_default(&dir.join(CONFIG_FILE_NAME)),
            None => Ok(Self::default()),
        }
    }

    /// Write the config as pretty TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = HarnessConfig::default();
        assert_eq!(config.poll.interval(), Duration::from_millis(10));
        assert_eq!(config.poll.timeout(), Duration::from_secs(30));
        assert_eq!(config.host.tick_rate, 0);
        assert_eq!(config.host.tick_duration(), None);
    }

    #[test]
    fn test_config_deserialize_empty() {
        let config: HarnessConfig = toml::from_str("").unwrap();
        assert_eq!(config, HarnessConfig::default());
    }

    #[test]
    fn test_config_deserialize_partial() {
        let toml_str = r#"
[poll]
timeout_ms = 500

[host]
tick_rate = 60
recordings_dir = "/srv/recordings"
"#;
        let config: HarnessConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.poll.interval_ms, 10); // default
        assert_eq!(config.poll.timeout_ms, 500);
        assert_eq!(config.host.tick_rate, 60);
        assert_eq!(
            config.host.recordings_dir(),
            Some(PathBuf::from("/srv/recordings"))
        );
        let tick = config.host.tick_duration().unwrap();
        assert!((tick.as_secs_f64() - 1.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_config_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let config = HarnessConfig {
            poll: PollConfig {
                interval_ms: 2,
                timeout_ms: 1234,
            },
            host: HostConfig {
                tick_rate: 1000,
                recordings_dir: Some(dir.path().to_path_buf()),
            },
        };
        config.save(&path).unwrap();

        assert_eq!(HarnessConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = HarnessConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, HarnessConfig::default());
        assert!(HarnessConfig::load(&dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn test_load_rejects_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[poll]\ninterval_ms = \"fast\"\n").unwrap();
        assert!(matches!(
            HarnessConfig::load(&path),
            Err(ConfigError::Parse(_))
        ));
    }
}
