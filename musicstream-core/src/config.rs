use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MusicStreamConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Initial playback state for a new session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_channel")]
    pub default_channel: String,
    #[serde(default = "default_volume")]
    pub initial_volume: u8,
    /// Start in the playing state
    #[serde(default = "default_true")]
    pub autoplay: bool,
    /// Duration used for songs the catalog gives no length for
    #[serde(default = "default_song_duration")]
    pub default_song_duration_secs: u32,
}

fn default_channel() -> String {
    "dancingDJ".to_string()
}

const fn default_volume() -> u8 {
    75
}

const fn default_true() -> bool {
    true
}

const fn default_song_duration() -> u32 {
    180
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_channel: default_channel(),
            initial_volume: default_volume(),
            autoplay: true,
            default_song_duration_secs: default_song_duration(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
}

const fn default_tick_interval() -> u64 {
    1000
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
        }
    }
}

impl DriverConfig {
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Where the channel catalog comes from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// TOML catalog snapshot; the built-in catalog is used when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to a file in the config directory
    #[serde(default)]
    pub enabled: bool,
}

impl MusicStreamConfig {
    /// Get the configuration directory path (~/.config/musicstream/)
    #[must_use]
    pub fn config_dir() -> PathBuf {
        crate::paths::config_dir()
    }

    /// Get the config file path (~/.config/musicstream/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from the default location or create a template on first run
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigNotFound`] after writing the template on
    /// first run, or an error if the file cannot be read, parsed or validated.
    pub fn load_or_create() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }

            fs::write(&config_path, CONFIG_TEMPLATE)?;

            return Err(CoreError::ConfigNotFound { path: config_path });
        }

        Self::load(&config_path)
    }

    /// Load and validate config from a specific file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate config from TOML text
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigParseError`] on TOML errors and
    /// [`CoreError::ConfigInvalid`] if a value is out of range.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigInvalid`] describing the first bad field.
    pub fn validate(&self) -> Result<()> {
        if self.session.default_channel.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "session.default_channel must not be empty".into(),
            });
        }
        if self.session.initial_volume > 100 {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "session.initial_volume must be between 0 and 100, got {}",
                    self.session.initial_volume
                ),
            });
        }
        if self.session.default_song_duration_secs == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "session.default_song_duration_secs must be at least 1".into(),
            });
        }
        // Each tick adds whole seconds to the timeline
        let interval = self.driver.tick_interval_ms;
        if interval == 0 || interval % 1000 != 0 {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "driver.tick_interval_ms must be a positive multiple of 1000, got {interval}"
                ),
            });
        }
        Ok(())
    }
}

/// Contents written to `config.toml` on first run
pub const CONFIG_TEMPLATE: &str = r##"# MusicStream Configuration
# ~/.config/musicstream/config.toml

[session]
# Channel selected when the session starts
default_channel = "dancingDJ"
# Volume in percent (0-100)
initial_volume = 75
# Start playing immediately
autoplay = true
# Length used for songs without an explicit duration_secs in the catalog
default_song_duration_secs = 180

[driver]
# How often the timeline advances, in whole seconds (1000, 2000, ...)
tick_interval_ms = 1000

[catalog]
# Optional TOML catalog file; the built-in channels are used when unset
# path = "/path/to/catalog.toml"

[logging]
# Also write logs to ~/.config/musicstream/musicstream.log
enabled = false
"##;
