use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // Configuration errors
    #[error("Config file not found at {path}. A template has been created with the default settings.")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    // Catalog errors
    #[error("Channel not found: {channel_id}")]
    ChannelNotFound { channel_id: String },

    #[error("Song index {index} out of range for channel {channel_id} ({len} songs)")]
    SongIndexOutOfRange {
        channel_id: String,
        index: usize,
        len: usize,
    },

    #[error("Channel {channel_id} has an empty playlist")]
    EmptyPlaylist { channel_id: String },

    #[error("Invalid catalog: {message}")]
    CatalogInvalid { message: String },

    // IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CoreError {
    /// Shorthand for a [`CoreError::ChannelNotFound`] error.
    pub fn channel_not_found(channel_id: impl Into<String>) -> Self {
        Self::ChannelNotFound {
            channel_id: channel_id.into(),
        }
    }

    /// Whether this error means the configuration (or catalog) has to be fixed
    /// before a session can start.
    #[must_use]
    pub const fn is_fatal_config(&self) -> bool {
        matches!(
            self,
            Self::ConfigInvalid { .. }
                | Self::ConfigParseError(_)
                | Self::EmptyPlaylist { .. }
                | Self::CatalogInvalid { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
