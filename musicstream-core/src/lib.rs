pub mod catalog;
pub mod config;
pub mod controller;
pub mod driver;
pub mod error;
pub mod paths;
pub mod playback;
pub mod rating;
pub mod time;

pub use catalog::{Catalog, CatalogSnapshot, Channel, ChannelEntry, Song};
pub use config::{
    CatalogConfig, DriverConfig, LoggingConfig, MusicStreamConfig, SessionConfig, CONFIG_TEMPLATE,
};
pub use controller::{
    AdvanceReason, PlaybackController, PlaybackEvent, SharedController, TickOutcome,
};
pub use driver::{TickDriver, TickHandle};
pub use error::{CoreError, Result};
pub use paths::{config_dir, log_file_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME, LOG_FILE_NAME};
pub use playback::PlaybackState;
pub use rating::{Rating, RatingStore};
pub use time::{format_clock, DurationExt};
