//! Channel and song registry.
//!
//! The catalog is loaded once at startup and is read-only afterwards. Every
//! channel owns a non-empty, fixed-order playlist; a catalog that breaks this
//! rule is rejected at load time rather than handled per operation.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// A themed playlist with display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Accent color used by the presentation layer (e.g. `#3B82F6`)
    #[serde(default)]
    pub accent_color: String,
}

/// A single song in a channel's playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artist: String,
    /// Artwork reference (URL or path) rendered by the presentation layer
    #[serde(default)]
    pub thumbnail: String,
    /// Song length; the session default applies when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u32>,
}

impl Song {
    /// Create a song without an explicit duration
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        thumbnail: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            thumbnail: thumbnail.into(),
            duration_secs: None,
        }
    }

    /// Set an explicit duration
    #[must_use]
    pub const fn with_duration(mut self, duration_secs: u32) -> Self {
        self.duration_secs = Some(duration_secs);
        self
    }
}

/// One channel together with its playlist, as it appears in a catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub accent_color: String,
    #[serde(default)]
    pub songs: Vec<Song>,
}

/// Unvalidated catalog data supplied by the catalog-loading layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub channels: Vec<ChannelEntry>,
}

/// Immutable registry of channels and their playlists.
#[derive(Debug, Clone)]
pub struct Catalog {
    channels: Vec<Channel>,
    playlists: Vec<Vec<Song>>,
    by_id: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from a snapshot, enforcing the load-time invariants.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyPlaylist`] if any channel has no songs, and
    /// [`CoreError::CatalogInvalid`] for an empty catalog, duplicate channel or
    /// song ids, or a zero song duration.
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Result<Self> {
        if snapshot.channels.is_empty() {
            return Err(CoreError::CatalogInvalid {
                message: "catalog has no channels".into(),
            });
        }

        let mut seen_songs = HashSet::new();
        let mut channels = Vec::with_capacity(snapshot.channels.len());
        let mut playlists = Vec::with_capacity(snapshot.channels.len());
        let mut by_id = HashMap::with_capacity(snapshot.channels.len());

        for entry in snapshot.channels {
            if entry.id.is_empty() {
                return Err(CoreError::CatalogInvalid {
                    message: "channel id must not be empty".into(),
                });
            }
            if by_id.contains_key(&entry.id) {
                return Err(CoreError::CatalogInvalid {
                    message: format!("duplicate channel id: {}", entry.id),
                });
            }
            if entry.songs.is_empty() {
                return Err(CoreError::EmptyPlaylist {
                    channel_id: entry.id,
                });
            }
            for song in &entry.songs {
                if !seen_songs.insert(song.id.clone()) {
                    return Err(CoreError::CatalogInvalid {
                        message: format!("duplicate song id: {}", song.id),
                    });
                }
                if song.duration_secs == Some(0) {
                    return Err(CoreError::CatalogInvalid {
                        message: format!("song {} has a zero duration", song.id),
                    });
                }
            }

            by_id.insert(entry.id.clone(), channels.len());
            channels.push(Channel {
                id: entry.id,
                name: entry.name,
                description: entry.description,
                accent_color: entry.accent_color,
            });
            playlists.push(entry.songs);
        }

        debug!("Catalog validated: {} channel(s)", channels.len());

        Ok(Self {
            channels,
            playlists,
            by_id,
        })
    }

    /// Load a catalog snapshot from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// snapshot fails validation (see [`Catalog::from_snapshot`]).
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let snapshot: CatalogSnapshot = toml::from_str(&content)?;
        let catalog = Self::from_snapshot(snapshot)?;
        info!(
            "Loaded catalog from {} ({} channels)",
            path.display(),
            catalog.channels.len()
        );
        Ok(catalog)
    }

    /// The built-in catalog: five channels with three songs each.
    #[must_use]
    pub fn builtin() -> Self {
        let mut channels = Vec::with_capacity(BUILTIN_CHANNELS.len());
        let mut playlists = Vec::with_capacity(BUILTIN_CHANNELS.len());
        let mut by_id = HashMap::with_capacity(BUILTIN_CHANNELS.len());

        for (channel, songs) in BUILTIN_CHANNELS {
            by_id.insert(channel.id.to_string(), channels.len());
            channels.push(Channel {
                id: channel.id.into(),
                name: channel.name.into(),
                description: channel.description.into(),
                accent_color: channel.accent_color.into(),
            });
            playlists.push(
                songs
                    .iter()
                    .map(|s| Song::new(s.id, s.title, s.artist, s.thumbnail))
                    .collect(),
            );
        }

        Self {
            channels,
            playlists,
            by_id,
        }
    }

    /// All channels in catalog order
    #[must_use]
    pub fn list_channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Whether a channel id is known
    #[must_use]
    pub fn contains(&self, channel_id: &str) -> bool {
        self.by_id.contains_key(channel_id)
    }

    /// Look up a channel by id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ChannelNotFound`] if the id is unknown.
    pub fn get_channel(&self, channel_id: &str) -> Result<&Channel> {
        self.position(channel_id).map(|i| &self.channels[i])
    }

    /// The ordered playlist of a channel. Never empty.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ChannelNotFound`] if the id is unknown.
    pub fn get_playlist(&self, channel_id: &str) -> Result<&[Song]> {
        self.position(channel_id).map(|i| self.playlists[i].as_slice())
    }

    /// Number of songs in a channel's playlist.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ChannelNotFound`] if the id is unknown.
    pub fn playlist_len(&self, channel_id: &str) -> Result<usize> {
        self.get_playlist(channel_id).map(<[Song]>::len)
    }

    /// A song by playlist position.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ChannelNotFound`] for an unknown channel and
    /// [`CoreError::SongIndexOutOfRange`] if `index` is past the playlist end.
    pub fn get_song(&self, channel_id: &str, index: usize) -> Result<&Song> {
        let playlist = self.get_playlist(channel_id)?;
        playlist
            .get(index)
            .ok_or_else(|| CoreError::SongIndexOutOfRange {
                channel_id: channel_id.to_string(),
                index,
                len: playlist.len(),
            })
    }

    /// Duration of a song, falling back to `default_secs` when the catalog
    /// does not specify one.
    ///
    /// # Errors
    ///
    /// Same as [`Catalog::get_song`].
    pub fn song_duration_secs(
        &self,
        channel_id: &str,
        index: usize,
        default_secs: u32,
    ) -> Result<u32> {
        self.get_song(channel_id, index)
            .map(|song| song.duration_secs.unwrap_or(default_secs).max(1))
    }

    /// Find a song anywhere in the catalog, returning its channel id and index
    #[must_use]
    pub fn find_song(&self, song_id: &str) -> Option<(&str, usize)> {
        self.playlists
            .iter()
            .enumerate()
            .find_map(|(channel_idx, playlist)| {
                playlist
                    .iter()
                    .position(|song| song.id == song_id)
                    .map(|song_idx| (self.channels[channel_idx].id.as_str(), song_idx))
            })
    }

    fn position(&self, channel_id: &str) -> Result<usize> {
        self.by_id
            .get(channel_id)
            .copied()
            .ok_or_else(|| CoreError::channel_not_found(channel_id))
    }
}

struct BuiltinChannel {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    accent_color: &'static str,
}

struct BuiltinSong {
    id: &'static str,
    title: &'static str,
    artist: &'static str,
    thumbnail: &'static str,
}

const fn song(
    id: &'static str,
    title: &'static str,
    artist: &'static str,
    thumbnail: &'static str,
) -> BuiltinSong {
    BuiltinSong {
        id,
        title,
        artist,
        thumbnail,
    }
}

const BUILTIN_CHANNELS: [(BuiltinChannel, [BuiltinSong; 3]); 5] = [
    (
        BuiltinChannel {
            id: "dancingDJ",
            name: "Dancing & DJ",
            description: "Dance to the beat of the latest DJ hits and party anthems. Perfect for workouts, parties, or just keeping your energy high!",
            accent_color: "#3B82F6",
        },
        [
            song("dj1", "Dance Beat Mix 2023", "DJ DanceMaster", "https://picsum.photos/id/1/300/300"),
            song("dj2", "Club Party Vibe", "DJ NightLife", "https://picsum.photos/id/2/300/300"),
            song("dj3", "Electro House Mix", "DJ Energy", "https://picsum.photos/id/3/300/300"),
        ],
    ),
    (
        BuiltinChannel {
            id: "lofi",
            name: "Lofi",
            description: "Relax and focus with the best lofi chill beats. Ideal for studying, working, or unwinding after a long day.",
            accent_color: "#22C55E",
        },
        [
            song("lofi1", "Lofi Chill Mix", "Chill Vibes", "https://picsum.photos/id/4/300/300"),
            song("lofi2", "Rainy Day Beats", "Lofi Master", "https://picsum.photos/id/5/300/300"),
            song("lofi3", "Study Focus Music", "Lofi Study", "https://picsum.photos/id/6/300/300"),
        ],
    ),
    (
        BuiltinChannel {
            id: "moodLifting",
            name: "Mood Lifting",
            description: "Uplift your mood with these positive and cheerful songs. Perfect for brightening your day and boosting your spirits.",
            accent_color: "#FACC15",
        },
        [
            song("mood1", "Happy Vibes", "Sunshine Music", "https://picsum.photos/id/7/300/300"),
            song("mood2", "Positive Energy", "Good Vibes Only", "https://picsum.photos/id/8/300/300"),
            song("mood3", "Uplifting Melodies", "Happy Tunes", "https://picsum.photos/id/9/300/300"),
        ],
    ),
    (
        BuiltinChannel {
            id: "nepali",
            name: "Nepali Songs",
            description: "Enjoy the best of Nepali music across all genres, from traditional folk songs to modern Nepali pop hits.",
            accent_color: "#EF4444",
        },
        [
            song("nepali1", "Nepali Folk Song", "Nepali Traditional", "https://picsum.photos/id/10/300/300"),
            song("nepali2", "Classic Nepali Melody", "Nepali Legends", "https://picsum.photos/id/11/300/300"),
            song("nepali3", "Modern Nepali Hits", "Nepali Pop", "https://picsum.photos/id/12/300/300"),
        ],
    ),
    (
        BuiltinChannel {
            id: "nepaliDancing",
            name: "Nepali Dancing",
            description: "Get your dance on with the hottest Nepali dance tracks! Traditional and modern Nepali songs that'll make you want to move.",
            accent_color: "#A855F7",
        },
        [
            song("nepaliDancing1", "Nepali Dance Party", "Nepali Dance Crew", "https://picsum.photos/id/13/300/300"),
            song("nepaliDancing2", "Festive Nepali Beats", "Nepali Party", "https://picsum.photos/id/14/300/300"),
            song("nepaliDancing3", "Traditional Nepali Dance", "Nepali Cultural", "https://picsum.photos/id/15/300/300"),
        ],
    ),
];
