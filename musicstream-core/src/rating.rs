//! Per-session song feedback.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Listener feedback on a song
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Like,
    Dislike,
}

impl Rating {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Dislike => "dislike",
        }
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Song id to rating map. Entries live for the whole session; a new rating
/// overwrites the previous one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RatingStore {
    ratings: HashMap<String, Rating>,
}

impl RatingStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rating, returning the one it replaced
    pub fn set(&mut self, song_id: impl Into<String>, rating: Rating) -> Option<Rating> {
        self.ratings.insert(song_id.into(), rating)
    }

    #[must_use]
    pub fn get(&self, song_id: &str) -> Option<Rating> {
        self.ratings.get(song_id).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Rating)> {
        self.ratings.iter().map(|(id, rating)| (id.as_str(), *rating))
    }
}
